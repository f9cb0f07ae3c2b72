// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome category of a pipeline evaluation.
///
/// Variants are ordered by severity so that the worst status of a chain is
/// simply the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusType {
    #[default]
    Success,
    Warning,
    Pending,
    Error,
}

/// Status value attached to every container and every stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineStatus {
    kind: StatusType,
    text: String,
}

impl PipelineStatus {
    pub fn new(kind: StatusType, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn success() -> Self {
        Self::default()
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(StatusType::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusType::Error, text)
    }

    pub fn pending() -> Self {
        Self::new(StatusType::Pending, "")
    }

    pub fn kind(&self) -> StatusType {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_kind(&mut self, kind: StatusType) {
        self.kind = kind;
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusType::Error
    }

    /// The most severe of the given statuses. Ties keep the first one.
    pub fn worst_of<'a>(statuses: impl IntoIterator<Item = &'a PipelineStatus>) -> PipelineStatus {
        let mut worst: Option<&PipelineStatus> = None;
        for status in statuses {
            if worst.map_or(true, |w| status.kind > w.kind) {
                worst = Some(status);
            }
        }
        worst.cloned().unwrap_or_default()
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{:?}: {}", self.kind, self.text)
        }
    }
}
