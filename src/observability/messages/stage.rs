// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for per-stage events.
//!
//! This module contains message types for logging events related to:
//! * Compute failures and panics inside a stage's transformation
//! * Pending and status transitions observed by the UI side
//! * Invalidation and pass-through decisions

use crate::data::PipelineStatus;
use crate::observability::messages::StructuredLog;
use crate::time::{TimeInterval, TimePoint};
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A stage's transformation reported an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_flowstate::observability::messages::stage::StageComputeFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "column 'z' not found");
/// let msg = StageComputeFailed {
///     stage_id: "scale",
///     time: 0,
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct StageComputeFailed<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
    pub error: &'a dyn std::error::Error,
}

impl Display for StageComputeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' failed at time {}: {}",
            self.stage_id, self.time, self.error
        )
    }
}

impl StructuredLog for StageComputeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            stage_id = self.stage_id,
            time = self.time,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "stage_failed",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
            error = %self.error,
        )
    }
}

/// A stage's transformation panicked.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StagePanicked<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
}

impl Display for StagePanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' panicked while evaluating time {}",
            self.stage_id, self.time
        )
    }
}

impl StructuredLog for StagePanicked<'_> {
    fn log(&self) {
        tracing::error!(
            stage_id = self.stage_id,
            time = self.time,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "stage_panicked",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
        )
    }
}

/// Number of outstanding asynchronous computations of a stage changed.
///
/// # Log Level
/// `debug!` - Routine event
pub struct StagePending<'a> {
    pub stage_id: &'a str,
    pub in_progress: usize,
}

impl Display for StagePending<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.in_progress > 0 {
            write!(
                f,
                "Stage '{}' is pending with {} computation(s) in progress",
                self.stage_id, self.in_progress
            )
        } else {
            write!(f, "Stage '{}' is no longer pending", self.stage_id)
        }
    }
}

impl StructuredLog for StagePending<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            in_progress = self.in_progress,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_pending",
            span_name = name,
            stage_id = self.stage_id,
            in_progress = self.in_progress,
        )
    }
}

/// The status shown for a stage changed.
pub struct StageStatusChanged<'a> {
    pub stage_id: &'a str,
    pub status: &'a PipelineStatus,
}

impl Display for StageStatusChanged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' status: {}", self.stage_id, self.status)
    }
}

impl StructuredLog for StageStatusChanged<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            status = ?self.status.kind(),
            text = self.status.text(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_status",
            span_name = name,
            stage_id = self.stage_id,
            status = ?self.status.kind(),
        )
    }
}

/// A stage's cached results were invalidated.
///
/// # Log Level
/// `debug!` - Routine event
pub struct StageInvalidated<'a> {
    pub stage_id: &'a str,
    pub keep: TimeInterval,
}

impl Display for StageInvalidated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.keep.is_empty() {
            write!(f, "Invalidated all results of stage '{}'", self.stage_id)
        } else {
            write!(
                f,
                "Invalidated results of stage '{}' outside {}",
                self.stage_id, self.keep
            )
        }
    }
}

impl StructuredLog for StageInvalidated<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            keep = %self.keep,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_invalidated",
            span_name = name,
            stage_id = self.stage_id,
            keep = %self.keep,
        )
    }
}

/// A stage handed its input through without running its transformation.
pub struct StagePassThrough<'a> {
    pub stage_id: &'a str,
    pub reason: &'a str,
}

impl Display for StagePassThrough<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' passed its input through: {}",
            self.stage_id, self.reason
        )
    }
}

impl StructuredLog for StagePassThrough<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_pass_through",
            span_name = name,
            stage_id = self.stage_id,
            reason = self.reason,
        )
    }
}
