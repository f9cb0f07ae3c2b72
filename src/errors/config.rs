// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Errors that can occur during pipeline configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The upstream links of the configured stages form a loop
    CyclicUpstream {
        /// The stage ids along the loop, first id repeated at the end
        cycle: Vec<String>,
    },
    /// A stage names an upstream stage that doesn't exist
    UnresolvedUpstream {
        /// The stage that has the unresolved upstream reference
        stage_id: String,
        /// The upstream id that couldn't be resolved
        missing_upstream: String,
    },
    /// Two stages (or a stage and the source) share an id
    DuplicateStageId {
        /// The duplicate stage id
        stage_id: String,
    },
    /// A stage names a kind no factory knows how to build
    UnknownStageKind {
        stage_id: String,
        kind: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicUpstream { cycle } => {
                write!(f, "Cyclic upstream chain detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedUpstream {
                stage_id,
                missing_upstream,
            } => {
                write!(
                    f,
                    "Stage '{}' reads from '{}' which does not exist",
                    stage_id, missing_upstream
                )
            }
            ValidationError::DuplicateStageId { stage_id } => {
                write!(f, "Duplicate stage ID: '{}'", stage_id)
            }
            ValidationError::UnknownStageKind { stage_id, kind } => {
                write!(f, "Stage '{}' has unknown kind '{}'", stage_id, kind)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while reading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration validation failed:\n{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    Invalid(Vec<ValidationError>),
}
