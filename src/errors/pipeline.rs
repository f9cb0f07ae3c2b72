// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by topology and persistence operations on a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown stage '{0}'")]
    UnknownStage(String),

    #[error("Stage '{0}' already exists")]
    DuplicateStage(String),

    #[error("Connecting '{stage_id}' to '{upstream}' would create an upstream cycle")]
    UpstreamCycle { stage_id: String, upstream: String },

    #[error("The data source '{0}' cannot be removed")]
    SourceNotRemovable(String),

    #[error("Stage '{0}' is a data source and cannot take an upstream stage")]
    SourceHasNoUpstream(String),

    #[error("Stage '{0}' is not a data source")]
    NotASource(String),

    #[error(transparent)]
    Factory(#[from] StageFactoryError),

    #[error(transparent)]
    Config(#[from] crate::errors::ConfigError),

    #[error("Export of time {time} failed: {source}")]
    Export {
        time: crate::time::TimePoint,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Canceled(#[from] crate::errors::Canceled),

    #[error("Failed to persist stage '{stage_id}': {source}")]
    Persistence {
        stage_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors for stage creation from configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageFactoryError {
    #[error("Unknown stage kind: '{0}'")]
    UnknownKind(String),

    #[error("Stage kind '{kind}' cannot be used as a {role}")]
    WrongRole { kind: String, role: &'static str },

    #[error("Stage '{stage_id}' has invalid parameters: {reason}")]
    InvalidParameters { stage_id: String, reason: String },
}
