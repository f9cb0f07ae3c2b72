// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised inside a stage's own transformation logic.
//!
//! A [`ComputeError`] never leaves the stage boundary as an error value: the
//! stage converts it into a container carrying an error status. See
//! `engine::stage` for where that conversion happens.

use std::collections::TryReserveError;
use thiserror::Error;

use crate::errors::ConsistencyError;

/// Fixed message reported when a stage runs out of memory.
pub const OUT_OF_MEMORY_MESSAGE: &str = "Not enough memory.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// Generic failure reported by a stage.
    #[error("{0}")]
    Failed(String),

    /// The stage's input did not have the expected shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required data object is missing from the input container.
    #[error("The input does not contain a {0}")]
    MissingObject(&'static str),

    /// Allocation failure during the computation.
    #[error("Not enough memory.")]
    OutOfMemory,

    /// Copy-on-write bookkeeping failed. Already reported as a violation.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// The computation noticed that nobody is interested in its result anymore.
    #[error("Computation was canceled")]
    Canceled,
}

impl From<TryReserveError> for ComputeError {
    fn from(_: TryReserveError) -> Self {
        ComputeError::OutOfMemory
    }
}

/// Outcome of an evaluation whose last interested caller went away.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("evaluation was canceled")]
pub struct Canceled;
