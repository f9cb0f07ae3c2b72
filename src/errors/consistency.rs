// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Broken invariants inside the pipeline core.
//!
//! These are programming errors. Debug builds abort on them; release builds
//! log the violation and the caller fails closed (drops the affected cache
//! entry or clone and recomputes) instead of returning possibly wrong data.

use thiserror::Error;

use crate::data::ObjectId;
use crate::observability::messages::engine::ConsistencyViolation;
use crate::observability::messages::StructuredLog;
use crate::time::{TimeInterval, TimePoint};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("clone of data object {object} has type '{actual}', expected '{expected}'")]
    CloneTypeMismatch {
        object: ObjectId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("clone of data object {0} reused the identity of its original")]
    CloneIdentityReused(ObjectId),

    #[error("data object {0} is already part of the container")]
    DuplicateObject(ObjectId),

    #[error("data object {0} is not part of the container")]
    ObjectNotFound(ObjectId),

    #[error("cache entry for time {time} claims validity {interval} which does not contain the requested time")]
    IntervalWidening { time: TimePoint, interval: TimeInterval },

    #[error("node destroyed while {0} dependent(s) are still registered")]
    DroppedWithDependents(usize),
}

/// Reports a consistency violation.
///
/// Panics in debug builds. In release builds the violation is logged and the
/// error handed back so the caller can fail closed.
pub fn report_violation(error: ConsistencyError) -> ConsistencyError {
    ConsistencyViolation { error: &error }.log();
    debug_assert!(false, "consistency violation: {}", error);
    error
}
