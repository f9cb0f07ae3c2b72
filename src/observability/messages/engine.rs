// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline topology and evaluation lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Evaluation lifecycle (start, join, completion, cancellation)
//! * Pipeline topology changes and persistence
//! * Worker pool setup
//! * Consistency violations inside the core

use crate::data::{PipelineStatus, StatusType};
use crate::errors::ConsistencyError;
use crate::observability::messages::StructuredLog;
use crate::time::TimePoint;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// An invariant of the pipeline core was broken.
///
/// # Log Level
/// `error!` - Programming error; the caller fails closed
pub struct ConsistencyViolation<'a> {
    pub error: &'a ConsistencyError,
}

impl Display for ConsistencyViolation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pipeline consistency violation: {}", self.error)
    }
}

impl StructuredLog for ConsistencyViolation<'_> {
    fn log(&self) {
        tracing::error!(
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "consistency_violation",
            span_name = name,
            error = %self.error,
        )
    }
}

/// A stage started a fresh evaluation for a time point.
///
/// # Log Level
/// `debug!` - Emitted for every cache miss
///
/// # Example
/// ```
/// use the_flowstate::observability::messages::engine::EvaluationStarted;
///
/// let msg = EvaluationStarted {
///     stage_id: "scale",
///     time: 4800,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct EvaluationStarted<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
}

impl Display for EvaluationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Evaluating stage '{}' at time {}", self.stage_id, self.time)
    }
}

impl StructuredLog for EvaluationStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            time = self.time,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "evaluation",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
        )
    }
}

/// A request attached to an evaluation that was already in flight.
///
/// # Log Level
/// `debug!` - Routine event
pub struct EvaluationJoined<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
    pub interested: usize,
}

impl Display for EvaluationJoined<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Joined in-flight evaluation of stage '{}' at time {} ({} interested)",
            self.stage_id, self.time, self.interested
        )
    }
}

impl StructuredLog for EvaluationJoined<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            time = self.time,
            interested = self.interested,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "evaluation_joined",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
            interested = self.interested,
        )
    }
}

/// Running evaluations of a stage were detached by an invalidation.
///
/// # Log Level
/// `debug!` - Routine event
pub struct EvaluationsDetached<'a> {
    pub stage_id: &'a str,
    pub detached: usize,
}

impl Display for EvaluationsDetached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Detached {} running evaluation(s) of stage '{}' after invalidation",
            self.detached, self.stage_id
        )
    }
}

impl StructuredLog for EvaluationsDetached<'_> {
    fn log(&self) {
        tracing::debug!(stage_id = self.stage_id, detached = self.detached, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "evaluations_detached",
            span_name = name,
            stage_id = self.stage_id,
            detached = self.detached,
        )
    }
}

/// A stage evaluation finished, successfully or with an error status.
///
/// # Log Level
/// `debug!` - Routine event
pub struct EvaluationCompleted<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
    pub status: StatusType,
    pub duration: Duration,
}

impl Display for EvaluationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' evaluated at time {} with status {:?} in {:?}",
            self.stage_id, self.time, self.status, self.duration
        )
    }
}

impl StructuredLog for EvaluationCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            time = self.time,
            status = ?self.status,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "evaluation_completed",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
            status = ?self.status,
            duration = ?self.duration,
        )
    }
}

/// The last interested caller went away and the evaluation was abandoned.
///
/// # Log Level
/// `debug!` - Cancellation is not an error
pub struct EvaluationCanceled<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
}

impl Display for EvaluationCanceled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evaluation of stage '{}' at time {} was abandoned",
            self.stage_id, self.time
        )
    }
}

impl StructuredLog for EvaluationCanceled<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            time = self.time,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "evaluation_canceled",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
        )
    }
}

/// A full pipeline evaluation requested by a consumer finished.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_flowstate::data::PipelineStatus;
/// use the_flowstate::observability::messages::engine::PipelineEvaluated;
/// use std::time::Duration;
///
/// let status = PipelineStatus::success();
/// let msg = PipelineEvaluated {
///     head_stage: "stats",
///     time: 0,
///     status: &status,
///     duration: Duration::from_millis(12),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineEvaluated<'a> {
    pub head_stage: &'a str,
    pub time: TimePoint,
    pub status: &'a PipelineStatus,
    pub duration: Duration,
}

impl Display for PipelineEvaluated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline ending at '{}' evaluated at time {} in {:?}: {}",
            self.head_stage, self.time, self.duration, self.status
        )
    }
}

impl StructuredLog for PipelineEvaluated<'_> {
    fn log(&self) {
        tracing::info!(
            head_stage = self.head_stage,
            time = self.time,
            status = ?self.status.kind(),
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_evaluated",
            span_name = name,
            head_stage = self.head_stage,
            time = self.time,
            status = ?self.status.kind(),
        )
    }
}

/// Worker pool created.
///
/// # Log Level
/// `info!` - Important operational event
pub struct WorkerPoolCreated {
    pub max_concurrency: usize,
}

impl Display for WorkerPoolCreated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created worker pool with max_concurrency={}",
            self.max_concurrency
        )
    }
}

impl StructuredLog for WorkerPoolCreated {
    fn log(&self) {
        tracing::info!(
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "worker_pool",
            span_name = name,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// A stage was added to the pipeline.
pub struct StageInserted<'a> {
    pub stage_id: &'a str,
    pub upstream: Option<&'a str>,
}

impl Display for StageInserted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.upstream {
            Some(upstream) => write!(
                f,
                "Inserted stage '{}' reading from '{}'",
                self.stage_id, upstream
            ),
            None => write!(f, "Inserted data source '{}'", self.stage_id),
        }
    }
}

impl StructuredLog for StageInserted<'_> {
    fn log(&self) {
        tracing::info!(
            stage_id = self.stage_id,
            upstream = self.upstream,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_inserted",
            span_name = name,
            stage_id = self.stage_id,
            upstream = self.upstream,
        )
    }
}

/// A stage was removed from the pipeline.
pub struct StageRemoved<'a> {
    pub stage_id: &'a str,
}

impl Display for StageRemoved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Removed stage '{}'", self.stage_id)
    }
}

impl StructuredLog for StageRemoved<'_> {
    fn log(&self) {
        tracing::info!(stage_id = self.stage_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("stage_removed", span_name = name, stage_id = self.stage_id)
    }
}

/// Stage parameter state was written to or read from a store.
pub struct PipelinePersisted<'a> {
    pub action: &'a str,
    pub stage_count: usize,
}

impl Display for PipelinePersisted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline state {} for {} stages",
            self.action, self.stage_count
        )
    }
}

impl StructuredLog for PipelinePersisted<'_> {
    fn log(&self) {
        tracing::info!(
            action = self.action,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_persisted",
            span_name = name,
            action = self.action,
            stage_count = self.stage_count,
        )
    }
}
