// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Explicit evaluation context.
//!
//! Everything an evaluation needs beyond its input (settings, the worker
//! pool, the mutation recorder) travels in an [`EvalContext`] passed to
//! every `evaluate` call.

use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::consts::{DEFAULT_FRAMES_PER_SECOND, TICKS_PER_SECOND};
use crate::engine::WorkerPool;
use crate::errors::ComputeError;
use crate::recorder::{MutationRecorder, NullRecorder, SuspendGuard};
use crate::time::{TimeInterval, TimePoint};
use crate::traits::StageParams;

/// Animation and error-handling settings.
///
/// # Example
/// ```yaml
/// settings:
///   frames_per_second: 10
///   break_on_error: false
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvalSettings {
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,
    #[serde(default)]
    pub break_on_error: bool,
}

fn default_frames_per_second() -> u32 {
    DEFAULT_FRAMES_PER_SECOND
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
            break_on_error: false,
        }
    }
}

impl EvalSettings {
    pub fn ticks_per_frame(&self) -> TimePoint {
        (TICKS_PER_SECOND / self.frames_per_second.max(1) as TimePoint).max(1)
    }

    /// Animation frame shown at `time`.
    pub fn frame_at(&self, time: TimePoint) -> TimePoint {
        time.div_euclid(self.ticks_per_frame())
    }

    /// First time point of `frame`.
    pub fn frame_time(&self, frame: TimePoint) -> TimePoint {
        frame.saturating_mul(self.ticks_per_frame())
    }

    /// All time points showing `frame`.
    pub fn frame_interval(&self, frame: TimePoint) -> TimeInterval {
        let start = self.frame_time(frame);
        TimeInterval::new(start, start.saturating_add(self.ticks_per_frame() - 1))
    }
}

#[derive(Clone)]
pub struct EvalContext {
    settings: EvalSettings,
    pool: WorkerPool,
    recorder: Arc<dyn MutationRecorder>,
}

impl EvalContext {
    pub fn new(settings: EvalSettings, pool: WorkerPool, recorder: Arc<dyn MutationRecorder>) -> Self {
        Self {
            settings,
            pool,
            recorder,
        }
    }

    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn recorder(&self) -> &dyn MutationRecorder {
        self.recorder.as_ref()
    }

    /// Suspends undo recording until the guard is dropped.
    pub fn suspend_recording(&self) -> SuspendGuard<'_> {
        SuspendGuard::new(self.recorder.as_ref())
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(
            EvalSettings::default(),
            WorkerPool::default(),
            Arc::new(NullRecorder::default()),
        )
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("settings", &self.settings)
            .field("max_concurrency", &self.pool.max_concurrency())
            .finish()
    }
}

/// What a consumer asks a stage for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub time: TimePoint,
    /// Skip every stage after the first one reporting an error.
    pub break_on_error: bool,
}

impl EvaluationRequest {
    pub fn new(time: TimePoint) -> Self {
        Self {
            time,
            break_on_error: false,
        }
    }

    pub fn with_break_on_error(mut self, break_on_error: bool) -> Self {
        self.break_on_error = break_on_error;
        self
    }
}

/// Everything a transform or data source sees of one evaluation.
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub stage_id: String,
    pub title: String,
    pub params: StageParams,
    pub time: TimePoint,
    pub context: EvalContext,
    pub cancel: CancellationToken,
}

impl StageRequest {
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns [`ComputeError::Canceled`] once nobody waits for the result.
    pub fn check_canceled(&self) -> Result<(), ComputeError> {
        if self.is_canceled() {
            Err(ComputeError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Runs `work` on the context's worker pool.
    pub async fn run_blocking<F, R>(&self, work: F) -> Result<R, ComputeError>
    where
        F: FnOnce(CancellationToken) -> Result<R, ComputeError> + Send + 'static,
        R: Send + 'static,
    {
        self.context.pool().run(&self.cancel, work).await
    }

    /// Animation frame shown at the requested time.
    pub fn frame(&self) -> TimePoint {
        self.context.settings().frame_at(self.time)
    }
}
