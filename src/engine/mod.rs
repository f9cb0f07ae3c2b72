// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline evaluation: stages, the pipeline graph, in-flight tracking and
//! the worker pool.

pub mod context;
pub mod executor;
pub mod inflight;
pub mod pipeline;
pub mod stage;
#[cfg(test)]
pub mod integration_tests;

pub use context::{EvalContext, EvalSettings, EvaluationRequest, StageRequest};
pub use executor::WorkerPool;
pub use inflight::{EvaluationHandle, InterestToken};
pub use pipeline::Pipeline;
pub use stage::{Stage, StageKind};
