// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::io::{self, Read, Write};

use crate::data::FlowState;
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::time::{TimeInterval, TimePoint};
use crate::traits::StageParams;

/// The transformation performed by a modifier stage.
///
/// Implementations are stateless with respect to the pipeline: parameters
/// live in the stage and arrive with every [`StageRequest`]. A transform may
/// keep its own memoization (see [`Transform::sweep_caches`]).
#[async_trait]
pub trait Transform: Send + Sync {
    /// Kind name, as used in configuration files.
    fn name(&self) -> &'static str;

    /// Produces the stage output from its input.
    ///
    /// Objects in `input` may be shared with upstream caches; modify content
    /// only through [`FlowState::make_mutable`]. Long-running work should go
    /// through [`StageRequest::run_blocking`] and poll the request's
    /// cancellation token.
    async fn apply(&self, request: &StageRequest, input: FlowState) -> Result<FlowState, ComputeError>;

    /// Interval around `time` over which this stage's output stays the same
    /// for unchanged input.
    fn validity(&self, _params: &StageParams, _time: TimePoint) -> TimeInterval {
        TimeInterval::infinite()
    }

    /// Cheap synchronous approximation used for immediate display. The
    /// default hands the input through.
    fn apply_preliminary(
        &self,
        _params: &StageParams,
        input: FlowState,
        _time: TimePoint,
    ) -> Result<FlowState, ComputeError> {
        Ok(input)
    }

    /// Stages returning true still run when their input carries an error status.
    fn operates_on_errors(&self) -> bool {
        false
    }

    /// Adjusts the number of animation frames reported by the upstream stage.
    fn number_of_source_frames(&self, _params: &StageParams, upstream_frames: usize) -> usize {
        upstream_frames
    }

    /// Checks a parameter set at creation time.
    fn check_params(&self, _params: &StageParams) -> Result<(), ComputeError> {
        Ok(())
    }

    /// Called after each full pipeline evaluation to drop memoized artifacts
    /// that were not used since the previous call.
    fn sweep_caches(&self) {}

    fn save_params(&self, params: &StageParams, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(writer, params).map_err(io::Error::from)
    }

    fn load_params(&self, reader: &mut dyn Read) -> io::Result<StageParams> {
        serde_json::from_reader(reader).map_err(io::Error::from)
    }
}
