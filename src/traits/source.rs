// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::io::{self, Read, Write};

use crate::data::FlowState;
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::traits::StageParams;

/// Supplies the root container that the first stage of a chain consumes.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Kind name, as used in configuration files.
    fn name(&self) -> &'static str;

    /// Loads the data for the animation frame at `request.time`. The returned
    /// validity must contain the requested time.
    async fn load_frame(&self, request: &StageRequest) -> Result<FlowState, ComputeError>;

    fn number_of_frames(&self, params: &StageParams) -> usize;

    fn check_params(&self, _params: &StageParams) -> Result<(), ComputeError> {
        Ok(())
    }

    fn save_params(&self, params: &StageParams, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(writer, params).map_err(io::Error::from)
    }

    fn load_params(&self, reader: &mut dyn Read) -> io::Result<StageParams> {
        serde_json::from_reader(reader).map_err(io::Error::from)
    }
}
