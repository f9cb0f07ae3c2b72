// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::data::{FlowState, Table};
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::traits::{DataSource, StageParams};

const DEFAULT_ROWS: u64 = 100;
const DEFAULT_FRAMES: u64 = 1;

/// Synthetic table source - generates one table per animation frame
///
/// Columns:
/// - `x`: the row index shifted by the frame number
/// - `y`: a sine wave whose phase advances with the frame
///
/// Parameters: `rows` (default 100), `frames` (default 1). Frames past the
/// last one repeat the last frame. The result is valid for the whole time
/// span of the frame.
pub struct SyntheticTableSource;

impl SyntheticTableSource {
    pub fn new() -> Self {
        Self
    }

    fn rows(params: &StageParams) -> u64 {
        params.get_u64("rows").unwrap_or(DEFAULT_ROWS)
    }

    fn frames(params: &StageParams) -> u64 {
        params.get_u64("frames").unwrap_or(DEFAULT_FRAMES).max(1)
    }
}

impl Default for SyntheticTableSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataSource for SyntheticTableSource {
    fn name(&self) -> &'static str {
        "synthetic_table"
    }

    async fn load_frame(&self, request: &StageRequest) -> Result<FlowState, ComputeError> {
        let settings = request.context.settings();
        let last_frame = Self::frames(&request.params) as i64 - 1;
        let frame = (request.frame() as i64).clamp(0, last_frame);
        let rows = usize::try_from(Self::rows(&request.params)).map_err(|_| ComputeError::OutOfMemory)?;

        let mut x = Vec::new();
        let mut y = Vec::new();
        x.try_reserve_exact(rows)?;
        y.try_reserve_exact(rows)?;
        for row in 0..rows {
            let row = row as f64;
            x.push(row + frame as f64);
            y.push((row * 0.1 + frame as f64 * 0.5).sin());
        }
        request.check_canceled()?;

        // Times before the first or after the last frame show a clamped frame,
        // so the validity covers the requested frame only.
        let mut state = FlowState::new(settings.frame_interval(request.frame()));
        state.add_object(Arc::new(
            Table::new("table").with_column("x", x).with_column("y", y),
        ))?;
        Ok(state)
    }

    fn number_of_frames(&self, params: &StageParams) -> usize {
        Self::frames(params) as usize
    }

    fn check_params(&self, params: &StageParams) -> Result<(), ComputeError> {
        for key in ["rows", "frames"] {
            if params.get(key).is_some() && params.get_u64(key).is_none() {
                return Err(ComputeError::InvalidInput(format!(
                    "parameter '{}' must be a non-negative integer",
                    key
                )));
            }
        }
        Ok(())
    }
}
