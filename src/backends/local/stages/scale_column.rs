// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::data::{FlowState, Table};
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::time::TimePoint;
use crate::traits::{StageParams, Transform};

/// Scale Column stage - multiplies every value of `column` by `factor`
pub struct ScaleColumnTransform;

impl ScaleColumnTransform {
    pub fn new() -> Self {
        Self
    }

    fn scale(params: &StageParams, mut input: FlowState) -> Result<FlowState, ComputeError> {
        let column = params.require_str("column")?;
        let factor = params.require_f64("factor")?;
        let table = input
            .make_mutable_as::<Table>()?
            .ok_or(ComputeError::MissingObject("Table"))?;
        let values = table
            .column_mut(column)
            .ok_or_else(|| ComputeError::InvalidInput(format!("table has no column '{}'", column)))?;
        values.iter_mut().for_each(|v| *v *= factor);
        Ok(input)
    }
}

impl Default for ScaleColumnTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for ScaleColumnTransform {
    fn name(&self) -> &'static str {
        "scale_column"
    }

    async fn apply(&self, request: &StageRequest, input: FlowState) -> Result<FlowState, ComputeError> {
        Self::scale(&request.params, input)
    }

    /// Scaling is cheap enough to run for the interactive preview.
    fn apply_preliminary(
        &self,
        params: &StageParams,
        input: FlowState,
        _time: TimePoint,
    ) -> Result<FlowState, ComputeError> {
        Self::scale(params, input)
    }

    fn check_params(&self, params: &StageParams) -> Result<(), ComputeError> {
        params.require_str("column")?;
        params.require_f64("factor")?;
        Ok(())
    }
}
