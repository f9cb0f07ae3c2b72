// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::data::{FlowState, Table};
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::time::{time_to_seconds, TimeInterval, TimePoint};
use crate::traits::{StageParams, Transform};

/// Offset Column stage - shifts `column` by `rate * seconds` of animation time
///
/// The output depends on the exact time, so it is only valid for the instant
/// it was computed for.
pub struct OffsetColumnTransform;

impl OffsetColumnTransform {
    pub fn new() -> Self {
        Self
    }

    fn offset(params: &StageParams, mut input: FlowState, time: TimePoint) -> Result<FlowState, ComputeError> {
        let column = params.require_str("column")?;
        let shift = params.require_f64("rate")? * time_to_seconds(time);
        let table = input
            .make_mutable_as::<Table>()?
            .ok_or(ComputeError::MissingObject("Table"))?;
        let values = table
            .column_mut(column)
            .ok_or_else(|| ComputeError::InvalidInput(format!("table has no column '{}'", column)))?;
        values.iter_mut().for_each(|v| *v += shift);
        Ok(input)
    }
}

impl Default for OffsetColumnTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for OffsetColumnTransform {
    fn name(&self) -> &'static str {
        "offset_column"
    }

    async fn apply(&self, request: &StageRequest, input: FlowState) -> Result<FlowState, ComputeError> {
        Self::offset(&request.params, input, request.time)
    }

    fn validity(&self, _params: &StageParams, time: TimePoint) -> TimeInterval {
        TimeInterval::instant(time)
    }

    fn apply_preliminary(
        &self,
        params: &StageParams,
        input: FlowState,
        time: TimePoint,
    ) -> Result<FlowState, ComputeError> {
        Self::offset(params, input, time)
    }

    fn check_params(&self, params: &StageParams) -> Result<(), ComputeError> {
        params.require_str("column")?;
        params.require_f64("rate")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::local::stages::{table_state, test_request};
    use crate::config::consts::TICKS_PER_SECOND;

    #[tokio::test]
    async fn test_offset_grows_with_time() {
        let params = StageParams::new().with("column", "x").with("rate", 2.0);
        let output = OffsetColumnTransform::new()
            .apply(&test_request(params, TICKS_PER_SECOND * 3), table_state(vec![0.0, 1.0]))
            .await
            .unwrap();
        assert_eq!(output.expect_object::<Table>().unwrap().column("x"), Some(&[6.0, 7.0][..]));
    }

    #[test]
    fn test_validity_is_an_instant() {
        let validity = OffsetColumnTransform::new().validity(&StageParams::new(), 123);
        assert_eq!(validity, TimeInterval::instant(123));
        assert!(!validity.contains(124));
    }

    #[test]
    fn test_check_params_requires_rate() {
        let params = StageParams::new().with("column", "x");
        assert!(OffsetColumnTransform::new().check_params(&params).is_err());
    }
}
