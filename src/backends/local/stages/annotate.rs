// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::data::{DataObject, FlowState, Label, Table};
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::traits::{StageParams, Transform};

/// Annotate stage - attaches a [`Label`] with `text` to the table
///
/// Labels are decorations, so the table's revision (and anything memoized
/// on it downstream) is unaffected.
pub struct AnnotateTransform;

impl AnnotateTransform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnnotateTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for AnnotateTransform {
    fn name(&self) -> &'static str {
        "annotate"
    }

    async fn apply(&self, request: &StageRequest, mut input: FlowState) -> Result<FlowState, ComputeError> {
        let text = request.params.require_str("text")?;
        let table = input
            .make_mutable_as::<Table>()?
            .ok_or(ComputeError::MissingObject("Table"))?;
        let mut label = Label::new(format!("{}.label", request.stage_id), text);
        label.meta_mut().set_data_source(request.stage_id.as_str());
        table.add_annotation(Arc::new(label));
        Ok(input)
    }

    fn check_params(&self, params: &StageParams) -> Result<(), ComputeError> {
        params.require_str("text")?;
        Ok(())
    }
}
