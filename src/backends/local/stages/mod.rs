// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in data source and transforms.

pub mod annotate;
pub mod column_statistics;
pub mod offset_column;
pub mod scale_column;
pub mod synthetic_table;

pub use annotate::AnnotateTransform;
pub use column_statistics::ColumnStatisticsTransform;
pub use offset_column::OffsetColumnTransform;
pub use scale_column::ScaleColumnTransform;
pub use synthetic_table::SyntheticTableSource;

#[cfg(test)]
pub(crate) fn test_request(params: crate::traits::StageParams, time: crate::time::TimePoint) -> crate::engine::StageRequest {
    crate::engine::StageRequest {
        stage_id: "test".to_string(),
        title: "test".to_string(),
        params,
        time,
        context: crate::engine::EvalContext::default(),
        cancel: tokio_util::sync::CancellationToken::new(),
    }
}

#[cfg(test)]
pub(crate) fn table_state(x: Vec<f64>) -> crate::data::FlowState {
    let mut state = crate::data::FlowState::new(crate::time::TimeInterval::infinite());
    state
        .add_object(std::sync::Arc::new(crate::data::Table::new("table").with_column("x", x)))
        .unwrap();
    state
}
