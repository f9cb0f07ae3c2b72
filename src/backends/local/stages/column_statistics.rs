// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::cache::{RevisionCache, RevisionKey};
use crate::data::{FlowState, PipelineStatus, Table};
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::traits::{StageParams, Transform};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Summary {
    sum: f64,
    mean: f64,
    min: f64,
    max: f64,
}

impl Summary {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            sum,
            mean: sum / values.len() as f64,
            min,
            max,
        })
    }
}

/// Column Statistics stage - attaches `<column>.sum`, `.mean`, `.min` and
/// `.max` attributes to the container
///
/// Summaries are memoized per table revision, so re-evaluating an unchanged
/// table (for example after a downstream parameter change) skips the scan.
pub struct ColumnStatisticsTransform {
    summaries: Mutex<RevisionCache<Option<Summary>>>,
    scans: AtomicUsize,
}

impl ColumnStatisticsTransform {
    pub fn new(capacity: usize) -> Self {
        Self {
            summaries: Mutex::new(RevisionCache::new(capacity)),
            scans: AtomicUsize::new(0),
        }
    }

    /// Number of column scans performed, memoized lookups excluded.
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn memoized(&self) -> usize {
        self.summaries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Transform for ColumnStatisticsTransform {
    fn name(&self) -> &'static str {
        "column_statistics"
    }

    async fn apply(&self, request: &StageRequest, mut input: FlowState) -> Result<FlowState, ComputeError> {
        let column = request.params.require_str("column")?;
        let table_ref = input
            .find_object_ref::<Table>()
            .ok_or(ComputeError::MissingObject("Table"))?;
        let key = RevisionKey::for_object(table_ref.as_ref(), format!("{}:{}", self.name(), column));
        let table = input.expect_object::<Table>()?;

        let summary = self
            .summaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(key, || {
                let values = table
                    .column(column)
                    .ok_or_else(|| ComputeError::InvalidInput(format!("table has no column '{}'", column)))?;
                self.scans.fetch_add(1, Ordering::Relaxed);
                Ok::<_, ComputeError>(Summary::of(values))
            })?;

        match summary {
            Some(summary) => {
                input.set_attribute(format!("{}.sum", column), summary.sum);
                input.set_attribute(format!("{}.mean", column), summary.mean);
                input.set_attribute(format!("{}.min", column), summary.min);
                input.set_attribute(format!("{}.max", column), summary.max);
                Ok(input)
            }
            None => Ok(input.with_status(PipelineStatus::warning(format!("Column '{}' is empty.", column)))),
        }
    }

    fn check_params(&self, params: &StageParams) -> Result<(), ComputeError> {
        params.require_str("column")?;
        Ok(())
    }

    fn sweep_caches(&self) {
        self.summaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain_accessed();
    }
}
