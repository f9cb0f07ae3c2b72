// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::stages::*;
use crate::config::consts::DEFAULT_REVISION_CACHE_CAPACITY;
use crate::config::StageConfig;
use crate::engine::{Stage, StageKind};
use crate::errors::StageFactoryError;
use crate::traits::{DataSource, Transform};

const SOURCE_KINDS: &[&str] = &["synthetic_table"];
const TRANSFORM_KINDS: &[&str] = &["scale_column", "offset_column", "column_statistics", "annotate"];

/// Factory for creating built-in (in-process) stages
///
/// The `kind` field of a stage config selects the implementation:
/// - "synthetic_table" -> SyntheticTableSource (data source only)
/// - "scale_column" -> ScaleColumnTransform
/// - "offset_column" -> OffsetColumnTransform
/// - "column_statistics" -> ColumnStatisticsTransform (memoizes per table revision)
/// - "annotate" -> AnnotateTransform
///
/// Parameters are checked when the stage is created, so a bad parameter set
/// is reported against the configuration rather than at evaluation time.
#[derive(Debug, Clone)]
pub struct LocalStageFactory {
    revision_cache_capacity: usize,
}

impl Default for LocalStageFactory {
    fn default() -> Self {
        Self::new(DEFAULT_REVISION_CACHE_CAPACITY)
    }
}

impl LocalStageFactory {
    pub fn new(revision_cache_capacity: usize) -> Self {
        Self {
            revision_cache_capacity,
        }
    }

    /// Create a data source from configuration
    pub fn create_source(&self, config: &StageConfig) -> Result<Arc<dyn DataSource>, StageFactoryError> {
        let source: Arc<dyn DataSource> = match config.kind.as_str() {
            "synthetic_table" => Arc::new(SyntheticTableSource::new()),
            kind if Self::is_transform_kind(kind) => {
                return Err(StageFactoryError::WrongRole {
                    kind: kind.to_string(),
                    role: "data source",
                })
            }
            kind => return Err(StageFactoryError::UnknownKind(kind.to_string())),
        };
        source
            .check_params(&config.stage_params())
            .map_err(|e| StageFactoryError::InvalidParameters {
                stage_id: config.id.clone(),
                reason: e.to_string(),
            })?;
        Ok(source)
    }

    /// Create a transform from configuration
    pub fn create_transform(&self, config: &StageConfig) -> Result<Arc<dyn Transform>, StageFactoryError> {
        let transform: Arc<dyn Transform> = match config.kind.as_str() {
            "scale_column" => Arc::new(ScaleColumnTransform::new()),
            "offset_column" => Arc::new(OffsetColumnTransform::new()),
            "column_statistics" => Arc::new(ColumnStatisticsTransform::new(self.revision_cache_capacity)),
            "annotate" => Arc::new(AnnotateTransform::new()),
            kind if Self::is_source_kind(kind) => {
                return Err(StageFactoryError::WrongRole {
                    kind: kind.to_string(),
                    role: "modifier",
                })
            }
            kind => return Err(StageFactoryError::UnknownKind(kind.to_string())),
        };
        transform
            .check_params(&config.stage_params())
            .map_err(|e| StageFactoryError::InvalidParameters {
                stage_id: config.id.clone(),
                reason: e.to_string(),
            })?;
        Ok(transform)
    }

    /// Create the data source stage at the root of a pipeline
    pub fn create_source_stage(
        &self,
        config: &StageConfig,
        cache_capacity: usize,
    ) -> Result<Arc<Stage>, StageFactoryError> {
        let source = self.create_source(config)?;
        Ok(Stage::with_title(
            config.id.clone(),
            config.title(),
            StageKind::Source(source),
            config.stage_params(),
            cache_capacity,
        ))
    }

    /// Create a modifier stage. The stage is not connected to anything yet.
    pub fn create_modifier_stage(
        &self,
        config: &StageConfig,
        cache_capacity: usize,
    ) -> Result<Arc<Stage>, StageFactoryError> {
        let transform = self.create_transform(config)?;
        let stage = Stage::with_title(
            config.id.clone(),
            config.title(),
            StageKind::Modifier(transform),
            config.stage_params(),
            cache_capacity,
        );
        Ok(stage)
    }

    /// List all available built-in stage kinds
    pub fn list_available_kinds() -> Vec<&'static str> {
        SOURCE_KINDS.iter().chain(TRANSFORM_KINDS).copied().collect()
    }

    pub fn is_source_kind(kind: &str) -> bool {
        SOURCE_KINDS.contains(&kind)
    }

    pub fn is_transform_kind(kind: &str) -> bool {
        TRANSFORM_KINDS.contains(&kind)
    }

    /// Check if a kind is available in any role
    pub fn is_kind_available(kind: &str) -> bool {
        Self::is_source_kind(kind) || Self::is_transform_kind(kind)
    }
}
