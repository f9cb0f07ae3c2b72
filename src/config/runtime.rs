// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::Arc;

use crate::backends::local::LocalStageFactory;
use crate::config::{validate_pipeline_config, Config};
use crate::engine::{EvalContext, Pipeline, WorkerPool};
use crate::errors::{ConfigError, PipelineError};
use crate::recorder::{MutationRecorder, NullRecorder};

/// Pipeline runtime builder - turns a configuration into a ready-to-evaluate [`Pipeline`].
///
/// The builder validates the configuration, creates the worker pool and the
/// evaluation context, builds every stage through the [`LocalStageFactory`]
/// and connects the stages along their upstream links. Building is internal
/// bookkeeping and is never recorded as user actions.
///
/// # Examples
///
/// ```
/// use the_flowstate::config::{Config, RuntimeBuilder};
///
/// let config: Config = serde_yaml::from_str(r#"
/// source: { id: source, kind: synthetic_table, params: { rows: 3 } }
/// stages:
///   - { id: scale, kind: scale_column, params: { column: x, factor: 2.0 } }
/// "#).unwrap();
///
/// let pipeline = RuntimeBuilder::from_config(&config).unwrap();
/// assert_eq!(pipeline.head_stage().id(), "scale");
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a pipeline whose user actions are discarded.
    pub fn from_config(cfg: &Config) -> Result<Pipeline, PipelineError> {
        Self::with_recorder(cfg, Arc::new(NullRecorder::default()))
    }

    /// Build a pipeline that reports user actions to `recorder`.
    pub fn with_recorder(cfg: &Config, recorder: Arc<dyn MutationRecorder>) -> Result<Pipeline, PipelineError> {
        validate_pipeline_config(cfg).map_err(ConfigError::Invalid)?;

        let pool = match cfg.executor_options.max_concurrency {
            Some(max_concurrency) => WorkerPool::new(max_concurrency),
            None => WorkerPool::with_default_concurrency(),
        };
        let context = EvalContext::new(cfg.settings.clone(), pool, recorder);
        let _bookkeeping = context.suspend_recording();

        let factory = LocalStageFactory::new(cfg.cache.revision_cache_capacity());
        let cache_capacity = cfg.cache.max_entries();

        let source = factory.create_source_stage(&cfg.source, cache_capacity)?;
        let mut pipeline = Pipeline::new(context.clone(), source)?;

        // Insert each stage once its upstream is in place. Validation has
        // ruled out cycles and dangling references, so every pass inserts
        // at least one stage.
        let mut inserted: HashSet<&str> = HashSet::from([cfg.source.id.as_str()]);
        while inserted.len() <= cfg.stages.len() {
            let before = inserted.len();
            for (index, stage_cfg) in cfg.stages.iter().enumerate() {
                let upstream = cfg.upstream_of(index);
                if inserted.contains(stage_cfg.id.as_str()) || !inserted.contains(upstream) {
                    continue;
                }
                let stage = factory.create_modifier_stage(stage_cfg, cache_capacity)?;
                pipeline.insert_stage(stage, Some(upstream))?;
                if !stage_cfg.enabled {
                    pipeline.set_enabled(&stage_cfg.id, false)?;
                }
                inserted.insert(stage_cfg.id.as_str());
            }
            if inserted.len() == before {
                break;
            }
        }

        pipeline.set_head(cfg.head_id())?;
        Ok(pipeline)
    }
}
