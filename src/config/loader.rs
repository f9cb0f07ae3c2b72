// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::consts::{DEFAULT_CACHE_ENTRIES, DEFAULT_REVISION_CACHE_CAPACITY};
use crate::engine::EvalSettings;
use crate::errors::ConfigError;
use crate::traits::StageParams;

/// Main configuration structure for a pipeline.
///
/// Describes the data source, the chain of stages reading from it, and the
/// options of the caches and the worker pool. It is typically loaded from a
/// YAML file; files ending in `.toml` are read as TOML.
///
/// # Fields
/// * `cache` - Capacities of the per-stage result caches and revision caches
/// * `executor_options` - Worker pool options (optional)
/// * `settings` - Animation and error-handling settings (optional)
/// * `source` - The data source at the root of the chain
/// * `stages` - Modifier stages, in insertion order
///
/// # Example
/// ```yaml
/// cache:
///   max_entries: 8
/// executor_options:
///   max_concurrency: 4
/// settings:
///   frames_per_second: 10
/// source:
///   id: source
///   kind: synthetic_table
///   params: { rows: 100, frames: 10 }
/// stages:
///   - id: scale
///     kind: scale_column
///     params: { column: x, factor: 2.0 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheOptions,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub settings: EvalSettings,
    pub source: StageConfig,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

impl Config {
    /// Id of the stage that `stages[index]` reads from.
    ///
    /// Defaults to the previously listed stage, or the source for the first.
    pub fn upstream_of(&self, index: usize) -> &str {
        match self.stages.get(index).and_then(|s| s.upstream.as_deref()) {
            Some(upstream) => upstream,
            None if index == 0 => &self.source.id,
            None => match self.stages.get(index - 1) {
                Some(previous) => &previous.id,
                None => &self.source.id,
            },
        }
    }

    /// Id of the stage whose output the pipeline shows by default.
    pub fn head_id(&self) -> &str {
        self.stages.last().map_or(&self.source.id, |s| &s.id)
    }
}

/// Cache capacity options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheOptions {
    pub max_entries: Option<usize>,
    pub revision_cache_capacity: Option<usize>,
}

impl CacheOptions {
    pub fn max_entries(&self) -> usize {
        self.max_entries.unwrap_or(DEFAULT_CACHE_ENTRIES)
    }

    pub fn revision_cache_capacity(&self) -> usize {
        self.revision_cache_capacity
            .unwrap_or(DEFAULT_REVISION_CACHE_CAPACITY)
    }
}

/// Worker pool options.
///
/// # Fields
/// * `max_concurrency` - Maximum number of heavy stage computations running
///   at once (optional, defaults to the number of CPUs)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
}

/// Configuration for a single stage.
///
/// # Fields
/// * `id` - Unique identifier for this stage
/// * `kind` - Name of the built-in stage kind
/// * `title` - Display title used in status messages (defaults to the id)
/// * `upstream` - Id of the stage this one reads from (see [`Config::upstream_of`])
/// * `enabled` - Disabled stages pass their input through (defaults to true)
/// * `params` - Kind-specific parameters
///
/// # Example
/// ```yaml
/// id: "offset"
/// kind: offset_column
/// upstream: scale
/// params: { column: y, rate: 0.5 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub upstream: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub params: HashMap<String, serde_yaml::Value>,
}

fn default_enabled() -> bool {
    true
}

impl StageConfig {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    pub fn stage_params(&self) -> StageParams {
        StageParams::from(self.params.clone())
    }
}

/// Load a config from a YAML or TOML file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

/// Load and validate a config file.
///
/// Validation checks stage id uniqueness, upstream references, upstream
/// cycles and stage kinds.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_pipeline_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
