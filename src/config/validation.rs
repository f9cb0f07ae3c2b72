// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for pipeline integrity.
//!
//! A configuration describes one data source and a list of stages, each of
//! which reads from exactly one upstream stage. Validation makes sure the
//! upstream links form a tree rooted at the source before any stage is built.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness Validation**: stage ids, the source id included, are unique
//! 2. **Kind Validation**: every kind is known to the local stage factory in
//!    the role it is configured for
//! 3. **Reference Validation**: every upstream id names a configured stage
//! 4. **Cycle Detection**: DFS over the upstream links
//!
//! Cycle detection only runs once references resolve, since it walks the
//! graph built from them.
//!
//! # Example
//! ```rust
//! use the_flowstate::config::{validate_pipeline_config, Config};
//!
//! let config: Config = serde_yaml::from_str(r#"
//! source: { id: source, kind: synthetic_table }
//! stages:
//!   - { id: scale, kind: scale_column, upstream: missing }
//! "#).unwrap();
//!
//! let errors = validate_pipeline_config(&config).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

use std::collections::{HashMap, HashSet};

use crate::backends::local::LocalStageFactory;
use crate::config::Config;
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    CyclicUpstreamDetected, DisabledStageConfigured, DuplicateStageId, UnknownStageKind,
    UnresolvedUpstream, ValidationCompleted, ValidationFailed, ValidationStarted,
};
use crate::observability::messages::StructuredLog;

/// Validates a pipeline configuration.
///
/// Errors are accumulated so that a user sees every problem at once. Disabled
/// stages are reported as warnings only.
///
/// # Returns
///
/// * `Ok(())` - The configuration can be built into a pipeline
/// * `Err(Vec<ValidationError>)` - Every validation error found
pub fn validate_pipeline_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let stage_count = config.stages.len() + 1;
    ValidationStarted { stage_count }.log();

    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_stage_ids(config) {
        errors.extend(duplicate_errors);
    }

    if let Err(kind_errors) = validate_stage_kinds(config) {
        errors.extend(kind_errors);
    }

    let mut references_resolved = true;
    if let Err(unresolved_errors) = validate_upstream_references(config) {
        references_resolved = false;
        errors.extend(unresolved_errors);
    }

    if references_resolved && errors.iter().all(|e| !matches!(e, ValidationError::DuplicateStageId { .. })) {
        if let Err(cycle_errors) = validate_acyclic_upstreams(config) {
            errors.extend(cycle_errors);
        }
    }

    let mut warning_count = 0;
    for stage in config.stages.iter().filter(|s| !s.enabled) {
        DisabledStageConfigured { stage_id: &stage.id }.log();
        warning_count += 1;
    }

    if errors.is_empty() {
        ValidationCompleted {
            stage_count,
            warning_count,
        }
        .log();
        Ok(())
    } else {
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        Err(errors)
    }
}

fn validate_unique_stage_ids(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for id in std::iter::once(&config.source.id).chain(config.stages.iter().map(|s| &s.id)) {
        if !seen_ids.insert(id) {
            DuplicateStageId { stage_id: id }.log();
            errors.push(ValidationError::DuplicateStageId {
                stage_id: id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_stage_kinds(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let source = &config.source;
    if !LocalStageFactory::is_source_kind(&source.kind) {
        UnknownStageKind {
            stage_id: &source.id,
            kind: &source.kind,
        }
        .log();
        errors.push(ValidationError::UnknownStageKind {
            stage_id: source.id.clone(),
            kind: source.kind.clone(),
        });
    }

    for stage in &config.stages {
        if !LocalStageFactory::is_transform_kind(&stage.kind) {
            UnknownStageKind {
                stage_id: &stage.id,
                kind: &stage.kind,
            }
            .log();
            errors.push(ValidationError::UnknownStageKind {
                stage_id: stage.id.clone(),
                kind: stage.kind.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream_references(config: &Config) -> Result<(), Vec<ValidationError>> {
    let stage_ids: HashSet<&str> = std::iter::once(config.source.id.as_str())
        .chain(config.stages.iter().map(|s| s.id.as_str()))
        .collect();
    let mut errors = Vec::new();

    for (index, stage) in config.stages.iter().enumerate() {
        let upstream = config.upstream_of(index);
        if !stage_ids.contains(upstream) {
            UnresolvedUpstream {
                stage_id: &stage.id,
                missing_upstream: upstream,
            }
            .log();
            errors.push(ValidationError::UnresolvedUpstream {
                stage_id: stage.id.clone(),
                missing_upstream: upstream.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects loops in the upstream links using DFS with a recursion stack.
///
/// The graph has an edge from every upstream to each stage reading from it.
/// A back edge onto a node still on the recursion stack closes a cycle, which
/// is reported as the path from that node around to itself.
fn validate_acyclic_upstreams(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    graph.insert(config.source.id.as_str(), Vec::new());
    for stage in &config.stages {
        graph.insert(stage.id.as_str(), Vec::new());
    }
    for (index, stage) in config.stages.iter().enumerate() {
        if let Some(dependents) = graph.get_mut(config.upstream_of(index)) {
            dependents.push(stage.id.as_str());
        }
    }

    // Visit in configuration order so the reported cycle is deterministic
    let order: Vec<&str> = std::iter::once(config.source.id.as_str())
        .chain(config.stages.iter().map(|s| s.id.as_str()))
        .collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for stage_id in order {
        if !visited.contains(stage_id) {
            if let Some(cycle) =
                dfs_cycle_detection(stage_id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                let cycle_refs: Vec<&str> = cycle.iter().map(String::as_str).collect();
                CyclicUpstreamDetected { cycle: &cycle_refs }.log();
                return Err(vec![ValidationError::CyclicUpstream { cycle }]);
            }
        }
    }

    Ok(())
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|x| *x == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> = path[cycle_start..].iter().map(|s| s.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
