// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration validation warnings and errors.
//!
//! This module contains message types for logging events related to:
//! * Upstream chain validation
//! * Cyclic upstream detection
//! * Unresolved upstream detection
//! * Duplicate stage ID detection
//! * Unknown stage kinds

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Cyclic upstream chain detected in configuration.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_flowstate::observability::messages::validation::CyclicUpstreamDetected;
///
/// let cycle = vec!["a", "b", "a"];
/// let msg = CyclicUpstreamDetected {
///     cycle: &cycle,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CyclicUpstreamDetected<'a> {
    pub cycle: &'a [&'a str],
}

impl Display for CyclicUpstreamDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic upstream chain detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicUpstreamDetected<'_> {
    fn log(&self) {
        tracing::error!(
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            cycle = self.cycle.join(" -> "),
            cycle_length = self.cycle.len(),
        )
    }
}

/// A stage reads from a stage that is not configured.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct UnresolvedUpstream<'a> {
    pub stage_id: &'a str,
    pub missing_upstream: &'a str,
}

impl Display for UnresolvedUpstream<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' reads from missing stage '{}'",
            self.stage_id, self.missing_upstream
        )
    }
}

impl StructuredLog for UnresolvedUpstream<'_> {
    fn log(&self) {
        tracing::error!(
            stage_id = self.stage_id,
            missing_upstream = self.missing_upstream,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            stage_id = self.stage_id,
            missing_upstream = self.missing_upstream,
        )
    }
}

/// Duplicate stage ID detected in configuration.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct DuplicateStageId<'a> {
    pub stage_id: &'a str,
}

impl Display for DuplicateStageId<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Duplicate stage ID: '{}'", self.stage_id)
    }
}

impl StructuredLog for DuplicateStageId<'_> {
    fn log(&self) {
        tracing::error!(stage_id = self.stage_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            stage_id = self.stage_id,
        )
    }
}

/// A stage names a kind the local factory cannot build.
pub struct UnknownStageKind<'a> {
    pub stage_id: &'a str,
    pub kind: &'a str,
}

impl Display for UnknownStageKind<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' has unknown kind '{}'", self.stage_id, self.kind)
    }
}

impl StructuredLog for UnknownStageKind<'_> {
    fn log(&self) {
        tracing::error!(stage_id = self.stage_id, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            stage_id = self.stage_id,
            kind = self.kind,
        )
    }
}

/// A stage is configured but disabled; it will pass its input through.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct DisabledStageConfigured<'a> {
    pub stage_id: &'a str,
}

impl Display for DisabledStageConfigured<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' is disabled and will pass its input through",
            self.stage_id
        )
    }
}

impl StructuredLog for DisabledStageConfigured<'_> {
    fn log(&self) {
        tracing::warn!(stage_id = self.stage_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            stage_id = self.stage_id,
        )
    }
}

/// Configuration validation started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationStarted {
    pub stage_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting configuration validation for {} stages",
            self.stage_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::info!(stage_count = self.stage_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            stage_count = self.stage_count,
        )
    }
}

/// Configuration validation completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_flowstate::observability::messages::validation::ValidationCompleted;
///
/// let msg = ValidationCompleted {
///     stage_count: 5,
///     warning_count: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ValidationCompleted {
    pub stage_count: usize,
    pub warning_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.warning_count > 0 {
            write!(
                f,
                "Configuration validation completed for {} stages with {} warnings",
                self.stage_count, self.warning_count
            )
        } else {
            write!(
                f,
                "Configuration validation completed successfully for {} stages",
                self.stage_count
            )
        }
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::info!(
            stage_count = self.stage_count,
            warning_count = self.warning_count,
            has_warnings = self.warning_count > 0,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            stage_count = self.stage_count,
            warning_count = self.warning_count,
        )
    }
}

/// Configuration validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Configuration validation failed with {} errors",
            self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(error_count = self.error_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}
