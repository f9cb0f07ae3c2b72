// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable text and
//! [`StructuredLog`] for emitting it with structured fields at a fixed level.
//!
//! # Organization
//!
//! * `engine` - pipeline topology, evaluation lifecycle, worker pool
//! * `stage` - per-stage compute, status and invalidation events
//! * `cache` - pipeline cache and revision cache activity
//! * `validation` - configuration validation warnings and errors
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_flowstate::observability::messages::engine::WorkerPoolCreated;
//! use the_flowstate::observability::messages::StructuredLog;
//!
//! let msg = WorkerPoolCreated { max_concurrency: 4 };
//!
//! msg.log();
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod cache;
pub mod engine;
pub mod stage;
pub mod validation;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emits the message as a `tracing` event.
    fn log(&self);

    /// Opens a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
