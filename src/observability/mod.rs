// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and
//! operational logging throughout the pipeline engine. Message types follow a
//! struct-based pattern with `Display` trait implementation to:
//!
//! * Keep log text out of engine code
//! * Attach the same structured fields wherever an event is logged
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - pipeline topology, evaluation lifecycle, worker pool
//! * `messages::stage` - per-stage compute, status and invalidation events
//! * `messages::cache` - pipeline cache and revision cache activity
//! * `messages::validation` - configuration validation warnings and errors
//!
//! # Usage
//!
//! ```rust
//! use the_flowstate::observability::messages::stage::StageComputeFailed;
//! use the_flowstate::observability::messages::StructuredLog;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = StageComputeFailed {
//!     stage_id: "scale",
//!     time: 0,
//!     error: &error,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
