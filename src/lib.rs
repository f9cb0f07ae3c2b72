// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // built-in stages
pub mod cache;      // pipeline + revision caches
pub mod config;     // config loading, validation, runtime
pub mod data;       // data objects and containers
pub mod engine;     // stages, pipeline, worker pool
pub mod errors;     // error handling
pub mod notify;     // change-notification graph
pub mod observability;
pub mod recorder;   // undo recording hooks
pub mod time;       // time points and intervals
pub mod traits;     // unified abstractions
