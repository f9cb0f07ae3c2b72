// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod compute;
mod config;
mod consistency;
mod pipeline;

pub use compute::{Canceled, ComputeError, OUT_OF_MEMORY_MESSAGE};
pub use config::{ConfigError, ValidationError};
pub use consistency::{report_violation, ConsistencyError};
pub use pipeline::{PipelineError, StageFactoryError};
