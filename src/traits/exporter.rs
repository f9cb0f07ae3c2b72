// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::io;

use crate::data::FlowState;
use crate::time::TimePoint;

/// Receives the final container of the pipeline for a requested time.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export_frame(&self, time: TimePoint, state: &FlowState) -> io::Result<()>;
}
