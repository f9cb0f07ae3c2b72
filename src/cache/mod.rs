// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod pipeline_cache;
mod revision_cache;

pub use pipeline_cache::PipelineCache;
pub use revision_cache::{RevisionCache, RevisionKey};
