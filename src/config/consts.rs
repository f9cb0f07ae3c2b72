// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Animation time resolution (ticks per second)
pub const TICKS_PER_SECOND: i32 = 4800;
/// Default animation frame rate
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 10;
/// Default number of cached results kept per stage
pub const DEFAULT_CACHE_ENTRIES: usize = 8;
/// Default number of memoized artifacts kept per revision cache
pub const DEFAULT_REVISION_CACHE_CAPACITY: usize = 256;
/// Status text of a stage that is switched off
pub const DISABLED_STAGE_MESSAGE: &str = "Stage is currently disabled.";
