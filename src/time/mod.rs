// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod interval;

pub use interval::{
    time_from_seconds, time_to_seconds, TimeInterval, TimeIntervalUnion, TimePoint,
    TIME_NEGATIVE_INFINITY, TIME_POSITIVE_INFINITY,
};
