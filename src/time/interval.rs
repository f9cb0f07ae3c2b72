// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Closed animation-time intervals.
//!
//! A [`TimeInterval`] describes the range of animation times over which a
//! pipeline result is known to be correct. Intervals only ever shrink through
//! [`TimeInterval::intersect`]; there is deliberately no union operation on a
//! single interval, use [`TimeIntervalUnion`] to collect disjoint ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::consts::TICKS_PER_SECOND;

/// Animation time measured in ticks.
pub type TimePoint = i32;

/// Smallest representable time. Also used as the end marker of an empty interval.
pub const TIME_NEGATIVE_INFINITY: TimePoint = TimePoint::MIN;
/// Largest representable time.
pub const TIME_POSITIVE_INFINITY: TimePoint = TimePoint::MAX;

/// Converts ticks to seconds.
pub fn time_to_seconds(time: TimePoint) -> f64 {
    time as f64 / TICKS_PER_SECOND as f64
}

/// Converts seconds to the nearest tick.
pub fn time_from_seconds(seconds: f64) -> TimePoint {
    (seconds * TICKS_PER_SECOND as f64).round() as TimePoint
}

/// A closed time range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    start: TimePoint,
    end: TimePoint,
}

impl TimeInterval {
    pub const fn new(start: TimePoint, end: TimePoint) -> Self {
        Self { start, end }
    }

    /// An interval containing exactly one time point.
    pub const fn instant(time: TimePoint) -> Self {
        Self { start: time, end: time }
    }

    pub const fn infinite() -> Self {
        Self {
            start: TIME_NEGATIVE_INFINITY,
            end: TIME_POSITIVE_INFINITY,
        }
    }

    pub const fn empty() -> Self {
        Self {
            start: TIME_NEGATIVE_INFINITY,
            end: TIME_NEGATIVE_INFINITY,
        }
    }

    pub fn start(&self) -> TimePoint {
        self.start
    }

    pub fn end(&self) -> TimePoint {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == TIME_NEGATIVE_INFINITY || self.start > self.end
    }

    pub fn is_infinite(&self) -> bool {
        self.start == TIME_NEGATIVE_INFINITY && self.end == TIME_POSITIVE_INFINITY
    }

    pub fn contains(&self, time: TimePoint) -> bool {
        !self.is_empty() && self.start <= time && time <= self.end
    }

    /// Returns true if `other` lies completely inside this interval.
    pub fn contains_interval(&self, other: &TimeInterval) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty() && self.start <= other.start && other.end <= self.end
    }

    /// Shrinks this interval to its overlap with `other`.
    pub fn intersect(&mut self, other: &TimeInterval) {
        if other.is_empty() || self.is_empty() || self.end < other.start || self.start > other.end {
            *self = Self::empty();
        } else if !other.is_infinite() {
            self.start = self.start.max(other.start);
            self.end = self.end.min(other.end);
        }
    }

    /// Non-mutating form of [`TimeInterval::intersect`].
    pub fn intersection(mut self, other: &TimeInterval) -> Self {
        self.intersect(other);
        self
    }

    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        !self.intersection(other).is_empty()
    }
}

impl Default for TimeInterval {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "[empty]");
        }
        let bound = |t: TimePoint| match t {
            TIME_NEGATIVE_INFINITY => "-inf".to_string(),
            TIME_POSITIVE_INFINITY => "+inf".to_string(),
            t => t.to_string(),
        };
        write!(f, "[{}, {}]", bound(self.start), bound(self.end))
    }
}

/// A set of pairwise disjoint intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeIntervalUnion {
    intervals: Vec<TimeInterval>,
}

impl TimeIntervalUnion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interval, trimming it against the ranges already present.
    pub fn add(&mut self, mut iv: TimeInterval) {
        if iv.is_empty() {
            return;
        }
        let mut index = 0;
        while index < self.intervals.len() {
            let existing = self.intervals[index];
            if iv.start <= existing.start && iv.end >= existing.end {
                self.intervals.remove(index);
                continue;
            }
            if existing.contains(iv.start) {
                if existing.end == TIME_POSITIVE_INFINITY {
                    return;
                }
                iv.start = existing.end + 1;
            }
            if existing.contains(iv.end) {
                if existing.start == TIME_NEGATIVE_INFINITY {
                    return;
                }
                iv.end = existing.start - 1;
            }
            if iv.start > iv.end {
                return;
            }
            index += 1;
        }
        self.intervals.push(iv);
    }

    pub fn contains(&self, time: TimePoint) -> bool {
        self.intervals.iter().any(|iv| iv.contains(time))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeInterval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
    }
}
