// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the pipeline cache and the revision cache.
//!
//! All cache events are logged at `debug!`; they fire on every lookup.

use crate::data::ObjectId;
use crate::observability::messages::StructuredLog;
use crate::time::{TimeInterval, TimePoint};
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A cached result covered the requested time.
///
/// # Example
/// ```
/// use the_flowstate::observability::messages::cache::CacheHit;
/// use the_flowstate::time::TimeInterval;
///
/// let msg = CacheHit {
///     stage_id: "scale",
///     time: 10,
///     interval: TimeInterval::new(0, 4799),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct CacheHit<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
    pub interval: TimeInterval,
}

impl Display for CacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cache hit for stage '{}' at time {} (entry valid over {})",
            self.stage_id, self.time, self.interval
        )
    }
}

impl StructuredLog for CacheHit<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            time = self.time,
            interval = %self.interval,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "cache_hit",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
        )
    }
}

pub struct CacheMiss<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
}

impl Display for CacheMiss<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cache miss for stage '{}' at time {}", self.stage_id, self.time)
    }
}

impl StructuredLog for CacheMiss<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            time = self.time,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "cache_miss",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
        )
    }
}

/// A result was stored in a stage's cache.
pub struct CacheStored<'a> {
    pub stage_id: &'a str,
    pub interval: TimeInterval,
    pub entries: usize,
}

impl Display for CacheStored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cached result of stage '{}' valid over {} ({} entries)",
            self.stage_id, self.interval, self.entries
        )
    }
}

impl StructuredLog for CacheStored<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            interval = %self.interval,
            entries = self.entries,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "cache_stored",
            span_name = name,
            stage_id = self.stage_id,
            interval = %self.interval,
        )
    }
}

/// The least recently used entry was dropped to stay within capacity.
pub struct CacheEvicted<'a> {
    pub stage_id: &'a str,
    pub interval: TimeInterval,
}

impl Display for CacheEvicted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Evicted cached result of stage '{}' valid over {}",
            self.stage_id, self.interval
        )
    }
}

impl StructuredLog for CacheEvicted<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            interval = %self.interval,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "cache_evicted",
            span_name = name,
            stage_id = self.stage_id,
            interval = %self.interval,
        )
    }
}

/// A finished computation started before the latest invalidation; its
/// result was returned to the caller but not stored.
pub struct StaleResultDiscarded<'a> {
    pub stage_id: &'a str,
    pub time: TimePoint,
}

impl Display for StaleResultDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Not caching result of stage '{}' at time {}: cache was invalidated meanwhile",
            self.stage_id, self.time
        )
    }
}

impl StructuredLog for StaleResultDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(
            stage_id = self.stage_id,
            time = self.time,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stale_result",
            span_name = name,
            stage_id = self.stage_id,
            time = self.time,
        )
    }
}

/// Lookup in the revision-keyed cache.
pub struct RevisionCacheLookup<'a> {
    pub object: ObjectId,
    pub consumer: &'a str,
    pub revision: u64,
    pub hit: bool,
}

impl Display for RevisionCacheLookup<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Revision cache {} for object {} revision {} (consumer '{}')",
            if self.hit { "hit" } else { "miss" },
            self.object,
            self.revision,
            self.consumer
        )
    }
}

impl StructuredLog for RevisionCacheLookup<'_> {
    fn log(&self) {
        tracing::debug!(
            object = self.object.as_u64(),
            consumer = self.consumer,
            revision = self.revision,
            hit = self.hit,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "revision_cache_lookup",
            span_name = name,
            object = self.object.as_u64(),
            consumer = self.consumer,
            revision = self.revision,
        )
    }
}

/// Entries not accessed since the previous sweep were dropped.
pub struct RevisionCacheSwept {
    pub removed: usize,
    pub remaining: usize,
}

impl Display for RevisionCacheSwept {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Revision cache sweep removed {} entries, {} remaining",
            self.removed, self.remaining
        )
    }
}

impl StructuredLog for RevisionCacheSwept {
    fn log(&self) {
        tracing::debug!(
            removed = self.removed,
            remaining = self.remaining,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "revision_cache_sweep",
            span_name = name,
            removed = self.removed,
            remaining = self.remaining,
        )
    }
}
