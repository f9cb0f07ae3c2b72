// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-stage memoization keyed by validity interval.
//!
//! An entry is found by asking whether its interval contains the requested
//! time, so one computed result serves every time point it is valid for.
//! The number of entries is bounded; the least recently used entry is
//! evicted first.
//!
//! Every [`PipelineCache::invalidate`] bumps a generation counter. A
//! computation records the generation it started under and
//! [`PipelineCache::insert`] refuses to store its result if the cache was
//! invalidated in the meantime.

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::data::FlowState;
use crate::errors::{report_violation, ConsistencyError};
use crate::observability::messages::cache::{
    CacheEvicted, CacheHit, CacheMiss, CacheStored, StaleResultDiscarded,
};
use crate::observability::messages::StructuredLog;
use crate::time::{TimeInterval, TimeIntervalUnion, TimePoint};

#[derive(Debug, Clone)]
struct CacheEntry {
    interval: TimeInterval,
    state: FlowState,
}

#[derive(Debug)]
pub struct PipelineCache {
    owner: String,
    entries: LruCache<u64, CacheEntry>,
    next_key: u64,
    generation: u64,
    preliminary: Option<FlowState>,
}

impl PipelineCache {
    /// Creates an empty cache for the stage `owner` holding at most
    /// `capacity` entries (at least one).
    pub fn new(owner: impl Into<String>, capacity: usize) -> Self {
        Self {
            owner: owner.into(),
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            next_key: 0,
            generation: 0,
            preliminary: None,
        }
    }

    /// Returns the cached state whose interval contains `time`.
    pub fn get(&mut self, time: TimePoint) -> Option<FlowState> {
        let key = self
            .entries
            .iter()
            .find(|(_, entry)| entry.interval.contains(time))
            .map(|(key, _)| *key);

        match key.and_then(|key| self.entries.get(&key)) {
            Some(entry) => {
                CacheHit {
                    stage_id: &self.owner,
                    time,
                    interval: entry.interval,
                }
                .log();
                Some(entry.state.clone())
            }
            None => {
                CacheMiss {
                    stage_id: &self.owner,
                    time,
                }
                .log();
                None
            }
        }
    }

    /// Returns the cached state valid over all of `interval`.
    pub fn get_covering(&mut self, interval: &TimeInterval) -> Option<FlowState> {
        let key = self
            .entries
            .iter()
            .find(|(_, entry)| entry.interval.contains_interval(interval))
            .map(|(key, _)| *key)?;
        self.entries.get(&key).map(|entry| entry.state.clone())
    }

    /// True if some entry covers `time`. Does not touch the LRU order.
    pub fn contains(&self, time: TimePoint) -> bool {
        self.entries.iter().any(|(_, entry)| entry.interval.contains(time))
    }

    /// Stores the result of a computation requested for `time`.
    pub fn put(&mut self, state: FlowState, time: TimePoint) -> Result<bool, ConsistencyError> {
        let generation = self.generation;
        self.insert(state, time, generation)
    }

    /// Stores the result of a computation that started under `generation`.
    ///
    /// Returns `Ok(false)` without storing when the cache was invalidated
    /// after the computation started or when the result carries an error
    /// status. A result whose validity does not contain the requested time is
    /// a consistency error and is never stored.
    pub fn insert(
        &mut self,
        state: FlowState,
        time: TimePoint,
        generation: u64,
    ) -> Result<bool, ConsistencyError> {
        let interval = state.validity();
        if !interval.contains(time) {
            return Err(report_violation(ConsistencyError::IntervalWidening { time, interval }));
        }
        if generation != self.generation {
            StaleResultDiscarded {
                stage_id: &self.owner,
                time,
            }
            .log();
            return Ok(false);
        }

        self.preliminary = Some(state.clone());
        if state.status().is_error() {
            return Ok(false);
        }

        let overlapping: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.interval.overlaps(&interval))
            .map(|(key, _)| *key)
            .collect();
        for key in overlapping {
            self.entries.pop(&key);
        }

        let key = self.next_key;
        self.next_key += 1;
        if let Some((_, evicted)) = self.entries.push(key, CacheEntry { interval, state }) {
            CacheEvicted {
                stage_id: &self.owner,
                interval: evicted.interval,
            }
            .log();
        }
        CacheStored {
            stage_id: &self.owner,
            interval,
            entries: self.entries.len(),
        }
        .log();
        Ok(true)
    }

    /// Discards everything outside `keep`.
    ///
    /// Entries overlapping `keep` shrink to the overlap; all others are
    /// dropped. Intervals are only ever intersected, never widened. The
    /// preliminary state survives.
    pub fn invalidate(&mut self, keep: TimeInterval) {
        self.generation += 1;

        let mut dropped = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            entry.interval.intersect(&keep);
            if entry.interval.is_empty() {
                dropped.push(*key);
            } else {
                entry.state.intersect_validity(&keep);
            }
        }
        for key in dropped {
            self.entries.pop(&key);
        }
    }

    /// Drops all entries and the preliminary state.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.entries.clear();
        self.preliminary = None;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The most recently computed state, kept across invalidations.
    pub fn preliminary(&self) -> Option<&FlowState> {
        self.preliminary.as_ref()
    }

    pub fn set_preliminary(&mut self, state: FlowState) {
        self.preliminary = Some(state);
    }

    /// The time ranges currently served from cache.
    pub fn cached_intervals(&self) -> TimeIntervalUnion {
        let mut union = TimeIntervalUnion::new();
        for (_, entry) in self.entries.iter() {
            union.add(entry.interval);
        }
        union
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.entries
            .resize(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN));
    }
}
