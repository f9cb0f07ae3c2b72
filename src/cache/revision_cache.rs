// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cache for artifacts derived from a data object's content.
//!
//! The key combines the producing object's identity, the consumer that
//! derived the artifact and the object's revision at the time. An in-place
//! content change bumps the revision, so the next lookup misses even though
//! the identity is the same.

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::data::{DataObject, ObjectId};
use crate::observability::messages::cache::{RevisionCacheLookup, RevisionCacheSwept};
use crate::observability::messages::StructuredLog;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionKey {
    object: ObjectId,
    consumer: String,
    revision: u64,
}

impl RevisionKey {
    /// Key for `consumer`'s artifact derived from the current content of `object`.
    pub fn for_object(object: &dyn DataObject, consumer: impl Into<String>) -> Self {
        Self {
            object: object.id(),
            consumer: consumer.into(),
            revision: object.revision(),
        }
    }

    pub fn new(object: ObjectId, consumer: impl Into<String>, revision: u64) -> Self {
        Self {
            object,
            consumer: consumer.into(),
            revision,
        }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    accessed: bool,
}

/// Bounded LRU map from [`RevisionKey`] to a derived value.
#[derive(Debug)]
pub struct RevisionCache<V> {
    entries: LruCache<RevisionKey, Slot<V>>,
}

impl<V: Clone> RevisionCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    pub fn get(&mut self, key: &RevisionKey) -> Option<V> {
        let value = self.entries.get_mut(key).map(|slot| {
            slot.accessed = true;
            slot.value.clone()
        });
        RevisionCacheLookup {
            object: key.object,
            consumer: &key.consumer,
            revision: key.revision,
            hit: value.is_some(),
        }
        .log();
        value
    }

    pub fn put(&mut self, key: RevisionKey, value: V) {
        self.entries.put(key, Slot { value, accessed: true });
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<E>(
        &mut self,
        key: RevisionKey,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.put(key, value.clone());
        Ok(value)
    }

    /// Drops every entry not looked up or stored since the previous sweep and
    /// clears the access marks. Returns the number of dropped entries.
    pub fn retain_accessed(&mut self) -> usize {
        let stale: Vec<RevisionKey> = self
            .entries
            .iter()
            .filter(|(_, slot)| !slot.accessed)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            self.entries.pop(key);
        }
        for (_, slot) in self.entries.iter_mut() {
            slot.accessed = false;
        }
        RevisionCacheSwept {
            removed: stale.len(),
            remaining: self.entries.len(),
        }
        .log();
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
