// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared, versioned data objects.
//!
//! Objects are shared through [`DataObjectRef`] (an `Arc`). The strong count of
//! that handle is the object's owner count: an object is safe to modify in
//! place only while exactly one handle exists, which is what
//! [`std::sync::Arc::get_mut`] checks for us. All other mutation goes through
//! the copy-on-write helpers in [`crate::data::cow`].

use downcast_rs::{impl_downcast, DowncastSync};
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::time::{TimeInterval, TimePoint};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identity of a data object. Clones get a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bookkeeping shared by every data object.
#[derive(Debug)]
pub struct ObjectMeta {
    id: ObjectId,
    identifier: String,
    revision: u64,
    data_source: Option<String>,
}

impl ObjectMeta {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: ObjectId::next(),
            identifier: identifier.into(),
            revision: 0,
            data_source: None,
        }
    }

    /// Metadata for a copy of the owning object: new identity, same
    /// identifier, revision and producing stage.
    pub fn duplicate(&self) -> Self {
        Self {
            id: ObjectId::next(),
            identifier: self.identifier.clone(),
            revision: self.revision,
            data_source: self.data_source.clone(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.identifier = identifier.into();
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Records a change of the object's own content.
    pub fn bump_revision(&mut self) {
        self.revision += 1;
    }

    /// Id of the stage that produced the object, if known.
    pub fn data_source(&self) -> Option<&str> {
        self.data_source.as_deref()
    }

    pub fn set_data_source(&mut self, stage_id: impl Into<String>) {
        self.data_source = Some(stage_id.into());
    }
}

/// A unit of shared content flowing down the pipeline.
pub trait DataObject: DowncastSync + fmt::Debug {
    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Short type name used for identifiers and diagnostics.
    fn type_name(&self) -> &'static str;

    /// Produces a shallow copy of this object. Sub-object handles are shared
    /// with the original; the copy's metadata must come from
    /// [`ObjectMeta::duplicate`].
    fn duplicate(&self) -> Box<dyn DataObject>;

    fn sub_objects(&self) -> Vec<&DataObjectRef> {
        Vec::new()
    }

    fn sub_objects_mut(&mut self) -> Vec<&mut DataObjectRef> {
        Vec::new()
    }

    /// Decorations (labels, display hints) don't count as content of the
    /// object that references them.
    fn is_decoration(&self) -> bool {
        false
    }

    /// The time interval around `time` over which this object's content is valid.
    fn validity(&self, _time: TimePoint) -> TimeInterval {
        TimeInterval::infinite()
    }
}
impl_downcast!(sync DataObject);

/// Shared handle to a data object.
pub type DataObjectRef = Arc<dyn DataObject>;

impl dyn DataObject {
    pub fn id(&self) -> ObjectId {
        self.meta().id()
    }

    pub fn revision(&self) -> u64 {
        self.meta().revision()
    }

    pub fn identifier(&self) -> &str {
        self.meta().identifier()
    }

    /// Runtime type of the concrete object behind the trait object.
    pub fn concrete_type_id(&self) -> TypeId {
        downcast_rs::Downcast::as_any(self).type_id()
    }
}

/// Number of handles currently sharing `obj`.
pub fn owner_count(obj: &DataObjectRef) -> usize {
    Arc::strong_count(obj)
}
