// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The versioned data container produced by every stage evaluation.
//!
//! None of the operations here touch the *content* of a contained object; they
//! only change which objects the container references. Content changes go
//! through [`FlowState::make_mutable`] and friends, which clone shared objects
//! first.

use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::data::cow::{self, CloneHelper};
use crate::data::{DataObject, DataObjectRef, ObjectId, PipelineStatus};
use crate::errors::{report_violation, ComputeError, ConsistencyError};
use crate::time::TimeInterval;

/// A global attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Text(_) => None,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered bundle of data objects with a status, a validity interval and a
/// flat attribute map.
///
/// Cloning a `FlowState` is cheap: the object handles are shared, which is
/// exactly what makes the copy-on-write discipline necessary.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    objects: Vec<DataObjectRef>,
    status: PipelineStatus,
    validity: TimeInterval,
    attributes: BTreeMap<String, AttributeValue>,
}

impl FlowState {
    pub fn new(validity: TimeInterval) -> Self {
        Self {
            validity,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: PipelineStatus) -> Self {
        self.status = status;
        self
    }

    pub fn objects(&self) -> &[DataObjectRef] {
        &self.objects
    }

    pub(crate) fn objects_mut(&mut self) -> &mut Vec<DataObjectRef> {
        &mut self.objects
    }

    pub(crate) fn position_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Appends an object. Adding the same object twice is a consistency error.
    pub fn add_object(&mut self, obj: DataObjectRef) -> Result<(), ConsistencyError> {
        let index = self.objects.len();
        self.insert_object(index, obj)
    }

    /// Inserts an object at `index` (clamped to the end of the list).
    pub fn insert_object(&mut self, index: usize, obj: DataObjectRef) -> Result<(), ConsistencyError> {
        if self.position_of(obj.id()).is_some() {
            return Err(report_violation(ConsistencyError::DuplicateObject(obj.id())));
        }
        let index = index.min(self.objects.len());
        self.objects.insert(index, obj);
        Ok(())
    }

    /// Swaps `old` for `new`, keeping its position in the list.
    pub fn replace_object(&mut self, old: ObjectId, new: DataObjectRef) -> Result<(), ConsistencyError> {
        let index = self
            .position_of(old)
            .ok_or_else(|| report_violation(ConsistencyError::ObjectNotFound(old)))?;
        if new.id() != old && self.position_of(new.id()).is_some() {
            return Err(report_violation(ConsistencyError::DuplicateObject(new.id())));
        }
        self.objects[index] = new;
        Ok(())
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<DataObjectRef> {
        let index = self.position_of(id)?;
        Some(self.objects.remove(index))
    }

    pub fn find_object_by_id(&self, id: ObjectId) -> Option<&DataObjectRef> {
        self.objects.iter().find(|o| o.id() == id)
    }

    /// Handle of the first top-level object of type `T`.
    pub fn find_object_ref<T: DataObject>(&self) -> Option<&DataObjectRef> {
        self.objects.iter().find(|o| o.is::<T>())
    }

    pub fn find_object<T: DataObject>(&self) -> Option<&T> {
        self.objects.iter().find_map(|o| o.downcast_ref::<T>())
    }

    /// Like [`FlowState::find_object`] but reports a missing object as a
    /// compute error, which is what a stage wants to bubble up.
    pub fn expect_object<T: DataObject>(&self) -> Result<&T, ComputeError> {
        self.find_object::<T>()
            .ok_or_else(|| ComputeError::MissingObject(short_type_name::<T>()))
    }

    /// Looks for an object of type `T` anywhere in the object graph.
    pub fn contains_object_recursive<T: DataObject>(&self) -> bool {
        fn visit<T: DataObject>(obj: &DataObjectRef) -> bool {
            obj.is::<T>() || obj.sub_objects().into_iter().any(visit::<T>)
        }
        self.objects.iter().any(visit::<T>)
    }

    /// Returns an identifier not yet used by any top-level object: `base`
    /// itself if free, otherwise `base.2`, `base.3`, ...
    pub fn generate_unique_identifier(&self, base: &str) -> String {
        let taken = |candidate: &str| self.objects.iter().any(|o| o.identifier() == candidate);
        if !taken(base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}.{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Sets an attribute, overwriting any previous value.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Adds an attribute without overwriting an existing one. A clashing key
    /// gets the first free `.2`, `.3`, ... suffix. Returns the key used.
    pub fn merge_attribute(&mut self, key: &str, value: impl Into<AttributeValue>) -> String {
        let mut actual = key.to_string();
        let mut n = 2;
        while self.attributes.contains_key(&actual) {
            actual = format!("{}.{}", key, n);
            n += 1;
        }
        self.attributes.insert(actual.clone(), value.into());
        actual
    }

    pub fn status(&self) -> &PipelineStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: PipelineStatus) {
        self.status = status;
    }

    pub fn validity(&self) -> TimeInterval {
        self.validity
    }

    pub fn set_validity(&mut self, validity: TimeInterval) {
        self.validity = validity;
    }

    /// Shrinks the validity interval. There is no way to widen it short of
    /// [`FlowState::set_validity`].
    pub fn intersect_validity(&mut self, other: &TimeInterval) {
        self.validity.intersect(other);
    }

    /// Exclusive access to the object `id`, cloning it first if shared.
    pub fn make_mutable(&mut self, id: ObjectId) -> Result<&mut dyn DataObject, ConsistencyError> {
        cow::make_mutable(self, id)
    }

    /// Exclusive access to the first object of type `T`, if there is one.
    pub fn make_mutable_as<T: DataObject>(&mut self) -> Result<Option<&mut T>, ConsistencyError> {
        let id = match self.find_object_ref::<T>() {
            Some(obj) => obj.id(),
            None => return Ok(None),
        };
        Ok(cow::make_mutable(self, id)?.downcast_mut::<T>())
    }

    /// Makes every top-level object exclusively owned by this container.
    ///
    /// One clone table is used for the whole pass so that sub-objects shared
    /// between two top-level objects stay shared between their clones.
    pub fn make_all_mutable(&mut self) -> Result<(), ConsistencyError> {
        let mut helper = CloneHelper::new();
        for slot in self.objects.iter_mut() {
            if Arc::get_mut(slot).is_none() {
                *slot = helper.clone_object(slot, false)?;
            }
        }
        Ok(())
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
