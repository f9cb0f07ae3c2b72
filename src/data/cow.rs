// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Copy-on-write graph manager.
//!
//! [`CloneHelper`] is the per-operation clone table: within one copy-on-write
//! operation each source object is cloned at most once, so two references to
//! the same source end up pointing at the same clone and the aliasing
//! topology of the graph survives the copy.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::{DataObject, DataObjectRef, FlowState, ObjectId};
use crate::errors::{report_violation, ConsistencyError};

/// Clone table scoped to a single copy-on-write operation.
#[derive(Default)]
pub struct CloneHelper {
    clones: HashMap<ObjectId, DataObjectRef>,
}

impl CloneHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clones `obj`, or returns the clone made earlier in this operation.
    ///
    /// With `deep == false` the clone shares its sub-objects with the
    /// original. With `deep == true` every sub-object goes through this
    /// method as well.
    pub fn clone_object(
        &mut self,
        obj: &DataObjectRef,
        deep: bool,
    ) -> Result<DataObjectRef, ConsistencyError> {
        if let Some(existing) = self.clones.get(&obj.id()) {
            return Ok(Arc::clone(existing));
        }

        let mut copy = obj.duplicate();
        let copy_ref: &dyn DataObject = copy.as_ref();
        if copy_ref.concrete_type_id() != obj.concrete_type_id() {
            return Err(report_violation(ConsistencyError::CloneTypeMismatch {
                object: obj.id(),
                expected: obj.type_name(),
                actual: copy_ref.type_name(),
            }));
        }
        if copy_ref.id() == obj.id() {
            return Err(report_violation(ConsistencyError::CloneIdentityReused(obj.id())));
        }

        if deep {
            for sub_object in copy.sub_objects_mut() {
                let source = Arc::clone(sub_object);
                *sub_object = self.clone_object(&source, true)?;
            }
        }

        let copy: DataObjectRef = Arc::from(copy);
        self.clones.insert(obj.id(), Arc::clone(&copy));
        Ok(copy)
    }

    /// Returns a handle for `obj` suitable for storing in a copied container:
    /// a clone when copying deeply, the shared original otherwise.
    pub fn copy_reference(
        &mut self,
        obj: &DataObjectRef,
        deep: bool,
    ) -> Result<DataObjectRef, ConsistencyError> {
        if deep {
            self.clone_object(obj, true)
        } else {
            Ok(Arc::clone(obj))
        }
    }

    /// Number of distinct source objects cloned so far.
    pub fn len(&self) -> usize {
        self.clones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clones.is_empty()
    }
}

/// Makes the object `id` of `state` exclusively owned and returns it.
///
/// If the container holds the only handle, the object is returned unchanged.
/// Otherwise a shallow clone replaces it at the same position. Either way the
/// returned object has an owner count of exactly one. Note that a clone has
/// a new [`ObjectId`].
pub fn make_mutable(
    state: &mut FlowState,
    id: ObjectId,
) -> Result<&mut dyn DataObject, ConsistencyError> {
    let index = state
        .position_of(id)
        .ok_or_else(|| report_violation(ConsistencyError::ObjectNotFound(id)))?;

    let slot = &mut state.objects_mut()[index];
    if Arc::get_mut(slot).is_none() {
        let clone = CloneHelper::new().clone_object(slot, false)?;
        *slot = clone;
    }
    Arc::get_mut(slot).ok_or_else(|| report_violation(ConsistencyError::ObjectNotFound(id)))
}

/// Makes sub-object `index` of `parent` exclusively owned and returns it.
///
/// Handing out a content sub-object for mutation counts as a change of the
/// parent, so the parent's revision is bumped whether or not a clone was
/// needed; decorations leave it untouched.
pub fn make_sub_object_mutable(
    parent: &mut dyn DataObject,
    index: usize,
) -> Result<Option<&mut dyn DataObject>, ConsistencyError> {
    let (needs_clone, decoration) = match parent.sub_objects().get(index) {
        Some(sub_object) => (Arc::strong_count(sub_object) > 1, sub_object.is_decoration()),
        None => return Ok(None),
    };
    if needs_clone {
        let mut helper = CloneHelper::new();
        let clone = helper.clone_object(parent.sub_objects()[index], false)?;
        *parent.sub_objects_mut().swap_remove(index) = clone;
    }
    if !decoration {
        parent.meta_mut().bump_revision();
    }
    let slot = parent.sub_objects_mut().swap_remove(index);
    Ok(Arc::get_mut(slot))
}
