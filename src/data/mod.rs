// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data model: shared objects, the container that carries them down the
//! pipeline, and the copy-on-write helpers that keep sharing safe.

mod container;
pub mod cow;
mod object;
mod status;
mod table;

pub use container::{AttributeValue, FlowState};
pub use cow::CloneHelper;
pub use object::{owner_count, DataObject, DataObjectRef, ObjectId, ObjectMeta};
pub use status::{PipelineStatus, StatusType};
pub use table::{Column, Label, Table};
