// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Change-notification graph.
//!
//! Nodes broadcast [`ChangeEvent`]s synchronously to their registered
//! dependents, which may forward a (possibly different) event further down.

mod dependents;
mod event;

pub use dependents::{Dependent, DependentList};
pub use event::ChangeEvent;
