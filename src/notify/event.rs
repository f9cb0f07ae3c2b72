// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::time::TimeInterval;

/// Event broadcast by a node of the change-notification graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The node's output changed. `unchanged` is the part of the time line
    /// on which previously computed results are still correct (empty when
    /// nothing survives).
    TargetChanged { unchanged: TimeInterval },
    /// The status shown for the node changed, including pending transitions.
    StatusChanged,
    /// The node's upstream link was replaced.
    PipelineChanged,
    /// The node was switched on or off.
    EnabledOrDisabled,
    /// A new best-effort state can be fetched without waiting.
    PreliminaryStateAvailable,
    /// The node is being removed from the pipeline.
    TargetDeleted,
}

impl ChangeEvent {
    /// A change that leaves nothing valid.
    pub fn changed() -> Self {
        ChangeEvent::TargetChanged {
            unchanged: TimeInterval::empty(),
        }
    }

    /// True for events after which downstream results have to be recomputed.
    pub fn invalidates_downstream(&self) -> bool {
        matches!(
            self,
            ChangeEvent::TargetChanged { .. }
                | ChangeEvent::PipelineChanged
                | ChangeEvent::EnabledOrDisabled
        )
    }

    /// Portion of the time line that survives this event.
    pub fn unchanged_interval(&self) -> TimeInterval {
        match self {
            ChangeEvent::TargetChanged { unchanged } => *unchanged,
            _ => TimeInterval::empty(),
        }
    }
}
