// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Back-references from a node to the nodes that depend on it.
//!
//! The list holds [`Weak`] handles only. Ownership always points upstream
//! (a stage owns its input), so the notification edges can never form a
//! strong cycle and are never followed for destruction.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::errors::{report_violation, ConsistencyError};
use crate::notify::ChangeEvent;

/// Receiver of change events.
pub trait Dependent: Send + Sync {
    /// Handles an event from a node this dependent is registered with.
    /// The handler may re-broadcast to its own dependents and may add or
    /// remove dependents on the sending node.
    fn handle_event(&self, event: &ChangeEvent);
}

/// The set of dependents registered with one node.
#[derive(Default)]
pub struct DependentList {
    dependents: Mutex<Vec<Weak<dyn Dependent>>>,
}

impl DependentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `dependent`. Registering the same dependent twice is a no-op.
    pub fn add_dependent(&self, dependent: &Arc<dyn Dependent>) {
        let weak = Arc::downgrade(dependent);
        let mut dependents = self.dependents.lock().unwrap_or_else(PoisonError::into_inner);
        if !dependents.iter().any(|d| Weak::ptr_eq(d, &weak)) {
            dependents.push(weak);
        }
    }

    /// Unregisters `dependent`. Returns false if it was not registered.
    pub fn remove_dependent(&self, dependent: &Arc<dyn Dependent>) -> bool {
        let weak = Arc::downgrade(dependent);
        let mut dependents = self.dependents.lock().unwrap_or_else(PoisonError::into_inner);
        let before = dependents.len();
        dependents.retain(|d| !Weak::ptr_eq(d, &weak));
        dependents.len() != before
    }

    /// Delivers `event` to every live dependent, depth first.
    ///
    /// Delivery iterates over a snapshot, so handlers may modify this list.
    /// Dependents that were dropped without unregistering are pruned.
    pub fn notify(&self, event: &ChangeEvent) {
        let snapshot: Vec<Arc<dyn Dependent>> = {
            let mut dependents = self.dependents.lock().unwrap_or_else(PoisonError::into_inner);
            dependents.retain(|d| d.strong_count() > 0);
            dependents.iter().filter_map(Weak::upgrade).collect()
        };
        for dependent in snapshot {
            dependent.handle_event(event);
        }
    }

    /// Number of registered dependents that are still alive.
    pub fn live_count(&self) -> usize {
        self.dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.strong_count() > 0)
            .count()
    }

    /// Live dependents, for lookup only.
    pub fn dependents(&self) -> Vec<Arc<dyn Dependent>> {
        self.dependents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

impl Drop for DependentList {
    fn drop(&mut self) {
        let live = self.live_count();
        if live > 0 && !std::thread::panicking() {
            report_violation(ConsistencyError::DroppedWithDependents(live));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeInterval;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ChangeEvent>>,
    }

    impl Dependent for Recorder {
        fn handle_event(&self, event: &ChangeEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    /// Forwards every event to its own dependents.
    #[derive(Default)]
    struct Relay {
        dependents: DependentList,
    }

    impl Dependent for Relay {
        fn handle_event(&self, event: &ChangeEvent) {
            self.dependents.notify(event);
        }
    }

    /// Unregisters itself from the sender while handling an event.
    struct SelfRemoving {
        sender: Arc<DependentList>,
        me: Mutex<Option<Weak<SelfRemoving>>>,
        calls: Mutex<usize>,
    }

    impl Dependent for SelfRemoving {
        fn handle_event(&self, _event: &ChangeEvent) {
            *self.calls.lock().unwrap() += 1;
            if let Some(me) = self.me.lock().unwrap().as_ref().and_then(Weak::upgrade) {
                let me: Arc<dyn Dependent> = me;
                self.sender.remove_dependent(&me);
            }
        }
    }

    #[test]
    fn test_notify_reaches_all_dependents() {
        let list = DependentList::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let a_dyn: Arc<dyn Dependent> = a.clone();
        let b_dyn: Arc<dyn Dependent> = b.clone();
        list.add_dependent(&a_dyn);
        list.add_dependent(&a_dyn);
        list.add_dependent(&b_dyn);
        assert_eq!(list.live_count(), 2);

        list.notify(&ChangeEvent::StatusChanged);
        assert_eq!(a.events.lock().unwrap().len(), 1);
        assert_eq!(b.events.lock().unwrap().len(), 1);

        assert!(list.remove_dependent(&a_dyn));
        assert!(!list.remove_dependent(&a_dyn));
        list.remove_dependent(&b_dyn);
    }

    #[test]
    fn test_events_forward_depth_first() {
        let root = DependentList::new();
        let relay = Arc::new(Relay::default());
        let leaf = Arc::new(Recorder::default());
        let relay_dyn: Arc<dyn Dependent> = relay.clone();
        let leaf_dyn: Arc<dyn Dependent> = leaf.clone();
        root.add_dependent(&relay_dyn);
        relay.dependents.add_dependent(&leaf_dyn);

        let event = ChangeEvent::TargetChanged {
            unchanged: TimeInterval::new(5, 10),
        };
        root.notify(&event);
        assert_eq!(*leaf.events.lock().unwrap(), vec![event]);

        relay.dependents.remove_dependent(&leaf_dyn);
        root.remove_dependent(&relay_dyn);
    }

    #[test]
    fn test_dead_dependents_are_pruned() {
        let list = DependentList::new();
        {
            let temp: Arc<dyn Dependent> = Arc::new(Recorder::default());
            list.add_dependent(&temp);
        }
        assert_eq!(list.live_count(), 0);
        list.notify(&ChangeEvent::changed());
        assert!(list.dependents().is_empty());
    }

    #[test]
    fn test_handler_may_unregister_itself() {
        let sender = Arc::new(DependentList::new());
        let node = Arc::new(SelfRemoving {
            sender: sender.clone(),
            me: Mutex::new(None),
            calls: Mutex::new(0),
        });
        *node.me.lock().unwrap() = Some(Arc::downgrade(&node));
        let node_dyn: Arc<dyn Dependent> = node.clone();
        sender.add_dependent(&node_dyn);

        sender.notify(&ChangeEvent::StatusChanged);
        sender.notify(&ChangeEvent::StatusChanged);
        assert_eq!(*node.calls.lock().unwrap(), 1);
        assert_eq!(sender.live_count(), 0);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "still registered"))]
    fn test_dropping_node_with_dependents_is_a_violation() {
        let dependent: Arc<dyn Dependent> = Arc::new(Recorder::default());
        let list = DependentList::new();
        list.add_dependent(&dependent);
        drop(list);
    }
}
