// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Interface to an external undo/redo recorder.
//!
//! The pipeline never records its own bookkeeping as user actions. Every
//! internal mutation runs while a [`SuspendGuard`] is alive; the guard
//! resumes recording when it goes out of scope, on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Receiver of user-visible mutations.
pub trait MutationRecorder: Send + Sync {
    /// Records a user action. Ignored while recording is suspended.
    fn record(&self, description: &str);

    /// Increments the suspension depth.
    fn suspend(&self);

    /// Decrements the suspension depth.
    fn resume(&self);

    fn is_recording(&self) -> bool;
}

/// Scoped suspension of a [`MutationRecorder`].
#[must_use = "recording resumes as soon as the guard is dropped"]
pub struct SuspendGuard<'a> {
    recorder: &'a dyn MutationRecorder,
}

impl<'a> SuspendGuard<'a> {
    pub fn new(recorder: &'a dyn MutationRecorder) -> Self {
        recorder.suspend();
        Self { recorder }
    }
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.recorder.resume();
    }
}

/// A recorder that discards everything.
#[derive(Debug, Default)]
pub struct NullRecorder {
    depth: AtomicUsize,
}

impl MutationRecorder for NullRecorder {
    fn record(&self, _description: &str) {}

    fn suspend(&self) {
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    fn is_recording(&self) -> bool {
        self.depth.load(Ordering::SeqCst) == 0
    }
}

/// A recorder that keeps the descriptions of recorded actions in memory.
#[derive(Debug, Default)]
pub struct ActionLog {
    depth: AtomicUsize,
    actions: Mutex<Vec<String>>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MutationRecorder for ActionLog {
    fn record(&self, description: &str) {
        if self.is_recording() {
            self.actions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(description.to_string());
        }
    }

    fn suspend(&self) {
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    fn is_recording(&self) -> bool {
        self.depth.load(Ordering::SeqCst) == 0
    }
}
