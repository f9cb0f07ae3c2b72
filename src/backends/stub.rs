// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test-only stages and data objects.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};

use crate::data::{DataObject, DataObjectRef, FlowState, ObjectMeta, PipelineStatus, Table};
use crate::engine::StageRequest;
use crate::errors::ComputeError;
use crate::notify::{ChangeEvent, Dependent};
use crate::traits::{DataSource, StageParams, Transform};

/// Source producing one table per frame with column `x = [frame, frame + 1, frame + 2]`.
pub struct StubSource {
    frames: usize,
    loads: AtomicUsize,
}

impl StubSource {
    pub fn new(frames: usize) -> Self {
        Self {
            frames,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for StubSource {
    fn name(&self) -> &'static str {
        "stub_source"
    }

    async fn load_frame(&self, request: &StageRequest) -> Result<FlowState, ComputeError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let frame = request.frame();
        let base = frame as f64;
        let mut state = FlowState::new(request.context.settings().frame_interval(frame));
        state.add_object(Arc::new(
            Table::new("table").with_column("x", vec![base, base + 1.0, base + 2.0]),
        ))?;
        Ok(state)
    }

    fn number_of_frames(&self, _params: &StageParams) -> usize {
        self.frames
    }
}

/// Multiplies column `x` by the `factor` parameter and counts invocations.
#[derive(Default)]
pub struct CountingTransform {
    calls: AtomicUsize,
}

impl CountingTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transform for CountingTransform {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn apply(&self, request: &StageRequest, mut input: FlowState) -> Result<FlowState, ComputeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let factor = request.params.get_f64("factor").unwrap_or(1.0);
        if let Some(table) = input.make_mutable_as::<Table>()? {
            if let Some(values) = table.column_mut("x") {
                values.iter_mut().for_each(|v| *v *= factor);
            }
        }
        Ok(input)
    }
}

/// Always fails with the configured message.
pub struct FailingTransform {
    message: String,
}

impl FailingTransform {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Transform for FailingTransform {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn apply(&self, _request: &StageRequest, _input: FlowState) -> Result<FlowState, ComputeError> {
        Err(ComputeError::Failed(self.message.clone()))
    }
}

/// Panics inside `apply`.
pub struct PanickingTransform;

#[async_trait]
impl Transform for PanickingTransform {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn apply(&self, _request: &StageRequest, _input: FlowState) -> Result<FlowState, ComputeError> {
        panic!("transform exploded");
    }
}

/// Suspends until [`GatedTransform::open`] is called or the evaluation is
/// canceled, then hands the input through.
pub struct GatedTransform {
    calls: AtomicUsize,
    started: Notify,
    gate: watch::Sender<bool>,
}

impl GatedTransform {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            started: Notify::new(),
            gate: watch::channel(false).0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Resolves once a computation has entered `apply`.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl Transform for GatedTransform {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn apply(&self, request: &StageRequest, input: FlowState) -> Result<FlowState, ComputeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        let mut gate = self.gate.subscribe();
        tokio::select! {
            _ = request.cancel.cancelled() => Err(ComputeError::Canceled),
            _ = gate.wait_for(|open| *open) => Ok(input),
        }
    }
}

/// Doubles column `x` on the worker pool after a short sleep.
pub struct BlockingTransform {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl BlockingTransform {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transform for BlockingTransform {
    fn name(&self) -> &'static str {
        "blocking"
    }

    async fn apply(&self, request: &StageRequest, mut input: FlowState) -> Result<FlowState, ComputeError> {
        let values = input
            .expect_object::<Table>()?
            .column("x")
            .map(<[f64]>::to_vec)
            .unwrap_or_default();
        let delay = self.delay;
        let calls = Arc::clone(&self.calls);
        let doubled = request
            .run_blocking(move |cancel| {
                calls.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(delay);
                if cancel.is_cancelled() {
                    return Err(ComputeError::Canceled);
                }
                Ok(values.iter().map(|v| v * 2.0).collect::<Vec<_>>())
            })
            .await?;
        if let Some(table) = input.make_mutable_as::<Table>()? {
            table.set_column("x", doubled);
        }
        Ok(input)
    }
}

/// Counts how often it runs and marks its output; also runs on error inputs.
#[derive(Default)]
pub struct ErrorTolerantTransform {
    calls: AtomicUsize,
}

impl ErrorTolerantTransform {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transform for ErrorTolerantTransform {
    fn name(&self) -> &'static str {
        "error_tolerant"
    }

    async fn apply(&self, _request: &StageRequest, mut input: FlowState) -> Result<FlowState, ComputeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        input.set_attribute("tolerant", 1i64);
        Ok(input)
    }

    fn operates_on_errors(&self) -> bool {
        true
    }
}

/// Reports a warning and hands the input through.
pub struct WarningTransform;

#[async_trait]
impl Transform for WarningTransform {
    fn name(&self) -> &'static str {
        "warning"
    }

    async fn apply(&self, _request: &StageRequest, input: FlowState) -> Result<FlowState, ComputeError> {
        Ok(input.with_status(PipelineStatus::warning("values look suspicious")))
    }
}

/// Records every event it receives.
#[derive(Default)]
pub struct EventProbe {
    events: Mutex<Vec<ChangeEvent>>,
}

impl EventProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ChangeEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl Dependent for EventProbe {
    fn handle_event(&self, event: &ChangeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A data object that only holds references to other objects.
#[derive(Debug)]
pub struct StubNode {
    meta: ObjectMeta,
    children: Vec<DataObjectRef>,
}

impl StubNode {
    pub fn new(identifier: &str, children: Vec<DataObjectRef>) -> Self {
        Self {
            meta: ObjectMeta::new(identifier),
            children,
        }
    }
}

impl DataObject for StubNode {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        "StubNode"
    }

    fn duplicate(&self) -> Box<dyn DataObject> {
        Box::new(StubNode {
            meta: self.meta.duplicate(),
            children: self.children.clone(),
        })
    }

    fn sub_objects(&self) -> Vec<&DataObjectRef> {
        self.children.iter().collect()
    }

    fn sub_objects_mut(&mut self) -> Vec<&mut DataObjectRef> {
        self.children.iter_mut().collect()
    }
}

/// A data object whose duplicate has a different concrete type.
#[derive(Debug)]
pub struct WrongCloneObject {
    meta: ObjectMeta,
}

impl WrongCloneObject {
    pub fn new() -> Self {
        Self {
            meta: ObjectMeta::new("wrong"),
        }
    }
}

impl DataObject for WrongCloneObject {
    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        "WrongCloneObject"
    }

    fn duplicate(&self) -> Box<dyn DataObject> {
        Box::new(Table::new(self.meta.identifier()))
    }
}
