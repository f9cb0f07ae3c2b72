// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A single pipeline stage: parameters, upstream link, result cache and the
//! evaluation state machine.
//!
//! `evaluate` either answers from the stage cache or attaches the caller to
//! the one evaluation running for the requested time. The evaluation task
//! pulls the upstream result, runs the stage's own computation and stores
//! the result unless an invalidation happened in the meantime. Failures of
//! the computation become error-status containers and never leave the
//! stage as errors.

use std::future::Future;
use std::io::{self, Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::cache::PipelineCache;
use crate::config::consts::DISABLED_STAGE_MESSAGE;
use crate::data::{FlowState, PipelineStatus, StatusType};
use crate::engine::inflight::{EvaluationHandle, InflightRegistry};
use crate::engine::{EvalContext, EvaluationRequest, StageRequest};
use crate::errors::{Canceled, ComputeError, PipelineError};
use crate::notify::{ChangeEvent, Dependent, DependentList};
use crate::observability::messages::engine::{EvaluationCompleted, EvaluationStarted};
use crate::observability::messages::stage::{
    StageComputeFailed, StageInvalidated, StagePanicked, StagePassThrough, StagePending,
    StageStatusChanged,
};
use crate::observability::messages::StructuredLog;
use crate::time::{TimeInterval, TimeIntervalUnion, TimePoint};
use crate::traits::{DataSource, StageParams, Transform};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What a stage does with its input.
#[derive(Clone)]
pub enum StageKind {
    /// Produces the root container of the chain. Has no upstream.
    Source(Arc<dyn DataSource>),
    /// Transforms the container produced by its upstream stage.
    Modifier(Arc<dyn Transform>),
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Source(source) => source.name(),
            StageKind::Modifier(transform) => transform.name(),
        }
    }
}

struct StageState {
    params: StageParams,
    enabled: bool,
    upstream: Option<Arc<Stage>>,
    cache: PipelineCache,
    status: PipelineStatus,
}

pub struct Stage {
    id: String,
    title: String,
    kind: StageKind,
    me: Weak<Stage>,
    state: Mutex<StageState>,
    dependents: DependentList,
    inflight: Arc<InflightRegistry>,
    in_progress: AtomicUsize,
}

enum Guarded<T> {
    Done(Result<T, ComputeError>),
    Panicked,
}

impl Stage {
    pub fn new(
        id: impl Into<String>,
        kind: StageKind,
        params: StageParams,
        cache_capacity: usize,
    ) -> Arc<Self> {
        let id = id.into();
        Self::with_title(id.clone(), id, kind, params, cache_capacity)
    }

    /// Like [`Stage::new`] with a display title different from the id.
    pub fn with_title(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: StageKind,
        params: StageParams,
        cache_capacity: usize,
    ) -> Arc<Self> {
        let id = id.into();
        Arc::new_cyclic(|me| Stage {
            title: title.into(),
            kind,
            me: me.clone(),
            state: Mutex::new(StageState {
                params,
                enabled: true,
                upstream: None,
                cache: PipelineCache::new(id.clone(), cache_capacity),
                status: PipelineStatus::success(),
            }),
            dependents: DependentList::new(),
            inflight: InflightRegistry::new(id.clone()),
            in_progress: AtomicUsize::new(0),
            id,
        })
    }

    fn state(&self) -> MutexGuard<'_, StageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> &StageKind {
        &self.kind
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, StageKind::Source(_))
    }

    /// Observers of this stage. Downstream stages register here.
    pub fn dependents(&self) -> &DependentList {
        &self.dependents
    }

    // ---- parameters ---------------------------------------------------

    pub fn params(&self) -> StageParams {
        self.state().params.clone()
    }

    /// Replaces the whole parameter set and invalidates this stage and
    /// everything downstream.
    pub fn set_params(&self, params: StageParams) {
        self.state().params = params;
        self.notify_changed(TimeInterval::empty());
    }

    /// Changes a single parameter. Returns the previous value.
    pub fn set_parameter(
        &self,
        key: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> Option<serde_yaml::Value> {
        let previous = self.state().params.set(key, value);
        self.notify_changed(TimeInterval::empty());
        previous
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        {
            let mut state = self.state();
            if state.enabled == enabled {
                return;
            }
            state.enabled = enabled;
        }
        self.invalidate(TimeInterval::empty());
        self.dependents.notify(&ChangeEvent::EnabledOrDisabled);
    }

    // ---- topology -----------------------------------------------------

    pub fn upstream(&self) -> Option<Arc<Stage>> {
        self.state().upstream.clone()
    }

    /// Connects this stage to a new upstream stage, moving its dependent
    /// registration along. Cycle checks are the caller's business.
    pub(crate) fn set_upstream(&self, upstream: Option<Arc<Stage>>) -> Result<(), PipelineError> {
        if self.is_source() && upstream.is_some() {
            return Err(PipelineError::SourceHasNoUpstream(self.id.clone()));
        }
        let Some(me) = self.me.upgrade() else {
            return Ok(());
        };
        let me: Arc<dyn Dependent> = me;

        let previous = std::mem::replace(&mut self.state().upstream, upstream.clone());
        if let Some(previous) = previous {
            previous.dependents.remove_dependent(&me);
        }
        if let Some(next) = &upstream {
            next.dependents.add_dependent(&me);
        }

        self.invalidate(TimeInterval::empty());
        self.dependents.notify(&ChangeEvent::PipelineChanged);
        Ok(())
    }

    /// Follows upstream links to the stage producing the root container.
    pub fn source_stage(self: &Arc<Self>) -> Arc<Stage> {
        let mut current = Arc::clone(self);
        while let Some(upstream) = current.upstream() {
            current = upstream;
        }
        current
    }

    /// Animation frames available at this point of the chain.
    pub fn number_of_source_frames(&self) -> usize {
        let (params, enabled, upstream) = {
            let state = self.state();
            (state.params.clone(), state.enabled, state.upstream.clone())
        };
        match &self.kind {
            StageKind::Source(source) => source.number_of_frames(&params),
            StageKind::Modifier(transform) => {
                let upstream_frames = upstream.map_or(1, |u| u.number_of_source_frames());
                if enabled {
                    transform.number_of_source_frames(&params, upstream_frames)
                } else {
                    upstream_frames
                }
            }
        }
    }

    // ---- status -------------------------------------------------------

    /// Status of the most recent evaluation. Reports `Pending` while an
    /// asynchronous computation of this stage is outstanding.
    pub fn status(&self) -> PipelineStatus {
        let mut status = self.state().status.clone();
        if self.in_progress.load(Ordering::SeqCst) > 0 {
            status.set_kind(StatusType::Pending);
        }
        status
    }

    fn set_status(&self, status: PipelineStatus) {
        {
            let mut state = self.state();
            if state.status == status {
                return;
            }
            state.status = status.clone();
        }
        StageStatusChanged {
            stage_id: &self.id,
            status: &status,
        }
        .log();
        self.dependents.notify(&ChangeEvent::StatusChanged);
    }

    /// Number of asynchronous computations of this stage still running.
    pub fn in_progress_count(&self) -> usize {
        self.in_progress.load(Ordering::SeqCst)
    }

    // ---- caching ------------------------------------------------------

    /// Drops cached results outside `keep`. Evaluations already running
    /// for times outside `keep` will not store their results, and later
    /// requests for those times start over instead of joining them.
    pub fn invalidate(&self, keep: TimeInterval) {
        self.state().cache.invalidate(keep);
        self.inflight.detach_outside(&keep);
        StageInvalidated {
            stage_id: &self.id,
            keep,
        }
        .log();
    }

    /// Invalidates this stage and tells downstream stages to do the same.
    pub fn notify_changed(&self, keep: TimeInterval) {
        self.invalidate(keep);
        self.dependents
            .notify(&ChangeEvent::TargetChanged { unchanged: keep });
    }

    /// Forgets every cached result including the preliminary state.
    pub fn reset_cache(&self) {
        self.state().cache.reset();
        self.inflight.detach_outside(&TimeInterval::empty());
    }

    pub fn cached_intervals(&self) -> TimeIntervalUnion {
        self.state().cache.cached_intervals()
    }

    pub fn cache_len(&self) -> usize {
        self.state().cache.len()
    }

    pub fn set_cache_capacity(&self, capacity: usize) {
        self.state().cache.set_capacity(capacity);
    }

    /// Number of distinct time points currently being evaluated.
    pub fn in_flight_count(&self) -> usize {
        self.inflight.len()
    }

    /// Lets the stage's transform drop memoized artifacts not used since
    /// the last sweep.
    pub fn sweep_caches(&self) {
        if let StageKind::Modifier(transform) = &self.kind {
            transform.sweep_caches();
        }
    }

    // ---- persistence --------------------------------------------------

    pub fn save(&self, writer: &mut dyn Write) -> io::Result<()> {
        let params = self.params();
        match &self.kind {
            StageKind::Source(source) => source.save_params(&params, writer),
            StageKind::Modifier(transform) => transform.save_params(&params, writer),
        }
    }

    pub fn load(&self, reader: &mut dyn Read) -> io::Result<()> {
        let params = match &self.kind {
            StageKind::Source(source) => source.load_params(reader)?,
            StageKind::Modifier(transform) => transform.load_params(reader)?,
        };
        self.set_params(params);
        Ok(())
    }

    // ---- evaluation ---------------------------------------------------

    /// Requests the output of this stage at `request.time`.
    ///
    /// Answers from the cache when an entry covers the time. Otherwise the
    /// caller is attached to the evaluation running for that time, which is
    /// started if there is none. Dropping or canceling the returned handle
    /// withdraws the caller's interest.
    pub fn evaluate(self: &Arc<Self>, context: &EvalContext, request: EvaluationRequest) -> EvaluationHandle {
        let joined = {
            let mut state = self.state();
            if let Some(cached) = state.cache.get(request.time) {
                return EvaluationHandle::ready(cached);
            }
            self.inflight.join_or_start(request.time)
        };

        if let Some((cancel, completion)) = joined.started {
            let stage = Arc::clone(self);
            let context = context.clone();
            tokio::spawn(async move {
                let work = Arc::clone(&stage).compute(context, request, cancel.clone());
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Canceled),
                    result = work => result,
                };
                completion.complete(outcome);
            });
        }

        EvaluationHandle::waiting(joined.token)
    }

    /// Best-effort snapshot that never waits.
    ///
    /// Uses the last computed state of this stage if it covers `time`,
    /// otherwise the upstream snapshot run through the transform's
    /// preliminary path.
    pub fn evaluate_preliminary(&self, time: TimePoint) -> FlowState {
        let (cached, params, enabled, upstream) = {
            let state = self.state();
            (
                state.cache.preliminary().cloned(),
                state.params.clone(),
                state.enabled,
                state.upstream.clone(),
            )
        };
        if let Some(state) = &cached {
            if state.validity().contains(time) {
                return state.clone();
            }
        }

        let transform = match &self.kind {
            StageKind::Source(_) => return cached.unwrap_or_default(),
            StageKind::Modifier(transform) => transform,
        };
        let Some(upstream) = upstream else {
            return FlowState::default();
        };

        let input = upstream.evaluate_preliminary(time);
        if !enabled || input.objects().is_empty() {
            return input;
        }
        if input.status().is_error() && !transform.operates_on_errors() {
            return input;
        }

        let fallback = input.clone();
        match catch_unwind(AssertUnwindSafe(|| transform.apply_preliminary(&params, input, time))) {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => fallback.with_status(PipelineStatus::error(error.to_string())),
            Err(_) => fallback.with_status(PipelineStatus::error(self.unknown_error_text())),
        }
    }

    async fn compute(
        self: Arc<Self>,
        context: EvalContext,
        request: EvaluationRequest,
        cancel: CancellationToken,
    ) -> Result<FlowState, Canceled> {
        let started = Instant::now();
        EvaluationStarted {
            stage_id: &self.id,
            time: request.time,
        }
        .log();

        let (generation, params, enabled, upstream) = {
            let state = self.state();
            (
                state.cache.generation(),
                state.params.clone(),
                state.enabled,
                state.upstream.clone(),
            )
        };
        let stage_request = StageRequest {
            stage_id: self.id.clone(),
            title: self.title.clone(),
            params,
            time: request.time,
            context: context.clone(),
            cancel,
        };

        let output = match &self.kind {
            StageKind::Source(source) => {
                self.compute_source(Arc::clone(source), stage_request).await?
            }
            StageKind::Modifier(transform) => {
                self.compute_modifier(Arc::clone(transform), upstream, enabled, request, stage_request)
                    .await?
            }
        };

        {
            let _not_recorded = context.suspend_recording();
            // A violation has already been reported; the result is returned uncached.
            let _ = self
                .state()
                .cache
                .insert(output.clone(), request.time, generation);
        }
        self.dependents.notify(&ChangeEvent::PreliminaryStateAvailable);

        EvaluationCompleted {
            stage_id: &self.id,
            time: request.time,
            status: output.status().kind(),
            duration: started.elapsed(),
        }
        .log();
        Ok(output)
    }

    async fn compute_source(
        &self,
        source: Arc<dyn DataSource>,
        request: StageRequest,
    ) -> Result<FlowState, Canceled> {
        let time = request.time;
        let work: BoxFuture<Result<FlowState, ComputeError>> =
            Box::pin(async move { source.load_frame(&request).await });

        let output = match self.run_guarded(work).await {
            Guarded::Done(Ok(mut state)) => {
                let objects_validity = state
                    .objects()
                    .iter()
                    .fold(TimeInterval::infinite(), |acc, obj| acc.intersection(&obj.validity(time)));
                state.intersect_validity(&objects_validity);
                for slot in state.objects_mut() {
                    if let Some(obj) = Arc::get_mut(slot) {
                        if obj.meta().data_source().is_none() {
                            obj.meta_mut().set_data_source(&self.id);
                        }
                    }
                }
                self.set_status(state.status().clone());
                state
            }
            Guarded::Done(Err(ComputeError::Canceled)) => return Err(Canceled),
            Guarded::Done(Err(error)) => {
                self.failed(time, FlowState::new(TimeInterval::instant(time)), &error)
            }
            Guarded::Panicked => self.panicked(time, FlowState::new(TimeInterval::instant(time))),
        };
        Ok(output)
    }

    async fn compute_modifier(
        &self,
        transform: Arc<dyn Transform>,
        upstream: Option<Arc<Stage>>,
        enabled: bool,
        request: EvaluationRequest,
        stage_request: StageRequest,
    ) -> Result<FlowState, Canceled> {
        let time = request.time;
        let Some(upstream) = upstream else {
            return Ok(FlowState::new(TimeInterval::infinite()));
        };
        let mut input = upstream
            .evaluate(&stage_request.context, request)
            .wait()
            .await?;

        let input_was_error = input.status().is_error();
        if !input_was_error {
            input.set_status(PipelineStatus::success());
        } else if request.break_on_error || !transform.operates_on_errors() {
            self.pass_through("upstream reported an error");
            self.set_status(PipelineStatus::success());
            return Ok(input);
        }

        if !enabled {
            self.pass_through(DISABLED_STAGE_MESSAGE);
            self.set_status(PipelineStatus::new(StatusType::Success, DISABLED_STAGE_MESSAGE));
            return Ok(input);
        }
        if input.objects().is_empty() {
            self.pass_through("input is empty");
            return Ok(input);
        }

        let own_validity = transform.validity(&stage_request.params, time);
        let input_validity = input.validity();
        let backup = input.clone();
        let work: BoxFuture<Result<FlowState, ComputeError>> =
            Box::pin(async move { transform.apply(&stage_request, input).await });

        let output = match self.run_guarded(work).await {
            Guarded::Done(Ok(mut state)) => {
                state.intersect_validity(&input_validity);
                state.intersect_validity(&own_validity);
                if input_was_error && state.status().kind() != StatusType::Success {
                    self.set_status(PipelineStatus::success());
                } else {
                    self.set_status(state.status().clone());
                }
                state
            }
            Guarded::Done(Err(ComputeError::Canceled)) => return Err(Canceled),
            Guarded::Done(Err(error)) => self.failed(time, backup, &error),
            Guarded::Panicked => self.panicked(time, backup),
        };
        Ok(output)
    }

    /// Runs a stage computation, catching panics.
    ///
    /// The first poll happens in place. A computation that completes there
    /// never shows up as pending; one that suspends is moved to its own task
    /// and the stage reports `Pending` until it finishes.
    async fn run_guarded<T: Send + 'static>(
        &self,
        mut work: BoxFuture<Result<T, ComputeError>>,
    ) -> Guarded<T> {
        let first = std::future::poll_fn(|cx| {
            Poll::Ready(catch_unwind(AssertUnwindSafe(|| work.as_mut().poll(cx))))
        })
        .await;

        match first {
            Err(_) => Guarded::Panicked,
            Ok(Poll::Ready(result)) => Guarded::Done(result),
            Ok(Poll::Pending) => {
                let _pending = PendingGuard::new(self);
                match AbortOnDrop(tokio::spawn(work)).await {
                    Ok(result) => Guarded::Done(result),
                    Err(error) if error.is_panic() => Guarded::Panicked,
                    Err(_) => Guarded::Done(Err(ComputeError::Canceled)),
                }
            }
        }
    }

    fn pass_through(&self, reason: &str) {
        StagePassThrough {
            stage_id: &self.id,
            reason,
        }
        .log();
    }

    fn failed(&self, time: TimePoint, input: FlowState, error: &ComputeError) -> FlowState {
        StageComputeFailed {
            stage_id: &self.id,
            time,
            error,
        }
        .log();
        self.set_status(PipelineStatus::error(error.to_string()));
        input.with_status(PipelineStatus::error(format!(
            "Stage '{}' reported: {}",
            self.title, error
        )))
    }

    fn panicked(&self, time: TimePoint, input: FlowState) -> FlowState {
        StagePanicked {
            stage_id: &self.id,
            time,
        }
        .log();
        let status = PipelineStatus::error(self.unknown_error_text());
        self.set_status(status.clone());
        input.with_status(status)
    }

    fn unknown_error_text(&self) -> String {
        format!("Unknown error during evaluation of stage '{}'", self.title)
    }

    fn pending_changed(&self, in_progress: usize) {
        StagePending {
            stage_id: &self.id,
            in_progress,
        }
        .log();
        self.dependents.notify(&ChangeEvent::StatusChanged);
    }
}

impl Dependent for Stage {
    fn handle_event(&self, event: &ChangeEvent) {
        match event {
            ChangeEvent::TargetChanged { unchanged } => self.notify_changed(*unchanged),
            ChangeEvent::PipelineChanged | ChangeEvent::EnabledOrDisabled => {
                self.notify_changed(TimeInterval::empty())
            }
            ChangeEvent::PreliminaryStateAvailable => self.dependents.notify(event),
            ChangeEvent::StatusChanged | ChangeEvent::TargetDeleted => {}
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("kind", &self.kind.name())
            .field("enabled", &state.enabled)
            .field("upstream", &state.upstream.as_ref().map(|u| u.id.clone()))
            .field("status", &state.status)
            .field("cached", &state.cache.len())
            .finish()
    }
}

/// Counts a suspended computation of a stage for as long as it lives.
struct PendingGuard<'a> {
    stage: &'a Stage,
}

impl<'a> PendingGuard<'a> {
    fn new(stage: &'a Stage) -> Self {
        if stage.in_progress.fetch_add(1, Ordering::SeqCst) == 0 {
            stage.pending_changed(1);
        }
        Self { stage }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.stage.in_progress.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.stage.pending_changed(0);
        }
    }
}

/// Aborts the spawned computation when the awaiting evaluation is dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Future for AbortOnDrop<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{CountingTransform, EventProbe, FailingTransform, StubSource};
    use crate::config::consts::DEFAULT_CACHE_ENTRIES;

    fn chain() -> (Arc<Stage>, Arc<Stage>, Arc<CountingTransform>) {
        let source = Stage::new(
            "source",
            StageKind::Source(Arc::new(StubSource::new(4))),
            StageParams::new(),
            DEFAULT_CACHE_ENTRIES,
        );
        let counting = Arc::new(CountingTransform::new());
        let scale = Stage::new(
            "scale",
            StageKind::Modifier(counting.clone()),
            StageParams::new().with("factor", 2.0),
            DEFAULT_CACHE_ENTRIES,
        );
        scale.set_upstream(Some(source.clone())).unwrap();
        (source, scale, counting)
    }

    #[tokio::test]
    async fn test_cached_result_skips_compute() {
        let (_source, scale, counting) = chain();
        let context = EvalContext::default();

        let first = scale.evaluate(&context, EvaluationRequest::new(0)).wait().await.unwrap();
        assert_eq!(counting.calls(), 1);

        let handle = scale.evaluate(&context, EvaluationRequest::new(10));
        assert!(handle.is_ready());
        let second = handle.wait().await.unwrap();
        assert_eq!(counting.calls(), 1);
        assert_eq!(first.objects()[0].id(), second.objects()[0].id());
    }

    #[tokio::test]
    async fn test_source_cannot_take_upstream() {
        let (source, scale, _) = chain();
        let result = source.set_upstream(Some(scale.clone()));
        assert!(matches!(result, Err(PipelineError::SourceHasNoUpstream(_))));
    }

    #[tokio::test]
    async fn test_failure_wraps_pre_stage_input() {
        let source = Stage::new(
            "source",
            StageKind::Source(Arc::new(StubSource::new(1))),
            StageParams::new(),
            DEFAULT_CACHE_ENTRIES,
        );
        let failing = Stage::with_title(
            "fail",
            "Failing stage",
            StageKind::Modifier(Arc::new(FailingTransform::new("bad column"))),
            StageParams::new(),
            DEFAULT_CACHE_ENTRIES,
        );
        failing.set_upstream(Some(source.clone())).unwrap();
        let context = EvalContext::default();

        let input = source.evaluate(&context, EvaluationRequest::new(0)).wait().await.unwrap();
        let output = failing.evaluate(&context, EvaluationRequest::new(0)).wait().await.unwrap();

        assert_eq!(output.status().kind(), StatusType::Error);
        assert_eq!(output.status().text(), "Stage 'Failing stage' reported: bad column");
        let ids = |s: &FlowState| s.objects().iter().map(|o| o.id()).collect::<Vec<_>>();
        assert_eq!(ids(&output), ids(&input));
        assert_eq!(failing.status().text(), "bad column");
        assert_eq!(failing.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_disabled_stage_passes_through() {
        let (_source, scale, counting) = chain();
        let context = EvalContext::default();
        scale.set_enabled(false);

        let output = scale.evaluate(&context, EvaluationRequest::new(0)).wait().await.unwrap();
        assert_eq!(counting.calls(), 0);
        assert_eq!(output.status().kind(), StatusType::Success);
        assert_eq!(scale.status().text(), DISABLED_STAGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_set_parameter_notifies_dependents() {
        let (_source, scale, _) = chain();
        let probe = EventProbe::new();
        let dependent: Arc<dyn Dependent> = probe.clone();
        scale.dependents().add_dependent(&dependent);

        scale.set_parameter("factor", 3.0);
        assert!(probe
            .events()
            .iter()
            .any(|e| matches!(e, ChangeEvent::TargetChanged { .. })));

        scale.dependents().remove_dependent(&dependent);
    }

    #[tokio::test]
    async fn test_preliminary_uses_last_result() {
        let (_source, scale, counting) = chain();
        let context = EvalContext::default();

        let before = scale.evaluate_preliminary(0);
        assert!(before.objects().is_empty());

        scale.evaluate(&context, EvaluationRequest::new(0)).wait().await.unwrap();
        let calls = counting.calls();
        let snapshot = scale.evaluate_preliminary(0);
        assert_eq!(snapshot.status().kind(), StatusType::Success);
        assert_eq!(counting.calls(), calls);
    }

    #[test]
    fn test_number_of_source_frames_flows_downstream() {
        let (source, scale, _) = chain();
        assert_eq!(source.number_of_source_frames(), 4);
        assert_eq!(scale.number_of_source_frames(), 4);
        assert!(Arc::ptr_eq(&scale.source_stage(), &source));
    }
}
