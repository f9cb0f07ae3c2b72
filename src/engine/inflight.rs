// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-flight evaluations and the interest tokens that keep them alive.
//!
//! Each stage keeps at most one running evaluation per requested time point.
//! Callers asking for the same time while it runs attach to it and wait on a
//! shared `watch` channel. Every caller holds an [`InterestToken`]; when the
//! last one is dropped the evaluation's [`CancellationToken`] fires and the
//! evaluation resolves to [`Canceled`].
//!
//! Interest counts only change under the registry lock, so a caller can
//! never join an evaluation that is concurrently being abandoned.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::data::FlowState;
use crate::errors::Canceled;
use crate::observability::messages::engine::{EvaluationCanceled, EvaluationJoined, EvaluationsDetached};
use crate::observability::messages::StructuredLog;
use crate::time::{TimeInterval, TimePoint};

type Outcome = Option<Result<FlowState, Canceled>>;

pub(crate) struct InFlight {
    time: TimePoint,
    interest: usize,
    cancel: CancellationToken,
    result: watch::Sender<Outcome>,
}

type FlightRef = Arc<Mutex<InFlight>>;

pub(crate) struct InflightRegistry {
    stage_id: String,
    flights: Mutex<HashMap<TimePoint, FlightRef>>,
}

/// Result of [`InflightRegistry::join_or_start`].
pub(crate) struct Joined {
    pub token: InterestToken,
    /// Set when the caller created the evaluation and must run it.
    pub started: Option<(CancellationToken, Completion)>,
}

impl InflightRegistry {
    pub(crate) fn new(stage_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            stage_id: stage_id.into(),
            flights: Mutex::new(HashMap::new()),
        })
    }

    fn flights(&self) -> MutexGuard<'_, HashMap<TimePoint, FlightRef>> {
        self.flights.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attaches to the evaluation running for `time`, or registers a new one.
    pub(crate) fn join_or_start(self: &Arc<Self>, time: TimePoint) -> Joined {
        let mut flights = self.flights();

        if let Some(existing) = flights.get(&time) {
            let mut flight = lock(existing);
            if !flight.cancel.is_cancelled() {
                flight.interest += 1;
                EvaluationJoined {
                    stage_id: &self.stage_id,
                    time,
                    interested: flight.interest,
                }
                .log();
                let receiver = flight.result.subscribe();
                drop(flight);
                return Joined {
                    token: InterestToken {
                        registry: Arc::clone(self),
                        flight: Arc::clone(existing),
                        receiver,
                    },
                    started: None,
                };
            }
        }

        let cancel = CancellationToken::new();
        let (sender, receiver) = watch::channel(None);
        let flight = Arc::new(Mutex::new(InFlight {
            time,
            interest: 1,
            cancel: cancel.clone(),
            result: sender,
        }));
        flights.insert(time, Arc::clone(&flight));

        Joined {
            token: InterestToken {
                registry: Arc::clone(self),
                flight: Arc::clone(&flight),
                receiver,
            },
            started: Some((
                cancel,
                Completion {
                    registry: Arc::clone(self),
                    flight,
                },
            )),
        }
    }

    fn release(&self, flight: &FlightRef) {
        let mut flights = self.flights();
        let mut state = lock(flight);
        state.interest = state.interest.saturating_sub(1);
        if state.interest > 0 {
            return;
        }
        let finished = state.result.borrow().is_some();
        if !finished {
            state.cancel.cancel();
            EvaluationCanceled {
                stage_id: &self.stage_id,
                time: state.time,
            }
            .log();
        }
        let time = state.time;
        drop(state);
        if flights.get(&time).is_some_and(|f| Arc::ptr_eq(f, flight)) {
            flights.remove(&time);
        }
    }

    /// Unregisters every running evaluation whose time lies outside `keep`.
    ///
    /// Detached evaluations keep running for the callers already attached to
    /// them, but later requests for the same time start a fresh evaluation
    /// instead of joining one that captured stale inputs.
    pub(crate) fn detach_outside(&self, keep: &TimeInterval) -> usize {
        let mut flights = self.flights();
        let before = flights.len();
        flights.retain(|time, _| keep.contains(*time));
        let detached = before - flights.len();
        if detached > 0 {
            EvaluationsDetached {
                stage_id: &self.stage_id,
                detached,
            }
            .log();
        }
        detached
    }

    /// Number of evaluations currently running.
    pub(crate) fn len(&self) -> usize {
        self.flights().len()
    }
}

fn lock(flight: &FlightRef) -> MutexGuard<'_, InFlight> {
    flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Write side of an in-flight evaluation, owned by the task running it.
pub(crate) struct Completion {
    registry: Arc<InflightRegistry>,
    flight: FlightRef,
}

impl Completion {
    /// Publishes the outcome to all waiters and unregisters the evaluation.
    pub(crate) fn complete(self, outcome: Result<FlowState, Canceled>) {
        let mut flights = self.registry.flights();
        let state = lock(&self.flight);
        if flights.get(&state.time).is_some_and(|f| Arc::ptr_eq(f, &self.flight)) {
            flights.remove(&state.time);
        }
        state.result.send_replace(Some(outcome));
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        // A task that ends without completing (aborted runtime) must not
        // leave waiters hanging.
        let state = lock(&self.flight);
        if state.result.borrow().is_none() {
            state.result.send_replace(Some(Err(Canceled)));
        }
    }
}

/// A caller's interest in an in-flight evaluation.
///
/// Dropping the token withdraws the interest.
pub struct InterestToken {
    registry: Arc<InflightRegistry>,
    flight: FlightRef,
    receiver: watch::Receiver<Outcome>,
}

impl InterestToken {
    /// Waits for the evaluation's outcome.
    pub async fn wait(&mut self) -> Result<FlowState, Canceled> {
        match self.receiver.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(Canceled)),
            Err(_) => Err(Canceled),
        }
    }
}

impl Drop for InterestToken {
    fn drop(&mut self) {
        self.registry.release(&self.flight);
    }
}

/// Future-like handle for a stage evaluation.
///
/// Either already resolved (cache hit) or attached to an in-flight
/// evaluation. Dropping the handle withdraws the caller's interest.
pub struct EvaluationHandle {
    state: HandleState,
}

enum HandleState {
    Ready(FlowState),
    Waiting(InterestToken),
}

impl EvaluationHandle {
    pub(crate) fn ready(state: FlowState) -> Self {
        Self {
            state: HandleState::Ready(state),
        }
    }

    pub(crate) fn waiting(token: InterestToken) -> Self {
        Self {
            state: HandleState::Waiting(token),
        }
    }

    /// True if the result was served from cache.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, HandleState::Ready(_))
    }

    pub async fn wait(self) -> Result<FlowState, Canceled> {
        match self.state {
            HandleState::Ready(state) => Ok(state),
            HandleState::Waiting(mut token) => token.wait().await,
        }
    }

    /// Withdraws the caller's interest.
    pub fn cancel(self) {
        drop(self);
    }
}

impl std::fmt::Debug for EvaluationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}
