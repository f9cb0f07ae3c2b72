// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The stage graph as seen by a consumer.
//!
//! A [`Pipeline`] owns one data source and any number of modifier stages
//! linked through their upstream pointers. Several stages may read from the
//! same upstream stage, so the graph is a tree rooted at the source. The
//! head stage is the one whose output a consumer sees by default.
//!
//! Topology and parameter changes take `&mut self` and are recorded with the
//! context's mutation recorder. The bookkeeping they trigger (relinking,
//! invalidation) runs with recording suspended.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::data::{FlowState, PipelineStatus};
use crate::engine::inflight::EvaluationHandle;
use crate::engine::stage::Stage;
use crate::engine::{EvalContext, EvaluationRequest};
use crate::errors::{Canceled, PipelineError};
use crate::notify::ChangeEvent;
use crate::observability::messages::engine::{
    PipelineEvaluated, PipelinePersisted, StageInserted, StageRemoved,
};
use crate::observability::messages::StructuredLog;
use crate::time::TimePoint;
use crate::traits::Exporter;

pub struct Pipeline {
    context: EvalContext,
    stages: Vec<Arc<Stage>>,
    head: String,
    last_good: Mutex<Option<FlowState>>,
}

impl Pipeline {
    /// Creates a pipeline consisting of `source` only.
    pub fn new(context: EvalContext, source: Arc<Stage>) -> Result<Self, PipelineError> {
        if !source.is_source() {
            return Err(PipelineError::NotASource(source.id().to_string()));
        }
        Ok(Self {
            context,
            head: source.id().to_string(),
            stages: vec![source],
            last_good: Mutex::new(None),
        })
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    pub fn stage(&self, id: &str) -> Option<&Arc<Stage>> {
        self.stages.iter().find(|s| s.id() == id)
    }

    fn require(&self, id: &str) -> Result<&Arc<Stage>, PipelineError> {
        self.stage(id)
            .ok_or_else(|| PipelineError::UnknownStage(id.to_string()))
    }

    /// All stages in insertion order.
    pub fn stages(&self) -> &[Arc<Stage>] {
        &self.stages
    }

    pub fn source_stage(&self) -> Arc<Stage> {
        self.head_stage().source_stage()
    }

    pub fn head_stage(&self) -> Arc<Stage> {
        match self.stage(&self.head) {
            Some(stage) => Arc::clone(stage),
            None => Arc::clone(&self.stages[0]),
        }
    }

    pub fn set_head(&mut self, id: &str) -> Result<(), PipelineError> {
        self.require(id)?;
        self.head = id.to_string();
        Ok(())
    }

    /// Stages ordered so that every stage comes after its upstream stage.
    pub fn topological_order(&self) -> Vec<Arc<Stage>> {
        let depth = |stage: &Arc<Stage>| {
            let mut hops = 0usize;
            let mut current = stage.upstream();
            while let Some(upstream) = current {
                hops += 1;
                current = upstream.upstream();
            }
            hops
        };
        let mut ordered: Vec<(usize, Arc<Stage>)> =
            self.stages.iter().map(|s| (depth(s), Arc::clone(s))).collect();
        ordered.sort_by_key(|(hops, _)| *hops);
        ordered.into_iter().map(|(_, stage)| stage).collect()
    }

    fn record(&self, description: String) {
        let recorder = self.context.recorder();
        if recorder.is_recording() {
            recorder.record(&description);
        }
    }

    // ---- topology -----------------------------------------------------

    /// Appends a modifier stage reading from `upstream`, or from the current
    /// head when `upstream` is `None`. A stage appended to the head becomes
    /// the new head.
    pub fn insert_stage(&mut self, stage: Arc<Stage>, upstream: Option<&str>) -> Result<(), PipelineError> {
        if self.stage(stage.id()).is_some() {
            return Err(PipelineError::DuplicateStage(stage.id().to_string()));
        }
        if stage.is_source() {
            return Err(PipelineError::SourceHasNoUpstream(stage.id().to_string()));
        }
        let upstream_id = upstream.unwrap_or(self.head.as_str()).to_string();
        let upstream_stage = Arc::clone(self.require(&upstream_id)?);

        self.record(format!("Insert stage '{}'", stage.id()));
        {
            let _bookkeeping = self.context.suspend_recording();
            stage.set_upstream(Some(upstream_stage))?;
        }
        StageInserted {
            stage_id: stage.id(),
            upstream: Some(&upstream_id),
        }
        .log();

        if upstream_id == self.head {
            self.head = stage.id().to_string();
        }
        self.stages.push(stage);
        Ok(())
    }

    /// Removes a modifier stage. Stages that read from it are reconnected to
    /// its upstream stage and recompute.
    pub fn remove_stage(&mut self, id: &str) -> Result<Arc<Stage>, PipelineError> {
        let stage = Arc::clone(self.require(id)?);
        if stage.is_source() {
            return Err(PipelineError::SourceNotRemovable(id.to_string()));
        }
        let upstream = stage.upstream();

        self.record(format!("Delete stage '{}'", id));
        {
            let _bookkeeping = self.context.suspend_recording();
            for other in &self.stages {
                let reads_from_removed = other
                    .upstream()
                    .map_or(false, |u| Arc::ptr_eq(&u, &stage));
                if reads_from_removed {
                    other.set_upstream(upstream.clone())?;
                }
            }
            stage.set_upstream(None)?;
            stage.dependents().notify(&ChangeEvent::TargetDeleted);
            stage.reset_cache();
        }

        if self.head == id {
            self.head = match &upstream {
                Some(u) => u.id().to_string(),
                None => self.stages[0].id().to_string(),
            };
        }
        self.stages.retain(|s| !Arc::ptr_eq(s, &stage));
        StageRemoved { stage_id: id }.log();
        Ok(stage)
    }

    /// Reconnects `id` to read from `upstream_id`.
    pub fn set_upstream(&mut self, id: &str, upstream_id: &str) -> Result<(), PipelineError> {
        let stage = Arc::clone(self.require(id)?);
        let upstream = Arc::clone(self.require(upstream_id)?);

        let mut current = Some(Arc::clone(&upstream));
        while let Some(candidate) = current {
            if Arc::ptr_eq(&candidate, &stage) {
                return Err(PipelineError::UpstreamCycle {
                    stage_id: id.to_string(),
                    upstream: upstream_id.to_string(),
                });
            }
            current = candidate.upstream();
        }

        self.record(format!("Connect '{}' to '{}'", id, upstream_id));
        let _bookkeeping = self.context.suspend_recording();
        stage.set_upstream(Some(upstream))
    }

    // ---- parameters ---------------------------------------------------

    pub fn set_parameter(
        &mut self,
        id: &str,
        key: &str,
        value: impl Into<serde_yaml::Value>,
    ) -> Result<Option<serde_yaml::Value>, PipelineError> {
        let stage = Arc::clone(self.require(id)?);
        self.record(format!("Change parameter '{}' of '{}'", key, id));
        let _bookkeeping = self.context.suspend_recording();
        Ok(stage.set_parameter(key, value))
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), PipelineError> {
        let stage = Arc::clone(self.require(id)?);
        let verb = if enabled { "Enable" } else { "Disable" };
        self.record(format!("{} stage '{}'", verb, id));
        let _bookkeeping = self.context.suspend_recording();
        stage.set_enabled(enabled);
        Ok(())
    }

    // ---- evaluation ---------------------------------------------------

    /// A request for `time` honoring the configured error handling.
    pub fn request(&self, time: TimePoint) -> EvaluationRequest {
        EvaluationRequest::new(time).with_break_on_error(self.context.settings().break_on_error)
    }

    /// Requests the head stage's output.
    pub fn evaluate(&self, request: EvaluationRequest) -> EvaluationHandle {
        self.head_stage().evaluate(&self.context, request)
    }

    pub fn evaluate_stage(&self, id: &str, request: EvaluationRequest) -> Result<EvaluationHandle, PipelineError> {
        Ok(self.require(id)?.evaluate(&self.context, request))
    }

    /// Evaluates the head stage to completion, then lets the stages on the
    /// head's chain drop memoized artifacts that this evaluation did not
    /// touch. Stages on other branches keep theirs.
    pub async fn evaluate_pipeline(&self, request: EvaluationRequest) -> Result<FlowState, Canceled> {
        let started = Instant::now();
        let head = self.head_stage();
        let state = head.evaluate(&self.context, request).wait().await?;

        if !state.status().is_error() {
            *self.last_good.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        }
        for stage in self.head_chain() {
            stage.sweep_caches();
        }

        PipelineEvaluated {
            head_stage: head.id(),
            time: request.time,
            status: &self.status(),
            duration: started.elapsed(),
        }
        .log();
        Ok(state)
    }

    /// Like [`Pipeline::evaluate_pipeline`], but a failed evaluation shows
    /// the last successful result annotated with the current error.
    pub async fn evaluate_for_display(&self, request: EvaluationRequest) -> Result<FlowState, Canceled> {
        let state = self.evaluate_pipeline(request).await?;
        if !state.status().is_error() {
            return Ok(state);
        }
        let last_good = self
            .last_good
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(match last_good {
            Some(previous) => previous.with_status(state.status().clone()),
            None => state,
        })
    }

    /// Immediate, possibly stale snapshot of the head stage's output.
    pub fn evaluate_preliminary(&self, time: TimePoint) -> FlowState {
        self.head_stage().evaluate_preliminary(time)
    }

    // ---- queries ------------------------------------------------------

    /// Stages from the source to the head stage.
    fn head_chain(&self) -> Vec<Arc<Stage>> {
        let mut chain = Vec::new();
        let mut current = Some(self.head_stage());
        while let Some(stage) = current {
            current = stage.upstream();
            chain.push(stage);
        }
        chain.reverse();
        chain
    }

    /// Statuses along the chain from the source to the head stage.
    pub fn stage_statuses(&self) -> Vec<(String, PipelineStatus)> {
        self.head_chain()
            .iter()
            .map(|stage| (stage.id().to_string(), stage.status()))
            .collect()
    }

    /// Worst status along the head stage's chain.
    pub fn status(&self) -> PipelineStatus {
        let statuses = self.stage_statuses();
        PipelineStatus::worst_of(statuses.iter().map(|(_, status)| status))
    }

    pub fn number_of_source_frames(&self) -> usize {
        self.head_stage().number_of_source_frames()
    }

    // ---- persistence --------------------------------------------------

    /// Writes every stage's parameters, upstream stages first. `open` maps a
    /// stage to the stream receiving its state.
    pub fn save<F>(&self, mut open: F) -> Result<(), PipelineError>
    where
        F: FnMut(&Stage) -> io::Result<Box<dyn Write>>,
    {
        let ordered = self.topological_order();
        for stage in &ordered {
            let persist = |source| PipelineError::Persistence {
                stage_id: stage.id().to_string(),
                source,
            };
            let mut writer = open(stage).map_err(persist)?;
            stage.save(&mut writer).map_err(persist)?;
            writer.flush().map_err(persist)?;
        }
        PipelinePersisted {
            action: "save",
            stage_count: ordered.len(),
        }
        .log();
        Ok(())
    }

    /// Restores every stage's parameters, upstream stages first.
    pub fn load<F>(&mut self, mut open: F) -> Result<(), PipelineError>
    where
        F: FnMut(&Stage) -> io::Result<Box<dyn Read>>,
    {
        let ordered = self.topological_order();
        let _restoring = self.context.suspend_recording();
        for stage in &ordered {
            let persist = |source| PipelineError::Persistence {
                stage_id: stage.id().to_string(),
                source,
            };
            let mut reader = open(stage).map_err(persist)?;
            stage.load(&mut reader).map_err(persist)?;
        }
        PipelinePersisted {
            action: "load",
            stage_count: ordered.len(),
        }
        .log();
        Ok(())
    }

    /// Saves one `<stage id>.json` file per stage into `dir`.
    pub fn save_to_dir(&self, dir: &Path) -> Result<(), PipelineError> {
        self.save(|stage| {
            let file = File::create(dir.join(format!("{}.json", stage.id())))?;
            Ok(Box::new(BufWriter::new(file)) as Box<dyn Write>)
        })
    }

    pub fn load_from_dir(&mut self, dir: &Path) -> Result<(), PipelineError> {
        let dir = dir.to_path_buf();
        self.load(move |stage| {
            let file = File::open(dir.join(format!("{}.json", stage.id())))?;
            Ok(Box::new(BufReader::new(file)) as Box<dyn Read>)
        })
    }

    // ---- export -------------------------------------------------------

    /// Evaluates the head stage at each time and hands the results to
    /// `exporter`. Returns the number of exported frames.
    pub async fn export_frames(&self, exporter: &dyn Exporter, times: &[TimePoint]) -> Result<usize, PipelineError> {
        for &time in times {
            let state = self.evaluate_pipeline(self.request(time)).await?;
            exporter
                .export_frame(time, &state)
                .await
                .map_err(|source| PipelineError::Export { time, source })?;
        }
        Ok(times.len())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("head", &self.head)
            .field("stages", &self.stages.iter().map(|s| s.id()).collect::<Vec<_>>())
            .finish()
    }
}
