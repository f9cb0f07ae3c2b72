// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backends::stub::{
    BlockingTransform, CountingTransform, ErrorTolerantTransform, EventProbe, FailingTransform,
    GatedTransform, PanickingTransform, StubSource, WarningTransform,
};
use crate::backends::local::ColumnStatisticsTransform;
use crate::config::consts::DEFAULT_CACHE_ENTRIES;
use crate::data::{FlowState, StatusType, Table};
use crate::engine::{EvalContext, EvalSettings, EvaluationRequest, Pipeline, Stage, StageKind, WorkerPool};
use crate::errors::PipelineError;
use crate::notify::{ChangeEvent, Dependent};
use crate::recorder::{ActionLog, MutationRecorder};
use crate::traits::{Exporter, StageParams, Transform};

/// Integration tests for stage chains built from stub stages
#[cfg(test)]
mod tests {
    use super::*;

    fn source(frames: usize) -> (Arc<Stage>, Arc<StubSource>) {
        let stub = Arc::new(StubSource::new(frames));
        let stage = Stage::new(
            "source",
            StageKind::Source(stub.clone()),
            StageParams::new(),
            DEFAULT_CACHE_ENTRIES,
        );
        (stage, stub)
    }

    fn modifier(id: &str, transform: Arc<dyn Transform>, params: StageParams) -> Arc<Stage> {
        Stage::new(id, StageKind::Modifier(transform), params, DEFAULT_CACHE_ENTRIES)
    }

    fn column_x(state: &FlowState) -> Vec<f64> {
        state
            .find_object::<Table>()
            .and_then(|t| t.column("x"))
            .map(<[f64]>::to_vec)
            .unwrap_or_default()
    }

    async fn eventually(condition: impl Fn() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition was not reached in time");
    }

    #[tokio::test]
    async fn test_chain_applies_stages_in_order() {
        let (src, _) = source(3);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let counting = Arc::new(CountingTransform::new());
        pipeline
            .insert_stage(modifier("double", counting.clone(), StageParams::new().with("factor", 2.0)), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("triple", counting.clone(), StageParams::new().with("factor", 3.0)), None)
            .unwrap();

        let state = pipeline.evaluate_pipeline(pipeline.request(480)).await.unwrap();
        assert_eq!(column_x(&state), vec![6.0, 12.0, 18.0]);
        assert_eq!(pipeline.head_stage().id(), "triple");
        assert_eq!(pipeline.status().kind(), StatusType::Success);
        assert_eq!(counting.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_compute_within_validity() {
        let (src, stub) = source(3);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let counting = Arc::new(CountingTransform::new());
        pipeline
            .insert_stage(modifier("scale", counting.clone(), StageParams::new()), None)
            .unwrap();

        pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        pipeline.evaluate_pipeline(pipeline.request(479)).await.unwrap();
        assert_eq!(counting.calls(), 1);
        assert_eq!(stub.loads(), 1);

        pipeline.evaluate_pipeline(pipeline.request(480)).await.unwrap();
        assert_eq!(counting.calls(), 2);
        assert_eq!(stub.loads(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let counting = Arc::new(CountingTransform::new());
        pipeline
            .insert_stage(modifier("scale", counting.clone(), StageParams::new()), None)
            .unwrap();

        let first = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        pipeline.stage("scale").unwrap().invalidate(Default::default());
        let handle = pipeline.evaluate(pipeline.request(0));
        assert!(!handle.is_ready());
        let second = handle.wait().await.unwrap();

        assert_eq!(counting.calls(), 2);
        assert_ne!(first.objects()[0].id(), second.objects()[0].id());
    }

    #[tokio::test]
    async fn test_parameter_change_invalidates_downstream_only() {
        let (src, stub) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src.clone()).unwrap();
        let b = Arc::new(CountingTransform::new());
        let c = Arc::new(CountingTransform::new());
        pipeline
            .insert_stage(modifier("b", b.clone(), StageParams::new().with("factor", 2.0)), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("c", c.clone(), StageParams::new()), None)
            .unwrap();

        let before = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(column_x(&before), vec![0.0, 2.0, 4.0]);

        pipeline.set_parameter("b", "factor", 10.0).unwrap();
        assert_eq!(src.cache_len(), 1);
        assert_eq!(pipeline.stage("b").unwrap().cache_len(), 0);
        assert_eq!(pipeline.stage("c").unwrap().cache_len(), 0);

        let after = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(column_x(&after), vec![0.0, 10.0, 20.0]);
        assert_eq!(stub.loads(), 1);
        assert_eq!(b.calls(), 2);
        assert_eq!(c.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_computation() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();

        let handles: Vec<_> = (0..5).map(|_| pipeline.evaluate(pipeline.request(0))).collect();
        gated.wait_started().await;
        assert_eq!(pipeline.head_stage().in_flight_count(), 1);
        gated.open();

        for handle in handles {
            handle.wait().await.unwrap();
        }
        assert_eq!(gated.calls(), 1);
        assert_eq!(pipeline.head_stage().in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_canceling_one_caller_keeps_the_others() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();

        let leaving = pipeline.evaluate(pipeline.request(0));
        let staying = pipeline.evaluate(pipeline.request(0));
        gated.wait_started().await;
        leaving.cancel();
        gated.open();

        let state = staying.wait().await.unwrap();
        assert_eq!(column_x(&state), vec![0.0, 1.0, 2.0]);
        assert_eq!(gated.calls(), 1);
    }

    #[tokio::test]
    async fn test_canceling_last_caller_abandons_computation() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();
        let stage = pipeline.head_stage();

        let handle = pipeline.evaluate(pipeline.request(0));
        gated.wait_started().await;
        assert_eq!(stage.in_flight_count(), 1);
        handle.cancel();
        assert_eq!(stage.in_flight_count(), 0);

        eventually(|| stage.in_progress_count() == 0).await;
        assert_eq!(stage.cache_len(), 0);

        gated.open();
        pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(gated.calls(), 2);
    }

    #[tokio::test]
    async fn test_canceling_downstream_releases_upstream() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("after", Arc::new(CountingTransform::new()), StageParams::new()), None)
            .unwrap();
        let upstream = pipeline.stage("gated").unwrap().clone();

        let handle = pipeline.evaluate(pipeline.request(0));
        gated.wait_started().await;
        assert_eq!(upstream.in_flight_count(), 1);

        handle.cancel();
        eventually(|| upstream.in_flight_count() == 0).await;
    }

    #[tokio::test]
    async fn test_suspended_stage_reports_pending() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();
        let stage = pipeline.head_stage();
        let probe = EventProbe::new();
        let dependent: Arc<dyn Dependent> = probe.clone();
        stage.dependents().add_dependent(&dependent);

        let handle = pipeline.evaluate(pipeline.request(0));
        gated.wait_started().await;
        eventually(|| stage.status().kind() == StatusType::Pending).await;
        assert_eq!(pipeline.status().kind(), StatusType::Pending);

        gated.open();
        handle.wait().await.unwrap();
        eventually(|| stage.status().kind() == StatusType::Success).await;
        assert!(probe.count(|e| matches!(e, ChangeEvent::StatusChanged)) >= 2);

        stage.dependents().remove_dependent(&dependent);
    }

    #[tokio::test]
    async fn test_synchronous_stage_never_pending() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        pipeline
            .insert_stage(modifier("scale", Arc::new(CountingTransform::new()), StageParams::new()), None)
            .unwrap();
        let stage = pipeline.head_stage();
        let probe = EventProbe::new();
        let dependent: Arc<dyn Dependent> = probe.clone();
        stage.dependents().add_dependent(&dependent);

        pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(probe.count(|e| matches!(e, ChangeEvent::StatusChanged)), 0);
        assert!(probe.count(|e| matches!(e, ChangeEvent::PreliminaryStateAvailable)) >= 1);

        stage.dependents().remove_dependent(&dependent);
    }

    #[tokio::test]
    async fn test_error_passes_through_downstream() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src.clone()).unwrap();
        let after = Arc::new(CountingTransform::new());
        pipeline
            .insert_stage(modifier("fail", Arc::new(FailingTransform::new("no such column")), StageParams::new()), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("after", after.clone(), StageParams::new()), None)
            .unwrap();

        let input = src.evaluate(pipeline.context(), pipeline.request(0)).wait().await.unwrap();
        let state = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();

        assert_eq!(state.status().kind(), StatusType::Error);
        assert_eq!(state.status().text(), "Stage 'fail' reported: no such column");
        assert_eq!(state.objects()[0].id(), input.objects()[0].id());
        assert_eq!(after.calls(), 0);
        assert_eq!(pipeline.status().kind(), StatusType::Error);
        assert_eq!(pipeline.stage("fail").unwrap().cache_len(), 0);

        let statuses = pipeline.stage_statuses();
        let ids: Vec<_> = statuses.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["source", "fail", "after"]);
        assert_eq!(statuses[2].1.kind(), StatusType::Success);
    }

    #[tokio::test]
    async fn test_error_tolerant_stage_runs_unless_breaking() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let tolerant = Arc::new(ErrorTolerantTransform::default());
        pipeline
            .insert_stage(modifier("fail", Arc::new(FailingTransform::new("bad")), StageParams::new()), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("tolerant", tolerant.clone(), StageParams::new()), None)
            .unwrap();

        let state = pipeline
            .evaluate_pipeline(EvaluationRequest::new(0).with_break_on_error(true))
            .await
            .unwrap();
        assert_eq!(tolerant.calls(), 0);
        assert!(state.attribute("tolerant").is_none());

        pipeline.stage("tolerant").unwrap().invalidate(Default::default());
        let state = pipeline.evaluate_pipeline(EvaluationRequest::new(0)).await.unwrap();
        assert_eq!(tolerant.calls(), 1);
        assert!(state.attribute("tolerant").is_some());
        assert_eq!(state.status().kind(), StatusType::Error);
    }

    #[tokio::test]
    async fn test_panicking_stage_becomes_error_container() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        pipeline
            .insert_stage(modifier("boom", Arc::new(PanickingTransform), StageParams::new()), None)
            .unwrap();

        let state = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(state.status().kind(), StatusType::Error);
        assert_eq!(
            state.status().text(),
            "Unknown error during evaluation of stage 'boom'"
        );
        assert_eq!(column_x(&state), vec![0.0, 1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_warning_is_aggregated() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        pipeline
            .insert_stage(modifier("warn", Arc::new(WarningTransform), StageParams::new()), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("scale", Arc::new(CountingTransform::new()), StageParams::new()), None)
            .unwrap();

        pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        let status = pipeline.status();
        assert_eq!(status.kind(), StatusType::Warning);
        assert_eq!(status.text(), "values look suspicious");
    }

    #[tokio::test]
    async fn test_disabled_stage_is_skipped() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let counting = Arc::new(CountingTransform::new());
        pipeline
            .insert_stage(modifier("scale", counting.clone(), StageParams::new().with("factor", 4.0)), None)
            .unwrap();

        pipeline.set_enabled("scale", false).unwrap();
        let state = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(column_x(&state), vec![0.0, 1.0, 2.0]);
        assert_eq!(counting.calls(), 0);

        pipeline.set_enabled("scale", true).unwrap();
        let state = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(column_x(&state), vec![0.0, 4.0, 8.0]);
    }

    #[tokio::test]
    async fn test_result_of_invalidated_run_is_not_cached() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();
        let stage = pipeline.head_stage();

        let handle = pipeline.evaluate(pipeline.request(0));
        gated.wait_started().await;
        pipeline.set_parameter("gated", "anything", 1.0).unwrap();
        gated.open();

        handle.wait().await.unwrap();
        assert_eq!(stage.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_request_after_parameter_change_does_not_join_stale_run() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        let counting = Arc::new(CountingTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("scale", counting.clone(), StageParams::new().with("factor", 2.0)), None)
            .unwrap();
        let scale = pipeline.head_stage();

        let before = pipeline.evaluate(pipeline.request(0));
        gated.wait_started().await;
        assert_eq!(scale.in_flight_count(), 1);

        pipeline.set_parameter("scale", "factor", 10.0).unwrap();
        assert_eq!(scale.in_flight_count(), 0);
        let after = pipeline.evaluate(pipeline.request(0));
        assert!(!after.is_ready());
        gated.open();

        assert_eq!(column_x(&after.wait().await.unwrap()), vec![0.0, 10.0, 20.0]);
        assert_eq!(column_x(&before.wait().await.unwrap()), vec![0.0, 2.0, 4.0]);
        assert_eq!(counting.calls(), 2);
        assert_eq!(gated.calls(), 1);

        // Only the run started after the change was cached.
        let cached = pipeline.evaluate(pipeline.request(0));
        assert!(cached.is_ready());
        assert_eq!(column_x(&cached.wait().await.unwrap()), vec![0.0, 10.0, 20.0]);
    }

    #[tokio::test]
    async fn test_head_evaluation_keeps_side_branch_memos() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let head_stats = Arc::new(ColumnStatisticsTransform::new(16));
        let side_stats = Arc::new(ColumnStatisticsTransform::new(16));
        pipeline
            .insert_stage(modifier("head_stats", head_stats.clone(), StageParams::new().with("column", "x")), None)
            .unwrap();
        pipeline
            .insert_stage(
                modifier("side_stats", side_stats.clone(), StageParams::new().with("column", "x")),
                Some("source"),
            )
            .unwrap();
        assert_eq!(pipeline.head_stage().id(), "head_stats");

        pipeline
            .evaluate_stage("side_stats", pipeline.request(0))
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(side_stats.memoized(), 1);

        for time in [0, 1, 2] {
            pipeline.evaluate_pipeline(pipeline.request(time)).await.unwrap();
        }
        assert_eq!(side_stats.memoized(), 1);
        assert_eq!(
            pipeline.stage_statuses().iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            vec!["source", "head_stats"]
        );
    }

    #[tokio::test]
    async fn test_worker_pool_stage() {
        let context = EvalContext::new(EvalSettings::default(), WorkerPool::new(2), Arc::new(ActionLog::new()));
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(context, src).unwrap();
        let blocking = Arc::new(BlockingTransform::new(Duration::from_millis(10)));
        pipeline
            .insert_stage(modifier("blocking", blocking.clone(), StageParams::new()), None)
            .unwrap();

        let state = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(column_x(&state), vec![0.0, 2.0, 4.0]);
        assert_eq!(blocking.calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_stage_rewires_dependents() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src.clone()).unwrap();
        pipeline
            .insert_stage(modifier("b", Arc::new(CountingTransform::new()), StageParams::new().with("factor", 2.0)), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("c", Arc::new(CountingTransform::new()), StageParams::new().with("factor", 3.0)), None)
            .unwrap();
        let state = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(column_x(&state), vec![0.0, 6.0, 12.0]);

        let removed = pipeline.remove_stage("b").unwrap();
        assert!(removed.upstream().is_none());
        assert!(Arc::ptr_eq(&pipeline.stage("c").unwrap().upstream().unwrap(), &src));

        let state = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(column_x(&state), vec![0.0, 3.0, 6.0]);

        assert!(matches!(
            pipeline.remove_stage("source"),
            Err(PipelineError::SourceNotRemovable(_))
        ));
    }

    #[tokio::test]
    async fn test_upstream_cycle_is_rejected() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        pipeline
            .insert_stage(modifier("b", Arc::new(CountingTransform::new()), StageParams::new()), None)
            .unwrap();
        pipeline
            .insert_stage(modifier("c", Arc::new(CountingTransform::new()), StageParams::new()), None)
            .unwrap();

        let result = pipeline.set_upstream("b", "c");
        assert!(matches!(result, Err(PipelineError::UpstreamCycle { .. })));
        assert!(matches!(
            pipeline.insert_stage(modifier("b", Arc::new(CountingTransform::new()), StageParams::new()), None),
            Err(PipelineError::DuplicateStage(_))
        ));
    }

    #[tokio::test]
    async fn test_display_keeps_last_good_result() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        pipeline
            .insert_stage(modifier("scale", Arc::new(CountingTransform::new()), StageParams::new().with("factor", 2.0)), None)
            .unwrap();
        let good = pipeline.evaluate_for_display(pipeline.request(0)).await.unwrap();

        pipeline
            .insert_stage(modifier("fail", Arc::new(FailingTransform::new("broken")), StageParams::new()), None)
            .unwrap();
        let shown = pipeline.evaluate_for_display(pipeline.request(0)).await.unwrap();

        assert_eq!(shown.status().kind(), StatusType::Error);
        assert_eq!(column_x(&shown), column_x(&good));
    }

    #[tokio::test]
    async fn test_preliminary_never_waits() {
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let gated = Arc::new(GatedTransform::new());
        pipeline
            .insert_stage(modifier("gated", gated.clone(), StageParams::new()), None)
            .unwrap();

        let handle = pipeline.evaluate(pipeline.request(0));
        gated.wait_started().await;
        let snapshot = pipeline.evaluate_preliminary(0);
        assert_eq!(column_x(&snapshot), vec![0.0, 1.0, 2.0]);

        gated.open();
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_user_actions_are_recorded_bookkeeping_is_not() {
        let log = Arc::new(ActionLog::new());
        let context = EvalContext::new(EvalSettings::default(), WorkerPool::new(1), log.clone());
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(context, src).unwrap();

        pipeline
            .insert_stage(modifier("scale", Arc::new(CountingTransform::new()), StageParams::new()), None)
            .unwrap();
        pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        pipeline.set_parameter("scale", "factor", 3.0).unwrap();
        pipeline.set_enabled("scale", false).unwrap();

        assert_eq!(
            log.actions(),
            vec![
                "Insert stage 'scale'".to_string(),
                "Change parameter 'factor' of 'scale'".to_string(),
                "Disable stage 'scale'".to_string(),
            ]
        );
        assert!(log.is_recording());
    }

    #[tokio::test]
    async fn test_save_and_load_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let (src, _) = source(1);
        let mut pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        pipeline
            .insert_stage(modifier("scale", Arc::new(CountingTransform::new()), StageParams::new().with("factor", 2.0)), None)
            .unwrap();

        pipeline.save_to_dir(dir.path()).unwrap();
        assert!(dir.path().join("scale.json").exists());
        assert!(dir.path().join("source.json").exists());

        pipeline.set_parameter("scale", "factor", 9.0).unwrap();
        pipeline.load_from_dir(dir.path()).unwrap();
        let params = pipeline.stage("scale").unwrap().params();
        assert_eq!(params.get_f64("factor"), Some(2.0));

        let missing = tempfile::tempdir().unwrap();
        assert!(matches!(
            pipeline.load_from_dir(missing.path()),
            Err(PipelineError::Persistence { .. })
        ));
    }

    #[tokio::test]
    async fn test_export_frames() {
        #[derive(Default)]
        struct Collect {
            frames: Mutex<Vec<(i32, Vec<f64>)>>,
        }

        #[async_trait::async_trait]
        impl Exporter for Collect {
            async fn export_frame(&self, time: i32, state: &FlowState) -> std::io::Result<()> {
                self.frames.lock().unwrap().push((time, column_x(state)));
                Ok(())
            }
        }

        let (src, _) = source(3);
        let pipeline = Pipeline::new(EvalContext::default(), src).unwrap();
        let exporter = Collect::default();
        let exported = pipeline.export_frames(&exporter, &[0, 480, 960]).await.unwrap();

        assert_eq!(exported, 3);
        let frames = exporter.frames.lock().unwrap();
        assert_eq!(frames[1], (480, vec![1.0, 2.0, 3.0]));
        assert_eq!(pipeline.number_of_source_frames(), 3);
    }
}
