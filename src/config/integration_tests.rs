// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::config::{load_and_validate_config, load_config, RuntimeBuilder};
    use crate::data::{AttributeValue, StatusType, Table};
    use crate::errors::{ConfigError, ValidationError};

    /// Test that YAML configurations can be loaded and parsed correctly
    #[test]
    fn test_simple_pipeline_yaml_loading() {
        let config = load_and_validate_config("configs/simple-pipeline.yaml").unwrap();

        assert_eq!(config.executor_options.max_concurrency, Some(2));
        assert_eq!(config.cache.max_entries(), 8);
        assert_eq!(config.cache.revision_cache_capacity(), 64);
        assert_eq!(config.settings.frames_per_second, 10);
        assert_eq!(config.source.id, "source");
        assert_eq!(config.stages.len(), 3);
        assert_eq!(config.stages[0].id, "scale");
        assert_eq!(config.stages[1].id, "drift");
        assert_eq!(config.stages[2].id, "stats");
        assert_eq!(config.stages[1].title(), "Drift Y");
        assert_eq!(config.upstream_of(2), "drift");
    }

    /// The TOML file describes the same pipeline as the YAML one
    #[test]
    fn test_toml_matches_yaml() {
        let yaml = load_and_validate_config("configs/simple-pipeline.yaml").unwrap();
        let toml = load_and_validate_config("configs/simple-pipeline.toml").unwrap();

        assert_eq!(toml.settings, yaml.settings);
        assert_eq!(toml.executor_options.max_concurrency, yaml.executor_options.max_concurrency);
        let ids = |c: &crate::config::Config| c.stages.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&toml), ids(&yaml));
        for (t, y) in toml.stages.iter().zip(&yaml.stages) {
            assert_eq!(t.stage_params(), y.stage_params());
        }
    }

    #[test]
    fn test_invalid_cycle_yaml_is_rejected() {
        // Loading alone succeeds; validation reports the cycle
        assert!(load_config("configs/invalid-cycle.yaml").is_ok());

        match load_and_validate_config("configs/invalid-cycle.yaml") {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(errors[0], ValidationError::CyclicUpstream { .. }));
            }
            other => panic!("Expected validation failure, got {:?}", other.map(|c| c.stages.len())),
        }
    }

    #[test]
    fn test_branching_pipeline_runtime() {
        let config = load_and_validate_config("configs/branching-pipeline.yaml").unwrap();
        let pipeline = RuntimeBuilder::from_config(&config).unwrap();

        assert_eq!(pipeline.stages().len(), 5);
        assert_eq!(pipeline.head_stage().id(), "annotated");
        assert_eq!(pipeline.stage("halved").unwrap().upstream().unwrap().id(), "source");
        assert_eq!(pipeline.stage("doubled_stats").unwrap().upstream().unwrap().id(), "doubled");
        assert!(!pipeline.stage("annotated").unwrap().is_enabled());
        assert_eq!(pipeline.number_of_source_frames(), 4);
    }

    /// Build the YAML pipeline and evaluate it end to end
    #[tokio::test]
    async fn test_evaluate_simple_pipeline() {
        let config = load_and_validate_config("configs/simple-pipeline.yaml").unwrap();
        let pipeline = RuntimeBuilder::from_config(&config).unwrap();

        let state = pipeline
            .evaluate_pipeline(pipeline.request(0))
            .await
            .unwrap();

        assert_eq!(state.status().kind(), StatusType::Success);
        let table = state.expect_object::<Table>().unwrap();
        assert_eq!(table.row_count(), 100);
        // frame 0: x = 0..100 scaled by 2
        assert_eq!(table.column("x").unwrap()[..3], [0.0, 2.0, 4.0]);
        assert_eq!(state.attribute("x.max"), Some(&AttributeValue::from(198.0)));
        // the offset stage makes the result valid for the requested instant only
        assert!(state.validity().contains(0));
        assert!(!state.validity().contains(1));
        assert_eq!(pipeline.status().kind(), StatusType::Success);
    }

    #[tokio::test]
    async fn test_evaluate_branching_pipeline_at_each_frame() {
        let config = load_and_validate_config("configs/branching-pipeline.yaml").unwrap();
        let pipeline = RuntimeBuilder::from_config(&config).unwrap();
        let ticks_per_frame = pipeline.context().settings().ticks_per_frame();

        for frame in 0..4 {
            let request = pipeline.request(frame * ticks_per_frame);
            let stats = pipeline
                .evaluate_stage("doubled_stats", request)
                .unwrap()
                .wait()
                .await
                .unwrap();
            // x = (row + frame) * 2 for rows 0..10
            let expected_min = (frame as f64) * 2.0;
            assert_eq!(stats.attribute("x.min"), Some(&AttributeValue::from(expected_min)));
        }

        // the disabled head passes the halved table through
        let head = pipeline.evaluate_pipeline(pipeline.request(0)).await.unwrap();
        assert_eq!(pipeline.head_stage().status().text(), "Stage is currently disabled.");
        assert_eq!(head.expect_object::<Table>().unwrap().column("x").unwrap()[1], 0.5);
    }
}
