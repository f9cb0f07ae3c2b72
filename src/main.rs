// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Instant;
use the_flowstate::config::{load_and_validate_config, RuntimeBuilder};
use the_flowstate::data::{FlowState, Table};
use the_flowstate::engine::Pipeline;
use the_flowstate::time::TimePoint;
use tracing_subscriber::EnvFilter;

/// Initialize logging, respecting `RUST_LOG` and defaulting to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn parse_frames(args: &[String]) -> Result<Vec<TimePoint>> {
    args.iter()
        .map(|a| {
            a.parse::<TimePoint>()
                .with_context(|| format!("'{}' is not a frame number", a))
        })
        .collect()
}

fn print_frame(pipeline: &Pipeline, frame: TimePoint, state: &FlowState) {
    println!("Frame {} (valid for {})", frame, state.validity());
    for (stage_id, status) in pipeline.stage_statuses() {
        if status.text().is_empty() {
            println!("  {:<20} {:?}", stage_id, status.kind());
        } else {
            println!("  {:<20} {:?}: {}", stage_id, status.kind(), status.text());
        }
    }
    println!("  aggregate status: {}", pipeline.status());

    for object in state.objects() {
        match object.downcast_ref::<Table>() {
            Some(table) => println!(
                "  object '{}': {} rows, columns [{}]",
                object.identifier(),
                table.row_count(),
                table
                    .columns()
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None => println!("  object '{}'", object.identifier()),
        }
    }
    for (key, value) in state.attributes() {
        println!("  {} = {}", key, value);
    }
}

fn print_cache_stats(pipeline: &Pipeline) {
    println!("Cache statistics:");
    for stage in pipeline.topological_order() {
        let intervals = stage
            .cached_intervals()
            .iter()
            .map(|iv| iv.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {:<20} {} entries {}", stage.id(), stage.cache_len(), intervals);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config.yaml|config.toml> [frame ...]", args[0]);
        eprintln!("Example: {} configs/simple-pipeline.yaml 0 1 2", args[0]);
        bail!("missing configuration file");
    }

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("Failed to load configuration '{}'", args[1]))?;
    let pipeline = RuntimeBuilder::from_config(&config).context("Failed to build pipeline")?;

    let mut frames = parse_frames(&args[2..])?;
    if frames.is_empty() {
        frames = (0..pipeline.number_of_source_frames() as TimePoint).collect();
    }

    let settings = pipeline.context().settings().clone();
    println!(
        "Pipeline '{}' -> '{}' with {} stages, {} source frames at {} fps",
        pipeline.source_stage().id(),
        pipeline.head_stage().id(),
        pipeline.stages().len(),
        pipeline.number_of_source_frames(),
        settings.frames_per_second
    );

    let started = Instant::now();
    for frame in frames {
        let request = pipeline.request(settings.frame_time(frame));
        let state = pipeline
            .evaluate_for_display(request)
            .await
            .with_context(|| format!("Evaluation of frame {} was canceled", frame))?;
        print_frame(&pipeline, frame, &state);
    }
    print_cache_stats(&pipeline);
    println!("Total time: {:?}", started.elapsed());

    Ok(())
}
