// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Instant;
use the_flowstate::config::{load_and_validate_config, RuntimeBuilder};
use the_flowstate::data::Table;

const CONFIG_FILES: &[&str] = &[
    "configs/simple-pipeline.yaml",
    "configs/simple-pipeline.toml",
    "configs/branching-pipeline.yaml",
];

/// Demo loading pipelines from configuration files and animating them
async fn run_yaml_demo() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== FlowState Configuration Demo ===\n");

    for file in CONFIG_FILES {
        println!("--- {} ---", file);
        let config = load_and_validate_config(file)?;
        let pipeline = RuntimeBuilder::from_config(&config)?;
        println!(
            "{} stages, head '{}', {} source frames",
            pipeline.stages().len(),
            pipeline.head_stage().id(),
            pipeline.number_of_source_frames()
        );

        let settings = pipeline.context().settings().clone();
        let started = Instant::now();
        for frame in 0..pipeline.number_of_source_frames() as i32 {
            let state = pipeline
                .evaluate_pipeline(pipeline.request(settings.frame_time(frame)))
                .await?;
            let rows = state.find_object::<Table>().map(|t| t.row_count()).unwrap_or(0);
            println!(
                "  frame {:>2}: {} rows, status {}, {} attributes",
                frame,
                rows,
                pipeline.status(),
                state.attributes().len()
            );
        }
        println!("  evaluated in {:?}\n", started.elapsed());
    }

    // A configuration with an upstream cycle is rejected before anything is built
    match load_and_validate_config("configs/invalid-cycle.yaml") {
        Ok(_) => println!("Unexpectedly accepted configs/invalid-cycle.yaml"),
        Err(e) => println!("configs/invalid-cycle.yaml rejected:\n{}", e),
    }

    println!("\n=== Demo completed successfully! ===");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_yaml_demo().await {
        eprintln!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
