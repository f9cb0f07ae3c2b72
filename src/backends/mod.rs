// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage implementations for the FlowState pipeline engine.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process data sources and transforms over tabular data:
//! - **Data source**: `synthetic_table`, one generated table per animation frame
//! - **Column transforms**: `scale_column`, `offset_column` (time dependent)
//! - **Analysis**: `column_statistics`, memoized per table revision
//! - **Decoration**: `annotate`, attaches a label without changing content
//!
//! ## Stub Backend (Test-Only)
//! Testing utilities for engine development (only available in test builds):
//! - **CountingTransform**: counts invocations to prove cache hits
//! - **FailingTransform** / **PanickingTransform**: error and panic paths
//! - **GatedTransform**: suspends until released, for pending status and cancellation
//! - **BlockingTransform**: runs on the worker pool
//! - **Note**: NOT available in production builds
//!
//! # Architecture
//!
//! ```text
//! Configuration → LocalStageFactory → Stage (Source | Modifier) → Pipeline
//! ```
//!
//! # Examples
//!
//! ```rust
//! use the_flowstate::backends::local::LocalStageFactory;
//! use the_flowstate::config::StageConfig;
//! use the_flowstate::traits::Transform;
//!
//! let config: StageConfig = serde_yaml::from_str(
//!     "{ id: scale, kind: scale_column, params: { column: x, factor: 2.0 } }",
//! ).unwrap();
//!
//! let transform = LocalStageFactory::default().create_transform(&config).unwrap();
//! assert_eq!(transform.name(), "scale_column");
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
