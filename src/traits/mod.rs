// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod exporter;
pub mod params;
pub mod source;
pub mod transform;

pub use exporter::Exporter;
pub use params::StageParams;
pub use source::DataSource;
pub use transform::Transform;
