//! Per-line speech pipeline: read, synthesize, play.

#[allow(clippy::module_inception)]
mod pipeline;

pub use pipeline::{Pipeline, PipelineStats};
