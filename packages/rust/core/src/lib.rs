//! Core pipeline orchestration for leadpages.
//!
//! This crate ties together ingestion, rendering, output assembly, and
//! lead-list archival into the `generate` workflow.

pub mod archive;
pub mod assembler;
pub mod pipeline;

pub use pipeline::{
    FileReport, GenerateConfig, GenerationReport, ProgressReporter, SilentProgress, generate,
};
