//! Runtime: per-record refinement pipeline and concurrent run orchestration.
//!
//! Records flow sanitize → mine + measure → assemble → localize → validate.
//! The orchestrator runs them with bounded concurrency, preserves input order
//! and honors cooperative cancellation.

pub mod orchestrator;
pub mod pipeline;
pub mod types;

pub use orchestrator::Orchestrator;
pub use pipeline::{fingerprint, RecordPipeline};
pub use types::*;
