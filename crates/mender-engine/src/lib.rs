//! Remediation engine: per-file prompt construction, model invocation, and
//! fence-based extraction of corrected file bodies.
//!
//! For each flagged file the engine reads the working copy, renders a single
//! prompt carrying the findings and the full file content, asks the model for
//! a corrected version wrapped in an agreed fenced block, and overwrites the
//! file only when a block with the agreed tag can be extracted.

pub mod extract;
pub mod llm;
pub mod prompt;

mod engine;

pub use engine::RemediationEngine;
