//! Pipeline orchestration: authentication, acquisition, scan trigger,
//! aggregation, the remediation loop, change detection, and the publish loop.
//!
//! The pipeline is single-threaded and strictly sequential: the working
//! copy's current branch is global mutable state, so each file fully
//! completes (or fails) before the next one starts. Per-file failures are
//! recorded on the [`RunReport`]; only an untrustworthy issue index, a failed
//! clone, or an unobtainable status listing abort a run.

mod pipeline;
mod report;

pub use pipeline::{derive_local_path, Pipeline, RunOptions};
pub use report::{RunOutcome, RunReport, RunStats};
