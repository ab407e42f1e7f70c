//! Change publishing: per-file branches, commits, pushes, and review requests.
//!
//! `git` and the code-hosting CLI are opaque external collaborators. Every
//! invocation uses a structured argument list (never a shell string), runs
//! under a timeout, and maps failure onto the run report instead of aborting
//! the run. The working copy's current branch is global mutable state, so
//! publishing is strictly sequential and always returns to the base branch
//! between files.

pub mod git;
pub mod host;
pub mod mock;
pub mod process;

mod publisher;

pub use publisher::{branch_name_for, sanitize_path, ChangePublisher};
