//! Core types, configuration, and error handling for the Mender pipeline.
//!
//! This crate provides the shared foundation used by all other Mender crates:
//! - [`MenderError`]: unified error type using `thiserror`
//! - [`MenderConfig`]: configuration loaded from `.mender.toml`
//! - Shared types: [`Finding`], [`FileIssueSet`], [`RemediationResult`],
//!   [`RemediationOutcome`], [`ChangeRecord`], [`PublishStatus`],
//!   [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{LlmConfig, MenderConfig, PublishConfig, RemedyConfig, ScanConfig};
pub use error::MenderError;
pub use types::{
    ChangeRecord, FileIssueSet, Finding, OutputFormat, PublishStatus, RemediationOutcome,
    RemediationResult,
};

/// A convenience `Result` type for Mender operations.
pub type Result<T> = std::result::Result<T, MenderError>;
