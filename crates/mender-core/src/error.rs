use std::path::PathBuf;

/// Errors that can occur across the Mender pipeline.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// Only a few variants are fatal to a whole run: [`MenderError::MalformedReport`]
/// (the issue index cannot be trusted) and acquisition-level failures surfaced
/// as [`MenderError::Git`]. Per-file failures are recorded as outcomes on the
/// run report instead of propagating.
///
/// # Examples
///
/// ```
/// use mender_core::MenderError;
///
/// let err = MenderError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MenderError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The static-analysis report is structurally invalid.
    #[error("malformed analysis report: {0}")]
    MalformedReport(String),

    /// Model service API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Review-request or code-host operation failure.
    #[error("publish error: {0}")]
    Publish(String),

    /// An external process could not be spawned or produced unreadable output.
    #[error("process error: {0}")]
    Process(String),

    /// An external process exceeded the configured timeout.
    #[error("timed out waiting for: {0}")]
    Timeout(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
