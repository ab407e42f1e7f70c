use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One static-analysis finding, scoped to a line range in one file.
///
/// Deserializes directly from the scanner report's issue records
/// (`startLine`/`endLine`/`message`). Immutable once built.
///
/// # Examples
///
/// ```
/// use mender_core::Finding;
///
/// let f: Finding = serde_json::from_str(
///     r#"{"startLine": 3, "endLine": 5, "message": "unused import"}"#,
/// ).unwrap();
/// assert_eq!(f.start_line, 3);
/// assert_eq!(f.message, "unused import");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// First line the finding covers (1-based).
    pub start_line: u32,
    /// Last line the finding covers (inclusive).
    pub end_line: u32,
    /// Human-readable description of the issue.
    pub message: String,
}

/// Per-file issue index: file path → findings, in report order.
///
/// Built once per run by the aggregator and read-only afterward. Keys are
/// unique; duplicate entries in the raw report merge by appending their
/// findings, preserving input order. A file absent from this set is never
/// submitted to the model.
///
/// # Examples
///
/// ```
/// use mender_core::{FileIssueSet, Finding};
///
/// let mut set = FileIssueSet::new();
/// set.insert("a.py".into(), vec![Finding { start_line: 1, end_line: 1, message: "x".into() }]);
/// assert_eq!(set.get("a.py").map(|f| f.len()), Some(1));
/// assert!(set.get("b.py").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileIssueSet {
    entries: Vec<(String, Vec<Finding>)>,
}

impl FileIssueSet {
    /// Create an empty issue set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add findings for `file`, merging into an existing entry if present.
    ///
    /// Insertion order of first appearance is preserved for iteration.
    pub fn insert(&mut self, file: String, findings: Vec<Finding>) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(name, _)| *name == file) {
            existing.extend(findings);
        } else {
            self.entries.push((file, findings));
        }
    }

    /// Look up the findings recorded for `file`.
    pub fn get(&self, file: &str) -> Option<&[Finding]> {
        self.entries
            .iter()
            .find(|(name, _)| name == file)
            .map(|(_, findings)| findings.as_slice())
    }

    /// Iterate entries in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Finding])> {
        self.entries
            .iter()
            .map(|(name, findings)| (name.as_str(), findings.as_slice()))
    }

    /// Number of distinct files in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the report contained no file entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Terminal outcome of one file's remediation attempt.
///
/// # Examples
///
/// ```
/// use mender_core::RemediationOutcome;
///
/// let json = serde_json::to_string(&RemediationOutcome::NoIssues).unwrap();
/// assert_eq!(json, "\"no-issues\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationOutcome {
    /// Extraction succeeded and the file was rewritten.
    Fixed,
    /// The file had no findings; the model was never invoked.
    NoIssues,
    /// The model responded but no delimited block could be extracted.
    ExtractionFailed,
    /// The model call failed (transport error or error response).
    NoResponse,
    /// The file could not be read from the working copy.
    ReadError,
    /// Extraction succeeded but the corrected content could not be written.
    WriteError,
}

impl RemediationOutcome {
    /// Returns `true` for the one outcome that mutates the working copy.
    pub fn is_fixed(self) -> bool {
        matches!(self, RemediationOutcome::Fixed)
    }
}

impl fmt::Display for RemediationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationOutcome::Fixed => write!(f, "fixed"),
            RemediationOutcome::NoIssues => write!(f, "no-issues"),
            RemediationOutcome::ExtractionFailed => write!(f, "extraction-failed"),
            RemediationOutcome::NoResponse => write!(f, "no-response"),
            RemediationOutcome::ReadError => write!(f, "read-error"),
            RemediationOutcome::WriteError => write!(f, "write-error"),
        }
    }
}

/// Record of one file's trip through the remediation engine.
///
/// Created per file during remediation and terminal once written. The
/// original and corrected bodies are kept so a caller can audit what the
/// model was shown and what replaced it.
///
/// # Examples
///
/// ```
/// use mender_core::{RemediationOutcome, RemediationResult};
/// use std::path::PathBuf;
///
/// let result = RemediationResult {
///     file_path: PathBuf::from("a.py"),
///     original: None,
///     response: None,
///     corrected: None,
///     outcome: RemediationOutcome::ReadError,
/// };
/// assert!(!result.outcome.is_fixed());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationResult {
    /// Path of the file, relative to the working copy root.
    pub file_path: PathBuf,
    /// File content as read from disk, when the read succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    /// Raw model response text, when a response arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Extracted corrected file body, when extraction succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected: Option<String>,
    /// Terminal outcome for this file.
    pub outcome: RemediationOutcome,
}

/// Publishing status of one modified file's change request.
///
/// # Examples
///
/// ```
/// use mender_core::PublishStatus;
///
/// let json = serde_json::to_string(&PublishStatus::ReviewOpened).unwrap();
/// assert_eq!(json, "\"review-opened\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishStatus {
    /// Record created; no git operation has run yet.
    Pending,
    /// Branch pushed to the remote; review request not yet opened.
    Pushed,
    /// Review request opened against the base branch.
    ReviewOpened,
    /// A publish step failed; the file's change was not proposed.
    Failed,
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStatus::Pending => write!(f, "pending"),
            PublishStatus::Pushed => write!(f, "pushed"),
            PublishStatus::ReviewOpened => write!(f, "review-opened"),
            PublishStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Record of one modified file's publish attempt.
///
/// Created only for files the post-remediation status query reported as
/// changed, never pre-emptively.
///
/// # Examples
///
/// ```
/// use mender_core::{ChangeRecord, PublishStatus};
/// use std::path::PathBuf;
///
/// let record = ChangeRecord {
///     file_path: PathBuf::from("a.py"),
///     branch: "update-20240101-120000-a-py".into(),
///     base_branch: "main".into(),
///     commit_message: "Update a.py".into(),
///     status: PublishStatus::Pending,
/// };
/// assert_eq!(record.status, PublishStatus::Pending);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// Path of the modified file.
    pub file_path: PathBuf,
    /// Unique per-run branch carrying this file's change.
    pub branch: String,
    /// Branch the review request targets.
    pub base_branch: String,
    /// Commit message used for the single-file commit.
    pub commit_message: String,
    /// Publishing status for this file.
    pub status: PublishStatus,
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use mender_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
