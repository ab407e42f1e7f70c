use std::fmt;

use serde::Serialize;

use mender_core::{ChangeRecord, PublishStatus, RemediationOutcome, RemediationResult};

/// Terminal outcome of a whole pipeline run.
///
/// # Examples
///
/// ```
/// use mender_pipeline::RunOutcome;
///
/// let json = serde_json::to_string(&RunOutcome::NoChanges).unwrap();
/// assert_eq!(json, "\"no-changes\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOutcome {
    /// Remediation and publishing both ran to completion.
    Completed,
    /// The post-remediation status query reported no changed paths.
    ///
    /// A normal terminal state, not an error: most runs over a clean
    /// repository end here.
    NoChanges,
    /// Remediation ran but publishing was skipped on request.
    DryRun,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::NoChanges => write!(f, "no changes"),
            RunOutcome::DryRun => write!(f, "dry run"),
        }
    }
}

/// Aggregate result of one pipeline run.
///
/// Carries one record per file considered, so a caller can distinguish
/// "no issues found" from "fix attempted and failed" from "fix published"
/// without re-deriving state from logs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Per-file remediation records, in report order.
    pub remediations: Vec<RemediationResult>,
    /// Per-file publish records, in status-query order.
    pub changes: Vec<ChangeRecord>,
    /// Statistics about the run.
    pub stats: RunStats,
}

/// Statistics about a pipeline run.
///
/// # Examples
///
/// ```
/// use mender_pipeline::RunStats;
///
/// let stats = RunStats {
///     files_considered: 4,
///     files_fixed: 2,
///     files_without_issues: 1,
///     remediation_failures: 1,
///     reviews_opened: 2,
///     publish_failures: 0,
///     model_used: "gpt-4o".into(),
///     authenticated: true,
/// };
/// assert_eq!(stats.files_considered, 4);
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Files listed in the issue index and run through the engine.
    pub files_considered: usize,
    /// Files whose content was rewritten.
    pub files_fixed: usize,
    /// Files with an empty finding list (model never invoked).
    pub files_without_issues: usize,
    /// Read/model/extraction/write failures.
    pub remediation_failures: usize,
    /// Review requests successfully opened.
    pub reviews_opened: usize,
    /// Publish attempts that failed.
    pub publish_failures: usize,
    /// Model identifier used for remediation.
    pub model_used: String,
    /// Whether a code-host session was available when the run started.
    pub authenticated: bool,
}

impl RunReport {
    /// Build a report, deriving the stats from the per-file records.
    pub fn new(
        outcome: RunOutcome,
        remediations: Vec<RemediationResult>,
        changes: Vec<ChangeRecord>,
        model_used: String,
        authenticated: bool,
    ) -> Self {
        let files_fixed = remediations
            .iter()
            .filter(|r| r.outcome.is_fixed())
            .count();
        let files_without_issues = remediations
            .iter()
            .filter(|r| r.outcome == RemediationOutcome::NoIssues)
            .count();
        let remediation_failures = remediations.len() - files_fixed - files_without_issues;
        let reviews_opened = changes
            .iter()
            .filter(|c| c.status == PublishStatus::ReviewOpened)
            .count();
        let publish_failures = changes
            .iter()
            .filter(|c| c.status == PublishStatus::Failed)
            .count();
        let stats = RunStats {
            files_considered: remediations.len(),
            files_fixed,
            files_without_issues,
            remediation_failures,
            reviews_opened,
            publish_failures,
            model_used,
            authenticated,
        };
        Self {
            outcome,
            remediations,
            changes,
            stats,
        }
    }

    /// Render the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Remediation Run\n\n");
        out.push_str(&format!(
            "**Outcome:** {} | **Model:** {} | **Files:** {} | **Fixed:** {} | **Reviews:** {}\n\n",
            self.outcome,
            self.stats.model_used,
            self.stats.files_considered,
            self.stats.files_fixed,
            self.stats.reviews_opened,
        ));
        if !self.remediations.is_empty() {
            out.push_str("## Remediation\n\n");
            for r in &self.remediations {
                out.push_str(&format!("- `{}`: {}\n", r.file_path.display(), r.outcome));
            }
            out.push('\n');
        }
        if !self.changes.is_empty() {
            out.push_str("## Change requests\n\n");
            for c in &self.changes {
                out.push_str(&format!(
                    "- `{}`: {} (branch `{}` -> `{}`)\n",
                    c.file_path.display(),
                    c.status,
                    c.branch,
                    c.base_branch,
                ));
            }
        }
        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Remediation Run")?;
        writeln!(f, "===============")?;
        writeln!(
            f,
            "Outcome: {} | Model: {} | Files: {} | Fixed: {} | Reviews: {}\n",
            self.outcome,
            self.stats.model_used,
            self.stats.files_considered,
            self.stats.files_fixed,
            self.stats.reviews_opened,
        )?;

        if self.remediations.is_empty() {
            writeln!(f, "No files were considered.")?;
        } else {
            for r in &self.remediations {
                writeln!(f, "[{}] {}", r.outcome, r.file_path.display())?;
            }
        }

        for c in &self.changes {
            writeln!(
                f,
                "[{}] {} (branch {} -> {})",
                c.status,
                c.file_path.display(),
                c.branch,
                c.base_branch,
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn remediation(path: &str, outcome: RemediationOutcome) -> RemediationResult {
        RemediationResult {
            file_path: PathBuf::from(path),
            original: None,
            response: None,
            corrected: None,
            outcome,
        }
    }

    fn change(path: &str, status: PublishStatus) -> ChangeRecord {
        ChangeRecord {
            file_path: PathBuf::from(path),
            branch: format!("update-20240101-000000-{path}"),
            base_branch: "main".into(),
            commit_message: format!("Update {path}"),
            status,
        }
    }

    #[test]
    fn stats_derived_from_records() {
        let report = RunReport::new(
            RunOutcome::Completed,
            vec![
                remediation("a.py", RemediationOutcome::Fixed),
                remediation("b.py", RemediationOutcome::NoIssues),
                remediation("c.py", RemediationOutcome::NoResponse),
                remediation("d.py", RemediationOutcome::Fixed),
            ],
            vec![
                change("a.py", PublishStatus::ReviewOpened),
                change("d.py", PublishStatus::Failed),
            ],
            "gpt-4o".into(),
            true,
        );
        assert_eq!(report.stats.files_considered, 4);
        assert_eq!(report.stats.files_fixed, 2);
        assert_eq!(report.stats.files_without_issues, 1);
        assert_eq!(report.stats.remediation_failures, 1);
        assert_eq!(report.stats.reviews_opened, 1);
        assert_eq!(report.stats.publish_failures, 1);
    }

    #[test]
    fn display_lists_every_file_outcome() {
        let report = RunReport::new(
            RunOutcome::Completed,
            vec![
                remediation("a.py", RemediationOutcome::Fixed),
                remediation("b.py", RemediationOutcome::ExtractionFailed),
            ],
            vec![change("a.py", PublishStatus::ReviewOpened)],
            "gpt-4o".into(),
            true,
        );
        let text = format!("{report}");
        assert!(text.contains("[fixed] a.py"));
        assert!(text.contains("[extraction-failed] b.py"));
        assert!(text.contains("[review-opened] a.py"));
    }

    #[test]
    fn no_changes_report_renders() {
        let report = RunReport::new(
            RunOutcome::NoChanges,
            vec![remediation("a.py", RemediationOutcome::NoIssues)],
            vec![],
            "gpt-4o".into(),
            false,
        );
        let text = format!("{report}");
        assert!(text.contains("Outcome: no changes"));

        let md = report.to_markdown();
        assert!(md.contains("# Remediation Run"));
        assert!(md.contains("no-issues"));
    }

    #[test]
    fn json_serializes_camel_case() {
        let report = RunReport::new(RunOutcome::DryRun, vec![], vec![], "gpt-4o".into(), true);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "dry-run");
        assert!(json["stats"].get("filesConsidered").is_some());
    }
}
