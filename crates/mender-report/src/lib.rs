//! Issue aggregation: raw static-analysis reports → per-file issue index.
//!
//! The scanner leaves behind a JSON report shaped as a sequence of per-file
//! records: `[ { "fileName": "...", "issues": [ { "startLine": ..,
//! "endLine": .., "message": ".." } ] } ]`. This crate turns that report into
//! a [`FileIssueSet`] and is deliberately strict about shape: a record
//! missing its file identifier or findings field fails the whole run, since
//! silently dropping it would disable remediation for that file with no trace.

use std::path::Path;

use serde::Deserialize;

use mender_core::{FileIssueSet, Finding, MenderError};

/// One raw report record, with both fields optional so that validation can
/// name exactly what is missing instead of failing the whole deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    file_name: Option<String>,
    issues: Option<Vec<Finding>>,
}

/// Aggregate a deserialized analysis report into a per-file issue index.
///
/// Entry order and per-file finding order follow the report. Duplicate
/// `fileName` records merge by appending, so the output has exactly one
/// entry per distinct file.
///
/// # Errors
///
/// Returns [`MenderError::MalformedReport`] if the input is not a JSON
/// array, or if any record lacks `fileName` or `issues`.
///
/// # Examples
///
/// ```
/// use mender_report::aggregate;
///
/// let report = r#"[
///     {"fileName": "a.py", "issues": [
///         {"startLine": 1, "endLine": 2, "message": "unused import"}
///     ]},
///     {"fileName": "b.py", "issues": []}
/// ]"#;
/// let issues = aggregate(report).unwrap();
/// assert_eq!(issues.len(), 2);
/// assert_eq!(issues.get("a.py").unwrap().len(), 1);
/// assert!(issues.get("b.py").unwrap().is_empty());
/// ```
pub fn aggregate(report_json: &str) -> Result<FileIssueSet, MenderError> {
    let entries: Vec<RawEntry> = serde_json::from_str(report_json)
        .map_err(|e| MenderError::MalformedReport(format!("not a valid report array: {e}")))?;

    let mut set = FileIssueSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let file_name = entry.file_name.ok_or_else(|| {
            MenderError::MalformedReport(format!("entry {index} is missing 'fileName'"))
        })?;
        let issues = entry.issues.ok_or_else(|| {
            MenderError::MalformedReport(format!(
                "entry {index} ('{file_name}') is missing 'issues'"
            ))
        })?;
        set.insert(file_name, issues);
    }
    Ok(set)
}

/// Read and aggregate the report file the scanner wrote.
///
/// # Errors
///
/// Returns [`MenderError::FileNotFound`] if `path` does not exist,
/// [`MenderError::Io`] if it cannot be read, and everything [`aggregate`]
/// can return.
pub fn aggregate_file(path: &Path) -> Result<FileIssueSet, MenderError> {
    if !path.exists() {
        return Err(MenderError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    aggregate(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_one_entry_per_file_in_order() {
        let report = r#"[
            {"fileName": "z.py", "issues": [{"startLine": 1, "endLine": 1, "message": "m1"}]},
            {"fileName": "a.py", "issues": [{"startLine": 9, "endLine": 9, "message": "m2"}]}
        ]"#;
        let set = aggregate(report).unwrap();
        let files: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(files, vec!["z.py", "a.py"]);
    }

    #[test]
    fn finding_order_matches_report_order() {
        let report = r#"[{"fileName": "a.py", "issues": [
            {"startLine": 30, "endLine": 31, "message": "third-listed"},
            {"startLine": 1, "endLine": 1, "message": "first-listed"}
        ]}]"#;
        let set = aggregate(report).unwrap();
        let findings = set.get("a.py").unwrap();
        assert_eq!(findings[0].message, "third-listed");
        assert_eq!(findings[1].message, "first-listed");
    }

    #[test]
    fn duplicate_file_entries_merge() {
        let report = r#"[
            {"fileName": "a.py", "issues": [{"startLine": 1, "endLine": 1, "message": "one"}]},
            {"fileName": "a.py", "issues": [{"startLine": 2, "endLine": 2, "message": "two"}]}
        ]"#;
        let set = aggregate(report).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a.py").unwrap().len(), 2);
    }

    #[test]
    fn missing_file_name_is_surfaced() {
        let report = r#"[{"issues": []}]"#;
        let err = aggregate(report).unwrap_err();
        assert!(matches!(err, MenderError::MalformedReport(_)));
        assert!(err.to_string().contains("entry 0"));
        assert!(err.to_string().contains("fileName"));
    }

    #[test]
    fn missing_issues_is_surfaced() {
        let report = r#"[
            {"fileName": "ok.py", "issues": []},
            {"fileName": "broken.py"}
        ]"#;
        let err = aggregate(report).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
        assert!(err.to_string().contains("broken.py"));
    }

    #[test]
    fn non_array_report_is_malformed() {
        let err = aggregate(r#"{"fileName": "a.py"}"#).unwrap_err();
        assert!(matches!(err, MenderError::MalformedReport(_)));
    }

    #[test]
    fn empty_report_yields_empty_set() {
        let set = aggregate("[]").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn aggregate_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(
            &path,
            r#"[{"fileName": "a.py", "issues": [{"startLine": 1, "endLine": 1, "message": "m"}]}]"#,
        )
        .unwrap();
        let set = aggregate_file(&path).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn aggregate_file_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = aggregate_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MenderError::FileNotFound(_)));
    }
}
