use mender_core::Finding;

/// Render findings as `Line <start>-<end>: <message>` lines.
///
/// Order matches the issue set (report order), keeping prompts reproducible
/// for identical reports.
///
/// # Examples
///
/// ```
/// use mender_core::Finding;
/// use mender_engine::prompt::render_findings;
///
/// let findings = vec![Finding { start_line: 3, end_line: 5, message: "unused import".into() }];
/// assert_eq!(render_findings(&findings), "Line 3-5: unused import");
/// ```
pub fn render_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("Line {}-{}: {}", f.start_line, f.end_line, f.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the single user-turn prompt for one file.
///
/// Carries the file identifier, the rendered findings, and the full file
/// content verbatim (no truncation), and instructs the model to wrap the
/// corrected file in a fenced block opened with `` ```<fence_tag> ``, the
/// same marker that [`crate::extract::extract_fenced`] matches on.
///
/// # Examples
///
/// ```
/// use mender_engine::prompt::build_fix_prompt;
///
/// let prompt = build_fix_prompt("a.py", "Line 1-1: unused import", "import os\n", "fixed");
/// assert!(prompt.contains("File: a.py"));
/// assert!(prompt.contains("```fixed"));
/// assert!(prompt.contains("import os\n"));
/// ```
pub fn build_fix_prompt(
    file_name: &str,
    rendered_findings: &str,
    content: &str,
    fence_tag: &str,
) -> String {
    format!(
        "The following file has issues reported by static analysis. Apply fixes for \
         all issues and return the complete updated file. Add brief comments where \
         changes were made.\n\n\
         File: {file_name}\n\n\
         Issues:\n{rendered_findings}\n\n\
         File content:\n{content}\n\n\
         Provide the corrected version of the file with all fixes applied. Wrap the \
         entire corrected file in a single code block opened with ```{fence_tag} and \
         closed with ```. Put nothing but the corrected file inside those markers."
    )
}
