use std::path::Path;

use mender_core::{FileIssueSet, RemedyConfig, RemediationOutcome, RemediationResult};

use crate::extract::extract_fenced;
use crate::llm::{ChatMessage, LlmClient, Role};
use crate::prompt;

/// Drives the per-file remediation contract: read, prompt, invoke, extract,
/// overwrite.
///
/// The engine is the only component that writes file content. Every call
/// produces a terminal [`RemediationResult`]; per-file failures are recorded
/// as outcomes, never propagated, so one bad file cannot abort a run.
pub struct RemediationEngine {
    llm: LlmClient,
    fence_tag: String,
}

impl RemediationEngine {
    /// Create an engine from an LLM client and remedy configuration.
    pub fn new(llm: LlmClient, remedy: &RemedyConfig) -> Self {
        Self {
            llm,
            fence_tag: remedy.fence_tag.clone(),
        }
    }

    /// Return the model identifier used for remediation requests.
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Attempt to remediate one file inside the working copy at `root`.
    ///
    /// `file_name` is the path as it appears in the issue set, relative to
    /// `root`. A file with no findings reports `no-issues` without ever
    /// invoking the model. The file on disk is overwritten only when a
    /// correctly delimited block was extracted from the model response.
    pub async fn remediate(
        &self,
        root: &Path,
        file_name: &str,
        issues: &FileIssueSet,
    ) -> RemediationResult {
        let path = root.join(file_name);

        let original = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                return RemediationResult {
                    file_path: file_name.into(),
                    original: None,
                    response: None,
                    corrected: None,
                    outcome: RemediationOutcome::ReadError,
                };
            }
        };

        let findings = issues.get(file_name).unwrap_or(&[]);
        if findings.is_empty() {
            return RemediationResult {
                file_path: file_name.into(),
                original: Some(original),
                response: None,
                corrected: None,
                outcome: RemediationOutcome::NoIssues,
            };
        }

        let rendered = prompt::render_findings(findings);
        let user_prompt =
            prompt::build_fix_prompt(file_name, &rendered, &original, &self.fence_tag);
        let messages = vec![ChatMessage {
            role: Role::User,
            content: user_prompt,
        }];

        let response = match self.llm.chat(messages).await {
            Ok(text) => text,
            Err(_) => {
                // No automatic retry; the run report carries the loss.
                return RemediationResult {
                    file_path: file_name.into(),
                    original: Some(original),
                    response: None,
                    corrected: None,
                    outcome: RemediationOutcome::NoResponse,
                };
            }
        };

        let Some(corrected) = extract_fenced(&response, &self.fence_tag) else {
            return RemediationResult {
                file_path: file_name.into(),
                original: Some(original),
                response: Some(response),
                corrected: None,
                outcome: RemediationOutcome::ExtractionFailed,
            };
        };

        let outcome = match std::fs::write(&path, &corrected) {
            Ok(()) => RemediationOutcome::Fixed,
            Err(_) => RemediationOutcome::WriteError,
        };

        RemediationResult {
            file_path: file_name.into(),
            original: Some(original),
            response: Some(response),
            corrected: Some(corrected),
            outcome,
        }
    }
}
