use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::ProgressBar;

use mender_core::{MenderConfig, MenderError};
use mender_engine::llm::LlmClient;
use mender_engine::RemediationEngine;
use mender_publish::git::GitCli;
use mender_publish::host::CodeHost;
use mender_publish::{process, ChangePublisher};

use crate::report::{RunOutcome, RunReport};

/// Per-run options, resolved from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Repository to acquire (URL or local path, anything `git clone` takes).
    pub repo_url: String,
    /// Working-copy destination; derived from the repository name when absent.
    pub local_path: Option<PathBuf>,
    /// Code-host token; falls back to `GH_TOKEN` at run time.
    pub token: Option<String>,
    /// Allow the interactive login fallback when token auth fails.
    pub allow_interactive: bool,
    /// Remediate but skip the publish phase entirely.
    pub dry_run: bool,
}

/// Derive the working-copy path from the repository reference.
///
/// Mirrors `git`'s own naming with a `_clone` suffix so the directory is
/// recognizably disposable: `git@host:owner/widget.git` → `widget_clone`.
///
/// # Examples
///
/// ```
/// use mender_pipeline::derive_local_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     derive_local_path("https://github.com/owner/widget.git", None),
///     PathBuf::from("widget_clone"),
/// );
/// ```
pub fn derive_local_path(repo_url: &str, explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let name = repo_url
        .rsplit(['/', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("repository")
        .trim_end_matches(".git");
    PathBuf::from(format!("{name}_clone"))
}

/// Drives a full remediation run.
///
/// Linear state machine, no branching back: authenticate, acquire, trigger
/// the scan, aggregate the report, remediate every indexed file, detect
/// changes, publish each changed file. The orchestrator is the only writer
/// of "current branch" state, via the publisher it owns.
pub struct Pipeline {
    config: MenderConfig,
}

impl Pipeline {
    /// Create a pipeline from resolved configuration.
    pub fn new(config: MenderConfig) -> Self {
        Self { config }
    }

    fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.config.publish.command_timeout_secs)
    }

    /// Execute a run against `host`.
    ///
    /// # Errors
    ///
    /// Only run-fatal conditions propagate: a failed clone, a malformed or
    /// missing analysis report, an unobtainable status listing, or an LLM
    /// client that cannot be constructed. Everything per-file lands on the
    /// returned [`RunReport`] instead.
    pub async fn run<H: CodeHost>(
        &self,
        opts: &RunOptions,
        host: H,
    ) -> Result<RunReport, MenderError> {
        let timeout = self.command_timeout();
        let work = derive_local_path(&opts.repo_url, opts.local_path.as_deref());

        let authenticated = self.authenticate(&host, opts).await;

        eprintln!("Cloning {} into {} ...", opts.repo_url, work.display());
        GitCli::clone_repo(&opts.repo_url, &work, timeout).await?;

        self.trigger_scan(&work, timeout).await;

        let report_path = work.join(&self.config.scan.report);
        let issues = mender_report::aggregate_file(&report_path)?;

        let llm = LlmClient::new(&self.config.llm)?;
        let engine = RemediationEngine::new(llm, &self.config.remedy);
        let model_used = engine.model().to_string();

        let mut remediations = Vec::with_capacity(issues.len());
        let bar = ProgressBar::new(issues.len() as u64);
        for (file, _) in issues.iter() {
            bar.set_message(file.to_string());
            let result = engine.remediate(&work, file, &issues).await;
            remediations.push(result);
            bar.inc(1);
        }
        bar.finish_and_clear();

        // Change detection happens once, after every remediation attempt.
        let git = GitCli::new(&work, timeout);
        let changed = git.status_porcelain().await?;
        if changed.is_empty() {
            eprintln!("No files were changed.");
            return Ok(RunReport::new(
                RunOutcome::NoChanges,
                remediations,
                vec![],
                model_used,
                authenticated,
            ));
        }

        if opts.dry_run {
            eprintln!(
                "Dry run: {} changed file(s) left unpublished.",
                changed.len()
            );
            return Ok(RunReport::new(
                RunOutcome::DryRun,
                remediations,
                vec![],
                model_used,
                authenticated,
            ));
        }

        let publisher = ChangePublisher::new(git, host, &self.config.publish);
        let mut changes = Vec::with_capacity(changed.len());
        for path in &changed {
            let (record, error) = publisher.publish(path).await;
            match &error {
                Some(e) => eprintln!("warning: publishing {path} failed: {e}"),
                None => eprintln!("Opened review request for {path} ({})", record.branch),
            }
            changes.push(record);
        }

        Ok(RunReport::new(
            RunOutcome::Completed,
            remediations,
            changes,
            model_used,
            authenticated,
        ))
    }

    /// Establish a code-host session if one is not already present.
    ///
    /// Never fatal: an unauthenticated run proceeds and fails per-file at
    /// the publish step, which the report records.
    async fn authenticate<H: CodeHost>(&self, host: &H, opts: &RunOptions) -> bool {
        match host.auth_status().await {
            Ok(true) => {
                eprintln!("Code host session already authenticated.");
                return true;
            }
            Ok(false) => {}
            Err(e) => {
                eprintln!("warning: could not query auth status: {e}");
                return false;
            }
        }

        let token = opts
            .token
            .clone()
            .or_else(|| std::env::var("GH_TOKEN").ok());
        match token {
            Some(token) => match host.login_with_token(&token).await {
                Ok(()) => {
                    eprintln!("Authenticated with the code host using the supplied token.");
                    return true;
                }
                Err(e) => eprintln!("warning: token authentication failed: {e}"),
            },
            None => eprintln!("No code-host token supplied (set GH_TOKEN or pass --token)."),
        }

        if opts.allow_interactive {
            match host.login_interactive().await {
                Ok(true) => return true,
                Ok(false) => eprintln!("Interactive login cancelled."),
                Err(e) => eprintln!("warning: interactive login failed: {e}"),
            }
        }

        eprintln!("warning: proceeding unauthenticated; review requests will fail.");
        false
    }

    /// Invoke the external analyzer inside the working copy.
    ///
    /// Exit status is logged, never fatal: a scanner warning must not block
    /// remediation of files already flagged by the report on disk.
    async fn trigger_scan(&self, work: &Path, timeout: Duration) {
        let scan = &self.config.scan;
        let args: Vec<&str> = scan.args.iter().map(String::as_str).collect();
        eprintln!("Running analysis: {} ...", scan.program);
        match process::run(&scan.program, &args, Some(work), timeout).await {
            Ok(output) if output.success => {}
            Ok(output) => eprintln!(
                "warning: analyzer exited with {:?}; continuing with the report on disk",
                output.code
            ),
            Err(e) => eprintln!("warning: analyzer did not run: {e}; continuing with the report on disk"),
        }
    }
}
