use std::time::Duration;

use async_trait::async_trait;

use mender_core::MenderError;

use crate::process::{run, run_interactive, run_with_stdin};

/// Code-hosting platform operations the pipeline depends on.
///
/// The seam exists so tests can substitute a recording mock for the real
/// `gh` CLI; see [`crate::mock::MockHost`].
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Whether a valid session already exists.
    async fn auth_status(&self) -> Result<bool, MenderError>;

    /// Log in using a token supplied at run time.
    ///
    /// The token travels via stdin, never an argument list, and is never
    /// logged.
    async fn login_with_token(&self, token: &str) -> Result<(), MenderError>;

    /// Interactive login fallback. Returns `Ok(false)` if the user cancelled.
    async fn login_interactive(&self) -> Result<bool, MenderError>;

    /// Open a review request proposing `head` for merge into `base`.
    async fn open_review_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<(), MenderError>;
}

#[async_trait]
impl<H: CodeHost + ?Sized> CodeHost for &H {
    async fn auth_status(&self) -> Result<bool, MenderError> {
        (**self).auth_status().await
    }

    async fn login_with_token(&self, token: &str) -> Result<(), MenderError> {
        (**self).login_with_token(token).await
    }

    async fn login_interactive(&self) -> Result<bool, MenderError> {
        (**self).login_interactive().await
    }

    async fn open_review_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<(), MenderError> {
        (**self).open_review_request(base, head, title, body).await
    }
}

/// [`CodeHost`] implementation backed by the GitHub CLI (`gh`).
pub struct GhCli {
    root: std::path::PathBuf,
    timeout: Duration,
}

impl GhCli {
    /// Create a wrapper running `gh` inside the working copy at `root`.
    pub fn new(root: impl Into<std::path::PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }
}

#[async_trait]
impl CodeHost for GhCli {
    async fn auth_status(&self) -> Result<bool, MenderError> {
        let output = run("gh", &["auth", "status"], None, self.timeout).await?;
        Ok(output.success)
    }

    async fn login_with_token(&self, token: &str) -> Result<(), MenderError> {
        let output = run_with_stdin(
            "gh",
            &["auth", "login", "--with-token"],
            token,
            None,
            self.timeout,
        )
        .await?;
        if !output.success {
            return Err(MenderError::Publish(format!(
                "token authentication failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    async fn login_interactive(&self) -> Result<bool, MenderError> {
        run_interactive("gh", &["auth", "login"]).await
    }

    async fn open_review_request(
        &self,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<(), MenderError> {
        let output = run(
            "gh",
            &[
                "pr", "create", "--base", base, "--head", head, "--title", title, "--body", body,
            ],
            Some(&self.root),
            self.timeout,
        )
        .await?;
        if !output.success {
            return Err(MenderError::Publish(format!(
                "review request for {head} failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(())
    }
}
