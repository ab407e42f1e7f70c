use chrono::{DateTime, Utc};

use mender_core::{ChangeRecord, MenderError, PublishConfig, PublishStatus};

use crate::git::GitCli;
use crate::host::CodeHost;

/// Replace path separators, dots, and whitespace with `-`, making a file
/// path safe for use inside a git ref name.
///
/// # Examples
///
/// ```
/// use mender_publish::sanitize_path;
///
/// assert_eq!(sanitize_path("src/app/main.py"), "src-app-main-py");
/// assert_eq!(sanitize_path("my file.py"), "my-file-py");
/// ```
pub fn sanitize_path(path: &str) -> String {
    path.chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | '.') || c.is_whitespace() {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Derive the branch name for one file's change.
///
/// `update-<UTC timestamp, second precision>-<sanitized path>`: sortable, and
/// unique per run unless the same path is published twice within one second.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use mender_publish::branch_name_for;
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(branch_name_for("a.py", t), "update-20240102-030405-a-py");
/// ```
pub fn branch_name_for(file_path: &str, now: DateTime<Utc>) -> String {
    format!(
        "update-{}-{}",
        now.format("%Y%m%d-%H%M%S"),
        sanitize_path(file_path)
    )
}

/// Publishes one modified file at a time as an isolated branch plus review
/// request.
///
/// Branch switches are global working-copy state, so a publisher must never
/// be driven concurrently; the pipeline calls it once per file, in sequence.
/// Whatever happens to an individual file, the working copy is returned to
/// the base branch before the next file is processed.
pub struct ChangePublisher<H: CodeHost> {
    git: GitCli,
    host: H,
    base_branch: String,
    remote: String,
    review_body: String,
}

impl<H: CodeHost> ChangePublisher<H> {
    /// Create a publisher for one working copy.
    pub fn new(git: GitCli, host: H, config: &PublishConfig) -> Self {
        Self {
            git,
            host,
            base_branch: config.base_branch.clone(),
            remote: config.remote.clone(),
            review_body: config.review_body.clone(),
        }
    }

    /// Borrow the underlying git wrapper (for status queries).
    pub fn git(&self) -> &GitCli {
        &self.git
    }

    /// Borrow the code host (for authentication).
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Publish one modified file.
    ///
    /// Any failed step marks the record `failed`; the error itself is carried
    /// back for logging but never aborts the caller's loop. The final switch
    /// back to the base branch happens regardless of success, so the next
    /// file's branch forks from a clean base.
    pub async fn publish(&self, file_path: &str) -> (ChangeRecord, Option<MenderError>) {
        let branch = branch_name_for(file_path, Utc::now());
        let mut record = ChangeRecord {
            file_path: file_path.into(),
            branch: branch.clone(),
            base_branch: self.base_branch.clone(),
            commit_message: format!("Update {file_path}"),
            status: PublishStatus::Pending,
        };

        let error = match self.publish_steps(file_path, &branch, &mut record).await {
            Ok(()) => None,
            Err(e) => {
                record.status = PublishStatus::Failed;
                Some(e)
            }
        };

        // Mandatory even after failure: the next file must fork from base.
        if let Err(e) = self.git.checkout(&self.base_branch).await {
            eprintln!(
                "warning: could not return to base branch '{}': {e}",
                self.base_branch
            );
        }

        (record, error)
    }

    async fn publish_steps(
        &self,
        file_path: &str,
        branch: &str,
        record: &mut ChangeRecord,
    ) -> Result<(), MenderError> {
        self.git.checkout(&self.base_branch).await?;
        self.git.create_branch(branch).await?;
        self.git.add(file_path).await?;
        self.git.commit(&record.commit_message).await?;
        self.git.push(&self.remote, branch).await?;
        record.status = PublishStatus::Pushed;

        let title = format!("Fix static analysis issues in {file_path}");
        self.host
            .open_review_request(&self.base_branch, branch, &title, &self.review_body)
            .await?;
        record.status = PublishStatus::ReviewOpened;
        Ok(())
    }
}
