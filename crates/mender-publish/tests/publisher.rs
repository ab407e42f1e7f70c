//! Publisher integration tests against real temporary git repositories.
//!
//! Each test builds a working copy with a bare "remote" so pushes actually
//! land somewhere, then drives the publisher with a recording mock host.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use mender_core::{PublishConfig, PublishStatus};
use mender_publish::git::GitCli;
use mender_publish::mock::MockHost;
use mender_publish::ChangePublisher;

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Working copy on branch `main` with `a.py`/`b.py` committed and a bare
/// remote named `origin`.
fn setup_repo() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    run_git(dir.path(), &["init", "--bare", "remote.git"]);

    let work = dir.path().join("work");
    std::fs::create_dir(&work).unwrap();
    run_git(&work, &["init"]);
    run_git(&work, &["checkout", "-b", "main"]);
    run_git(&work, &["config", "user.name", "test-user"]);
    run_git(&work, &["config", "user.email", "test@example.com"]);
    std::fs::write(work.join("a.py"), "import os\n").unwrap();
    std::fs::write(work.join("b.py"), "x = 1\n").unwrap();
    run_git(&work, &["add", "."]);
    run_git(&work, &["commit", "-m", "initial"]);

    let remote = dir.path().join("remote.git");
    run_git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);
    run_git(&work, &["push", "origin", "main"]);

    (dir, work)
}

fn publisher(work: &Path, host: MockHost) -> ChangePublisher<MockHost> {
    let git = GitCli::new(work, Duration::from_secs(30));
    ChangePublisher::new(git, host, &PublishConfig::default())
}

#[tokio::test]
async fn status_lists_modified_and_untracked_files() {
    let (_dir, work) = setup_repo();
    std::fs::write(work.join("a.py"), "import sys\n").unwrap();
    std::fs::write(work.join("new.py"), "fresh\n").unwrap();

    let git = GitCli::new(&work, Duration::from_secs(30));
    let changed = git.status_porcelain().await.unwrap();
    assert!(changed.contains(&"a.py".to_string()));
    assert!(changed.contains(&"new.py".to_string()));
    assert_eq!(changed.len(), 2);
}

#[tokio::test]
async fn clean_tree_reports_no_changes() {
    let (_dir, work) = setup_repo();
    let git = GitCli::new(&work, Duration::from_secs(30));
    assert!(git.status_porcelain().await.unwrap().is_empty());
}

#[tokio::test]
async fn publish_opens_review_request_and_returns_to_base() {
    let (_dir, work) = setup_repo();
    std::fs::write(work.join("a.py"), "import sys\n").unwrap();

    let publisher = publisher(&work, MockHost::authenticated());
    let (record, error) = publisher.publish("a.py").await;

    assert!(error.is_none(), "unexpected error: {error:?}");
    assert_eq!(record.status, PublishStatus::ReviewOpened);
    assert!(record.branch.starts_with("update-"));
    assert_eq!(record.base_branch, "main");
    assert_eq!(record.commit_message, "Update a.py");

    let opened = publisher.host().opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].base, "main");
    assert_eq!(opened[0].head, record.branch);
    assert!(opened[0].title.contains("a.py"));

    // Working copy restored to base.
    assert_eq!(publisher.git().current_branch().await.unwrap(), "main");

    // The branch made it to the remote.
    let remote_branches = git_stdout(&work, &["ls-remote", "--heads", "origin"]);
    assert!(remote_branches.contains(&record.branch));
}

#[tokio::test]
async fn publish_commits_only_the_named_file() {
    let (_dir, work) = setup_repo();
    std::fs::write(work.join("a.py"), "import sys\n").unwrap();
    std::fs::write(work.join("b.py"), "x = 2\n").unwrap();

    let publisher = publisher(&work, MockHost::authenticated());
    let (record, _) = publisher.publish("a.py").await;
    assert_eq!(record.status, PublishStatus::ReviewOpened);

    // b.py's modification is still pending on the working tree.
    let changed = publisher.git().status_porcelain().await.unwrap();
    assert_eq!(changed, vec!["b.py".to_string()]);

    let shown = git_stdout(&work, &["show", "--name-only", "--format=", &record.branch]);
    assert!(shown.contains("a.py"));
    assert!(!shown.contains("b.py"));
}

#[tokio::test]
async fn failed_review_request_marks_failed_but_restores_base() {
    let (_dir, work) = setup_repo();
    std::fs::write(work.join("a.py"), "import sys\n").unwrap();

    let publisher = publisher(&work, MockHost::authenticated().failing_reviews());
    let (record, error) = publisher.publish("a.py").await;

    assert_eq!(record.status, PublishStatus::Failed);
    assert!(error.is_some());
    assert_eq!(publisher.git().current_branch().await.unwrap(), "main");
}

#[tokio::test]
async fn one_failure_never_blocks_the_next_file() {
    let (_dir, work) = setup_repo();
    std::fs::write(work.join("a.py"), "import sys\n").unwrap();
    std::fs::write(work.join("b.py"), "x = 2\n").unwrap();

    // First file fails at the review-request step.
    let publisher_a = publisher(&work, MockHost::authenticated().failing_reviews());
    let (record_a, _) = publisher_a.publish("a.py").await;
    assert_eq!(record_a.status, PublishStatus::Failed);

    // Second file still publishes cleanly from base.
    let publisher_b = publisher(&work, MockHost::authenticated());
    let (record_b, error) = publisher_b.publish("b.py").await;
    assert!(error.is_none(), "unexpected error: {error:?}");
    assert_eq!(record_b.status, PublishStatus::ReviewOpened);
    assert_ne!(record_a.branch, record_b.branch);
    assert_eq!(publisher_b.git().current_branch().await.unwrap(), "main");
}

#[tokio::test]
async fn publish_handles_paths_with_spaces() {
    let (_dir, work) = setup_repo();
    std::fs::write(work.join("my module.py"), "x = 1\n").unwrap();

    // Quoted in the porcelain listing, unquoted in the result.
    let git = GitCli::new(&work, Duration::from_secs(30));
    let changed = git.status_porcelain().await.unwrap();
    assert_eq!(changed, vec!["my module.py".to_string()]);

    let publisher = publisher(&work, MockHost::authenticated());
    let (record, error) = publisher.publish("my module.py").await;

    assert!(error.is_none(), "unexpected error: {error:?}");
    assert_eq!(record.status, PublishStatus::ReviewOpened);
    assert!(!record.branch.contains(' '));
    assert_eq!(publisher.git().current_branch().await.unwrap(), "main");

    let remote_branches = git_stdout(&work, &["ls-remote", "--heads", "origin"]);
    assert!(remote_branches.contains(&record.branch));
}

#[tokio::test]
async fn distinct_files_get_distinct_branches_same_run() {
    let (_dir, work) = setup_repo();
    std::fs::write(work.join("a.py"), "import sys\n").unwrap();
    std::fs::write(work.join("b.py"), "x = 2\n").unwrap();

    let publisher = publisher(&work, MockHost::authenticated());
    let (record_a, _) = publisher.publish("a.py").await;
    let (record_b, _) = publisher.publish("b.py").await;

    assert_ne!(record_a.branch, record_b.branch);
    assert_eq!(record_a.status, PublishStatus::ReviewOpened);
    assert_eq!(record_b.status, PublishStatus::ReviewOpened);
    assert_eq!(publisher.git().current_branch().await.unwrap(), "main");
}
