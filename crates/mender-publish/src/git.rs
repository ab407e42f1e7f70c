use std::path::{Path, PathBuf};
use std::time::Duration;

use mender_core::MenderError;

use crate::process::{run, CommandOutput};

/// Thin wrapper over the `git` CLI scoped to one working copy.
///
/// Every operation is a blocking external call with a timeout; failures carry
/// git's stderr so the run report stays diagnosable.
pub struct GitCli {
    root: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Create a wrapper for the working copy at `root`.
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    /// Path of the working copy this wrapper operates on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Clone `url` into `dest`. Fatal to the run if it fails.
    ///
    /// # Errors
    ///
    /// Returns [`MenderError::Git`] with git's stderr on failure.
    pub async fn clone_repo(url: &str, dest: &Path, timeout: Duration) -> Result<(), MenderError> {
        let dest_str = dest.to_string_lossy();
        let output = run("git", &["clone", url, &dest_str], None, timeout).await?;
        if !output.success {
            return Err(MenderError::Git(format!(
                "git clone {url} failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    async fn git(&self, args: &[&str]) -> Result<CommandOutput, MenderError> {
        run("git", args, Some(&self.root), self.timeout).await
    }

    async fn git_checked(&self, args: &[&str]) -> Result<CommandOutput, MenderError> {
        let output = self.git(args).await?;
        if !output.success {
            return Err(MenderError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(output)
    }

    /// Changed paths from `git status --porcelain`, in git's output order.
    ///
    /// Handles both untracked (`??`) and modified/staged encodings; rename
    /// lines yield the new path.
    ///
    /// # Errors
    ///
    /// Returns [`MenderError::Git`] if the status listing cannot be obtained.
    /// Fatal to the run, since change detection is impossible without it.
    pub async fn status_porcelain(&self) -> Result<Vec<String>, MenderError> {
        let output = self.git_checked(&["status", "--porcelain"]).await?;
        Ok(output
            .stdout
            .lines()
            .filter_map(parse_porcelain_line)
            .collect())
    }

    /// Name of the currently checked-out branch.
    pub async fn current_branch(&self) -> Result<String, MenderError> {
        let output = self
            .git_checked(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Switch to an existing branch.
    pub async fn checkout(&self, branch: &str) -> Result<(), MenderError> {
        self.git_checked(&["checkout", branch]).await.map(|_| ())
    }

    /// Create and switch to a new branch.
    pub async fn create_branch(&self, branch: &str) -> Result<(), MenderError> {
        self.git_checked(&["checkout", "-b", branch])
            .await
            .map(|_| ())
    }

    /// Stage a single file.
    pub async fn add(&self, file: &str) -> Result<(), MenderError> {
        self.git_checked(&["add", "--", file]).await.map(|_| ())
    }

    /// Commit staged changes.
    pub async fn commit(&self, message: &str) -> Result<(), MenderError> {
        self.git_checked(&["commit", "-m", message])
            .await
            .map(|_| ())
    }

    /// Push a branch to `remote`.
    pub async fn push(&self, remote: &str, branch: &str) -> Result<(), MenderError> {
        self.git_checked(&["push", remote, branch]).await.map(|_| ())
    }
}

/// Parse one `git status --porcelain` line into a changed path.
///
/// The format is a two-character status code, a space, then the path:
/// `?? new.py` for untracked entries, ` M a.py` / `M  a.py` for modified
/// ones. Rename entries (`R  old -> new`) yield the new path. Paths git
/// quotes (spaces, escapes) come back unquoted so later `git add -- <path>`
/// calls receive the real file name.
///
/// # Examples
///
/// ```
/// use mender_publish::git::parse_porcelain_line;
///
/// assert_eq!(parse_porcelain_line("?? new.py").as_deref(), Some("new.py"));
/// assert_eq!(parse_porcelain_line(" M src/a.py").as_deref(), Some("src/a.py"));
/// assert_eq!(parse_porcelain_line("?? \"a b.py\"").as_deref(), Some("a b.py"));
/// assert_eq!(parse_porcelain_line(""), None);
/// ```
pub fn parse_porcelain_line(line: &str) -> Option<String> {
    if line.len() < 4 {
        return None;
    }
    let path = line[3..].trim();
    if path.is_empty() {
        return None;
    }
    let path = match path.split_once(" -> ") {
        Some((_, renamed)) => renamed,
        None => path,
    };
    Some(unquote(path))
}

/// Undo git's C-style path quoting (`"a b.py"`, `"tab\there"`).
fn unquote(path: &str) -> String {
    let Some(inner) = path
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return path.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn porcelain_untracked() {
        assert_eq!(parse_porcelain_line("?? c.py").as_deref(), Some("c.py"));
    }

    #[test]
    fn porcelain_modified_unstaged() {
        assert_eq!(parse_porcelain_line(" M a.py").as_deref(), Some("a.py"));
    }

    #[test]
    fn porcelain_modified_staged() {
        assert_eq!(parse_porcelain_line("M  a.py").as_deref(), Some("a.py"));
    }

    #[test]
    fn porcelain_rename_takes_new_path() {
        assert_eq!(
            parse_porcelain_line("R  old.py -> new.py").as_deref(),
            Some("new.py")
        );
    }

    #[test]
    fn porcelain_nested_path() {
        assert_eq!(
            parse_porcelain_line(" M src/deep/mod.py").as_deref(),
            Some("src/deep/mod.py")
        );
    }

    #[test]
    fn porcelain_blank_and_short_lines_skipped() {
        assert_eq!(parse_porcelain_line(""), None);
        assert_eq!(parse_porcelain_line("M"), None);
    }

    #[test]
    fn porcelain_quoted_path_is_unquoted() {
        assert_eq!(
            parse_porcelain_line("?? \"a b.py\"").as_deref(),
            Some("a b.py")
        );
        assert_eq!(
            parse_porcelain_line(" M \"dir name/file.py\"").as_deref(),
            Some("dir name/file.py")
        );
    }

    #[test]
    fn porcelain_quoted_escapes_are_decoded() {
        assert_eq!(
            parse_porcelain_line("?? \"quo\\\"te.py\"").as_deref(),
            Some("quo\"te.py")
        );
        assert_eq!(
            parse_porcelain_line("?? \"back\\\\slash.py\"").as_deref(),
            Some("back\\slash.py")
        );
    }
}
