use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use mender_core::MenderError;

/// Captured output of a finished external process.
#[derive(Debug)]
pub struct CommandOutput {
    /// Decoded stdout (lossy UTF-8).
    pub stdout: String,
    /// Decoded stderr (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Raw exit code, if the process exited normally.
    pub code: Option<i32>,
}

fn describe(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| a.to_string()));
    parts.join(" ")
}

/// Run an external command with captured output and a hard timeout.
///
/// Arguments are passed as a structured list; nothing is ever interpreted by
/// a shell, so file paths and messages with special characters are safe.
///
/// # Errors
///
/// Returns [`MenderError::Process`] if the command cannot be spawned and
/// [`MenderError::Timeout`] (naming the command) if it outlives `timeout`,
/// so a stuck external tool surfaces instead of hanging the run.
pub async fn run(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput, MenderError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| MenderError::Timeout(describe(program, args)))?
        .map_err(|e| MenderError::Process(format!("failed to run {program}: {e}")))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        code: output.status.code(),
    })
}

/// Run an external command, feeding `input` to its stdin.
///
/// Used for `gh auth login --with-token`, which reads the credential from
/// stdin so the token never appears in an argument list or process listing.
///
/// # Errors
///
/// Same failure modes as [`run`].
pub async fn run_with_stdin(
    program: &str,
    args: &[&str],
    input: &str,
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput, MenderError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let fut = async {
        let mut child = command
            .spawn()
            .map_err(|e| MenderError::Process(format!("failed to run {program}: {e}")))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| MenderError::Process(format!("failed to write stdin: {e}")))?;
            // Dropping stdin closes the pipe so the child sees EOF.
        }
        child
            .wait_with_output()
            .await
            .map_err(|e| MenderError::Process(format!("failed to wait for {program}: {e}")))
    };

    let output = tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| MenderError::Timeout(describe(program, args)))??;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        success: output.status.success(),
        code: output.status.code(),
    })
}

/// Run an external command with inherited stdio and no timeout.
///
/// Only used for interactive fallbacks (`gh auth login` prompting the user);
/// a timeout makes no sense while a human is typing.
///
/// # Errors
///
/// Returns [`MenderError::Process`] if the command cannot be spawned.
pub async fn run_interactive(program: &str, args: &[&str]) -> Result<bool, MenderError> {
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| MenderError::Process(format!("failed to run {program}: {e}")))?;
    Ok(status.success())
}
