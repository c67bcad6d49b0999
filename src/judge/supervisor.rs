use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::ExecutionResult;

/// Bound on draining the output streams after the child is gone. A process
/// that escaped the child's process group can still hold the pipe write
/// ends open; it must never block the return.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Runs a prepared command to completion under a wall-clock deadline and
/// classifies the outcome.
///
/// Classification follows the harness contract: a harness writes to stderr
/// only on failure, so any stderr content (non-empty after trimming) is a
/// failure regardless of exit code, and stdout is discarded in that case.
/// Otherwise the trimmed stdout is the result. On deadline expiry the child
/// is terminated and the accumulated stderr, if any, becomes the failure
/// message.
///
/// Every artifact in `artifacts` is removed before this returns, on every
/// path: normal completion, stderr failure, spawn error, timeout.
pub(super) async fn supervise(
    mut command: Command,
    artifacts: &[PathBuf],
    deadline: Duration,
) -> ExecutionResult {
    let result = run_supervised(&mut command, deadline).await;
    remove_artifacts(artifacts);
    result
}

async fn run_supervised(command: &mut Command, deadline: Duration) -> ExecutionResult {
    // The child leads its own process group so that on expiry the whole
    // tree can be killed, not just the direct child.
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return ExecutionResult::failure(format!("Execution error: {e}")),
    };
    let pgid = child.id();

    let Some(mut stdout_pipe) = child.stdout.take() else {
        return ExecutionResult::failure("Execution error: child stdout was not captured");
    };
    let Some(mut stderr_pipe) = child.stderr.take() else {
        return ExecutionResult::failure("Execution error: child stderr was not captured");
    };

    // Drain both streams incrementally so a chatty child never blocks on a
    // full pipe while we wait for it to exit.
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        buf
    });

    let waited = timeout(deadline, child.wait()).await;

    if waited.is_err() {
        // Deadline elapsed: terminate the entire process group and reap the
        // child. Killing only the child would leave forked descendants
        // running with the pipe write ends still open.
        kill_process_group(pgid);
        let _ = child.start_kill();
        let _ = child.wait().await;
    }

    let stdout = collect_stream(stdout_task).await;
    let stderr = collect_stream(stderr_task).await;

    match waited {
        Err(_) => {
            if stderr.is_empty() {
                ExecutionResult::failure(format!(
                    "Time limit exceeded ({} ms)",
                    deadline.as_millis()
                ))
            } else {
                ExecutionResult::failure(stderr)
            }
        }
        Ok(Err(e)) => ExecutionResult::failure(format!("Execution error: {e}")),
        Ok(Ok(_exit_status)) => {
            if stderr.is_empty() {
                ExecutionResult::success(stdout)
            } else {
                ExecutionResult::failure(stderr)
            }
        }
    }
}

async fn collect_stream(mut task: tokio::task::JoinHandle<Vec<u8>>) -> String {
    let bytes = match timeout(DRAIN_GRACE, &mut task).await {
        Ok(joined) => joined.unwrap_or_default(),
        Err(_) => {
            task.abort();
            Vec::new()
        }
    };
    String::from_utf8_lossy(&bytes).trim().to_string()
}

/// SIGKILLs every process in the child's group. The child was spawned as
/// its own group leader, so the negative pid addresses the whole tree.
fn kill_process_group(pgid: Option<u32>) {
    if let Some(pgid) = pgid {
        unsafe {
            libc::kill(-(pgid as i32), libc::SIGKILL);
        }
    }
}

/// Best-effort removal of temporary artifacts. Failures are swallowed by
/// design: artifact leakage under e.g. disk exhaustion is an accepted
/// residual risk, not a reported error.
pub(super) fn remove_artifacts(artifacts: &[PathBuf]) {
    for path in artifacts {
        let outcome = if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        if let Err(e) = outcome {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::debug!("Failed to remove artifact {}: {e}", path.display());
            }
        }
    }
}
