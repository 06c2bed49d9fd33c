//! Runs external tools with captured output and a hard timeout.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

/// Captured result of a tool that exited successfully.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why a tool invocation did not succeed.
#[derive(Debug)]
pub enum ToolFailure {
    Spawn(std::io::Error),
    TimedOut(Duration),
    Exited { status: String, stderr: String },
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolFailure::Spawn(e) => write!(f, "failed to start: {e}"),
            ToolFailure::TimedOut(t) => write!(f, "timed out after {}s", t.as_secs()),
            ToolFailure::Exited { status, stderr } => {
                let tail = stderr_tail(stderr, 20);
                if tail.is_empty() {
                    write!(f, "exited with {status}")
                } else {
                    write!(f, "exited with {status}: {tail}")
                }
            }
        }
    }
}

/// Run `cmd` to completion, killing it if it outlives `timeout`.
pub async fn run_tool(mut cmd: Command, timeout: Duration) -> Result<ToolOutput, ToolFailure> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {:?}", cmd.as_std());
    let started = Instant::now();

    let child = cmd.spawn().map_err(ToolFailure::Spawn)?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ToolFailure::TimedOut(timeout))?
        .map_err(ToolFailure::Spawn)?;

    debug!(
        "{:?} finished with {} in {:.2}s",
        cmd.as_std().get_program(),
        output.status,
        started.elapsed().as_secs_f64()
    );

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(ToolFailure::Exited {
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

/// Last `max_lines` non-empty lines of a tool's stderr.
pub fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let skip = lines.len().saturating_sub(max_lines);
    lines[skip..].join("\n")
}
