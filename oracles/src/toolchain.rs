//! External toolchain invocation with timeout and kill-on-drop.
//!
//! Tools are spawned with `tokio::process::Command`; a dropped future kills
//! the child, so cancelling a session abandons in-flight invocations.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// Errors raised when a toolchain cannot be run at all.
///
/// A tool that runs and reports failures is not an error at this level;
/// its output is parsed into diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to spawn `{tool}`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the external tools live and how long they may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// TypeScript compiler binary.
    pub tsc_bin: String,
    /// jscodeshift binary.
    pub jscodeshift_bin: String,
    /// Parser passed to jscodeshift (`--parser`).
    pub parser: String,
    /// Upper bound for one tool invocation.
    pub tool_timeout_secs: u64,
    /// Parent directory for per-session scratch dirs. `None` uses the
    /// system temp dir. Point it at a directory with `node_modules` so
    /// the type checker resolves `jscodeshift` types.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            tsc_bin: "tsc".to_string(),
            jscodeshift_bin: "jscodeshift".to_string(),
            parser: "tsx".to_string(),
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            scratch_dir: None,
        }
    }
}

impl ToolchainConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Captured result of one tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Run `program args..` in `working_dir`, bounded by `timeout`.
pub async fn run_tool<I, S>(
    program: &str,
    args: I,
    working_dir: &Path,
    timeout: Duration,
) -> Result<ToolOutput, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = tokio::process::Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ToolError::Spawn {
                tool: program.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(ToolError::Timeout {
                tool: program.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    };

    let result = ToolOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    debug!(tool = program, exit_code = ?result.exit_code, "tool finished");
    Ok(result)
}
