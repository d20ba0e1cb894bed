//! External forward command invocation
//!
//! The orchestrator talks to the outside world through [`ForwardInvoker`],
//! so tests can script tier outcomes without a real binary. The production
//! implementation spawns the external `tdl` CLI with a per-invocation
//! deadline and kills the child if the deadline elapses.

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Forward mode passed to the external command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardMode {
    /// Forward the referenced content as-is
    Direct,
    /// Re-send a copy, optionally with an edited caption
    Clone,
}

impl ForwardMode {
    /// The `--mode` argument value
    pub fn as_arg(&self) -> &'static str {
        match self {
            ForwardMode::Direct => "direct",
            ForwardMode::Clone => "clone",
        }
    }
}

/// Storage selector identifying the backend and per-account session path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageSelector {
    backend: &'static str,
    path: PathBuf,
}

impl StorageSelector {
    /// Selector for a bolt-backed session store at `path`
    pub fn bolt(path: PathBuf) -> Self {
        Self {
            backend: "bolt",
            path,
        }
    }
}

impl std::fmt::Display for StorageSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type={},path={}", self.backend, self.path.display())
    }
}

/// One fully specified external forward invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardRequest {
    /// Which session store the invocation uses
    pub storage: StorageSelector,
    /// Source reference (a link or a `file://` artifact)
    pub from: String,
    /// Destination chat identifier
    pub to: String,
    /// Forward mode
    pub mode: ForwardMode,
    /// Caption/body override for clone mode
    pub edit: Option<String>,
}

impl ForwardRequest {
    /// Human-readable command description for logs and errors
    pub fn describe(&self) -> String {
        let mut desc = format!(
            "tdl forward --storage {} --from {} --to {} --mode {}",
            self.storage,
            self.from,
            self.to,
            self.mode.as_arg()
        );
        if let Some(edit) = &self.edit {
            desc.push_str(" --edit ");
            desc.push_str(edit);
        }
        desc
    }
}

/// Result of one external invocation that ran to a conclusion
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvokeOutcome {
    /// The process exited before the deadline
    Completed {
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured stderr output
        stderr: String,
    },
    /// The deadline elapsed; the process was terminated
    TimedOut,
}

impl InvokeOutcome {
    /// Success means a zero exit status before the deadline
    pub fn succeeded(&self) -> bool {
        matches!(self, InvokeOutcome::Completed { code: Some(0), .. })
    }
}

/// Seam for invoking the external forward command
#[async_trait]
pub trait ForwardInvoker: Send + Sync {
    /// Run one forward invocation, bounded by `limit`
    ///
    /// Timeouts are reported as `Ok(InvokeOutcome::TimedOut)`, not as errors;
    /// `Err` is reserved for faults in launching the process itself. Either
    /// way the caller treats a non-success as a failed tier.
    async fn invoke(&self, request: &ForwardRequest, limit: Duration) -> Result<InvokeOutcome>;

    /// Handler name for logs
    fn name(&self) -> &'static str;
}

/// Production invoker spawning the external `tdl` binary
pub struct CliForwardInvoker {
    binary_path: PathBuf,
}

impl CliForwardInvoker {
    /// Create an invoker with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find `tdl` in PATH
    pub fn from_path() -> Option<Self> {
        which::which("tdl").ok().map(Self::new)
    }

    /// Build from configuration: an explicit `tdl_path` wins over PATH
    /// discovery.
    pub fn from_config(config: &Config) -> Option<Self> {
        match &config.tdl_path {
            Some(path) => Some(Self::new(path.clone())),
            None => Self::from_path(),
        }
    }
}

#[async_trait]
impl ForwardInvoker for CliForwardInvoker {
    async fn invoke(&self, request: &ForwardRequest, limit: Duration) -> Result<InvokeOutcome> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("forward")
            .arg("--storage")
            .arg(request.storage.to_string())
            .arg("--from")
            .arg(&request.from)
            .arg("--to")
            .arg(&request.to)
            .arg("--mode")
            .arg(request.mode.as_arg());
        if let Some(edit) = &request.edit {
            cmd.arg("--edit").arg(edit);
        }
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| Error::ExternalProcess {
            command: request.describe(),
            code: None,
            stderr: format!("failed to spawn: {e}"),
        })?;

        // Drain stderr concurrently so a chatty child cannot block on a
        // full pipe while we wait for it to exit.
        let stderr_pipe = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr_pipe {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => {
                let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default())
                    .trim()
                    .to_string();
                Ok(InvokeOutcome::Completed {
                    code: status.code(),
                    stderr,
                })
            }
            Ok(Err(e)) => Err(Error::ExternalProcess {
                command: request.describe(),
                code: None,
                stderr: format!("failed to await process: {e}"),
            }),
            Err(_) => {
                // The tier must not leave the process running: kill it and
                // reap the zombie before reporting the timeout.
                let _ = child.start_kill();
                let _ = child.wait().await;
                stderr_task.abort();
                tracing::warn!(
                    command = %request.describe(),
                    timeout_secs = limit.as_secs(),
                    "Forward command timed out, process terminated"
                );
                Ok(InvokeOutcome::TimedOut)
            }
        }
    }

    fn name(&self) -> &'static str {
        "cli-tdl"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: ForwardMode, edit: Option<&str>) -> ForwardRequest {
        ForwardRequest {
            storage: StorageSelector::bolt(PathBuf::from("/home/u/.tdl/account1")),
            from: "https://t.me/c/100/1".into(),
            to: "2532518781".into(),
            mode,
            edit: edit.map(str::to_string),
        }
    }

    #[test]
    fn storage_selector_renders_backend_and_path() {
        let selector = StorageSelector::bolt(PathBuf::from("/home/u/.tdl/account2"));
        assert_eq!(selector.to_string(), "type=bolt,path=/home/u/.tdl/account2");
    }

    #[test]
    fn describe_includes_all_arguments() {
        let desc = request(ForwardMode::Direct, None).describe();
        assert!(desc.contains("--storage type=bolt,path=/home/u/.tdl/account1"));
        assert!(desc.contains("--from https://t.me/c/100/1"));
        assert!(desc.contains("--to 2532518781"));
        assert!(desc.contains("--mode direct"));
        assert!(!desc.contains("--edit"));
    }

    #[test]
    fn describe_includes_edit_override_in_clone_mode() {
        let desc = request(ForwardMode::Clone, Some("https://t.me/c/100/1")).describe();
        assert!(desc.contains("--mode clone"));
        assert!(desc.contains("--edit https://t.me/c/100/1"));
    }

    #[test]
    fn zero_exit_is_the_only_success() {
        let ok = InvokeOutcome::Completed {
            code: Some(0),
            stderr: String::new(),
        };
        let nonzero = InvokeOutcome::Completed {
            code: Some(1),
            stderr: "boom".into(),
        };
        let killed = InvokeOutcome::Completed {
            code: None,
            stderr: String::new(),
        };
        assert!(ok.succeeded());
        assert!(!nonzero.succeeded());
        assert!(!killed.succeeded());
        assert!(!InvokeOutcome::TimedOut.succeeded());
    }

    #[tokio::test]
    async fn invoke_with_invalid_binary_path_is_an_error() {
        let invoker = CliForwardInvoker::new(PathBuf::from("/nonexistent/path/to/tdl"));
        let result = invoker
            .invoke(&request(ForwardMode::Direct, None), Duration::from_secs(5))
            .await;

        match result {
            Err(Error::ExternalProcess { stderr, .. }) => {
                assert!(stderr.contains("failed to spawn"));
            }
            other => panic!("expected ExternalProcess error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invoke_reports_nonzero_exit_as_completed_failure() {
        // `false` ignores our arguments and exits 1, which is exactly the
        // shape of a failed forward attempt.
        let invoker = CliForwardInvoker::new(PathBuf::from("/bin/false"));
        let outcome = invoker
            .invoke(&request(ForwardMode::Direct, None), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            InvokeOutcome::Completed { code: Some(c), .. } if c != 0
        ));
    }

    #[tokio::test]
    async fn invoke_kills_process_on_timeout() {
        // `yes` ignores our arguments (it just echoes them forever), so it
        // stands in for a forward command that never finishes.
        let Ok(yes) = which::which("yes") else {
            eprintln!("Skipping test: yes binary not found in PATH");
            return;
        };
        let invoker = CliForwardInvoker::new(yes);

        let started = std::time::Instant::now();
        let outcome = invoker
            .invoke(
                &request(ForwardMode::Direct, None),
                Duration::from_millis(200),
            )
            .await
            .unwrap();

        assert_eq!(outcome, InvokeOutcome::TimedOut);
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "timed-out invocation must return promptly after killing the child"
        );
    }

    #[test]
    fn from_path_agrees_with_which() {
        let which_result = which::which("tdl");
        assert_eq!(which_result.is_ok(), CliForwardInvoker::from_path().is_some());
    }

    #[test]
    fn from_config_prefers_the_explicit_binary_path() {
        let config = Config {
            tdl_path: Some(PathBuf::from("/opt/tools/tdl")),
            ..Default::default()
        };
        let invoker = CliForwardInvoker::from_config(&config).unwrap();
        assert_eq!(invoker.binary_path, PathBuf::from("/opt/tools/tdl"));
    }

    #[test]
    fn from_config_without_explicit_path_falls_back_to_discovery() {
        let config = Config::default();
        assert!(config.tdl_path.is_none());
        assert_eq!(
            CliForwardInvoker::from_config(&config).is_some(),
            which::which("tdl").is_ok()
        );
    }
}
