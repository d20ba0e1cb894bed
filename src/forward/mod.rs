//! Tiered forwarding orchestrator
//!
//! Delivers a link to a destination chat by degrading through three tiers of
//! decreasing fidelity, each bound to one external command invocation with
//! its own timeout:
//!
//! 1. **Direct** — forward the referenced content as-is.
//! 2. **Clone text** — clone with the caption replaced by the literal link.
//! 3. **File relay** — write the link to a transient artifact and clone from
//!    a `file://` source. The artifact is removed on every exit path.
//!
//! Tiers run strictly sequentially: a tier starts only after the previous
//! one has fully terminated (a timed-out child is killed, not abandoned) and
//! reported failure. The first success stops the chain.

mod invoker;

pub use invoker::{
    CliForwardInvoker, ForwardInvoker, ForwardMode, ForwardRequest, InvokeOutcome, StorageSelector,
};

use crate::config::{Config, TierTimeouts};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One fallback tier of the forwarding chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardTier {
    /// Direct forward of the referenced content
    Direct,
    /// Clone with the caption replaced by the literal link text
    CloneText,
    /// Clone sourced from a transient file artifact
    FileRelay,
}

impl ForwardTier {
    /// Tier name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ForwardTier::Direct => "direct",
            ForwardTier::CloneText => "clone-text",
            ForwardTier::FileRelay => "file-relay",
        }
    }
}

/// How a single tier attempt concluded
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Zero exit before the deadline
    Succeeded,
    /// The command exited nonzero (or was killed by a signal)
    Failed {
        /// Exit code, if any
        code: Option<i32>,
        /// Captured stderr output
        stderr: String,
    },
    /// The deadline elapsed and the process was terminated
    TimedOut,
    /// The invocation itself could not run
    Errored(String),
}

/// Diagnostic record of one tier attempt
///
/// Exists only for the duration of one forwarding call and feeds the log;
/// it is never stored and is not part of the contract surface.
#[derive(Clone, Debug)]
pub struct ForwardAttempt {
    /// Which tier was attempted
    pub tier: ForwardTier,
    /// Description of the invoked external command
    pub command: String,
    /// How the invocation concluded
    pub outcome: AttemptOutcome,
}

impl ForwardAttempt {
    fn succeeded(&self) -> bool {
        self.outcome == AttemptOutcome::Succeeded
    }

    fn log(&self) {
        match &self.outcome {
            AttemptOutcome::Succeeded => {
                tracing::info!(tier = self.tier.name(), "Forward tier succeeded");
            }
            AttemptOutcome::Failed { code, stderr } => {
                tracing::warn!(
                    tier = self.tier.name(),
                    command = %self.command,
                    code = ?code,
                    stderr = %stderr,
                    "Forward tier failed"
                );
            }
            AttemptOutcome::TimedOut => {
                tracing::warn!(tier = self.tier.name(), "Forward tier timed out");
            }
            AttemptOutcome::Errored(reason) => {
                tracing::warn!(tier = self.tier.name(), error = %reason, "Forward tier errored");
            }
        }
    }
}

/// Orchestrates the three-tier forwarding fallback chain
///
/// Construction captures everything the chain needs (session path, target
/// chat, relay directory, timeouts); `forward` takes only the link.
pub struct ForwardOrchestrator {
    invoker: Arc<dyn ForwardInvoker>,
    session_path: PathBuf,
    target_chat: String,
    relay_dir: PathBuf,
    timeouts: TierTimeouts,
}

impl ForwardOrchestrator {
    /// Create an orchestrator bound to an invoker and configuration
    pub fn new(invoker: Arc<dyn ForwardInvoker>, config: &Config) -> Self {
        Self {
            invoker,
            session_path: config.session_path(),
            target_chat: config.target_chat.clone(),
            relay_dir: config.relay_dir.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    /// Attempt delivery of `link`, degrading through the fallback tiers
    ///
    /// Returns true as soon as any tier succeeds; false only after all three
    /// tiers were attempted and failed. Per-attempt diagnostics go to the
    /// log; they are not part of the contract surface.
    pub async fn forward(&self, link: &str) -> bool {
        if link.trim().is_empty() {
            tracing::warn!("Refusing to forward an empty link");
            return false;
        }

        let storage = StorageSelector::bolt(self.session_path.clone());

        let direct = ForwardRequest {
            storage: storage.clone(),
            from: link.to_string(),
            to: self.target_chat.clone(),
            mode: ForwardMode::Direct,
            edit: None,
        };
        if self.attempt(ForwardTier::Direct, &direct, self.timeouts.direct).await {
            return true;
        }

        let clone_text = ForwardRequest {
            storage: storage.clone(),
            from: link.to_string(),
            to: self.target_chat.clone(),
            mode: ForwardMode::Clone,
            edit: Some(link.to_string()),
        };
        if self
            .attempt(ForwardTier::CloneText, &clone_text, self.timeouts.clone_text)
            .await
        {
            return true;
        }

        self.file_relay(link, storage).await
    }

    /// Tier 3: relay the link through a transient file artifact
    ///
    /// The artifact gets a unique per-call name so concurrent forwards cannot
    /// race on a shared path, and it is deleted when the handle drops, which
    /// covers the success, failure, and panic paths alike.
    async fn file_relay(&self, link: &str, storage: StorageSelector) -> bool {
        let artifact = match tempfile::Builder::new()
            .prefix("relay-link-")
            .suffix(".txt")
            .tempfile_in(&self.relay_dir)
        {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::warn!(
                    dir = %self.relay_dir.display(),
                    error = %e,
                    "Could not create relay artifact"
                );
                return false;
            }
        };
        if let Err(e) = artifact.as_file().write_all(link.as_bytes()) {
            tracing::warn!(error = %e, "Could not write relay artifact");
            return false;
        }

        let request = ForwardRequest {
            storage,
            from: format!("file://{}", artifact.path().display()),
            to: self.target_chat.clone(),
            mode: ForwardMode::Clone,
            edit: None,
        };
        self.attempt(ForwardTier::FileRelay, &request, self.timeouts.file_relay)
            .await
        // artifact dropped here: the relay file is removed regardless of outcome
    }

    async fn attempt(&self, tier: ForwardTier, request: &ForwardRequest, limit: Duration) -> bool {
        tracing::info!(
            tier = tier.name(),
            invoker = self.invoker.name(),
            command = %request.describe(),
            timeout_secs = limit.as_secs(),
            "Attempting forward tier"
        );

        let outcome = match self.invoker.invoke(request, limit).await {
            Ok(outcome) if outcome.succeeded() => AttemptOutcome::Succeeded,
            Ok(InvokeOutcome::Completed { code, stderr }) => {
                AttemptOutcome::Failed { code, stderr }
            }
            Ok(InvokeOutcome::TimedOut) => AttemptOutcome::TimedOut,
            Err(e) => AttemptOutcome::Errored(e.to_string()),
        };
        let attempt = ForwardAttempt {
            tier,
            command: request.describe(),
            outcome,
        };
        attempt.log();
        attempt.succeeded()
    }
}
