//! Configuration types for link-relay

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-tier timeouts for the forwarding fallback chain
///
/// Each tier's external command is bound by its own deadline. A command that
/// runs past the deadline is killed and the tier counts as failed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierTimeouts {
    /// Timeout for the direct forward tier (default: 60s)
    #[serde(default = "default_direct_timeout")]
    pub direct: Duration,

    /// Timeout for the clone-with-literal-text tier (default: 30s)
    #[serde(default = "default_clone_timeout")]
    pub clone_text: Duration,

    /// Timeout for the file-relay tier (default: 30s)
    #[serde(default = "default_clone_timeout")]
    pub file_relay: Duration,
}

impl Default for TierTimeouts {
    fn default() -> Self {
        Self {
            direct: default_direct_timeout(),
            clone_text: default_clone_timeout(),
            file_relay: default_clone_timeout(),
        }
    }
}

/// Main configuration for the relay backend
///
/// Every component receives the values it needs from this struct at
/// construction time; there are no process-wide singletons.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Path of the sheet file holding the tracked links
    #[serde(default = "default_sheet_path")]
    pub sheet_path: PathBuf,

    /// Number of records shown per page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Destination chat identifier for forwards
    #[serde(default)]
    pub target_chat: String,

    /// Which local tdl account/session store to use (default: 1)
    #[serde(default = "default_account_number")]
    pub account_number: u32,

    /// Root directory holding per-account session stores (default: ~/.tdl)
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    /// Directory for transient relay artifacts (default: system temp dir)
    #[serde(default = "default_relay_dir")]
    pub relay_dir: PathBuf,

    /// Explicit path to the tdl binary (auto-detected from PATH if None)
    #[serde(default)]
    pub tdl_path: Option<PathBuf>,

    /// Per-tier forward timeouts
    #[serde(default)]
    pub timeouts: TierTimeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_path: default_sheet_path(),
            page_size: default_page_size(),
            target_chat: String::new(),
            account_number: default_account_number(),
            storage_root: default_storage_root(),
            relay_dir: default_relay_dir(),
            tdl_path: None,
            timeouts: TierTimeouts::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config {
                message: "page_size must be at least 1".into(),
                key: Some("page_size".into()),
            });
        }
        if self.account_number == 0 {
            return Err(Error::Config {
                message: "account_number must be at least 1".into(),
                key: Some("account_number".into()),
            });
        }
        Ok(())
    }

    /// Expand the configured account number into its session store path
    ///
    /// Each account gets its own directory under `storage_root`; session
    /// stores are never shared across accounts.
    pub fn session_path(&self) -> PathBuf {
        self.storage_root
            .join(format!("account{}", self.account_number))
    }
}

fn default_sheet_path() -> PathBuf {
    PathBuf::from("links.tsv")
}

fn default_page_size() -> usize {
    20
}

fn default_account_number() -> u32 {
    1
}

fn default_storage_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tdl")
}

fn default_relay_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_direct_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_clone_timeout() -> Duration {
    Duration::from_secs(30)
}
