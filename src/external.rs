//! Open and download integrations
//!
//! Opaque external collaborators for the non-forward actions: opening a link
//! with the platform URL handler and downloading content through a terminal
//! automation command. Both sit behind traits so the dispatcher can be
//! exercised without spawning real processes.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use url::Url;

/// Seam for the "open reference" integration
#[async_trait]
pub trait LinkOpener: Send + Sync {
    /// Hand the link to the platform opener; Ok means it was accepted
    async fn open(&self, link: &str) -> Result<()>;
}

/// Seam for the "download via terminal automation" integration
#[async_trait]
pub trait ContentDownloader: Send + Sync {
    /// Kick off a download of the linked content
    async fn download(&self, link: &str) -> Result<()>;
}

/// Rewrite a private-channel web link into its deep-link form
///
/// `https://t.me/c/<channel>/<post>` becomes
/// `tg://privatepost?channel=<channel>&post=<post>`, which opens the post in
/// the installed client instead of the browser. Any other link is left
/// untouched (returns `None`).
pub fn private_post_url(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    if url.host_str() != Some("t.me") {
        return None;
    }
    let mut segments = url.path_segments()?;
    if segments.next() != Some("c") {
        return None;
    }
    let channel = segments.next().filter(|s| !s.is_empty())?;
    let post = segments.next().filter(|s| !s.is_empty())?;
    Some(format!("tg://privatepost?channel={channel}&post={post}"))
}

/// Opens links with the platform URL opener (`open` / `xdg-open`)
pub struct SystemLinkOpener {
    opener_path: PathBuf,
}

impl SystemLinkOpener {
    /// Create an opener with an explicit binary path
    pub fn new(opener_path: PathBuf) -> Self {
        Self { opener_path }
    }

    /// Attempt to find the platform opener in PATH
    pub fn from_path() -> Option<Self> {
        let binary = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        which::which(binary).ok().map(Self::new)
    }
}

#[async_trait]
impl LinkOpener for SystemLinkOpener {
    async fn open(&self, link: &str) -> Result<()> {
        let target = private_post_url(link).unwrap_or_else(|| link.to_string());
        tracing::debug!(link, target = %target, "Opening link");
        run_checked(&self.opener_path, &[target]).await
    }
}

/// Downloads content by spawning a configured terminal command
///
/// The command receives its fixed arguments followed by the link, e.g.
/// `tlg 1 <link>`. What the command does with the link is opaque here.
pub struct TerminalDownloader {
    program: PathBuf,
    base_args: Vec<String>,
}

impl TerminalDownloader {
    /// Create a downloader invoking `program` with `base_args` before the link
    pub fn new(program: PathBuf, base_args: Vec<String>) -> Self {
        Self { program, base_args }
    }
}

#[async_trait]
impl ContentDownloader for TerminalDownloader {
    async fn download(&self, link: &str) -> Result<()> {
        tracing::debug!(link, program = %self.program.display(), "Starting download command");
        let mut args = self.base_args.clone();
        args.push(link.to_string());
        run_checked(&self.program, &args).await
    }
}

/// Run an external command to completion and require a zero exit status
async fn run_checked(program: &Path, args: &[String]) -> Result<()> {
    let describe = || format!("{} {}", program.display(), args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| Error::ExternalProcess {
            command: describe(),
            code: None,
            stderr: format!("failed to spawn: {e}"),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::ExternalProcess {
            command: describe(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
