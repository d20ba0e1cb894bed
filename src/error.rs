//! Error types for link-relay
//!
//! This module provides the error taxonomy for the library:
//! - Store errors (sheet unreadable, commit failed, not loaded)
//! - External process errors (nonzero exit, spawn failure)
//! - Timeouts for external command invocations
//! - Forward exhaustion after all fallback tiers failed

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for link-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for link-relay
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Record store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An invoked external command exited nonzero
    #[error("external process failed: {command} (exit code {code:?}): {stderr}")]
    ExternalProcess {
        /// Human-readable description of the invoked command
        command: String,
        /// Exit code reported by the process, if any
        code: Option<i32>,
        /// Captured stderr output
        stderr: String,
    },

    /// An external command did not finish within its bound
    #[error("external process timed out after {timeout:?}: {command}")]
    Timeout {
        /// Human-readable description of the invoked command
        command: String,
        /// The enforced timeout that elapsed
        timeout: Duration,
    },

    /// All forwarding tiers were attempted and failed
    #[error("forward exhausted all fallback tiers for link: {link}")]
    ForwardExhausted {
        /// The link that could not be delivered
        link: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "sheet_path")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by the persisted record store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Sheet file missing or corrupt at load time
    #[error("sheet unreadable at {path}: {reason}")]
    Unreadable {
        /// Path of the sheet that could not be loaded
        path: PathBuf,
        /// The reason the sheet could not be read
        reason: String,
    },

    /// Commit of a processed marker failed; in-memory state unchanged
    #[error("failed to commit sheet at {path}: {reason}")]
    WriteFailed {
        /// Path of the sheet that could not be committed
        path: PathBuf,
        /// The reason the commit failed
        reason: String,
    },

    /// Mutation attempted before any successful load
    #[error("no sheet loaded")]
    NotLoaded,

    /// Position does not identify any tracked record
    #[error("no tracked record at position {position}")]
    UnknownPosition {
        /// The row position that was requested
        position: usize,
    },
}
