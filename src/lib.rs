//! # link-relay
//!
//! Backend library for tracking content links in a persisted sheet and
//! relaying them to a Telegram destination via the external `tdl` CLI.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Explicit configuration** - Every component receives its settings at
//!   construction; no process-wide singletons
//! - **Trait seams** - External commands (forward, open, download) sit
//!   behind traits so hosts and tests can swap them out
//!
//! ## Quick Start
//!
//! ```no_run
//! use link_relay::{
//!     ActionDispatcher, CliForwardInvoker, Config, ForwardOrchestrator, RecordStore,
//!     SystemLinkOpener, TerminalDownloader,
//! };
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         target_chat: "2532518781".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let mut store = RecordStore::new();
//!     store.load(&config.sheet_path)?;
//!     let store = Arc::new(Mutex::new(store));
//!
//!     let invoker = Arc::new(CliForwardInvoker::from_config(&config).ok_or("tdl not found")?);
//!     let orchestrator = Arc::new(ForwardOrchestrator::new(invoker, &config));
//!     let opener = Arc::new(SystemLinkOpener::from_path().ok_or("no URL opener")?);
//!     let downloader = Arc::new(TerminalDownloader::new("tlg".into(), vec!["1".into()]));
//!
//!     let dispatcher = ActionDispatcher::new(store, opener, downloader, orchestrator);
//!     dispatcher.forward(0).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Action dispatch for the three user actions
pub mod dispatch;
/// Error types
pub mod error;
/// Open and download integrations
pub mod external;
/// Tiered forwarding orchestrator
pub mod forward;
/// Pagination over the tracked list
pub mod pagination;
/// Fire-and-forget execution with marshaled callbacks
pub mod runner;
/// Persistent processed-state store
pub mod store;

// Re-export commonly used types
pub use config::{Config, TierTimeouts};
pub use dispatch::{ActionDispatcher, RefreshObserver};
pub use error::{Error, Result, StoreError};
pub use external::{ContentDownloader, LinkOpener, SystemLinkOpener, TerminalDownloader};
pub use forward::{
    AttemptOutcome, CliForwardInvoker, ForwardAttempt, ForwardInvoker, ForwardMode,
    ForwardOrchestrator, ForwardRequest, ForwardTier, InvokeOutcome, StorageSelector,
};
pub use pagination::{Pager, page_bounds, page_count};
pub use runner::AsyncRunner;
pub use store::{LinkRecord, PROCESSED_MARKER, RecordStore};
