//! Action dispatch
//!
//! [`ActionDispatcher`] is the single entry point the presentation layer
//! calls for the three user actions. It resolves the record's link, runs the
//! matching integration, and marks the record processed only when the
//! integration reported success. All store access is serialized behind one
//! mutex, so a concurrent load and mark can never interleave mid-mutation.

use crate::error::{Error, Result, StoreError};
use crate::external::{ContentDownloader, LinkOpener};
use crate::forward::ForwardOrchestrator;
use crate::store::RecordStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Notified after a record was durably marked processed
///
/// The presentation layer implements this to refresh its display; the core
/// has no dependency on any concrete presentation type.
pub trait RefreshObserver: Send + Sync {
    /// A record at `position` is now processed
    fn record_marked(&self, position: usize);
}

/// Dispatches user actions against tracked records
pub struct ActionDispatcher {
    store: Arc<Mutex<RecordStore>>,
    opener: Arc<dyn LinkOpener>,
    downloader: Arc<dyn ContentDownloader>,
    orchestrator: Arc<ForwardOrchestrator>,
    observer: Option<Arc<dyn RefreshObserver>>,
}

impl ActionDispatcher {
    /// Create a dispatcher over a shared store and its integrations
    pub fn new(
        store: Arc<Mutex<RecordStore>>,
        opener: Arc<dyn LinkOpener>,
        downloader: Arc<dyn ContentDownloader>,
        orchestrator: Arc<ForwardOrchestrator>,
    ) -> Self {
        Self {
            store,
            opener,
            downloader,
            orchestrator,
            observer: None,
        }
    }

    /// Attach a refresh observer
    pub fn with_observer(mut self, observer: Arc<dyn RefreshObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The shared store, for the presentation layer's read access
    pub fn store(&self) -> Arc<Mutex<RecordStore>> {
        self.store.clone()
    }

    /// Open the record's link with the platform opener, then mark it processed
    pub async fn open(&self, position: usize) -> Result<()> {
        let link = self.link_at(position).await?;
        self.opener.open(&link).await?;
        self.mark(position).await
    }

    /// Download the record's content, then mark it processed
    pub async fn download(&self, position: usize) -> Result<()> {
        let link = self.link_at(position).await?;
        self.downloader.download(&link).await?;
        self.mark(position).await
    }

    /// Forward the record's link through the fallback chain
    ///
    /// The record is marked processed only on overall success; exhaustion of
    /// all tiers surfaces as [`Error::ForwardExhausted`] with nothing marked.
    pub async fn forward(&self, position: usize) -> Result<()> {
        let link = self.link_at(position).await?;
        if self.orchestrator.forward(&link).await {
            self.mark(position).await
        } else {
            Err(Error::ForwardExhausted { link })
        }
    }

    /// Resolve a tracked record's link without holding the store lock across
    /// the external invocation.
    async fn link_at(&self, position: usize) -> Result<String> {
        let store = self.store.lock().await;
        if !store.is_loaded() {
            return Err(StoreError::NotLoaded.into());
        }
        store
            .record_at(position)
            .map(|record| record.link.clone())
            .ok_or_else(|| StoreError::UnknownPosition { position }.into())
    }

    async fn mark(&self, position: usize) -> Result<()> {
        self.store.lock().await.mark_processed(position)?;
        if let Some(observer) = &self.observer {
            observer.record_marked(position);
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::forward::tests::{ScriptedInvoker, failure, success};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    const SAMPLE: &str = "status\tlink\tformat\n\
        \thttps://t.me/c/100/1\tmp4\n\
        \thttps://t.me/c/100/2\tmkv\n";

    struct StubOpener {
        succeed: bool,
    }

    #[async_trait]
    impl LinkOpener for StubOpener {
        async fn open(&self, link: &str) -> Result<()> {
            if self.succeed {
                Ok(())
            } else {
                Err(Error::ExternalProcess {
                    command: format!("open {link}"),
                    code: Some(1),
                    stderr: "refused".into(),
                })
            }
        }
    }

    struct StubDownloader {
        succeed: bool,
    }

    #[async_trait]
    impl ContentDownloader for StubDownloader {
        async fn download(&self, link: &str) -> Result<()> {
            if self.succeed {
                Ok(())
            } else {
                Err(Error::ExternalProcess {
                    command: format!("tlg 1 {link}"),
                    code: Some(2),
                    stderr: "download failed".into(),
                })
            }
        }
    }

    struct RecordingObserver {
        marked: StdMutex<Vec<usize>>,
    }

    impl RefreshObserver for RecordingObserver {
        fn record_marked(&self, position: usize) {
            self.marked.lock().unwrap().push(position);
        }
    }

    struct Fixture {
        dispatcher: ActionDispatcher,
        store: Arc<Mutex<RecordStore>>,
        observer: Arc<RecordingObserver>,
        invoker: Arc<ScriptedInvoker>,
        _dir: TempDir,
    }

    async fn fixture(
        opener_ok: bool,
        downloader_ok: bool,
        outcomes: Vec<Result<crate::forward::InvokeOutcome>>,
    ) -> Fixture {
        let dir = TempDir::new().unwrap();
        let sheet = dir.path().join("links.tsv");
        std::fs::write(&sheet, SAMPLE).unwrap();

        let mut store = RecordStore::new();
        store.load(&sheet).unwrap();
        let store = Arc::new(Mutex::new(store));

        let config = Config {
            target_chat: "42".into(),
            relay_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let invoker = Arc::new(ScriptedInvoker::new(outcomes));
        let orchestrator = Arc::new(ForwardOrchestrator::new(invoker.clone(), &config));

        let observer = Arc::new(RecordingObserver {
            marked: StdMutex::new(Vec::new()),
        });
        let dispatcher = ActionDispatcher::new(
            store.clone(),
            Arc::new(StubOpener { succeed: opener_ok }),
            Arc::new(StubDownloader {
                succeed: downloader_ok,
            }),
            orchestrator,
        )
        .with_observer(observer.clone());

        Fixture {
            dispatcher,
            store,
            observer,
            invoker,
            _dir: dir,
        }
    }

    async fn processed(store: &Arc<Mutex<RecordStore>>, position: usize) -> bool {
        store
            .lock()
            .await
            .record_at(position)
            .map(|r| r.processed)
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn open_success_marks_and_notifies() {
        let fx = fixture(true, true, vec![]).await;
        fx.dispatcher.open(0).await.unwrap();

        assert!(processed(&fx.store, 0).await);
        assert_eq!(*fx.observer.marked.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn open_failure_surfaces_and_marks_nothing() {
        let fx = fixture(false, true, vec![]).await;
        let err = fx.dispatcher.open(0).await.unwrap_err();

        assert!(matches!(err, Error::ExternalProcess { .. }));
        assert!(!processed(&fx.store, 0).await);
        assert!(fx.observer.marked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_success_marks_the_record() {
        let fx = fixture(true, true, vec![]).await;
        fx.dispatcher.download(1).await.unwrap();

        assert!(processed(&fx.store, 1).await);
        assert!(!processed(&fx.store, 0).await);
    }

    #[tokio::test]
    async fn download_failure_surfaces_and_marks_nothing() {
        let fx = fixture(true, false, vec![]).await;
        assert!(fx.dispatcher.download(1).await.is_err());
        assert!(!processed(&fx.store, 1).await);
    }

    #[tokio::test]
    async fn forward_success_marks_the_record() {
        let fx = fixture(true, true, vec![success()]).await;
        fx.dispatcher.forward(0).await.unwrap();

        assert!(processed(&fx.store, 0).await);
        assert_eq!(*fx.observer.marked.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn forward_exhaustion_surfaces_and_never_marks() {
        let fx = fixture(true, true, vec![failure(1), failure(1), failure(1)]).await;
        let err = fx.dispatcher.forward(0).await.unwrap_err();

        assert!(matches!(err, Error::ForwardExhausted { ref link } if link == "https://t.me/c/100/1"));
        assert_eq!(fx.invoker.request_count(), 3, "all tiers were attempted");
        assert!(
            !processed(&fx.store, 0).await,
            "a failed forward must never mark the record"
        );
        assert!(fx.observer.marked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forward_fallback_success_still_marks() {
        let fx = fixture(true, true, vec![failure(1), success()]).await;
        fx.dispatcher.forward(1).await.unwrap();

        assert_eq!(fx.invoker.request_count(), 2);
        assert!(processed(&fx.store, 1).await);
    }

    #[tokio::test]
    async fn unknown_position_is_surfaced() {
        let fx = fixture(true, true, vec![]).await;
        let err = fx.dispatcher.open(99).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Store(StoreError::UnknownPosition { position: 99 })
        ));
    }

    #[tokio::test]
    async fn actions_on_an_unloaded_store_fail_cleanly() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Mutex::new(RecordStore::new()));
        let config = Config {
            relay_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let invoker = Arc::new(ScriptedInvoker::new(vec![]));
        let dispatcher = ActionDispatcher::new(
            store,
            Arc::new(StubOpener { succeed: true }),
            Arc::new(StubDownloader { succeed: true }),
            Arc::new(ForwardOrchestrator::new(invoker, &config)),
        );

        let err = dispatcher.open(0).await.unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::NotLoaded)));
    }
}
