//! Fire-and-forget execution with callbacks marshaled to one context
//!
//! [`AsyncRunner`] runs an operation on the tokio runtime and delivers
//! exactly one of two callbacks (success or failure) into a channel owned by
//! the coordinating context (the presentation event loop). Callbacks never
//! run concurrently with coordinating-context code: they execute only when
//! that context drains its receiver. There is no cancellation; once started,
//! an operation runs to completion or to its own internal timeout.

use crate::error::{Error, Result};
use std::future::Future;
use tokio::sync::mpsc;

/// A callback queued for execution on the coordinating context
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Spawns operations and queues their completion callbacks
#[derive(Clone)]
pub struct AsyncRunner {
    tx: mpsc::UnboundedSender<Callback>,
}

impl AsyncRunner {
    /// Create a runner plus the receiver the coordinating context must drain
    ///
    /// # Example
    ///
    /// ```no_run
    /// use link_relay::runner::AsyncRunner;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let (runner, mut callbacks) = AsyncRunner::new();
    ///
    /// runner.run(
    ///     async { Ok::<_, link_relay::Error>(3) },
    ///     |count| println!("loaded {count} records"),
    ///     |error| eprintln!("load failed: {error}"),
    /// );
    ///
    /// // Coordinating context: execute queued callbacks in order
    /// while let Some(callback) = callbacks.recv().await {
    ///     callback();
    /// }
    /// # }
    /// ```
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Callback>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Run `operation` on a worker task; queue exactly one callback when done
    pub fn run<T, Fut, S, F>(&self, operation: Fut, on_success: S, on_failure: F)
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(Error) + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let callback: Callback = match operation.await {
                Ok(value) => Box::new(move || on_success(value)),
                Err(error) => Box::new(move || on_failure(error)),
            };
            if tx.send(callback).is_err() {
                tracing::debug!("Coordinating context is gone, dropping completion callback");
            }
        });
    }

    /// Like [`run`](Self::run) for blocking (non-async) operations
    ///
    /// The operation executes on the blocking thread pool so it cannot stall
    /// runtime workers.
    pub fn run_blocking<T, O, S, F>(&self, operation: O, on_success: S, on_failure: F)
    where
        T: Send + 'static,
        O: FnOnce() -> Result<T> + Send + 'static,
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(Error) + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let callback: Callback = match tokio::task::spawn_blocking(operation).await {
                Ok(Ok(value)) => Box::new(move || on_success(value)),
                Ok(Err(error)) => Box::new(move || on_failure(error)),
                Err(join_error) => Box::new(move || {
                    on_failure(Error::Io(std::io::Error::other(join_error.to_string())))
                }),
            };
            if tx.send(callback).is_err() {
                tracing::debug!("Coordinating context is gone, dropping completion callback");
            }
        });
    }
}
