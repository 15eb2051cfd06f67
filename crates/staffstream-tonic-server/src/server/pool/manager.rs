//! Bounded worker pool for streaming exports.
//!
//! This module defines the [`WorkerPool`] struct, which owns the queue feeding
//! a fixed set of asynchronous workers. Every accepted call becomes one
//! [`WorkRequest::Export`]; a free worker takes it from the queue and streams
//! the whole record set before taking the next one. With all workers busy,
//! further calls wait in FIFO order.
//!
//! Shutdown is coordinated through a shared [`CancellationToken`]: new calls
//! are refused, in-flight calls get a grace period, then whatever is left is
//! cancelled and each worker is asked to stop.

use crate::server::streaming::request::{StreamGuard, WorkRequest};
use core::time::Duration;
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use staffstream_tonic_core::Error;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// How long to wait for each worker to acknowledge shutdown.
const WORKER_ACK_TIMEOUT: Duration = Duration::from_secs(3);

/// A cooperative pool of asynchronous workers that process [`WorkRequest`]s.
pub struct WorkerPool {
    queue: mpsc::Sender<WorkRequest>,
    num_workers: usize,
    inflight: Arc<AtomicUsize>,
    accepting: AtomicBool,
    shutdown_token: CancellationToken,
    shutdown_grace: Duration,
}

impl WorkerPool {
    /// Constructs a new [`WorkerPool`] around the sending half of the queue
    /// that `num_workers` already-spawned workers consume, and the
    /// cancellation token those workers observe.
    pub fn new(
        queue: mpsc::Sender<WorkRequest>,
        num_workers: usize,
        shutdown_token: CancellationToken,
        shutdown_grace: Duration,
    ) -> Self {
        Self {
            queue,
            num_workers,
            inflight: Arc::new(AtomicUsize::new(0)),
            accepting: AtomicBool::new(true),
            shutdown_token,
            shutdown_grace,
        }
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has started.
    pub fn is_shutting_down(&self) -> bool {
        !self.accepting.load(Ordering::Acquire) || self.shutdown_token.is_cancelled()
    }

    /// Number of calls that are queued or being streamed.
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// Registers a new in-flight call. The call stays counted until the
    /// returned guard is dropped.
    pub fn track_stream(&self) -> StreamGuard {
        StreamGuard::new(Arc::clone(&self.inflight))
    }

    /// Queues a [`WorkRequest`] for the next free worker.
    ///
    /// Waits while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The service is shutting down.
    /// - The queue is closed because every worker has stopped.
    pub async fn dispatch(&self, request: WorkRequest) -> Result<(), Error> {
        if self.is_shutting_down() {
            return Err(Error::ServiceShutdown);
        }

        self.queue
            .send(request)
            .await
            .map_err(|_| Error::ChannelError {
                context: "Worker queue closed".to_string(),
            })
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Stops accepting new calls.
    /// - Waits up to the configured grace period for in-flight calls to
    ///   drain.
    /// - Cancels the shared [`CancellationToken`] so remaining calls end with
    ///   `UNAVAILABLE`.
    /// - Sends a [`WorkRequest::Shutdown`] per worker and waits (up to 3
    ///   seconds each) for acknowledgements.
    ///
    /// This method is typically invoked during service termination.
    pub async fn shutdown(&self) -> Result<(), Error> {
        // === Phase 0: Stop accepting new requests ===
        tracing::info!("Refusing new requests");
        self.accepting.store(false, Ordering::Release);

        // === Phase 1: Wait for in-flight streams to drain ===
        tracing::info!(
            "Draining in-flight streams ({} active, {:?} grace period)",
            self.inflight(),
            self.shutdown_grace
        );
        let drain_result = timeout(self.shutdown_grace, async {
            while self.inflight() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => {
                tracing::debug!("All in-flight streams drained successfully");
            }
            Err(_) => {
                tracing::warn!(
                    "Graceful drain timed out ({} streams still active)",
                    self.inflight()
                );
            }
        }

        // === Phase 2: Cancel any remaining work ===
        tracing::debug!("Cancelling remaining work via shutdown token");
        self.shutdown_token.cancel();

        // === Phase 3: Notify workers to shut down ===
        // Each worker consumes exactly one shutdown request and exits, after
        // flushing anything queued ahead of it.
        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.num_workers);

        for i in 0..self.num_workers {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = self.queue.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::error!("Failed to send shutdown request {i}: {e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        tracing::debug!("Waiting for up to 3s per worker for shutdown acknowledgements");

        let timeout_futures = shutdown_handles.into_iter().map(|(i, rx)| async move {
            match timeout(WORKER_ACK_TIMEOUT, rx).await {
                Ok(Ok(())) => {
                    tracing::trace!("Shutdown request {i} acknowledged");
                }
                Ok(Err(e)) => {
                    tracing::error!("Shutdown request {i} dropped: {e}");
                }
                Err(_) => {
                    tracing::warn!("Shutdown request {i} timed out");
                }
            }
        });

        futures::future::join_all(timeout_futures).await;

        tracing::info!("Worker pool shutdown complete");

        Ok(())
    }
}
