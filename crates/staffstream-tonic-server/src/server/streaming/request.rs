use super::sink::ChannelSink;
use crate::server::telemetry::{decrement_streams_inflight, increment_streams_inflight};
use portable_atomic::{AtomicUsize, Ordering};
use std::{sync::Arc, time::Instant};
use tokio::sync::oneshot;

/// A message sent from the worker pool to a worker task.
///
/// [`WorkRequest`]s travel over the pool's bounded queue and are consumed by
/// whichever worker is free first.
#[derive(Debug)]
pub enum WorkRequest {
    /// Stream the whole record set into `sink`.
    ///
    /// - `sink`: Output channel feeding the client's gRPC response stream.
    /// - `guard`: Keeps the call counted as in-flight until it is dropped.
    /// - `accepted`: When the handler accepted the call, for duration
    ///   metrics.
    Export {
        sink: ChannelSink,
        guard: StreamGuard,
        accepted: Instant,
    },

    /// Request the worker to shut down gracefully.
    ///
    /// - `response`: One-shot channel for acknowledging that the worker has
    ///   completed its shutdown routine.
    Shutdown { response: oneshot::Sender<()> },
}

/// Counts a stream as in-flight for as long as it is alive.
///
/// Created by the handler before the call is queued and dropped by the worker
/// once the export has finished. A request dropped while still queued (for
/// example because the pool shut down) releases its slot as well.
#[derive(Debug)]
pub struct StreamGuard {
    inflight: Arc<AtomicUsize>,
}

impl StreamGuard {
    pub fn new(inflight: Arc<AtomicUsize>) -> Self {
        inflight.fetch_add(1, Ordering::AcqRel);
        increment_streams_inflight();
        Self { inflight }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_streams_inflight();
    }
}
