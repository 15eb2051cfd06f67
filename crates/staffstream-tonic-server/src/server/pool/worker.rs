use crate::server::{
    streaming::{
        processor::{ExportOutcome, handle_export},
        request::WorkRequest,
    },
    telemetry::{increment_stream_errors, record_stream_duration},
};
use core::num::NonZeroUsize;
use staffstream_tonic_core::staffstream::RecordSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Receiving half of the pool queue, shared by every worker.
///
/// Whichever idle worker holds the lock receives the next request, so calls
/// are served in FIFO order by the first worker to become free.
pub type SharedQueue = Arc<Mutex<mpsc::Receiver<WorkRequest>>>;

/// Settings every worker shares.
#[derive(Clone)]
pub struct WorkerContext {
    pub records: Arc<RecordSet>,
    pub shutdown_token: CancellationToken,
    pub progress_interval: NonZeroUsize,
}

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// Each worker streams one export at a time: it takes a request from the
/// shared queue, writes every record to that call's sink, and only then
/// takes the next request. The worker exits after acknowledging a
/// [`WorkRequest::Shutdown`], or when the queue is closed.
///
/// # Arguments
///
/// - `worker_id`: Unique numeric identifier for this worker (used for
///   logs/tracing).
/// - `queue`: Shared receiver the pool dispatches requests through.
/// - `ctx`: The record set, the shutdown token and the progress interval.
pub async fn worker_loop(worker_id: usize, queue: SharedQueue, ctx: WorkerContext) {
    tracing::trace!("Worker {worker_id} started");

    loop {
        let work = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(work) = work else {
            tracing::debug!("Worker {worker_id} queue closed");
            break;
        };

        match work {
            WorkRequest::Export {
                mut sink,
                guard,
                accepted,
            } => {
                tracing::debug!(
                    "Worker {worker_id} picked up stream after {:.2}ms in queue",
                    accepted.elapsed().as_secs_f64() * 1000.0
                );

                let span = tracing::info_span!("streaming", worker = worker_id);
                let outcome = handle_export(
                    worker_id,
                    ctx.records.export(),
                    &mut sink,
                    &ctx.shutdown_token,
                    ctx.progress_interval,
                )
                .instrument(span)
                .await;

                match &outcome {
                    ExportOutcome::Completed { .. } => {
                        record_stream_duration(accepted.elapsed().as_millis() as f64);
                    }
                    ExportOutcome::Failed { .. } | ExportOutcome::Shutdown { .. } => {
                        increment_stream_errors();
                    }
                    ExportOutcome::Disconnected { .. } => {}
                }

                tracing::trace!("Worker {worker_id} finished stream: {outcome:?}");
                // Closes the response stream with the status the export
                // settled on and releases the in-flight slot.
                drop(sink);
                drop(guard);
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Worker {worker_id} stopped");
}
