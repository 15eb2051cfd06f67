use super::sink::{FrameSink, SinkError};
use crate::server::telemetry::{increment_cancelled_streams, increment_records_streamed};
use staffstream_tonic_core::{Error, staffstream::Export, types::Frame};
use core::num::NonZeroUsize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a single export ended.
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    /// Every record was written; the stream closes with OK.
    Completed { sent: usize },
    /// The client went away; emission stopped at the next write boundary.
    Disconnected { sent: usize },
    /// The service is shutting down; the stream was ended with
    /// `UNAVAILABLE`.
    Shutdown { sent: usize },
    /// A write failed; the stream was ended with `INTERNAL`.
    Failed { sent: usize, error: Error },
}

impl ExportOutcome {
    /// Number of frames successfully written before the export ended.
    pub const fn sent(&self) -> usize {
        match self {
            Self::Completed { sent }
            | Self::Disconnected { sent }
            | Self::Shutdown { sent }
            | Self::Failed { sent, .. } => *sent,
        }
    }
}

/// Streams every record of `export` into `sink`, one frame per record.
///
/// This is the emission loop of a single call. It runs on a worker and is
/// strictly sequential: one frame is written, and only then is the next
/// record taken from the cursor.
///
/// # Arguments
///
/// - `worker_id`: Identifier for this worker, used in logs and tracing.
/// - `export`: Fresh cursor over the shared record set.
/// - `sink`: Destination of the frames.
/// - `cancel`: Cancelled when the service shuts down.
/// - `progress_interval`: A progress event is logged every this many frames.
///
/// # Behavior
///
/// - The cancellation token is checked between writes and raced against a
///   write that is waiting on a full buffer.
/// - A disconnected client stops the loop silently.
/// - Any other write failure ends the stream with [`Error::Emission`]
///   (`INTERNAL`) and stops the loop. Nothing is retried.
/// - Only a completed export ends the stream with OK.
pub async fn handle_export<S: FrameSink>(
    worker_id: usize,
    mut export: Export,
    sink: &mut S,
    cancel: &CancellationToken,
    progress_interval: NonZeroUsize,
) -> ExportOutcome {
    let start = Instant::now();
    let total = export.total();

    tracing::info!(worker = worker_id, total, "Starting stream");

    while let Some(record) = export.next() {
        let sent = export.position() - 1;

        if cancel.is_cancelled() {
            export.stop();
            return shut_down(sink, sent);
        }
        if sink.is_closed() {
            export.stop();
            return disconnected(worker_id, sent);
        }

        let id = record.id();
        let write = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            res = sink.send(Frame::from(record)) => Some(res),
        };

        match write {
            None => {
                export.stop();
                return shut_down(sink, sent);
            }
            Some(Err(SinkError::Disconnected)) => {
                export.stop();
                return disconnected(worker_id, sent);
            }
            Some(Err(SinkError::Transport(reason))) => {
                export.stop();
                let error = Error::Emission { record: id, reason };
                tracing::error!(worker = worker_id, sent, "Error during streaming: {error}");
                sink.abort(error.clone().into());
                return ExportOutcome::Failed { sent, error };
            }
            Some(Ok(())) => {}
        }

        increment_records_streamed(1);

        let sent = sent + 1;
        if sent % progress_interval.get() == 0 {
            tracing::info!(
                worker = worker_id,
                "Streamed {sent} records in {:.2}s",
                start.elapsed().as_secs_f64()
            );
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let throughput = if elapsed > 0.0 {
        total as f64 / elapsed
    } else {
        0.0
    };
    tracing::info!(
        worker = worker_id,
        "Completed streaming {total} records in {elapsed:.2}s ({throughput:.0} records/second)"
    );

    sink.finish();
    ExportOutcome::Completed { sent: total }
}

fn disconnected(worker_id: usize, sent: usize) -> ExportOutcome {
    tracing::debug!(worker = worker_id, sent, "Client went away, stopping stream");
    increment_cancelled_streams();
    ExportOutcome::Disconnected { sent }
}

fn shut_down<S: FrameSink>(sink: &mut S, sent: usize) -> ExportOutcome {
    tracing::debug!(sent, "Stream cancelled by shutdown");
    sink.abort(Error::ServiceShutdown.into());
    ExportOutcome::Shutdown { sent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::streaming::sink::{ChannelSink, ResponseStream, response_channel};
    use futures::StreamExt;
    use staffstream_tonic_core::staffstream::{EmployeeRecord, RecordSet};
    use std::sync::Arc;
    use tonic::{Code, Status};

    type Item = Result<Frame, Status>;

    fn records(count: u32) -> Arc<RecordSet> {
        Arc::new(RecordSet::generate_seeded(count, 2020))
    }

    fn every(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    /// Wraps a [`ChannelSink`] and fails with a transport error when asked to
    /// write frame number `fail_at` (1-based).
    struct FlakySink {
        inner: ChannelSink,
        writes: usize,
        fail_at: usize,
    }

    impl FrameSink for FlakySink {
        async fn send(&mut self, frame: Frame) -> Result<(), SinkError> {
            self.writes += 1;
            if self.writes == self.fail_at {
                return Err(SinkError::Transport("connection reset by peer".into()));
            }
            self.inner.send(frame).await
        }

        fn finish(&mut self) {
            self.inner.finish();
        }

        fn abort(&mut self, status: Status) {
            self.inner.abort(status);
        }

        fn is_closed(&self) -> bool {
            self.inner.is_closed()
        }
    }

    async fn drain(stream: ResponseStream) -> Vec<Item> {
        stream.collect().await
    }

    #[tokio::test]
    async fn streams_every_record_in_order() {
        let set = records(10_000);
        let (mut sink, stream) = response_channel(64);
        let collector = tokio::spawn(drain(stream));

        let outcome =
            handle_export(0, set.export(), &mut sink, &CancellationToken::new(), every(2_500))
                .await;
        drop(sink);

        assert!(matches!(outcome, ExportOutcome::Completed { sent: 10_000 }));

        let items = collector.await.unwrap();
        assert_eq!(items.len(), 10_000);
        for (i, item) in items.into_iter().enumerate() {
            let frame = item.unwrap();
            let record = EmployeeRecord::try_from(&frame).unwrap();
            assert_eq!(record.id() as usize, i + 1);
            assert_eq!(&record, set.get(i).unwrap());
        }
    }

    #[tokio::test]
    async fn progress_can_be_logged_for_every_record() {
        let (mut sink, stream) = response_channel(16);
        let collector = tokio::spawn(drain(stream));

        let outcome =
            handle_export(0, records(10).export(), &mut sink, &CancellationToken::new(), every(1))
                .await;
        drop(sink);

        assert!(matches!(outcome, ExportOutcome::Completed { sent: 10 }));
        assert_eq!(collector.await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn empty_set_completes_immediately() {
        let (mut sink, stream) = response_channel(1);

        let outcome =
            handle_export(0, records(0).export(), &mut sink, &CancellationToken::new(), every(1))
                .await;
        drop(sink);

        assert!(matches!(outcome, ExportOutcome::Completed { sent: 0 }));
        assert!(drain(stream).await.is_empty());
    }

    #[tokio::test]
    async fn write_failure_ends_with_internal() {
        let (inner, stream) = response_channel(64);
        let collector = tokio::spawn(drain(stream));

        let mut sink = FlakySink {
            inner,
            writes: 0,
            fail_at: 5_000,
        };
        let outcome = handle_export(
            0,
            records(10_000).export(),
            &mut sink,
            &CancellationToken::new(),
            every(2_500),
        )
        .await;
        drop(sink);

        match outcome {
            ExportOutcome::Failed {
                sent: 4_999,
                error: Error::Emission { record: 5_000, .. },
            } => {}
            other => panic!("unexpected outcome: {other:?}"),
        }

        let mut items = collector.await.unwrap();
        assert_eq!(items.len(), 5_000);

        let status = items.pop().unwrap().unwrap_err();
        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().starts_with("Streaming error"), "{status:?}");

        for (i, item) in items.iter().enumerate() {
            let record = EmployeeRecord::try_from(item.as_ref().unwrap()).unwrap();
            assert_eq!(record.id() as usize, i + 1);
        }
    }

    #[tokio::test]
    async fn write_failure_on_a_full_buffer_still_ends_with_internal() {
        let (inner, mut stream) = response_channel(4);
        let mut sink = FlakySink {
            inner,
            writes: 0,
            fail_at: 5,
        };

        // Nobody reads until the export has returned, so the failure happens
        // with the buffer full.
        let outcome =
            handle_export(0, records(100).export(), &mut sink, &CancellationToken::new(), every(10))
                .await;
        drop(sink);
        assert!(matches!(outcome, ExportOutcome::Failed { sent: 4, .. }));

        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        assert_eq!(items.len(), 5);
        assert_eq!(items[4].as_ref().unwrap_err().code(), Code::Internal);
    }

    #[tokio::test]
    async fn stops_when_client_goes_away() {
        let (mut sink, mut stream) = response_channel(4);

        let reader = tokio::spawn(async move {
            for _ in 0..100 {
                stream.next().await.unwrap().unwrap();
            }
            // Dropping the stream is what tonic does when the client cancels
            // the call.
        });

        let outcome = handle_export(
            0,
            records(10_000).export(),
            &mut sink,
            &CancellationToken::new(),
            every(2_500),
        )
        .await;
        reader.await.unwrap();

        let ExportOutcome::Disconnected { sent } = outcome else {
            panic!("unexpected outcome: {outcome:?}");
        };
        // At most the frames that fit in the buffer after the reader stopped.
        assert!((100..=104).contains(&sent), "sent {sent}");
    }

    #[tokio::test]
    async fn shutdown_cancels_a_blocked_write() {
        let (mut sink, mut stream) = response_channel(1);
        let cancel = CancellationToken::new();

        let export = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                handle_export(0, records(100).export(), &mut sink, &cancel, every(10)).await
            })
        };

        // Take one frame, then let the worker block on a full buffer.
        stream.next().await.unwrap().unwrap();
        tokio::task::yield_now().await;
        cancel.cancel();

        let outcome = export.await.unwrap();
        assert!(matches!(outcome, ExportOutcome::Shutdown { .. }));
        assert!(outcome.sent() < 100);

        // The buffered frames come first, then the status, even though the
        // buffer was still full when the export gave up.
        let items = drain(stream).await;
        let status = items.last().unwrap().as_ref().unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
        assert!(items[..items.len() - 1].iter().all(Result::is_ok));
    }

    #[tokio::test]
    async fn already_cancelled_sends_nothing_but_the_status() {
        let (mut sink, stream) = response_channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = handle_export(0, records(50).export(), &mut sink, &cancel, every(10)).await;
        drop(sink);

        assert!(matches!(outcome, ExportOutcome::Shutdown { sent: 0 }));
        let items = drain(stream).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap_err().code(), Code::Unavailable);
    }
}
