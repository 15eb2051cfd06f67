//! gRPC service implementation for streaming employee records.
//!
//! This module defines [`ExportService`], the concrete implementation of the
//! `SimpleDataService` gRPC service defined in the protobuf specification. It
//! exposes a single server-streaming endpoint that emits every record of the
//! service's record set, one frame per record, in generation order.
//!
//! ## Responsibilities
//!
//! - Own the immutable record set and share it with the workers.
//! - Spawn and manage the bounded worker pool.
//! - Queue each `StreamLargeData` call on the pool and return its response
//!   stream.
//! - Refuse new calls and coordinate draining during graceful shutdown.

use crate::server::{
    config::ServerConfig,
    pool::{
        manager::WorkerPool,
        worker::{WorkerContext, worker_loop},
    },
    streaming::{
        request::WorkRequest,
        sink::{ResponseStream, response_channel},
    },
    telemetry::{increment_requests, increment_stream_errors},
};
use futures::TryStreamExt;
use staffstream_tonic_core::{
    Error,
    proto::{LargeDataRequest, simple_data_service_server::SimpleDataService},
    staffstream::RecordSet,
};
use std::{sync::Arc, time::Instant};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

/// gRPC service that streams the synthetic employee record set.
///
/// Implements the `SimpleDataService` trait generated from the protobuf
/// schema. The record set is generated by the caller, handed over once, and
/// never mutated afterwards, so every call against the same service observes
/// an identical sequence.
///
/// Cloning is cheap; clones share the record set and the worker pool.
#[derive(Clone)]
pub struct ExportService {
    config: ServerConfig,
    records: Arc<RecordSet>,
    worker_pool: Arc<WorkerPool>,
}

impl ExportService {
    /// Creates a new `ExportService` and spawns `num_workers` worker tasks.
    ///
    /// Workers share one bounded FIFO queue of capacity `queue_capacity`.
    /// Each worker streams a single call at a time, which caps the number of
    /// concurrently streamed calls at `num_workers`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig, records: Arc<RecordSet>) -> Self {
        let shutdown_token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(config.queue_capacity.get());
        let queue = Arc::new(Mutex::new(rx));

        let ctx = WorkerContext {
            records: Arc::clone(&records),
            shutdown_token: shutdown_token.clone(),
            progress_interval: config.progress_interval,
        };

        for worker_id in 0..config.num_workers.get() {
            tokio::spawn(worker_loop(worker_id, Arc::clone(&queue), ctx.clone()));
        }

        let worker_pool =
            WorkerPool::new(
            tx,
            config.num_workers.get(),
            shutdown_token,
            config.shutdown_grace,
        );

        Self {
            config,
            records,
            worker_pool: Arc::new(worker_pool),
        }
    }

    /// The record set every call streams.
    pub fn records(&self) -> &Arc<RecordSet> {
        &self.records
    }

    /// Number of calls currently queued or streaming.
    pub fn streams_inflight(&self) -> usize {
        self.worker_pool.inflight()
    }

    /// Initiates a graceful shutdown of the worker pool.
    ///
    /// New calls are refused immediately. In-flight calls get the configured
    /// grace period to finish; any still running afterwards are ended with
    /// `UNAVAILABLE`. Returns once every worker has acknowledged shutdown.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.worker_pool.shutdown().await
    }
}

#[tonic::async_trait]
impl SimpleDataService for ExportService {
    type StreamLargeDataStream = ResponseStream;

    /// Handles a streaming export request.
    ///
    /// The request carries no parameters. The call is queued on the worker
    /// pool and the response stream is returned right away; frames start
    /// flowing once a worker picks the call up.
    ///
    /// Emits telemetry for:
    /// - request rate
    /// - concurrent stream count
    /// - records streamed
    /// - stream duration
    /// - stream errors
    #[tracing::instrument(skip_all, fields(records = self.records.len()))]
    async fn stream_large_data(
        &self,
        _req: Request<LargeDataRequest>,
    ) -> Result<Response<Self::StreamLargeDataStream>, Status> {
        let accepted = Instant::now();

        if self.worker_pool.is_shutting_down() {
            increment_stream_errors();
            return Err(Error::ServiceShutdown.into());
        }

        increment_requests();
        tracing::info!(
            "Starting gRPC stream of {} employee records",
            self.records.len()
        );

        let (sink, stream) = response_channel(self.config.stream_buffer_size.get());

        let request = WorkRequest::Export {
            sink,
            guard: self.worker_pool.track_stream(),
            accepted,
        };

        if let Err(e) = self.worker_pool.dispatch(request).await {
            tracing::warn!("Failed to queue stream: {e}");
            increment_stream_errors();
            return Err(e.into());
        }

        let stream = stream.inspect_err(|e| {
            tracing::debug!("Stream ended with status {:?}", e.code());
        });

        Ok(Response::new(Box::pin(stream)))
    }
}
