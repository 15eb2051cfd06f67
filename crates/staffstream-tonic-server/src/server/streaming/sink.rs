//! Write side of a streaming export.
//!
//! A [`FrameSink`] is where a worker puts frames for one call. The production
//! implementation is [`ChannelSink`], created together with the gRPC response
//! stream by [`response_channel`]. The trait exists so tests can inject
//! transport failures at a chosen frame.
//!
//! Frames and the final status travel separately. Frames go through a
//! bounded channel, so a slow reader applies backpressure to the worker. The
//! final status goes through a oneshot that the response stream only polls
//! after the last buffered frame, so it never competes with frames for
//! buffer space. A sink dropped without [`FrameSink::finish`] or
//! [`FrameSink::abort`] ends the stream with `UNAVAILABLE`, never with OK.

use core::pin::Pin;
use futures::{Stream, StreamExt, stream};
use staffstream_tonic_core::{Error, types::Frame};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;

/// The response stream handed to tonic for one call.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<Frame, Status>> + Send>>;

/// Why a frame could not be written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The client went away (cancelled the call or disconnected). Not an
    /// error from the service's point of view; emission just stops.
    #[error("client disconnected")]
    Disconnected,

    /// The write failed for any other reason. Surfaced to the client as
    /// `INTERNAL`. [`ChannelSink`] never returns it: a closed channel always
    /// means the client is gone.
    #[error("{0}")]
    Transport(String),
}

pub trait FrameSink: Send {
    /// Writes one frame, waiting while the stream's buffer is full.
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Ends the stream with OK once the frames already written are read.
    fn finish(&mut self);

    /// Ends the stream with `status` once the frames already written are
    /// read. Does not wait for buffer space.
    fn abort(&mut self, status: Status);

    /// Returns `true` once the client side of the stream has gone away.
    fn is_closed(&self) -> bool;
}

/// A [`FrameSink`] backed by the bounded channel that feeds a gRPC response
/// stream.
#[derive(Debug)]
pub struct ChannelSink {
    frames: mpsc::Sender<Frame>,
    outcome: Option<oneshot::Sender<Result<(), Status>>>,
}

/// Creates a sink and the response stream it feeds.
///
/// The stream yields every frame written to the sink, then the final status:
/// nothing for [`FrameSink::finish`], the given status for
/// [`FrameSink::abort`], and [`Error::ServiceShutdown`] if the sink was
/// dropped without either. At most `capacity` frames are buffered.
pub fn response_channel(capacity: usize) -> (ChannelSink, ResponseStream) {
    let (frames_tx, frames_rx) = mpsc::channel(capacity);
    let (outcome_tx, outcome_rx) = oneshot::channel();

    let trailer = stream::once(outcome_rx).filter_map(|outcome| async move {
        match outcome {
            Ok(Ok(())) => None,
            Ok(Err(status)) => Some(Err(status)),
            Err(_) => Some(Err(Status::from(Error::ServiceShutdown))),
        }
    });
    let stream = ReceiverStream::new(frames_rx).map(Ok).chain(trailer);

    let sink = ChannelSink {
        frames: frames_tx,
        outcome: Some(outcome_tx),
    };
    (sink, Box::pin(stream))
}

impl ChannelSink {
    fn settle(&mut self, outcome: Result<(), Status>) {
        let Some(tx) = self.outcome.take() else {
            tracing::warn!("Stream outcome already settled");
            return;
        };
        if tx.send(outcome).is_err() {
            tracing::debug!("Response stream dropped before its outcome was known");
        }
    }
}

impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: Frame) -> Result<(), SinkError> {
        self.frames
            .send(frame)
            .await
            .map_err(|_| SinkError::Disconnected)
    }

    fn finish(&mut self) {
        self.settle(Ok(()));
    }

    fn abort(&mut self, status: Status) {
        self.settle(Err(status));
    }

    fn is_closed(&self) -> bool {
        self.frames.is_closed()
    }
}
