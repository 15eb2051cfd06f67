//! Error types for the record streaming service.
//!
//! This module defines the central `Error` enum, which captures every
//! reportable failure of a streaming export. It implements `From<Error>` for
//! `tonic::Status` so handlers and workers can surface errors to clients with
//! the appropriate status codes.
//!
//! ## Error Cases
//! - `ChannelError`: An internal communication failure between tasks or
//!   workers.
//! - `Emission`: Writing a record to the response stream failed.
//! - `ServiceShutdown`: A request arrived, or was still running, while the
//!   service was shutting down.

use tonic::Status;

/// Unified error type for the record streaming service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// Internal channel send/receive failure (e.g., closed or full channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// A record could not be written to the response stream.
    ///
    /// `record` is the 1-based id of the record whose write failed.
    #[error("Streaming error: record {record}: {reason}")]
    Emission { record: u32, reason: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            e @ Error::Emission { .. } => Status::internal(e.to_string()),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
