//! # Shared Wire Types and Constants
//!
//! Conversions between the record model in [`staffstream`] and the protobuf
//! messages in [`crate::proto`], plus the constants both the server and the
//! client agree on.

use crate::proto::LargeDataLine;
use staffstream::{EmployeeRecord, ParseRecordError};

/// Port the server listens on unless `SERVER_ADDR` says otherwise.
pub const DEFAULT_PORT: u16 = 50051;

/// Fully-qualified gRPC service name, as used by health checks.
pub const SERVICE_NAME: &str = "staffstream.SimpleDataService";

/// A single response frame: one formatted record.
pub type Frame = LargeDataLine;

impl From<&EmployeeRecord> for LargeDataLine {
    fn from(record: &EmployeeRecord) -> Self {
        Self {
            line: record.to_string(),
        }
    }
}

impl From<EmployeeRecord> for LargeDataLine {
    fn from(record: EmployeeRecord) -> Self {
        Self::from(&record)
    }
}

impl TryFrom<&LargeDataLine> for EmployeeRecord {
    type Error = ParseRecordError;

    fn try_from(frame: &LargeDataLine) -> Result<Self, Self::Error> {
        frame.line.parse()
    }
}
