pub mod error;
pub mod types;

pub use error::Error;

/// gRPC service and message definitions generated from
/// `proto/staffstream.proto`.
///
/// ## Service
///
/// - `SimpleDataService.StreamLargeData` - streams every record of the
///   server's record set, one [`LargeDataLine`](proto::LargeDataLine) per
///   record, in generation order.
///
/// ## Messages
///
/// - [`LargeDataRequest`](proto::LargeDataRequest) - empty; the export always
///   covers the whole set.
/// - [`LargeDataLine`](proto::LargeDataLine) - a single formatted record line.
pub mod proto {
    tonic::include_proto!("staffstream");

    /// Encoded file descriptor set for `staffstream.proto`, registered with
    /// the reflection service.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("staffstream_descriptor");
}
