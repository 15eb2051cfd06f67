//! gRPC service implementation and worker coordination.
//!
//! This module contains the client-facing `SimpleDataService` handler. It
//! accepts streaming calls, queues them on the worker pool and hands the
//! response stream back to tonic.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`ExportService`).

pub mod handler;
