//! Server-side components of the `staffstream` export service.
//!
//! This module contains the building blocks necessary to run the streaming gRPC
//! server, including service logic, worker pool orchestration, transport
//! security and telemetry setup.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration and its validation.
//! - [`pool`] - Bounded worker pool and the per-worker loop.
//! - [`service`] - The `SimpleDataService` implementation.
//! - [`streaming`] - Work requests, frame sinks, and the export loop that
//!   writes one frame per record.
//! - [`telemetry`] - Structured logging, plus optional OpenTelemetry export.
//! - [`tls`] - Loading the PEM identity served over TLS.
//! - [`web`] - CORS policy for gRPC-Web callers.
//!
//! These components are wired together in the server's `main.rs` and used to
//! serve the `SimpleDataService` gRPC service defined in
//! [`staffstream_tonic_core::proto`].

pub mod config;
pub mod pool;
pub mod service;
pub mod streaming;
pub mod telemetry;
pub mod tls;
pub mod web;
