#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can access `staffstream` via
// `staffstream_tonic_core::staffstream`
pub use staffstream;
