//! Per-call streaming: the work request handed to workers, the sink frames
//! are written to, and the emission loop itself.

pub mod processor;
pub mod request;
pub mod sink;
