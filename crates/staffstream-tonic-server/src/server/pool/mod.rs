//! Bounded pool of worker tasks that run streaming exports.

pub mod manager;
pub mod worker;
