#![doc = include_str!("../README.md")]

mod error;
mod generator;
mod record;
mod set;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::record::*;
pub use crate::set::*;
