mod category;
mod date;
mod employee;
#[cfg(test)]
mod tests;

pub use category::*;
pub use date::*;
pub use employee::*;
