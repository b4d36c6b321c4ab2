#![forbid(unsafe_code)]

mod store;

pub use store::*;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
