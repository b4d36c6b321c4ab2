#![forbid(unsafe_code)]

mod blocks;
mod history;
mod runs;
mod stats;
mod tasks;

pub use blocks::*;
pub use history::*;
pub use runs::*;
pub use stats::*;
pub use tasks::*;
