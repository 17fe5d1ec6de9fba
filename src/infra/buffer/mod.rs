//! Message buffer backends.

pub mod memory;

pub use memory::{BufferedMessage, PriorityBuffer};
