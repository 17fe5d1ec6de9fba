//! Infrastructure adapters backing the queue.

pub mod buffer;

pub use buffer::{BufferedMessage, PriorityBuffer};
