pub mod config;
pub mod console;
pub mod ring;

pub use ring::{RingBuffer, RingError};
