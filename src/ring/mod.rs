pub mod iter;
pub mod ring_buffer;

pub use iter::Iter;
pub use ring_buffer::{RingBuffer, RingError};
