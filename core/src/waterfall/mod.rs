//! Scrolling waterfall image: a colour lookup table and the ring buffer of pixel rows it fills.
pub mod color;
pub mod ring_buffer;

pub use color::{ColorMapper, LUT_SIZE};
pub use ring_buffer::{BlitSegments, WaterfallError, WaterfallRingBuffer};
