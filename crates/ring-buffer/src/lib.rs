//! Sample Ring Buffer
//!
//! Provides the temperature sample record, its fixed 16-byte wire form,
//! and a bounded FIFO with overwrite-oldest-on-full semantics shared
//! between one producer and any number of competing readers.

mod buffer;
mod sample;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
pub use sample::{flags, RecordError, Sample};
