//! Sampling Scheduler
//!
//! The producer side of the device: a periodic task that generates one
//! sample per firing, classifies it against the threshold, pushes it
//! into the ring buffer, and wakes blocked readers. Supports live
//! rearming with a new period and synchronous, completion-guaranteed
//! stop for teardown.

mod sampler;

pub use sampler::{spawn, SamplerContext, SamplerHandle};
