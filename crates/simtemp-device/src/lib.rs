//! Simulated Temperature Sensor Device
//!
//! The driver facade: owns the ring buffer, the sampler task, the
//! configuration and the statistics, and exposes the byte-stream read
//! gateway plus the textual attribute surface. Each attached device is
//! an independent instance; nothing is shared across devices.

mod attr;
mod device;
mod error;
mod options;

pub use attr::Attribute;
pub use device::SimTempDevice;
pub use error::{errno, DeviceError};
pub use options::DeviceOptions;

pub use ring_buffer::{flags, RecordError, RingBuffer, Sample};
pub use temp_sim::{Mode, SimConfig, StatsSnapshot};
