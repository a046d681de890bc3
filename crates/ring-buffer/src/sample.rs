//! Temperature sample record and its wire encoding

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flag bits carried in [`Sample::flags`]
pub mod flags {
    /// Set on every sample the sampler produces
    pub const NEW_SAMPLE: u32 = 1 << 0;
    /// Set when the sample landed on the opposite side of the threshold
    /// from its predecessor
    pub const THRESHOLD_CROSSED: u32 = 1 << 1;
}

/// Error decoding a wire record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    /// Input shorter than one whole record
    #[error("record truncated: got {0} bytes, need 16")]
    Truncated(usize),
}

/// One temperature sample
///
/// Produced exactly once per scheduler firing, consumed exactly once by
/// a reader, never mutated in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Monotonic timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Temperature in milli-degrees Celsius (44123 = 44.123 °C)
    pub temp_mc: i32,
    /// Flag bits, see [`flags`]
    pub flags: u32,
}

impl Sample {
    /// Serialized record size: 8-byte timestamp + 4-byte temperature +
    /// 4-byte flags, no padding
    pub const WIRE_SIZE: usize = 16;

    /// Encode into the fixed wire layout (native byte order)
    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0..8].copy_from_slice(&self.timestamp_ns.to_ne_bytes());
        out[8..12].copy_from_slice(&self.temp_mc.to_ne_bytes());
        out[12..16].copy_from_slice(&self.flags.to_ne_bytes());
        out
    }

    /// Decode one record from the start of `buf`
    pub fn from_bytes(buf: &[u8]) -> Result<Self, RecordError> {
        if buf.len() < Self::WIRE_SIZE {
            return Err(RecordError::Truncated(buf.len()));
        }

        let mut ts = [0u8; 8];
        let mut temp = [0u8; 4];
        let mut fl = [0u8; 4];
        ts.copy_from_slice(&buf[0..8]);
        temp.copy_from_slice(&buf[8..12]);
        fl.copy_from_slice(&buf[12..16]);

        Ok(Self {
            timestamp_ns: u64::from_ne_bytes(ts),
            temp_mc: i32::from_ne_bytes(temp),
            flags: u32::from_ne_bytes(fl),
        })
    }

    /// True when the threshold-crossed bit is set
    pub fn threshold_crossed(&self) -> bool {
        self.flags & flags::THRESHOLD_CROSSED != 0
    }
}
