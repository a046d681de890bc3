//! Textual attribute surface
//!
//! One value per attribute, newline-terminated, with the same names and
//! formats the device has always exposed so existing tooling parses
//! either. Reads and writes go through the device's `show_attr` and
//! `store_attr` methods.

use std::fmt;

/// Runtime device attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Sampling period in milliseconds (read-write)
    SamplingMs,
    /// Alert threshold in milli-degrees Celsius (read-write)
    ThresholdMc,
    /// Generation mode (read-write)
    Mode,
    /// Counter snapshot (read-only)
    Stats,
}

impl Attribute {
    /// All attributes, in registration order
    pub const ALL: [Attribute; 4] = [
        Attribute::SamplingMs,
        Attribute::ThresholdMc,
        Attribute::Mode,
        Attribute::Stats,
    ];

    /// Attribute file name
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::SamplingMs => "sampling_ms",
            Attribute::ThresholdMc => "threshold_mC",
            Attribute::Mode => "mode",
            Attribute::Stats => "stats",
        }
    }

    /// Look up an attribute by its file name
    pub fn from_name(name: &str) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|a| a.name() == name)
    }

    /// False for read-only attributes
    pub fn writable(&self) -> bool {
        !matches!(self, Attribute::Stats)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
