//! Runtime sampling configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Lower bound of the sampling period in milliseconds
pub const SAMPLING_MS_MIN: u32 = 1;
/// Upper bound of the sampling period in milliseconds
pub const SAMPLING_MS_MAX: u32 = 10_000;

/// Temperature generation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Constant base temperature
    #[default]
    Normal,
    /// Base temperature with uniform noise up to ±1 °C
    Noisy,
    /// Triangular wave around the base temperature
    Ramp,
}

impl Mode {
    /// Canonical attribute name for this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Noisy => "noisy",
            Mode::Ramp => "ramp",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a mode name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown mode {0:?}, expected one of normal, noisy, ramp")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    /// Case-sensitive match on the canonical names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Mode::Normal),
            "noisy" => Ok(Mode::Noisy),
            "ramp" => Ok(Mode::Ramp),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Runtime-configurable sampling parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Sampling period in milliseconds (1..=10000)
    pub sampling_ms: u32,
    /// Alert threshold in milli-degrees Celsius
    pub threshold_mc: i32,
    /// Generation policy
    pub mode: Mode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sampling_ms: 100,
            threshold_mc: 45_000,
            mode: Mode::Normal,
        }
    }
}

impl SimConfig {
    /// True when `ms` is an acceptable sampling period
    pub fn valid_sampling_ms(ms: u32) -> bool {
        (SAMPLING_MS_MIN..=SAMPLING_MS_MAX).contains(&ms)
    }

    /// Sampling period as a [`Duration`]
    pub fn period(&self) -> Duration {
        Duration::from_millis(u64::from(self.sampling_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.sampling_ms, 100);
        assert_eq!(cfg.threshold_mc, 45_000);
        assert_eq!(cfg.mode, Mode::Normal);
        assert_eq!(cfg.period(), Duration::from_millis(100));
    }

    #[test]
    fn test_sampling_range() {
        assert!(!SimConfig::valid_sampling_ms(0));
        assert!(SimConfig::valid_sampling_ms(1));
        assert!(SimConfig::valid_sampling_ms(10_000));
        assert!(!SimConfig::valid_sampling_ms(10_001));
    }

    #[test]
    fn test_mode_names_roundtrip() {
        for mode in [Mode::Normal, Mode::Noisy, Mode::Ramp] {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_parse_is_case_sensitive() {
        assert!("Normal".parse::<Mode>().is_err());
        assert!("RAMP".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
        assert!("ramp ".parse::<Mode>().is_err());
    }
}
