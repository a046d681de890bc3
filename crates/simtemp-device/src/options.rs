//! Attach-time configuration input
//!
//! The userspace analog of firmware-provided device properties:
//! optional, validated once at attach, and invalid values degrade to
//! the defaults with a logged diagnostic instead of failing the attach.

use crate::errno;
use serde::Deserialize;
use temp_sim::{Mode, SimConfig, Stats};
use tracing::{info, warn};

/// Optional attach-time overrides for the default configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceOptions {
    /// Sampling period in milliseconds (1..=10000)
    pub sampling_ms: Option<u32>,
    /// Alert threshold in milli-degrees Celsius
    pub threshold_mc: Option<i32>,
    /// Generation mode name: "normal", "noisy" or "ramp"
    pub mode: Option<String>,
}

impl DeviceOptions {
    /// Resolve against the defaults. A rejected value is logged,
    /// counted in `stats`, and the default stands.
    pub(crate) fn resolve(self, stats: &Stats) -> SimConfig {
        let mut cfg = SimConfig::default();

        if let Some(ms) = self.sampling_ms {
            if SimConfig::valid_sampling_ms(ms) {
                cfg.sampling_ms = ms;
                info!(sampling_ms = ms, "attach option applied");
            } else {
                warn!(
                    sampling_ms = ms,
                    default = cfg.sampling_ms,
                    "invalid sampling period option, keeping default"
                );
                stats.record_error(errno::EINVAL);
            }
        }

        if let Some(mc) = self.threshold_mc {
            cfg.threshold_mc = mc;
            info!(threshold_mc = mc, "attach option applied");
        }

        if let Some(name) = self.mode {
            match name.parse::<Mode>() {
                Ok(mode) => {
                    cfg.mode = mode;
                    info!(%mode, "attach option applied");
                }
                Err(err) => {
                    warn!(%err, default = %cfg.mode, "invalid mode option, keeping default");
                    stats.record_error(errno::EINVAL);
                }
            }
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options_yield_defaults() {
        let stats = Stats::new();
        let cfg = DeviceOptions::default().resolve(&stats);
        assert_eq!(cfg, SimConfig::default());
        assert_eq!(stats.snapshot().errors, 0);
    }

    #[test]
    fn test_valid_options_apply() {
        let stats = Stats::new();
        let options = DeviceOptions {
            sampling_ms: Some(250),
            threshold_mc: Some(-5_000),
            mode: Some("ramp".to_string()),
        };

        let cfg = options.resolve(&stats);
        assert_eq!(cfg.sampling_ms, 250);
        assert_eq!(cfg.threshold_mc, -5_000);
        assert_eq!(cfg.mode, Mode::Ramp);
        assert_eq!(stats.snapshot().errors, 0);
    }

    #[test]
    fn test_invalid_options_fall_back_and_count() {
        let stats = Stats::new();
        let options = DeviceOptions {
            sampling_ms: Some(50_000),
            threshold_mc: None,
            mode: Some("sawtooth".to_string()),
        };

        let cfg = options.resolve(&stats);
        assert_eq!(cfg, SimConfig::default());

        let snap = stats.snapshot();
        assert_eq!(snap.errors, 2);
        assert_eq!(snap.last_error, errno::EINVAL);
    }

    #[test]
    fn test_options_deserialize_from_json() {
        let options: DeviceOptions =
            serde_json::from_str(r#"{"sampling_ms": 10, "mode": "noisy"}"#).unwrap();
        assert_eq!(options.sampling_ms, Some(10));
        assert_eq!(options.threshold_mc, None);
        assert_eq!(options.mode.as_deref(), Some("noisy"));
    }
}
