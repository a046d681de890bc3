//! Temperature generation policies

use crate::{Mode, Stats};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Default base temperature (25 °C)
pub const DEFAULT_BASE_TEMP_MC: i32 = 25_000;

/// Ramp step size per sample in milli-degrees
const RAMP_STEP_MC: i32 = 200;
/// Samples per ramp half-cycle before the direction flips
const RAMP_FLIP_AFTER: u32 = 10;
/// Peak noise magnitude in milli-degrees
const NOISE_SPAN_MC: i32 = 1_000;

/// Mode-driven temperature source.
///
/// Owns the ramp state and the PRNG. Driven only by the sampler; the
/// configuration surface reaches in through [`TempGenerator::enter_ramp`]
/// when the mode switches into ramp.
pub struct TempGenerator {
    base_temp_mc: i32,
    ramp_direction: i32,
    ramp_counter: u32,
    rng: SmallRng,
}

impl TempGenerator {
    /// Create a generator around the given base temperature
    pub fn new(base_temp_mc: i32) -> Self {
        Self {
            base_temp_mc,
            ramp_direction: 1,
            ramp_counter: 0,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Base temperature the policies modulate
    pub fn base_temp_mc(&self) -> i32 {
        self.base_temp_mc
    }

    /// Produce the next temperature under `mode` and count the update.
    ///
    /// This is the sole writer of the `updates` statistic.
    pub fn next_temp(&mut self, mode: Mode, stats: &Stats) -> i32 {
        let temp_mc = match mode {
            Mode::Normal => self.base_temp_mc,
            Mode::Noisy => {
                self.base_temp_mc + self.rng.random_range(-NOISE_SPAN_MC..NOISE_SPAN_MC)
            }
            Mode::Ramp => {
                self.ramp_counter += 1;
                if self.ramp_counter > RAMP_FLIP_AFTER {
                    self.ramp_direction = -self.ramp_direction;
                    self.ramp_counter = 0;
                }
                self.base_temp_mc + self.ramp_counter as i32 * self.ramp_direction * RAMP_STEP_MC
            }
        };

        stats.record_update();
        temp_mc
    }

    /// Reset ramp state for a switch into ramp mode.
    ///
    /// The first half-cycle heads toward `threshold_mc` so a crossing
    /// shows up quickly: down when the threshold sits below the base
    /// temperature, up otherwise.
    pub fn enter_ramp(&mut self, threshold_mc: i32) {
        self.ramp_counter = 0;
        self.ramp_direction = if threshold_mc < self.base_temp_mc { -1 } else { 1 };
        debug!(
            direction = self.ramp_direction,
            threshold_mc,
            base_mc = self.base_temp_mc,
            "ramp state reset"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_is_base_bit_exact() {
        let stats = Stats::new();
        let mut generator = TempGenerator::new(DEFAULT_BASE_TEMP_MC);

        for _ in 0..32 {
            assert_eq!(generator.next_temp(Mode::Normal, &stats), 25_000);
        }
        assert_eq!(stats.snapshot().updates, 32);
    }

    #[test]
    fn test_noisy_stays_within_one_degree() {
        let stats = Stats::new();
        let mut generator = TempGenerator::new(DEFAULT_BASE_TEMP_MC);

        let values: Vec<i32> = (0..256)
            .map(|_| generator.next_temp(Mode::Noisy, &stats))
            .collect();

        assert!(values
            .iter()
            .all(|&v| (24_000..25_000 + NOISE_SPAN_MC).contains(&v)));
        // 256 draws from a ±1 °C span all landing on the same value
        // would mean the RNG is not feeding the perturbation
        assert!(values.iter().any(|&v| v != values[0]));
    }

    #[test]
    fn test_ramp_triangle_toward_higher_threshold() {
        let stats = Stats::new();
        let mut generator = TempGenerator::new(25_000);
        generator.enter_ramp(45_000);

        // Steps 1..=10 climb 200 mC per sample
        for step in 1..=10 {
            let expected = 25_000 + step * 200;
            assert_eq!(generator.next_temp(Mode::Ramp, &stats), expected);
        }

        // Step 11 flips direction: counter resets, base re-emitted
        assert_eq!(generator.next_temp(Mode::Ramp, &stats), 25_000);

        // Then 200 mC down per step
        for step in 1..=10 {
            let expected = 25_000 - step * 200;
            assert_eq!(generator.next_temp(Mode::Ramp, &stats), expected);
        }

        // And back up after the second flip
        assert_eq!(generator.next_temp(Mode::Ramp, &stats), 25_000);
        assert_eq!(generator.next_temp(Mode::Ramp, &stats), 25_200);
    }

    #[test]
    fn test_ramp_heads_down_when_threshold_below_base() {
        let stats = Stats::new();
        let mut generator = TempGenerator::new(25_000);
        generator.enter_ramp(20_000);

        assert_eq!(generator.next_temp(Mode::Ramp, &stats), 24_800);
        assert_eq!(generator.next_temp(Mode::Ramp, &stats), 24_600);
    }

    #[test]
    fn test_enter_ramp_resets_mid_cycle() {
        let stats = Stats::new();
        let mut generator = TempGenerator::new(25_000);
        generator.enter_ramp(45_000);

        for _ in 0..7 {
            generator.next_temp(Mode::Ramp, &stats);
        }

        // Re-entering restarts the half-cycle from the base
        generator.enter_ramp(45_000);
        assert_eq!(generator.next_temp(Mode::Ramp, &stats), 25_200);
    }
}
