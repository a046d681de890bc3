//! Threshold-crossing detection

/// Flags samples landing on the opposite side of the threshold from
/// their predecessor (strict `>` compare on both sides).
///
/// The last-temperature state updates unconditionally for every sample.
/// It lives outside the buffer critical section, so a threshold rewrite
/// racing an in-flight sample makes that one verdict best-effort rather
/// than guaranteed.
#[derive(Debug, Clone)]
pub struct ThresholdDetector {
    last_temp_mc: i32,
}

impl ThresholdDetector {
    /// Create a detector seeded with the initial "previous" temperature
    pub fn new(initial_temp_mc: i32) -> Self {
        Self {
            last_temp_mc: initial_temp_mc,
        }
    }

    /// True when `temp_mc` crosses `threshold_mc` relative to the
    /// previous sample. Updates the previous-sample state either way.
    pub fn crossed(&mut self, temp_mc: i32, threshold_mc: i32) -> bool {
        let crossed = (temp_mc > threshold_mc) != (self.last_temp_mc > threshold_mc);
        self.last_temp_mc = temp_mc;
        crossed
    }

    /// Last temperature fed through the detector
    pub fn last_temp_mc(&self) -> i32 {
        self.last_temp_mc
    }
}
