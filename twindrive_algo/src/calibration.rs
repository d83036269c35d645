// ADC offset calibration: averages a fixed number of raw samples per channel
// into the zero-current baseline used by every later current computation.
// Averaging rejects sensor noise; integer truncation is fine because the
// offsets are coarse bias values.

use crate::inputs::RawSamples;

/// Averaged zero-current baselines, one per raw current channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentOffsets {
    pub left_pha_a: u16,
    pub left_pha_b: u16,
    pub right_pha_b: u16,
    pub right_pha_c: u16,
    pub left_dc: u16,
    pub right_dc: u16,
}

impl CurrentOffsets {
    /// Offset-corrected signed current, `offset - sample`. The inverted sign
    /// convention matches the polarity the external control step expects;
    /// do not flip it.
    pub fn corrected(offset: u16, sample: u16) -> i16 {
        offset.wrapping_sub(sample) as i16
    }
}

/// Running per-channel sums while calibration accumulates.
#[derive(Clone, Copy, Debug, Default)]
pub struct OffsetAccumulator {
    left_pha_a: u32,
    left_pha_b: u32,
    right_pha_b: u32,
    right_pha_c: u32,
    left_dc: u32,
    right_dc: u32,
}

impl OffsetAccumulator {
    pub const fn new() -> Self {
        Self {
            left_pha_a: 0,
            left_pha_b: 0,
            right_pha_b: 0,
            right_pha_c: 0,
            left_dc: 0,
            right_dc: 0,
        }
    }

    /// Zero every channel sum for a fresh accumulation run.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Add one tick's raw samples to the sums.
    pub fn add(&mut self, raw: &RawSamples) {
        self.left_pha_a += raw.left_pha_a as u32;
        self.left_pha_b += raw.left_pha_b as u32;
        self.right_pha_b += raw.right_pha_b as u32;
        self.right_pha_c += raw.right_pha_c as u32;
        self.left_dc += raw.left_dc as u32;
        self.right_dc += raw.right_dc as u32;
    }

    /// Divide each sum by the sample count. Called exactly once, when the
    /// accumulation target is reached.
    pub fn finalize(&self, samples: u32) -> CurrentOffsets {
        CurrentOffsets {
            left_pha_a: (self.left_pha_a / samples) as u16,
            left_pha_b: (self.left_pha_b / samples) as u16,
            right_pha_b: (self.right_pha_b / samples) as u16,
            right_pha_c: (self.right_pha_c / samples) as u16,
            left_dc: (self.left_dc / samples) as u16,
            right_dc: (self.right_dc / samples) as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_raw(v: u16) -> RawSamples {
        RawSamples {
            left_pha_a: v,
            left_pha_b: v,
            right_pha_b: v,
            right_pha_c: v,
            left_dc: v,
            right_dc: v,
            battery: 0,
        }
    }

    #[test]
    fn constant_input_averages_exactly() {
        let mut acc = OffsetAccumulator::new();
        for _ in 0..64 {
            acc.add(&constant_raw(1850));
        }
        let offsets = acc.finalize(64);
        assert_eq!(offsets.left_pha_a, 1850);
        assert_eq!(offsets.right_dc, 1850);
    }

    #[test]
    fn division_truncates() {
        let mut acc = OffsetAccumulator::new();
        acc.add(&constant_raw(3));
        acc.add(&constant_raw(4));
        // (3 + 4) / 2 == 3 in integer math; coarse bias, truncation intended.
        assert_eq!(acc.finalize(2).left_dc, 3);
    }

    #[test]
    fn reset_discards_previous_sums() {
        let mut acc = OffsetAccumulator::new();
        acc.add(&constant_raw(4000));
        acc.reset();
        acc.add(&constant_raw(100));
        assert_eq!(acc.finalize(1).left_pha_b, 100);
    }

    #[test]
    fn corrected_current_is_offset_minus_sample() {
        assert_eq!(CurrentOffsets::corrected(2000, 1500), 500);
        assert_eq!(CurrentOffsets::corrected(2000, 2500), -500);
        assert_eq!(CurrentOffsets::corrected(0, 1), -1);
    }
}
