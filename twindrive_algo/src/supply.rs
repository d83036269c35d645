// Battery voltage telemetry. The raw divider channel is noisy and only
// consumed by slow reporting paths, so it runs through a Q16 fixed-point
// low-pass at a sub-rate of the control tick.

/// Fixed-point low-pass filter over the battery ADC channel.
#[derive(Clone, Copy, Debug)]
pub struct BatteryMonitor {
    /// Filter state, ADC counts in Q16.
    filt_fixdt: i32,
    /// Filter coefficient, Q16 (655 ~= 0.01).
    coef: i16,
}

impl BatteryMonitor {
    pub const fn new(initial_counts: u16, coef: i16) -> Self {
        Self {
            filt_fixdt: (initial_counts as i32) << 16,
            coef,
        }
    }

    /// Advance the filter with one raw sample.
    pub fn tick(&mut self, raw: u16) -> i16 {
        let target = (raw as i32) << 16;
        let error = target.wrapping_sub(self.filt_fixdt) >> 16;
        self.filt_fixdt = self.filt_fixdt.wrapping_add(self.coef as i32 * error);
        self.voltage_counts()
    }

    /// Filtered battery voltage in ADC counts.
    pub fn voltage_counts(&self) -> i16 {
        (self.filt_fixdt >> 16) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_the_seed_value() {
        let monitor = BatteryMonitor::new(2400, 655);
        assert_eq!(monitor.voltage_counts(), 2400);
    }

    #[test]
    fn converges_toward_constant_input() {
        let mut monitor = BatteryMonitor::new(0, 655);
        for _ in 0..2000 {
            monitor.tick(3000);
        }
        let v = monitor.voltage_counts();
        assert!((2990..=3000).contains(&v), "filter settled at {v}");
    }

    #[test]
    fn single_sample_moves_output_only_slightly() {
        let mut monitor = BatteryMonitor::new(2400, 655);
        monitor.tick(0);
        let v = monitor.voltage_counts();
        assert!(v < 2400 && v > 2300, "one step moved to {v}");
    }
}
