// Hardware-level current chopping. This is the second, lower-latency layer
// of current protection; the first is the motor-current limit inside the
// external control step. Binary, non-latching, no hysteresis: the output
// stage is off for the very next PWM cycle and comes back by itself once the
// current drops under the ceiling again.

/// Per-motor DC-link current cutoff.
#[derive(Clone, Copy, Debug)]
pub struct CurrentGate {
    /// Ceiling in ADC counts.
    ceiling: i16,
}

impl CurrentGate {
    pub const fn new(max_current_a: i16, counts_per_amp: i16) -> Self {
        Self {
            ceiling: max_current_a * counts_per_amp,
        }
    }

    /// Whether PWM output generation may stay enabled this cycle.
    ///
    /// Disabled when the current magnitude exceeds the ceiling or the drive
    /// is administratively off. A magnitude exactly at the ceiling does NOT
    /// disable the output.
    pub fn allows(&self, dc_link: i16, admin_enable: bool) -> bool {
        admin_enable && dc_link.unsigned_abs() <= self.ceiling as u16
    }

    pub fn ceiling(&self) -> i16 {
        self.ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuts_off_above_ceiling() {
        let gate = CurrentGate::new(17, 50);
        assert_eq!(gate.ceiling(), 850);
        assert!(!gate.allows(851, true));
        assert!(!gate.allows(-851, true));
    }

    #[test]
    fn passes_below_ceiling() {
        let gate = CurrentGate::new(17, 50);
        assert!(gate.allows(849, true));
        assert!(gate.allows(-849, true));
        assert!(gate.allows(0, true));
    }

    #[test]
    fn boundary_stays_enabled() {
        // Pinned side: not disabled at exactly the ceiling.
        let gate = CurrentGate::new(17, 50);
        assert!(gate.allows(850, true));
        assert!(gate.allows(-850, true));
    }

    #[test]
    fn admin_disable_wins_regardless_of_current() {
        let gate = CurrentGate::new(17, 50);
        assert!(!gate.allows(0, false));
    }

    #[test]
    fn most_negative_current_does_not_wrap() {
        let gate = CurrentGate::new(17, 50);
        assert!(!gate.allows(i16::MIN, true));
    }
}
