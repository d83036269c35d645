// Hall decode and sector history.
//
// Three hall lines give 8 combinations; six are real commutation sectors,
// the all-low/all-high pair can only come from noise or a broken sensor and
// decodes to the reserved sector instead of failing.

/// Reserved sector returned for the two impossible hall combinations.
pub const SECTOR_INVALID: u8 = 6;

/// Number of valid commutation sectors.
pub const SECTOR_COUNT: u8 = 6;

/// 2x2x2 hall lookup, indexed `[a][b][c]` with `true == 1`.
pub type HallTable = [[[u8; 2]; 2]; 2];

/// Decode table for a forward-mounted motor.
pub const HALL_TO_SECTOR_FWD: HallTable = [
    [[SECTOR_INVALID, 2], [4, 3]],
    [[0, 1], [5, SECTOR_INVALID]],
];

/// Mirror of [`HALL_TO_SECTOR_FWD`] with the B/C axes swapped, for the motor
/// mounted with the opposite rotation sense.
pub const HALL_TO_SECTOR_REV: HallTable = [
    [[SECTOR_INVALID, 4], [2, 3]],
    [[0, 5], [1, SECTOR_INVALID]],
];

/// Sampled state of the three hall lines, already converted from the
/// active-low inputs (`true` = magnet present).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HallState {
    pub a: bool,
    pub b: bool,
    pub c: bool,
}

impl HallState {
    pub const fn new(a: bool, b: bool, c: bool) -> Self {
        Self { a, b, c }
    }
}

/// Infallible hall decode; every one of the 8 input combinations maps to a
/// defined sector.
pub fn decode(table: &HallTable, hall: HallState) -> u8 {
    table[hall.a as usize][hall.b as usize][hall.c as usize]
}

/// Two-slot sector history with a step counter for telemetry.
///
/// The counter only increments when a newly observed sector differs from
/// both stored slots, so a single-tick bounce across one sensor boundary
/// never double-counts.
#[derive(Clone, Copy, Debug)]
pub struct SectorTracker {
    current: u8,
    previous: u8,
    steps: u16,
}

impl SectorTracker {
    pub const fn new() -> Self {
        Self {
            current: SECTOR_INVALID,
            previous: SECTOR_INVALID,
            steps: 0,
        }
    }

    /// Seed both history slots without counting a step. Used when entering
    /// calibration so the starting sector is the motion baseline.
    pub fn baseline(&mut self, sector: u8) {
        self.current = sector;
        self.previous = sector;
    }

    /// Record one observation, advancing the history and the step counter.
    pub fn observe(&mut self, sector: u8) {
        if sector != self.current {
            if sector != self.previous {
                self.steps = self.steps.wrapping_add(1);
            }
            self.previous = self.current;
            self.current = sector;
        }
    }

    /// Most recently stored sector.
    pub fn current(&self) -> u8 {
        self.current
    }

    /// Accumulated step count (diagnostics only, never control feedback).
    pub fn steps(&self) -> u16 {
        self.steps
    }
}

impl Default for SectorTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_states() -> [HallState; 8] {
        let mut out = [HallState::default(); 8];
        for (i, s) in out.iter_mut().enumerate() {
            *s = HallState::new(i & 4 != 0, i & 2 != 0, i & 1 != 0);
        }
        out
    }

    #[test]
    fn every_combination_decodes() {
        for hall in all_states() {
            for table in [&HALL_TO_SECTOR_FWD, &HALL_TO_SECTOR_REV] {
                let sector = decode(table, hall);
                assert!(sector <= SECTOR_INVALID);
                let impossible = (hall.a == hall.b) && (hall.b == hall.c);
                if impossible {
                    assert_eq!(sector, SECTOR_INVALID);
                } else {
                    assert!(sector < SECTOR_COUNT);
                }
            }
        }
    }

    #[test]
    fn valid_sectors_cover_zero_to_five() {
        for table in [&HALL_TO_SECTOR_FWD, &HALL_TO_SECTOR_REV] {
            let mut seen = [false; SECTOR_COUNT as usize];
            for hall in all_states() {
                let sector = decode(table, hall);
                if sector < SECTOR_COUNT {
                    seen[sector as usize] = true;
                }
            }
            assert_eq!(seen, [true; SECTOR_COUNT as usize]);
        }
    }

    #[test]
    fn tables_are_mirrored() {
        for hall in all_states() {
            let swapped = HallState::new(hall.a, hall.c, hall.b);
            assert_eq!(
                decode(&HALL_TO_SECTOR_REV, hall),
                decode(&HALL_TO_SECTOR_FWD, swapped)
            );
        }
    }

    #[test]
    fn bounce_between_known_sectors_does_not_count() {
        let mut tracker = SectorTracker::new();
        tracker.baseline(2);
        tracker.observe(3);
        assert_eq!(tracker.steps(), 1);
        // Oscillation around the 2/3 boundary: both sectors are already in
        // the history, so no further steps.
        tracker.observe(2);
        tracker.observe(3);
        tracker.observe(2);
        assert_eq!(tracker.steps(), 1);
    }

    #[test]
    fn rotation_counts_each_new_sector() {
        let mut tracker = SectorTracker::new();
        tracker.baseline(0);
        for sector in [1, 2, 3, 4, 5] {
            tracker.observe(sector);
        }
        assert_eq!(tracker.steps(), 5);
        assert_eq!(tracker.current(), 5);
    }

    #[test]
    fn baseline_does_not_count_a_step() {
        let mut tracker = SectorTracker::new();
        tracker.baseline(4);
        assert_eq!(tracker.steps(), 0);
        assert_eq!(tracker.current(), 4);
        // Re-observing the baseline sector is not a transition either.
        tracker.observe(4);
        assert_eq!(tracker.steps(), 0);
    }
}
