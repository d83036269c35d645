//! Hall sensor line reading. The lines are active low; `read()` returns
//! `true` for an asserted sensor so the decode tables index directly.

use hal::gpio::{Pin, Pull};

use crate::pinout::{self, PinDef};

pub struct HallInputs {
    u: Pin,
    v: Pin,
    w: Pin,
}

impl HallInputs {
    /// Claim the left motor's three hall lines.
    pub fn left() -> Self {
        Self::from_defs(
            &pinout::hall::LEFT_HALL_U,
            &pinout::hall::LEFT_HALL_V,
            &pinout::hall::LEFT_HALL_W,
        )
    }

    /// Claim the right motor's three hall lines.
    pub fn right() -> Self {
        Self::from_defs(
            &pinout::hall::RIGHT_HALL_U,
            &pinout::hall::RIGHT_HALL_V,
            &pinout::hall::RIGHT_HALL_W,
        )
    }

    fn from_defs(u: &PinDef, v: &PinDef, w: &PinDef) -> Self {
        let mut u = u.init();
        let mut v = v.init();
        let mut w = w.init();
        u.pull(Pull::Up);
        v.pull(Pull::Up);
        w.pull(Pull::Up);
        Self { u, v, w }
    }

    /// Combinatorial sample of the three lines, no debounce.
    pub fn read(&self) -> (bool, bool, bool) {
        (self.u.is_low(), self.v.is_low(), self.w.is_low())
    }
}
