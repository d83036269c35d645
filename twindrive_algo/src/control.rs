// Contract with the external control step. The regulation algorithm itself
// (current/speed loops, modulation math) lives outside this crate; the loop
// only cares about this fixed input/output record pair.

use crate::commutation::HallState;

/// Per-motor inputs handed to the control step, rebuilt every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlInput {
    /// Combined enable/fault gate shared by both motors this tick.
    pub enable: bool,
    /// Requested target from the command source.
    pub target: i16,
    /// Raw hall bits, forwarded untouched.
    pub hall: HallState,
    /// Offset-corrected phase current, A-B shunt pair.
    pub cur_pha_ab: i16,
    /// Offset-corrected phase current, B-C shunt pair.
    pub cur_pha_bc: i16,
    /// Offset-corrected DC-link current.
    pub cur_dc_link: i16,
}

/// The consumed fields of the control step's output record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlOutput {
    /// Signed zero-centered phase duties.
    pub duty_a: i16,
    pub duty_b: i16,
    pub duty_c: i16,
    /// Zero means healthy; anything else trips the shared enable/fault gate.
    pub err_code: u8,
}

impl ControlOutput {
    /// Neutral output used until a channel's step has run at least once.
    pub const IDLE: ControlOutput = ControlOutput {
        duty_a: 0,
        duty_b: 0,
        duty_c: 0,
        err_code: 0,
    };
}

impl Default for ControlOutput {
    fn default() -> Self {
        Self::IDLE
    }
}

/// One step of the external regulation algorithm.
///
/// Called exactly once per tick per configured motor and must not block.
/// Injected as a capability so the loop can run against a deterministic
/// stub in tests instead of the real algorithm.
pub trait ControlStep {
    fn step(&mut self, input: &ControlInput) -> ControlOutput;
}
