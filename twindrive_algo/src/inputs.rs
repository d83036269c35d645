// Per-tick input records. All of these are rebuilt by the caller every tick
// from the DMA sample buffer, the hall lines and the command statics; the
// core only ever reads them.

use crate::commutation::HallState;

/// One batch of raw ADC samples, refreshed once per tick by the sampling
/// subsystem. Unsigned converter counts, no offset correction applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSamples {
    /// Left motor, phase A shunt.
    pub left_pha_a: u16,
    /// Left motor, phase B shunt.
    pub left_pha_b: u16,
    /// Right motor, phase B shunt.
    pub right_pha_b: u16,
    /// Right motor, phase C shunt.
    pub right_pha_c: u16,
    /// Left motor DC-link shunt.
    pub left_dc: u16,
    /// Right motor DC-link shunt.
    pub right_dc: u16,
    /// Battery voltage divider.
    pub battery: u16,
}

/// Everything the loop consumes in one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickInputs {
    pub raw: RawSamples,
    pub hall_left: HallState,
    pub hall_right: HallState,
}

/// Administrative command inputs, written asynchronously by the command
/// source and read once per tick. Last writer wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub enable: bool,
    pub target_left: i16,
    pub target_right: i16,
}

impl Command {
    /// Motors disabled until the command source says otherwise.
    pub const SAFE: Command = Command {
        enable: false,
        target_left: 0,
        target_right: 0,
    };
}

impl Default for Command {
    fn default() -> Self {
        Command::SAFE
    }
}
