// Static configuration for the drive loop. All values are plain integers:
// the loop runs from a fixed-rate interrupt and never does float math.

/// Control strategy requested from the external control step. Only the PWM
/// margin selection consumes it inside this core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlType {
    /// Plain 6-step commutation.
    Commutation,
    /// Sinusoidal modulation.
    Sinusoidal,
    /// Field-oriented control; needs a current-sampling window in the PWM.
    FieldOriented,
}

/// Rotation sense of a motor, selecting which mirrored hall table decodes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Forward,
    Reverse,
}

/// Dead-zone reserved at the duty-cycle extremes when running field-oriented
/// control, so phase-current sampling always sees a valid window.
pub const FOC_PWM_MARGIN: u16 = 110;

pub struct LoopConfig {
    /// PWM period in timer counts. Duty outputs land in `[0, pwm_period)`.
    pub pwm_period: u16,
    /// Number of ticks averaged into the ADC offsets.
    pub calibration_samples: u32,
    /// DC-link current ceiling in amps before the hardware cutoff fires.
    pub max_dc_current_a: i16,
    /// ADC scale factor, counts per amp.
    pub counts_per_amp: i16,
    /// Per-motor control strategy, [left, right].
    pub control_type: [ControlType; 2],
    /// Per-motor rotation sense, [left, right].
    pub rotation: [Rotation; 2],
    /// Battery filter seed, ADC counts at the nominal pack voltage.
    pub battery_initial: u16,
    /// Battery low-pass coefficient, Q16 fixed point.
    pub battery_filter_coef: i16,
    /// Battery filter runs every `battery_divider` ticks.
    pub battery_divider: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            // 64 MHz / 2 / 16 kHz, center-aligned
            pwm_period: 2000,
            calibration_samples: 1024,
            max_dc_current_a: 17,
            counts_per_amp: 50,
            control_type: [ControlType::FieldOriented; 2],
            rotation: [Rotation::Forward, Rotation::Reverse],
            battery_initial: 2400,
            battery_filter_coef: 655,
            battery_divider: 1000,
        }
    }
}
