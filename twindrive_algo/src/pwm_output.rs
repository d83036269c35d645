// Duty-cycle conversion: the control step produces signed, zero-centered
// duties; the timer wants unsigned compare values inside the period.

use crate::config::{ControlType, FOC_PWM_MARGIN};

/// PWM safety margin for a control strategy. Field-oriented control needs a
/// dead-zone at the duty extremes so phase-current sampling always has a
/// valid window; the simpler strategies do not.
pub fn margin_for(control: ControlType) -> u16 {
    match control {
        ControlType::FieldOriented => FOC_PWM_MARGIN,
        ControlType::Commutation | ControlType::Sinusoidal => 0,
    }
}

/// Shift a signed centered duty into the unsigned register range and clamp
/// it to `[margin, period - margin]`. Out-of-range values saturate at the
/// boundary, never wrap.
pub fn center_clamp(duty: i16, period: u16, margin: u16) -> u16 {
    let centered = duty as i32 + (period / 2) as i32;
    centered.clamp(margin as i32, (period - margin) as i32) as u16
}
