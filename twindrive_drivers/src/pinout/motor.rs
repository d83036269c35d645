//! PWM output pins for the two motor timers. Left motor on TIM1, right
//! motor on TIM8, three phases each.
use super::PinDef;
use super::{PinMode, Port};

/// Left motor phase A, TIM1_CH1
pub const LEFT_PHA_A: PinDef = PinDef {
    port: Port::A,
    pin: 8,
    mode: PinMode::Alt(6),
};

/// Left motor phase B, TIM1_CH2
pub const LEFT_PHA_B: PinDef = PinDef {
    port: Port::A,
    pin: 9,
    mode: PinMode::Alt(6),
};

/// Left motor phase C, TIM1_CH3
pub const LEFT_PHA_C: PinDef = PinDef {
    port: Port::A,
    pin: 10,
    mode: PinMode::Alt(6),
};

/// Right motor phase A, TIM8_CH1
pub const RIGHT_PHA_A: PinDef = PinDef {
    port: Port::C,
    pin: 6,
    mode: PinMode::Alt(4),
};

/// Right motor phase B, TIM8_CH2
pub const RIGHT_PHA_B: PinDef = PinDef {
    port: Port::C,
    pin: 7,
    mode: PinMode::Alt(4),
};

/// Right motor phase C, TIM8_CH3
pub const RIGHT_PHA_C: PinDef = PinDef {
    port: Port::C,
    pin: 8,
    mode: PinMode::Alt(4),
};

/// Configure all six phase pins.
pub fn init_all() {
    LEFT_PHA_A.init();
    LEFT_PHA_B.init();
    LEFT_PHA_C.init();
    RIGHT_PHA_A.init();
    RIGHT_PHA_B.init();
    RIGHT_PHA_C.init();
}
