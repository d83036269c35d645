//! Analog inputs: six current shunts plus the battery divider.
//!
//! ADC1 channel numbers for these pins are listed next to each definition;
//! the sampling sequence itself is configured by the application.
use super::PinDef;
use super::{PinMode, Port};

/// Left motor phase A shunt, ADC1_IN1
pub const LEFT_CUR_A: PinDef = PinDef {
    port: Port::A,
    pin: 0,
    mode: PinMode::Analog,
};

/// Left motor phase B shunt, ADC1_IN2
pub const LEFT_CUR_B: PinDef = PinDef {
    port: Port::A,
    pin: 1,
    mode: PinMode::Analog,
};

/// Right motor phase B shunt, ADC1_IN3
pub const RIGHT_CUR_B: PinDef = PinDef {
    port: Port::A,
    pin: 2,
    mode: PinMode::Analog,
};

/// Right motor phase C shunt, ADC1_IN4
pub const RIGHT_CUR_C: PinDef = PinDef {
    port: Port::A,
    pin: 3,
    mode: PinMode::Analog,
};

/// Left motor DC-link shunt, ADC1_IN15
pub const LEFT_CUR_DC: PinDef = PinDef {
    port: Port::B,
    pin: 0,
    mode: PinMode::Analog,
};

/// Right motor DC-link shunt, ADC1_IN12
pub const RIGHT_CUR_DC: PinDef = PinDef {
    port: Port::B,
    pin: 1,
    mode: PinMode::Analog,
};

/// Battery voltage divider, ADC1_IN14
pub const BATTERY: PinDef = PinDef {
    port: Port::B,
    pin: 11,
    mode: PinMode::Analog,
};

/// Configure all seven analog pins.
pub fn init_all() {
    LEFT_CUR_A.init();
    LEFT_CUR_B.init();
    RIGHT_CUR_B.init();
    RIGHT_CUR_C.init();
    LEFT_CUR_DC.init();
    RIGHT_CUR_DC.init();
    BATTERY.init();
}
