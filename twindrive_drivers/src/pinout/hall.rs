//! Hall sensor input pins, three active-low lines per motor.
use super::PinDef;
use super::{PinMode, Port};

pub const LEFT_HALL_U: PinDef = PinDef {
    port: Port::B,
    pin: 6,
    mode: PinMode::Input,
};

pub const LEFT_HALL_V: PinDef = PinDef {
    port: Port::B,
    pin: 7,
    mode: PinMode::Input,
};

pub const LEFT_HALL_W: PinDef = PinDef {
    port: Port::B,
    pin: 8,
    mode: PinMode::Input,
};

pub const RIGHT_HALL_U: PinDef = PinDef {
    port: Port::B,
    pin: 3,
    mode: PinMode::Input,
};

pub const RIGHT_HALL_V: PinDef = PinDef {
    port: Port::B,
    pin: 4,
    mode: PinMode::Input,
};

pub const RIGHT_HALL_W: PinDef = PinDef {
    port: Port::B,
    pin: 5,
    mode: PinMode::Input,
};
