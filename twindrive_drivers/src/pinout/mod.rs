use hal::gpio::{Pin, PinMode, Port};

pub mod analog;
pub mod hall;
pub mod motor;

/// Compile-time description of one GPIO pin.
pub struct PinDef {
    /// Port the pin belongs to.
    port: Port,
    /// Pin number within the port.
    pin: u8,
    /// Pin mode (input, analog, alternate function...).
    mode: PinMode,
}

impl PinDef {
    pub const fn new(port: Port, pin: u8, mode: PinMode) -> PinDef {
        PinDef { port, pin, mode }
    }

    /// Claim and configure the pin.
    pub fn init(&self) -> Pin {
        Pin::new(self.port, self.pin, self.mode)
    }
}
