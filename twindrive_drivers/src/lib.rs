#![no_std]

pub mod hall;
pub mod pinout;
pub mod pwm;
