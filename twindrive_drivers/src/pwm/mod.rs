//! Center-aligned three-phase PWM on the two advanced timers. Compare
//! values come pre-clamped from the control core; this layer only moves
//! them into the registers and drives the master output enable bit, which
//! is the hardware current-chopping actuator.

use hal::{
    clocks::Clocks,
    pac::{TIM1, TIM8},
    timer::{Alignment, OutputCompare, TimChannel, Timer, TimerConfig},
};

pub struct MotorPwm<TIM> {
    tim: Timer<TIM>,
    period: u16,
}

macro_rules! impl_motor_pwm {
    ($TIM:ty, $new:ident) => {
        impl MotorPwm<$TIM> {
            pub fn new(tim: $TIM, clock_cfg: &Clocks, freq: u16) -> Self {
                let timer = Timer::$new(
                    tim,
                    freq as f32,
                    TimerConfig {
                        auto_reload_preload: true,
                        alignment: Alignment::Center1,
                        ..Default::default()
                    },
                    clock_cfg,
                );
                let period = timer.get_max_duty() as u16;
                Self { tim: timer, period }
            }

            /// Enable the three phase outputs at zero duty and start the
            /// counter. Output generation itself stays off until
            /// [`Self::set_output_enable`] asserts it.
            pub fn begin(&mut self) {
                self.tim
                    .enable_pwm_output(TimChannel::C1, OutputCompare::Pwm1, 0.0);
                self.tim
                    .enable_pwm_output(TimChannel::C2, OutputCompare::Pwm1, 0.0);
                self.tim
                    .enable_pwm_output(TimChannel::C3, OutputCompare::Pwm1, 0.0);
                self.set_output_enable(false);
                self.tim.enable();
            }

            /// Latch one tick's actuator state: three compare values plus
            /// the master output enable.
            pub fn apply(&mut self, compare: [u16; 3], output_enable: bool) {
                self.tim.set_duty(TimChannel::C1, compare[0] as u32);
                self.tim.set_duty(TimChannel::C2, compare[1] as u32);
                self.tim.set_duty(TimChannel::C3, compare[2] as u32);
                self.set_output_enable(output_enable);
            }

            /// Master output enable (BDTR.MOE). Clearing it disables PWM
            /// generation for the following cycle without touching the
            /// compare values.
            pub fn set_output_enable(&mut self, on: bool) {
                self.tim.regs.bdtr.modify(|_, w| w.moe().bit(on));
            }

            /// PWM period in timer counts.
            pub fn period(&self) -> u16 {
                self.period
            }
        }
    };
}

impl_motor_pwm!(TIM1, new_tim1);
impl_motor_pwm!(TIM8, new_tim8);
