#![no_main]
#![no_std]

use defmt_rtt as _;
use panic_probe as _;

use hal::{
    self,
    adc::{Adc, AdcDevice, Align, InputType, SampleTime},
    clocks::Clocks,
    dma::{self, Dma, DmaChannel, DmaInput, DmaInterrupt, DmaPeriph},
    pac,
    pac::{ADC1, DMA1, TIM3},
    timer::{Timer, TimerInterrupt},
};

use twindrive_algo::{
    commutation::{self, HallState, HallTable, SECTOR_COUNT},
    config::LoopConfig,
    control::{ControlInput, ControlOutput, ControlStep},
    inputs::{Command, RawSamples, TickInputs},
    DriveLoop,
};
use twindrive_drivers::{hall::HallInputs, pinout, pwm::MotorPwm};

use cortex_m;

/// Control tick rate; the ADC sampling timer fires at this frequency and
/// each completed sample batch drives one loop tick.
const TICK_FREQ_HZ: u16 = 16_000;

// ADC1 sampling order: left phase A/B, right phase B/C, left DC, right DC,
// battery. Channel numbers match the pins in `pinout::analog`.
const SAMPLING_COUNT: usize = 7;
const ADC1_SEQUENCE: [u8; SAMPLING_COUNT] = [1, 2, 3, 4, 15, 12, 14];

static mut ADC_READ_BUF: [u16; SAMPLING_COUNT] = [0; SAMPLING_COUNT];

// Written by the command source (comms glue, not part of this image yet),
// read once per tick. Plain last-writer-wins variables by design.
static mut COMMAND: Command = Command::SAFE;

fn hall_state(lines: (bool, bool, bool)) -> HallState {
    HallState::new(lines.0, lines.1, lines.2)
}

/// Plain 6-step commutation implementing the control-step contract. Stands
/// in for the full regulation algorithm: one positive phase, one negative,
/// one floating per sector, duty taken straight from the target.
struct SixStepCommutation {
    table: &'static HallTable,
}

impl SixStepCommutation {
    /// Phase polarity per sector, [A, B, C].
    const PATTERN: [[i16; 3]; SECTOR_COUNT as usize] = [
        [1, -1, 0],
        [1, 0, -1],
        [0, 1, -1],
        [-1, 1, 0],
        [-1, 0, 1],
        [0, -1, 1],
    ];

    fn new(table: &'static HallTable) -> Self {
        Self { table }
    }
}

impl ControlStep for SixStepCommutation {
    fn step(&mut self, input: &ControlInput) -> ControlOutput {
        let sector = commutation::decode(self.table, input.hall);
        if sector >= SECTOR_COUNT {
            // Hall noise or a broken sensor; report and let the gate stop
            // both motors until a valid sector comes back.
            return ControlOutput {
                duty_a: 0,
                duty_b: 0,
                duty_c: 0,
                err_code: 1,
            };
        }
        if !input.enable {
            return ControlOutput::IDLE;
        }
        let duty = input.target.clamp(-1000, 1000);
        let pattern = Self::PATTERN[sector as usize];
        ControlOutput {
            duty_a: pattern[0] * duty,
            duty_b: pattern[1] * duty,
            duty_c: pattern[2] * duty,
            err_code: 0,
        }
    }
}

#[rtic::app(device = pac, peripherals = true)]
mod app {
    use super::*;

    #[shared]
    struct Shared {
        adc1: Adc<ADC1>,
    }

    #[local]
    struct Local {
        sampler: Timer<TIM3>,
        dma1: Dma<DMA1>,
        pwm_left: MotorPwm<pac::TIM1>,
        pwm_right: MotorPwm<pac::TIM8>,
        halls_left: HallInputs,
        halls_right: HallInputs,
        drive: DriveLoop<SixStepCommutation, SixStepCommutation>,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let dp = ctx.device;
        let clock_cfg = Clocks::default();
        clock_cfg.setup().unwrap();
        defmt::debug!(
            "SYSTEM: clock frequency is {} MHz",
            clock_cfg.sysclk() / 1_000_000
        );

        pinout::motor::init_all();
        pinout::analog::init_all();

        let mut pwm_left = MotorPwm::new(dp.TIM1, &clock_cfg, TICK_FREQ_HZ);
        let mut pwm_right = MotorPwm::new(dp.TIM8, &clock_cfg, TICK_FREQ_HZ);
        pwm_left.begin();
        pwm_right.begin();

        let halls_left = HallInputs::left();
        let halls_right = HallInputs::right();

        let cfg = LoopConfig {
            pwm_period: pwm_left.period(),
            ..Default::default()
        };
        let mut drive = DriveLoop::new(
            cfg,
            Some(SixStepCommutation::new(&commutation::HALL_TO_SECTOR_FWD)),
            Some(SixStepCommutation::new(&commutation::HALL_TO_SECTOR_REV)),
        );
        drive.begin_calibration(
            hall_state(halls_left.read()),
            hall_state(halls_right.read()),
        );

        let mut adc1 = Adc::new_adc1(
            dp.ADC1,
            AdcDevice::One,
            Default::default(),
            clock_cfg.systick(),
        );
        for i in 0..SAMPLING_COUNT {
            adc1.set_sequence(ADC1_SEQUENCE[i], i as u8 + 1);
            adc1.set_input_type(ADC1_SEQUENCE[i], InputType::SingleEnded);
            adc1.set_sample_time(ADC1_SEQUENCE[i], SampleTime::T2);
        }
        adc1.set_sequence_len(SAMPLING_COUNT as u8);
        adc1.set_align(Align::Right);

        let dma1 = Dma::new(dp.DMA1);
        dma::enable_mux1();
        dma::mux(DmaPeriph::Dma1, DmaChannel::C1, DmaInput::Adc1);

        // Sampling timer: one ADC batch per control tick.
        let mut sampler = Timer::new_tim3(dp.TIM3, TICK_FREQ_HZ as f32, Default::default(), &clock_cfg);
        sampler.enable_interrupt(TimerInterrupt::Update);
        sampler.enable();

        (
            Shared { adc1 },
            Local {
                sampler,
                dma1,
                pwm_left,
                pwm_right,
                halls_left,
                halls_right,
                drive,
            },
        )
    }

    /// Kick one ADC sample batch per tick. Runs above the control task so
    /// sampling cadence never slips when a control tick overruns.
    #[task(binds = TIM3, local = [sampler], shared = [adc1], priority = 2)]
    fn on_sampling_tick(mut cx: on_sampling_tick::Context) {
        cx.local.sampler.clear_interrupt(TimerInterrupt::Update);

        cx.shared.adc1.lock(|adc| unsafe {
            adc.read_dma(
                &mut ADC_READ_BUF,
                &ADC1_SEQUENCE,
                DmaChannel::C1,
                Default::default(),
                DmaPeriph::Dma1,
            )
        });
    }

    /// Tick entry point: a completed sample batch drives one loop tick and
    /// latches the resulting duty/enable state into both timers.
    #[task(binds = DMA1_CH1, local = [dma1, pwm_left, pwm_right, halls_left, halls_right, drive], priority = 1)]
    fn on_control_tick(cx: on_control_tick::Context) {
        dma::clear_interrupt(
            DmaPeriph::Dma1,
            DmaChannel::C1,
            DmaInterrupt::TransferComplete,
        );
        cx.local.dma1.stop(DmaChannel::C1);

        let buf = unsafe { ADC_READ_BUF };
        let inputs = TickInputs {
            raw: RawSamples {
                left_pha_a: buf[0],
                left_pha_b: buf[1],
                right_pha_b: buf[2],
                right_pha_c: buf[3],
                left_dc: buf[4],
                right_dc: buf[5],
                battery: buf[6],
            },
            hall_left: hall_state(cx.local.halls_left.read()),
            hall_right: hall_state(cx.local.halls_right.read()),
        };
        let cmd = unsafe { COMMAND };

        let drive = cx.local.drive;
        drive.isr_tick(&inputs, &cmd);

        let [left, right] = drive.outputs();
        cx.local.pwm_left.apply(left.compare, left.output_enable);
        cx.local.pwm_right.apply(right.compare, right.output_enable);

        // 1 Hz telemetry
        if drive.tick_count() % TICK_FREQ_HZ as u64 == 0 {
            let steps = drive.steps();
            defmt::debug!(
                "steps L/R: {}/{}, battery: {} counts",
                steps[0],
                steps[1],
                drive.battery_counts()
            );
        }
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
