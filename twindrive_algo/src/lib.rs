#![cfg_attr(not(test), no_std)]

// This must go first so the log macros are visible to the other modules.
mod fmt;

pub mod calibration;
pub mod commutation;
pub mod config;
pub mod control;
pub mod inputs;
pub mod protection;
pub mod pwm_output;
pub mod supply;

use calibration::{CurrentOffsets, OffsetAccumulator};
use commutation::{HallState, HallTable, SectorTracker, HALL_TO_SECTOR_FWD, HALL_TO_SECTOR_REV};
use config::{ControlType, LoopConfig, Rotation};
use control::{ControlInput, ControlOutput, ControlStep};
use inputs::{Command, TickInputs};
use protection::CurrentGate;
use supply::BatteryMonitor;

/// Lifecycle phase of the drive loop. Explicit enum dispatch at the tick
/// entry, not a reassignable function reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopPhase {
    /// Averaging ADC offsets; motors are not driven.
    Calibrating,
    /// Closed-loop control tick. Terminal unless calibration is restarted.
    Running,
}

/// Actuator state for one motor, latched by the tick and copied to the
/// timer registers by the interrupt glue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorOutputs {
    /// Three clamped compare values, one per phase.
    pub compare: [u16; 3],
    /// Master output enable for the motor's timer; driven by the current
    /// protection gate.
    pub output_enable: bool,
}

impl Default for MotorOutputs {
    fn default() -> Self {
        Self {
            compare: [0; 3],
            output_enable: false,
        }
    }
}

/// Offset-corrected signed currents for one motor, one tick.
#[derive(Clone, Copy, Debug)]
pub struct PhaseCurrents {
    pub pha_ab: i16,
    pub pha_bc: i16,
    pub dc_link: i16,
}

/// One motor channel: its hall table, sector history, injected control step
/// and latched outputs.
struct MotorChannel<S: ControlStep> {
    control: ControlType,
    table: &'static HallTable,
    tracker: SectorTracker,
    /// `None` when this channel is not built into the image; the output
    /// record then simply keeps its previous value.
    step: Option<S>,
    last_out: ControlOutput,
    output: MotorOutputs,
}

impl<S: ControlStep> MotorChannel<S> {
    fn new(control: ControlType, rotation: Rotation, step: Option<S>) -> Self {
        Self {
            control,
            table: match rotation {
                Rotation::Forward => &HALL_TO_SECTOR_FWD,
                Rotation::Reverse => &HALL_TO_SECTOR_REV,
            },
            tracker: SectorTracker::new(),
            step,
            last_out: ControlOutput::IDLE,
            output: MotorOutputs::default(),
        }
    }

    fn decode(&self, hall: HallState) -> u8 {
        commutation::decode(self.table, hall)
    }

    /// Run-time sequence for one motor, in fixed order: protection gate,
    /// margin, hall decode, control step, duty conversion.
    fn tick(
        &mut self,
        period: u16,
        gate: &CurrentGate,
        currents: PhaseCurrents,
        hall: HallState,
        target: i16,
        enable_fin: bool,
        admin_enable: bool,
    ) {
        // Hardware-level current chopping; takes effect next PWM cycle.
        self.output.output_enable = gate.allows(currents.dc_link, admin_enable);

        let margin = pwm_output::margin_for(self.control);

        let sector = self.decode(hall);
        self.tracker.observe(sector);

        let input = ControlInput {
            enable: enable_fin,
            target,
            hall,
            cur_pha_ab: currents.pha_ab,
            cur_pha_bc: currents.pha_bc,
            cur_dc_link: currents.dc_link,
        };
        if let Some(step) = self.step.as_mut() {
            self.last_out = step.step(&input);
        }

        self.output.compare = [
            pwm_output::center_clamp(self.last_out.duty_a, period, margin),
            pwm_output::center_clamp(self.last_out.duty_b, period, margin),
            pwm_output::center_clamp(self.last_out.duty_c, period, margin),
        ];
    }
}

/// The real-time core: owns every piece of state the interrupt mutates and
/// is the single writer for all of it. The interrupt entry point holds the
/// only mutable handle.
pub struct DriveLoop<L: ControlStep, R: ControlStep> {
    cfg: LoopConfig,
    gate: CurrentGate,
    phase: LoopPhase,
    /// Monotonic tick count; increments once per interrupt, overrun or not.
    counter: u64,
    /// Run-to-completion reentrancy lock for the tick work.
    busy: bool,
    accumulator: OffsetAccumulator,
    offsets: CurrentOffsets,
    /// Combined enable/fault gate: admin enable AND no fault code from
    /// either motor's previous control step. Any fault stops both.
    enable_fin: bool,
    left: MotorChannel<L>,
    right: MotorChannel<R>,
    battery: BatteryMonitor,
}

impl<L: ControlStep, R: ControlStep> DriveLoop<L, R> {
    /// Build the loop in the calibration phase. The first tick establishes
    /// the motion baseline by itself; call [`Self::begin_calibration`] with
    /// the current hall state to seed it explicitly.
    pub fn new(cfg: LoopConfig, left_step: Option<L>, right_step: Option<R>) -> Self {
        let gate = CurrentGate::new(cfg.max_dc_current_a, cfg.counts_per_amp);
        let battery = BatteryMonitor::new(cfg.battery_initial, cfg.battery_filter_coef);
        let left = MotorChannel::new(cfg.control_type[0], cfg.rotation[0], left_step);
        let right = MotorChannel::new(cfg.control_type[1], cfg.rotation[1], right_step);
        Self {
            cfg,
            gate,
            phase: LoopPhase::Calibrating,
            counter: 0,
            busy: false,
            accumulator: OffsetAccumulator::new(),
            offsets: CurrentOffsets::default(),
            enable_fin: false,
            left,
            right,
            battery,
        }
    }

    /// Interrupt entry point, called once per sampling interrupt.
    ///
    /// Always advances the tick counter. If the previous tick's work is
    /// still in flight (overrun), everything else is skipped: a stale
    /// control action is worse than a dropped one, so the tick is never
    /// queued or retried.
    pub fn isr_tick(&mut self, inputs: &TickInputs, cmd: &Command) {
        self.counter = self.counter.wrapping_add(1);
        if self.busy {
            return;
        }
        self.busy = true;

        match self.phase {
            LoopPhase::Calibrating => self.calibration_tick(inputs),
            LoopPhase::Running => self.control_tick(inputs, cmd),
        }

        if self.counter % self.cfg.battery_divider == 0 {
            self.battery.tick(inputs.raw.battery);
        }

        self.busy = false;
    }

    /// Re-enter offset calibration, zeroing the accumulators and the tick
    /// counter and snapshotting the given hall state as the motion baseline.
    pub fn begin_calibration(&mut self, hall_left: HallState, hall_right: HallState) {
        let sectors = [self.left.decode(hall_left), self.right.decode(hall_right)];
        self.restart_calibration(sectors);
        self.phase = LoopPhase::Calibrating;
        info!("offset calibration started");
    }

    fn restart_calibration(&mut self, sectors: [u8; 2]) {
        self.accumulator.reset();
        self.counter = 0;
        self.left.tracker.baseline(sectors[0]);
        self.right.tracker.baseline(sectors[1]);
    }

    /// Calibration-phase tick: accumulate raw samples, restart on motion.
    fn calibration_tick(&mut self, inputs: &TickInputs) {
        let sec_left = self.left.decode(inputs.hall_left);
        let sec_right = self.right.decode(inputs.hall_right);

        // A sector change means the motor moved; averaging against a moving
        // baseline would bake a wrong DC bias into every current reading, so
        // start over. Not an error, just a longer calibration.
        if sec_left != self.left.tracker.current() || sec_right != self.right.tracker.current() {
            debug!("motion during calibration, restarting");
            self.restart_calibration([sec_left, sec_right]);
            return;
        }

        let target = self.cfg.calibration_samples as u64;
        if self.counter < target {
            self.accumulator.add(&inputs.raw);
        } else if self.counter == target {
            self.accumulator.add(&inputs.raw);
            self.offsets = self.accumulator.finalize(self.cfg.calibration_samples);
            self.phase = LoopPhase::Running;
            info!(
                "offset calibration done after {} samples",
                self.cfg.calibration_samples
            );
        }
    }

    /// Run-phase tick: gate, currents, control steps, duty outputs.
    fn control_tick(&mut self, inputs: &TickInputs, cmd: &Command) {
        // Shared by both motors this tick: a fault on either stops both.
        self.enable_fin =
            cmd.enable && self.left.last_out.err_code == 0 && self.right.last_out.err_code == 0;

        let raw = &inputs.raw;
        let left_currents = PhaseCurrents {
            pha_ab: CurrentOffsets::corrected(self.offsets.left_pha_a, raw.left_pha_a),
            pha_bc: CurrentOffsets::corrected(self.offsets.left_pha_b, raw.left_pha_b),
            dc_link: CurrentOffsets::corrected(self.offsets.left_dc, raw.left_dc),
        };
        self.left.tick(
            self.cfg.pwm_period,
            &self.gate,
            left_currents,
            inputs.hall_left,
            cmd.target_left,
            self.enable_fin,
            cmd.enable,
        );

        let right_currents = PhaseCurrents {
            pha_ab: CurrentOffsets::corrected(self.offsets.right_pha_b, raw.right_pha_b),
            pha_bc: CurrentOffsets::corrected(self.offsets.right_pha_c, raw.right_pha_c),
            dc_link: CurrentOffsets::corrected(self.offsets.right_dc, raw.right_dc),
        };
        self.right.tick(
            self.cfg.pwm_period,
            &self.gate,
            right_currents,
            inputs.hall_right,
            cmd.target_right,
            self.enable_fin,
            cmd.enable,
        );
    }

    /// Latched actuator outputs, [left, right].
    pub fn outputs(&self) -> [MotorOutputs; 2] {
        [self.left.output, self.right.output]
    }

    /// Telemetry step counters, [left, right].
    pub fn steps(&self) -> [u16; 2] {
        [self.left.tracker.steps(), self.right.tracker.steps()]
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Monotonic tick count.
    pub fn tick_count(&self) -> u64 {
        self.counter
    }

    /// Calibrated offsets (zeros until calibration completes).
    pub fn offsets(&self) -> CurrentOffsets {
        self.offsets
    }

    /// Filtered battery voltage in ADC counts.
    pub fn battery_counts(&self) -> i16 {
        self.battery.voltage_counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::inputs::RawSamples;

    /// Deterministic stand-in for the opaque control step.
    struct StubStep {
        out: ControlOutput,
        seen: Option<ControlInput>,
        calls: u32,
    }

    impl StubStep {
        fn returning(out: ControlOutput) -> Self {
            Self {
                out,
                seen: None,
                calls: 0,
            }
        }

        fn healthy(duty_a: i16, duty_b: i16, duty_c: i16) -> Self {
            Self::returning(ControlOutput {
                duty_a,
                duty_b,
                duty_c,
                err_code: 0,
            })
        }
    }

    impl ControlStep for StubStep {
        fn step(&mut self, input: &ControlInput) -> ControlOutput {
            self.seen = Some(*input);
            self.calls += 1;
            self.out
        }
    }

    // Halls for sector 0 in the forward table; decodes to 0 in the reverse
    // table as well.
    const HALL_SECTOR_0: HallState = HallState::new(true, false, false);
    // Forward sector 1 / reverse sector 5.
    const HALL_MOVED: HallState = HallState::new(true, false, true);

    fn small_cfg() -> LoopConfig {
        LoopConfig {
            calibration_samples: 8,
            ..LoopConfig::default()
        }
    }

    fn tick_inputs(raw_value: u16) -> TickInputs {
        TickInputs {
            raw: RawSamples {
                left_pha_a: raw_value,
                left_pha_b: raw_value,
                right_pha_b: raw_value,
                right_pha_c: raw_value,
                left_dc: raw_value,
                right_dc: raw_value,
                battery: 0,
            },
            hall_left: HALL_SECTOR_0,
            hall_right: HALL_SECTOR_0,
        }
    }

    fn enabled_cmd(target: i16) -> Command {
        Command {
            enable: true,
            target_left: target,
            target_right: target,
        }
    }

    /// Loop with calibration already behind it and zero offsets.
    fn running_loop(
        left: Option<StubStep>,
        right: Option<StubStep>,
    ) -> DriveLoop<StubStep, StubStep> {
        let mut drive = DriveLoop::new(small_cfg(), left, right);
        drive.phase = LoopPhase::Running;
        drive.left.tracker.baseline(0);
        drive.right.tracker.baseline(0);
        drive
    }

    #[test]
    fn calibration_averages_constant_input_exactly() {
        let mut drive = DriveLoop::<StubStep, StubStep>::new(small_cfg(), None, None);
        let inputs = tick_inputs(1850);
        // First tick re-baselines (tracker starts invalid), then 8 samples.
        for _ in 0..9 {
            drive.isr_tick(&inputs, &Command::SAFE);
        }
        assert_eq!(drive.phase(), LoopPhase::Running);
        assert_eq!(drive.offsets().left_pha_a, 1850);
        assert_eq!(drive.offsets().right_dc, 1850);
    }

    #[test]
    fn motion_mid_calibration_restarts_from_zero() {
        let mut drive = DriveLoop::<StubStep, StubStep>::new(small_cfg(), None, None);
        drive.begin_calibration(HALL_SECTOR_0, HALL_SECTOR_0);
        // Half the samples with one value...
        for _ in 0..4 {
            drive.isr_tick(&tick_inputs(500), &Command::SAFE);
        }
        // ...then the rotor moves. The contaminated run is discarded.
        let mut moved = tick_inputs(900);
        moved.hall_left = HALL_MOVED;
        moved.hall_right = HALL_MOVED;
        drive.isr_tick(&moved, &Command::SAFE);
        assert_eq!(drive.tick_count(), 0);
        assert_eq!(drive.phase(), LoopPhase::Calibrating);

        // A full run of post-restart samples finishes with their average.
        for _ in 0..8 {
            drive.isr_tick(&moved, &Command::SAFE);
        }
        assert_eq!(drive.phase(), LoopPhase::Running);
        assert_eq!(drive.offsets().left_dc, 900);
    }

    #[test]
    fn control_step_receives_gate_target_and_currents() {
        let mut drive = running_loop(
            Some(StubStep::healthy(500, -500, 0)),
            Some(StubStep::healthy(0, 0, 0)),
        );
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(500));

        let seen = drive.left.step.as_ref().unwrap().seen.unwrap();
        assert!(seen.enable);
        assert_eq!(seen.target, 500);
        assert_eq!(seen.hall, HALL_SECTOR_0);
        assert_eq!(seen.cur_pha_ab, 0);
        assert_eq!(seen.cur_dc_link, 0);

        // In-range duties pass through the clamp unchanged after centering.
        assert_eq!(drive.outputs()[0].compare, [1500, 500, 1000]);
        assert!(drive.outputs()[0].output_enable);
    }

    #[test]
    fn fault_on_one_motor_disables_both_next_tick() {
        let mut left = StubStep::healthy(0, 0, 0);
        left.out.err_code = 3;
        let mut drive = running_loop(Some(left), Some(StubStep::healthy(0, 0, 0)));

        // First tick: previous outputs were healthy, so both steps still see
        // enable=true while the left step reports its fault.
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(100));
        assert!(drive.right.step.as_ref().unwrap().seen.unwrap().enable);

        // Next tick: the stored fault gates BOTH motors despite admin enable.
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(100));
        assert!(!drive.left.step.as_ref().unwrap().seen.unwrap().enable);
        assert!(!drive.right.step.as_ref().unwrap().seen.unwrap().enable);
    }

    #[test]
    fn overcurrent_disables_only_that_motor_output() {
        let mut drive = running_loop(
            Some(StubStep::healthy(0, 0, 0)),
            Some(StubStep::healthy(0, 0, 0)),
        );
        // Zero offsets: corrected = 0 - raw, so 900 counts is well over the
        // 850-count ceiling on the left DC link only.
        let mut inputs = tick_inputs(0);
        inputs.raw.left_dc = 900;
        drive.isr_tick(&inputs, &enabled_cmd(0));
        assert!(!drive.outputs()[0].output_enable);
        assert!(drive.outputs()[1].output_enable);

        // Non-latching: back under the ceiling, output returns by itself.
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(0));
        assert!(drive.outputs()[0].output_enable);
    }

    #[test]
    fn admin_disable_cuts_output_generation() {
        let mut drive = running_loop(
            Some(StubStep::healthy(0, 0, 0)),
            Some(StubStep::healthy(0, 0, 0)),
        );
        drive.isr_tick(&tick_inputs(0), &Command::SAFE);
        assert!(!drive.outputs()[0].output_enable);
        assert!(!drive.outputs()[1].output_enable);
    }

    #[test]
    fn overrun_tick_only_advances_the_counter() {
        let mut drive = running_loop(
            Some(StubStep::healthy(200, 0, 0)),
            Some(StubStep::healthy(0, 0, 0)),
        );
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(300));
        let outputs = drive.outputs();
        let steps = drive.steps();
        let calls = drive.left.step.as_ref().unwrap().calls;
        let count = drive.tick_count();

        // Synthetic overrun: the guard is still held, so the second
        // invocation must not touch anything but the counter.
        drive.busy = true;
        let mut hostile = tick_inputs(4000);
        hostile.hall_left = HALL_MOVED;
        drive.isr_tick(&hostile, &Command::SAFE);

        assert_eq!(drive.tick_count(), count + 1);
        assert_eq!(drive.outputs(), outputs);
        assert_eq!(drive.steps(), steps);
        assert_eq!(drive.left.step.as_ref().unwrap().calls, calls);
    }

    #[test]
    fn absent_channel_keeps_previous_output() {
        let mut drive = running_loop(Some(StubStep::healthy(300, 0, 0)), None);
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(100));
        // Right channel has no step built in: its output record stays at the
        // idle value, centered into the period. Defined behavior, no fault.
        assert_eq!(drive.outputs()[1].compare, [1000, 1000, 1000]);
        assert_eq!(drive.steps()[1], 0);
        assert!(drive.outputs()[1].output_enable);
    }

    #[test]
    fn step_counters_follow_rotation_only_in_run_phase() {
        let mut drive = running_loop(
            Some(StubStep::healthy(0, 0, 0)),
            Some(StubStep::healthy(0, 0, 0)),
        );
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(0));
        assert_eq!(drive.steps(), [0, 0]);

        let mut moved = tick_inputs(0);
        moved.hall_left = HALL_MOVED;
        moved.hall_right = HALL_MOVED;
        drive.isr_tick(&moved, &enabled_cmd(0));
        // Forward table decodes the moved state to sector 1, reverse to 5;
        // both are genuine transitions away from sector 0.
        assert_eq!(drive.steps(), [1, 1]);
    }

    #[test]
    fn battery_filter_runs_at_subrate() {
        let mut cfg = small_cfg();
        cfg.battery_divider = 4;
        cfg.battery_initial = 0;
        let mut drive = DriveLoop::<StubStep, StubStep>::new(cfg, None, None);
        drive.phase = LoopPhase::Running;
        drive.left.tracker.baseline(0);
        drive.right.tracker.baseline(0);

        let mut inputs = tick_inputs(0);
        inputs.raw.battery = 3000;
        for _ in 0..3 {
            drive.isr_tick(&inputs, &Command::SAFE);
        }
        assert_eq!(drive.battery_counts(), 0);
        drive.isr_tick(&inputs, &Command::SAFE);
        assert!(drive.battery_counts() > 0);
    }

    #[test]
    fn external_restart_reenters_calibration() {
        let mut drive = running_loop(
            Some(StubStep::healthy(0, 0, 0)),
            Some(StubStep::healthy(0, 0, 0)),
        );
        drive.isr_tick(&tick_inputs(0), &enabled_cmd(0));
        drive.begin_calibration(HALL_SECTOR_0, HALL_SECTOR_0);
        assert_eq!(drive.phase(), LoopPhase::Calibrating);
        assert_eq!(drive.tick_count(), 0);
    }
}
