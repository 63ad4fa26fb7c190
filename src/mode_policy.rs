use crate::pid::Pid;
use crate::plant::Plant;
use crate::session::{Mode, SessionConfig};
use crate::signal::target_value;

/// Loop state advanced once per tick
#[derive(Debug, Clone)]
pub struct ControlLoop {
    pub plant: Plant,
    pub pid: Pid,
}

impl ControlLoop {
    pub fn reset(&mut self) {
        self.plant.reset();
        self.pid.reset();
    }
}

/// What one tick produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSample {
    pub target: f64,
    /// control input applied to the plant
    pub input: f64,
    /// plant output after the step
    pub output: f64,
}

/// Slider position to unit input
pub fn scale_user_input(value: i32) -> f64 {
    value as f64 / 100.0
}

fn reference(config: &SessionConfig, t: f64, user: f64) -> f64 {
    if config.mode.uses_target_function() {
        target_value(t, config.target_function)
    } else {
        user
    }
}

/// Slider drives the plant directly
pub fn step_open_loop(
    lp: &mut ControlLoop,
    config: &SessionConfig,
    t: f64,
    user: f64,
) -> TickSample {
    let target = reference(config, t, user);
    let output = lp.plant.step(user);
    TickSample {
        target,
        input: user,
        output,
    }
}

/// PID closes the loop on the previous plant output
pub fn step_closed_loop(
    lp: &mut ControlLoop,
    config: &SessionConfig,
    t: f64,
    user: f64,
) -> TickSample {
    let target = reference(config, t, user);
    let input = lp.pid.compute(target, lp.plant.output());
    let output = lp.plant.step(input);
    TickSample {
        target,
        input,
        output,
    }
}

pub fn apply_step(
    lp: &mut ControlLoop,
    config: &SessionConfig,
    t: f64,
    user_input: i32,
) -> TickSample {
    let user = scale_user_input(user_input);
    match config.mode {
        Mode::OpenLoop | Mode::HumanInLoop => step_open_loop(lp, config, t, user),
        Mode::ClosedLoop | Mode::ClosedLoopAuto => step_closed_loop(lp, config, t, user),
    }
}

/// Whether a sample counts as a hit in the given mode
pub fn is_hit(mode: Mode, sample: &TickSample, margin: f64) -> bool {
    scores(mode) && (sample.target - sample.output).abs() < margin
}

pub fn scores(mode: Mode) -> bool {
    matches!(mode, Mode::HumanInLoop | Mode::ClosedLoopAuto)
}
