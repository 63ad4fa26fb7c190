use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::plant::PlantOrder;
use crate::signal::TargetFunction;

/// Countdown timer period
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Slider bounds, in percent of unit input
pub const USER_INPUT_MIN: i32 = -150;
pub const USER_INPUT_MAX: i32 = 150;

/// How target, control input and scoring are wired for one run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
    strum_macros::Display,
)]
pub enum Mode {
    /// slider drives the plant directly and is also the target
    #[serde(rename = "openL")]
    #[value(name = "openL")]
    #[strum(serialize = "openL")]
    OpenLoop,
    /// track the generated target by hand
    #[serde(rename = "humanil")]
    #[value(name = "humanil")]
    #[strum(serialize = "humanil")]
    HumanInLoop,
    /// slider sets the target, PID drives the plant
    #[serde(rename = "closedL")]
    #[value(name = "closedL")]
    #[strum(serialize = "closedL")]
    ClosedLoop,
    /// PID tracks the generated target, no countdown
    #[default]
    #[serde(rename = "closedL-auto")]
    #[value(name = "closedL-auto")]
    #[strum(serialize = "closedL-auto")]
    ClosedLoopAuto,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::OpenLoop,
        Mode::HumanInLoop,
        Mode::ClosedLoop,
        Mode::ClosedLoopAuto,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether Start skips the countdown
    pub fn starts_immediately(self) -> bool {
        matches!(self, Mode::ClosedLoopAuto)
    }

    /// Whether the target comes from the signal generator
    pub fn uses_target_function(self) -> bool {
        matches!(self, Mode::HumanInLoop | Mode::ClosedLoopAuto)
    }

    /// Whether the slider is read at all
    pub fn uses_user_input(self) -> bool {
        !matches!(self, Mode::ClosedLoopAuto)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub mode: Mode,
    pub target_function: TargetFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    /// seconds left before the run starts
    CountingDown(u32),
    Running,
    /// timed out; Start stays disabled until reset
    Finished,
}

impl RunState {
    /// Configuration may only change in these states
    pub fn is_settled(self) -> bool {
        matches!(self, RunState::Idle | RunState::Finished)
    }
}

/// Validated timing and scoring parameters, fixed for the lifetime of a game
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub loop_period: Duration,
    /// integration step in seconds, equal to `loop_period`
    pub dt: f64,
    pub display_seconds: f64,
    /// rolling buffer length
    pub capacity: usize,
    pub timeout_ticks: u64,
    pub countdown_seconds: u32,
    pub margin: f64,
    pub plant: PlantOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            loop_period: Duration::from_millis(50),
            dt: 0.05,
            display_seconds: 10.0,
            capacity: 200,
            timeout_ticks: 300,
            countdown_seconds: 3,
            margin: 0.15,
            plant: PlantOrder::Pt2,
        }
    }
}

impl Settings {
    pub fn timeout_seconds(&self) -> f64 {
        self.timeout_ticks as f64 * self.dt
    }
}
