//! Session state machine.
//!
//! A [`Game`] owns every piece of mutable simulation state and the timers
//! that drive it. Timers are acquired and released only in
//! [`Game::transition`], so every path out of `Running` (stop, timeout,
//! reset) drops the loop timer before anything else happens, and a timer
//! event that was already queued is recognised by its id and ignored.

use crate::mode_policy::{self, ControlLoop, TickSample};
use crate::pid::{Pid, PidGains};
use crate::plant::Plant;
use crate::runtime::{Scheduler, TimerGuard, TimerId};
use crate::session::{
    Mode, RunState, SessionConfig, Settings, COUNTDOWN_PERIOD, USER_INPUT_MAX, USER_INPUT_MIN,
};
use crate::signal::TargetFunction;
use crate::time_series::{ChartSnapshot, RollingBuffer};

/// Elapsed simulation time kept as a tick count so `t = ticks * dt` is exact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    ticks: u64,
    dt: f64,
}

impl SimulationClock {
    pub fn new(dt: f64) -> Self {
        Self { ticks: 0, dt }
    }

    pub fn t(&self) -> f64 {
        self.ticks as f64 * self.dt
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn advance(&mut self) {
        self.ticks += 1;
    }

    fn reset(&mut self) {
        self.ticks = 0;
    }
}

/// Result of a run that reached the timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: Mode,
    pub ticks: u64,
    pub scored_ticks: u64,
    pub score: u32,
}

impl RunSummary {
    /// Share of scored ticks that were hits, in percent
    pub fn hit_rate(&self) -> f64 {
        if self.scored_ticks == 0 {
            0.0
        } else {
            self.score as f64 / self.scored_ticks as f64 * 100.0
        }
    }
}

/// Enabled state and labels for the control surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub button_label: String,
    pub start_enabled: bool,
    pub mode_selectable: bool,
    pub target_function_selectable: bool,
    pub user_input_enabled: bool,
}

#[derive(Debug)]
pub struct Game<S: Scheduler> {
    settings: Settings,
    config: SessionConfig,
    scheduler: S,
    run_state: RunState,
    clock: SimulationClock,
    control: ControlLoop,
    buffer: RollingBuffer,
    score: u32,
    scored_ticks: u64,
    user_input: i32,
    last_sample: Option<TickSample>,
    summary: Option<RunSummary>,
    loop_timer: Option<TimerGuard>,
    countdown_timer: Option<TimerGuard>,
}

impl<S: Scheduler> Game<S> {
    pub fn new(settings: Settings, config: SessionConfig, scheduler: S) -> Self {
        let dt = settings.dt;
        Self {
            clock: SimulationClock::new(dt),
            control: ControlLoop {
                plant: Plant::new(settings.plant, dt),
                pid: Pid::new(PidGains::default(), dt),
            },
            buffer: RollingBuffer::new(settings.capacity, settings.display_seconds),
            settings,
            config,
            scheduler,
            run_state: RunState::Idle,
            score: 0,
            scored_ticks: 0,
            user_input: 0,
            last_sample: None,
            summary: None,
            loop_timer: None,
            countdown_timer: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.run_state == RunState::Finished
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn user_input(&self) -> i32 {
        self.user_input
    }

    pub fn clock(&self) -> SimulationClock {
        self.clock
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.t()
    }

    pub fn plant_output(&self) -> f64 {
        self.control.plant.output()
    }

    pub fn last_sample(&self) -> Option<TickSample> {
        self.last_sample
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.summary
    }

    pub fn loop_timer(&self) -> Option<TimerId> {
        self.loop_timer.as_ref().map(TimerGuard::id)
    }

    pub fn countdown_timer(&self) -> Option<TimerId> {
        self.countdown_timer.as_ref().map(TimerGuard::id)
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        self.buffer.snapshot()
    }

    pub fn controls(&self) -> Controls {
        let settled = self.run_state.is_settled();
        let button_label = match self.run_state {
            RunState::Idle | RunState::Finished => "START".to_string(),
            RunState::CountingDown(n) => n.to_string(),
            RunState::Running => "STOP".to_string(),
        };
        Controls {
            button_label,
            start_enabled: !self.is_finished(),
            mode_selectable: settled,
            target_function_selectable: settled && self.config.mode.uses_target_function(),
            user_input_enabled: self.config.mode.uses_user_input(),
        }
    }

    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if !self.run_state.is_settled() {
            log::debug!("mode change to {mode} rejected while {:?}", self.run_state);
            return false;
        }
        self.config.mode = mode;
        true
    }

    pub fn set_target_function(&mut self, function: TargetFunction) -> bool {
        if !self.controls().target_function_selectable {
            log::debug!("target function change rejected in {}", self.config.mode);
            return false;
        }
        self.config.target_function = function;
        true
    }

    /// Set the slider, clamped to its bounds
    pub fn set_user_input(&mut self, value: i32) -> bool {
        if !self.config.mode.uses_user_input() {
            return false;
        }
        self.user_input = value.clamp(USER_INPUT_MIN, USER_INPUT_MAX);
        true
    }

    pub fn adjust_user_input(&mut self, delta: i32) -> bool {
        self.set_user_input(self.user_input.saturating_add(delta))
    }

    /// The single start/stop button
    pub fn start_stop(&mut self) {
        match self.run_state {
            RunState::Idle => {
                let countdown = self.settings.countdown_seconds;
                if self.config.mode.starts_immediately() || countdown == 0 {
                    self.transition(RunState::Running);
                } else {
                    self.transition(RunState::CountingDown(countdown));
                }
            }
            RunState::CountingDown(_) => {
                log::info!("countdown cancelled");
                self.transition(RunState::Idle);
            }
            RunState::Running => {
                log::info!("run aborted at t={:.2}s, score {}", self.elapsed(), self.score);
                self.transition(RunState::Idle);
            }
            RunState::Finished => {
                log::debug!("start ignored until reset");
            }
        }
    }

    /// Dispatch a fired timer. Returns false for timers this game no longer owns.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.loop_timer() == Some(id) {
            self.tick();
            true
        } else if self.countdown_timer() == Some(id) {
            self.countdown_step();
            true
        } else {
            log::trace!("ignoring stale timer {id:?}");
            false
        }
    }

    /// Stop any run and return every piece of state to its initial value
    pub fn reset(&mut self) {
        // timers go first so nothing already queued can touch the zeroed state
        self.loop_timer = None;
        self.countdown_timer = None;
        self.run_state = RunState::Idle;

        self.score = 0;
        self.scored_ticks = 0;
        self.user_input = 0;
        self.clock.reset();
        self.control.reset();
        self.buffer.reset();
        self.last_sample = None;
        self.summary = None;
        log::info!("session reset");
    }

    /// Advance the loop by one step. Only has an effect while running.
    pub fn tick(&mut self) -> Option<TickSample> {
        if self.run_state != RunState::Running {
            return None;
        }

        let sample =
            mode_policy::apply_step(&mut self.control, &self.config, self.clock.t(), self.user_input);

        if mode_policy::scores(self.config.mode) {
            self.scored_ticks += 1;
            if mode_policy::is_hit(self.config.mode, &sample, self.settings.margin) {
                self.score += 1;
            }
        }

        self.buffer.append(sample.target, sample.output);
        self.clock.advance();
        self.last_sample = Some(sample);

        if self.clock.ticks() >= self.settings.timeout_ticks {
            self.finish();
        }
        Some(sample)
    }

    fn countdown_step(&mut self) {
        if let RunState::CountingDown(n) = self.run_state {
            if n <= 1 {
                self.transition(RunState::Running);
            } else {
                self.transition(RunState::CountingDown(n - 1));
            }
        }
    }

    fn finish(&mut self) {
        let summary = RunSummary {
            mode: self.config.mode,
            ticks: self.clock.ticks(),
            scored_ticks: self.scored_ticks,
            score: self.score,
        };
        log::info!(
            "run finished in {} after {} ticks: score {} ({:.1}% hits)",
            summary.mode,
            summary.ticks,
            summary.score,
            summary.hit_rate()
        );
        self.summary = Some(summary);
        self.transition(RunState::Finished);
    }

    /// Move to `next`, releasing timers of the state being left and
    /// acquiring the one `next` needs
    fn transition(&mut self, next: RunState) {
        if !matches!(next, RunState::CountingDown(_)) {
            self.countdown_timer = None;
        }
        if next != RunState::Running {
            self.loop_timer = None;
        }

        match next {
            RunState::CountingDown(_) if self.countdown_timer.is_none() => {
                self.countdown_timer = Some(self.scheduler.schedule(COUNTDOWN_PERIOD));
            }
            RunState::Running if self.loop_timer.is_none() => {
                self.loop_timer = Some(self.scheduler.schedule(self.settings.loop_period));
            }
            _ => {}
        }

        if self.run_state != next {
            log::info!("{:?} -> {:?} ({})", self.run_state, next, self.config.mode);
        }
        self.run_state = next;
    }
}
