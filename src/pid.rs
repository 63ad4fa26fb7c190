//! Discrete PID controller.
//!
//! The integral is a plain running sum with no clamping; under sustained
//! saturation it winds up. That is the intended teaching behaviour.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 3.28,
            ki: 3.38,
            kd: 1.48,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    pub integral: f64,
    pub last_error: f64,
}

#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    dt: f64,
    state: ControllerState,
}

impl Pid {
    /// `dt` must be the same step the plant is advanced with
    pub fn new(gains: PidGains, dt: f64) -> Self {
        Self {
            gains,
            dt,
            state: ControllerState::default(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn compute(&mut self, target: f64, measured: f64) -> f64 {
        let error = target - measured;
        self.state.integral += error * self.dt;
        let derivative = (error - self.state.last_error) / self.dt;
        self.state.last_error = error;

        self.gains.kp * error + self.gains.ki * self.state.integral + self.gains.kd * derivative
    }

    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::{Plant, PlantOrder};
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.05;

    #[test]
    fn test_first_call() {
        let mut pid = Pid::new(PidGains::default(), DT);
        let u = pid.compute(1.0, 0.0);
        // 3.28 * 1 + 3.38 * 0.05 + 1.48 * (1 / 0.05)
        assert_abs_diff_eq!(u, 3.28 + 0.169 + 29.6, epsilon = 1e-12);
        assert_abs_diff_eq!(pid.state().integral, 0.05, epsilon = 1e-15);
        assert_eq!(pid.state().last_error, 1.0);
    }

    #[test]
    fn test_constant_error_has_no_derivative_kick_after_first_call() {
        let gains = PidGains {
            kp: 0.0,
            ki: 0.0,
            kd: 1.0,
        };
        let mut pid = Pid::new(gains, DT);
        pid.compute(0.5, 0.0);
        assert_eq!(pid.compute(0.5, 0.0), 0.0);
    }

    #[test]
    fn test_integral_is_unbounded() {
        let mut pid = Pid::new(PidGains::default(), DT);
        for _ in 0..10_000 {
            pid.compute(1.0, 0.0);
        }
        assert_abs_diff_eq!(pid.state().integral, 500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_reset() {
        let mut pid = Pid::new(PidGains::default(), DT);
        pid.compute(1.0, 0.3);
        pid.reset();
        assert_eq!(pid.state(), ControllerState::default());
    }

    #[test]
    fn test_closed_loop_tracks_step_on_pt2() {
        let mut plant = Plant::new(PlantOrder::Pt2, DT);
        let mut pid = Pid::new(PidGains::default(), DT);
        for _ in 0..600 {
            let u = pid.compute(0.8, plant.output());
            plant.step(u);
        }
        assert_abs_diff_eq!(plant.output(), 0.8, epsilon = 1e-3);
    }

    #[test]
    fn test_closed_loop_on_pt1_diverges_at_default_gains() {
        // derivative gain over one 50 ms step exceeds what the Euler PT1 can absorb
        let mut plant = Plant::new(PlantOrder::Pt1, DT);
        let mut pid = Pid::new(PidGains::default(), DT);
        for _ in 0..200 {
            let u = pid.compute(0.8, plant.output());
            plant.step(u);
        }
        assert!(plant.output().abs() > 1e6);
    }
}
