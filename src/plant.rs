//! Fixed-step linear plant models.
//!
//! Both orders are integrated with forward Euler at the loop period `dt`.
//! The second-order model updates `y1` first and then feeds the new `y1`
//! into the `y2` update.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Static gain
pub const GAIN: f64 = 1.0;
/// PT1 time constant (s)
pub const TIME_CONSTANT: f64 = 1.0;
/// PT2 damping ratio
pub const DAMPING: f64 = 0.5;
/// PT2 natural frequency (rad/s)
pub const NATURAL_FREQUENCY: f64 = 2.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum PlantOrder {
    #[strum(serialize = "PT1")]
    Pt1,
    #[default]
    #[strum(serialize = "PT2")]
    Pt2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlantState {
    /// Output
    pub y1: f64,
    /// Derivative of the output, PT2 only
    pub y2: f64,
}

#[derive(Debug, Clone)]
pub struct Plant {
    order: PlantOrder,
    dt: f64,
    state: PlantState,
}

impl Plant {
    pub fn new(order: PlantOrder, dt: f64) -> Self {
        Self {
            order,
            dt,
            state: PlantState::default(),
        }
    }

    pub fn order(&self) -> PlantOrder {
        self.order
    }

    pub fn state(&self) -> PlantState {
        self.state
    }

    pub fn output(&self) -> f64 {
        self.state.y1
    }

    /// Advance one `dt` with control input `u` and return the new output
    pub fn step(&mut self, u: f64) -> f64 {
        let dt = self.dt;
        let s = &mut self.state;
        match self.order {
            PlantOrder::Pt1 => {
                s.y1 += (dt / TIME_CONSTANT) * (GAIN * u - s.y1);
            }
            PlantOrder::Pt2 => {
                let wn = NATURAL_FREQUENCY;
                s.y1 += dt * s.y2;
                s.y2 += dt * (wn * wn * (GAIN * u - s.y1) - 2.0 * DAMPING * wn * s.y2);
            }
        }
        s.y1
    }

    pub fn reset(&mut self) {
        self.state = PlantState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.05;

    #[test]
    fn test_pt1_first_step() {
        let mut plant = Plant::new(PlantOrder::Pt1, DT);
        assert_abs_diff_eq!(plant.step(1.0), 0.05, epsilon = 1e-15);
        assert_abs_diff_eq!(plant.step(1.0), 0.05 + 0.05 * 0.95, epsilon = 1e-15);
    }

    #[test]
    fn test_pt2_first_steps() {
        let mut plant = Plant::new(PlantOrder::Pt2, DT);
        // y1 lags one step behind y2
        assert_eq!(plant.step(1.0), 0.0);
        assert_abs_diff_eq!(plant.state().y2, 0.2, epsilon = 1e-15);
        assert_abs_diff_eq!(plant.step(1.0), 0.01, epsilon = 1e-15);
        // y2 += 0.05 * (4 * (1 - 0.01) - 2 * 0.2)
        assert_abs_diff_eq!(plant.state().y2, 0.2 + 0.05 * (3.96 - 0.4), epsilon = 1e-12);
    }

    #[test]
    fn test_step_is_deterministic() {
        for order in [PlantOrder::Pt1, PlantOrder::Pt2] {
            let mut a = Plant::new(order, DT);
            let mut b = Plant::new(order, DT);
            for i in 0..200 {
                let u = ((i as f64) * 0.1).sin();
                assert_eq!(a.step(u), b.step(u));
                assert_eq!(a.state(), b.state());
            }
        }
    }

    #[test]
    fn test_step_response_settles_at_gain() {
        for order in [PlantOrder::Pt1, PlantOrder::Pt2] {
            let mut plant = Plant::new(order, DT);
            for _ in 0..1000 {
                plant.step(0.7);
            }
            assert_abs_diff_eq!(plant.output(), 0.7 * GAIN, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_pt1_never_overshoots() {
        let mut plant = Plant::new(PlantOrder::Pt1, DT);
        for _ in 0..500 {
            assert!(plant.step(1.0) <= 1.0);
        }
    }

    #[test]
    fn test_pt2_underdamped_overshoots() {
        let mut plant = Plant::new(PlantOrder::Pt2, DT);
        let peak = (0..200).map(|_| plant.step(1.0)).fold(f64::MIN, f64::max);
        assert!(peak > 1.0, "peak {peak}");
    }

    #[test]
    fn test_reset_zeroes_state() {
        let mut plant = Plant::new(PlantOrder::Pt2, DT);
        plant.step(1.0);
        plant.step(1.0);
        plant.reset();
        assert_eq!(plant.state(), PlantState::default());
        assert_eq!(plant.order(), PlantOrder::Pt2);
    }

    #[test]
    fn test_order_display() {
        assert_eq!(PlantOrder::Pt1.to_string(), "PT1");
        assert_eq!(PlantOrder::Pt2.to_string(), "PT2");
    }
}
