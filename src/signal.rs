use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Base frequency (Hz) of the periodic target waveforms
pub const BASE_FREQUENCY: f64 = 0.4;

/// Angular rate of the slow sine component
const SINE_RATE: f64 = 0.3;

/// Waveform used as the reference signal in the auto-target modes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TargetFunction {
    #[default]
    Sine,
    Triangle,
    Sawtooth,
    DoubleSine,
}

impl TargetFunction {
    pub const ALL: [TargetFunction; 4] = [
        TargetFunction::Sine,
        TargetFunction::Triangle,
        TargetFunction::Sawtooth,
        TargetFunction::DoubleSine,
    ];

    /// Numeric id as shown on the selector (0..=3)
    pub fn id(self) -> u8 {
        match self {
            TargetFunction::Sine => 0,
            TargetFunction::Triangle => 1,
            TargetFunction::Sawtooth => 2,
            TargetFunction::DoubleSine => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.id() as usize + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.id() as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Evaluate the waveform at simulation time `t` (seconds)
    pub fn value(self, t: f64) -> f64 {
        let f = BASE_FREQUENCY;
        match self {
            TargetFunction::Sine => (SINE_RATE * t).sin(),
            TargetFunction::Triangle => {
                let phase = ((t + 0.25 / f) * f / 2.0).rem_euclid(1.0);
                1.0 - 4.0 * (phase - 0.5).abs()
            }
            TargetFunction::Sawtooth => {
                let phase = ((t + 0.25 / f) * f).rem_euclid(1.0);
                2.0 * phase - 1.0
            }
            TargetFunction::DoubleSine => (SINE_RATE * t).sin() + 0.3 * (2.0 * t).sin(),
        }
    }
}

/// Reference value of `function` at simulation time `t`
pub fn target_value(t: f64, function: TargetFunction) -> f64 {
    function.value(t)
}
