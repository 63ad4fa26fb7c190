use std::collections::VecDeque;
use std::sync::Arc;

/// Immutable view of the rolling buffer handed to the presentation layer.
/// `None` marks a slot that has not received a sample since the last reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub time_axis: Arc<[f64]>,
    pub target: Vec<Option<f64>>,
    pub output: Vec<Option<f64>>,
}

impl ChartSnapshot {
    /// (time, value) pairs of the target series, skipping empty slots
    pub fn target_points(&self) -> Vec<(f64, f64)> {
        points(&self.time_axis, &self.target)
    }

    pub fn output_points(&self) -> Vec<(f64, f64)> {
        points(&self.time_axis, &self.output)
    }
}

fn points(axis: &[f64], series: &[Option<f64>]) -> Vec<(f64, f64)> {
    axis.iter()
        .zip(series)
        .filter_map(|(&t, v)| v.map(|v| (t, v)))
        .collect()
}

/// Fixed-capacity pair of (target, output) series, oldest first
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    capacity: usize,
    target: VecDeque<Option<f64>>,
    output: VecDeque<Option<f64>>,
    time_axis: Arc<[f64]>,
}

impl RollingBuffer {
    /// `capacity` slots spanning `display_seconds` back from now.
    /// Capacity must be at least 2 so the axis has two distinct ends.
    pub fn new(capacity: usize, display_seconds: f64) -> Self {
        let mut buffer = Self {
            capacity,
            target: VecDeque::with_capacity(capacity + 1),
            output: VecDeque::with_capacity(capacity + 1),
            time_axis: time_axis(capacity, display_seconds).into(),
        };
        buffer.reset();
        buffer
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn time_axis(&self) -> &[f64] {
        &self.time_axis
    }

    pub fn append(&mut self, target: f64, output: f64) {
        self.target.push_back(Some(target));
        self.output.push_back(Some(output));
        while self.target.len() > self.capacity {
            self.target.pop_front();
        }
        while self.output.len() > self.capacity {
            self.output.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.target.clear();
        self.output.clear();
        self.target.resize(self.capacity, None);
        self.output.resize(self.capacity, None);
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        ChartSnapshot {
            time_axis: Arc::clone(&self.time_axis),
            target: self.target.iter().copied().collect(),
            output: self.output.iter().copied().collect(),
        }
    }
}

/// Evenly spaced labels from `-display_seconds` to 0, last one pinned to 0
fn time_axis(capacity: usize, display_seconds: f64) -> Vec<f64> {
    if capacity == 0 {
        return Vec::new();
    }
    if capacity == 1 {
        return vec![0.0];
    }
    let step = display_seconds / (capacity - 1) as f64;
    let mut axis: Vec<f64> = (0..capacity)
        .map(|i| -display_seconds + i as f64 * step)
        .collect();
    if let Some(last) = axis.last_mut() {
        *last = 0.0;
    }
    axis
}
