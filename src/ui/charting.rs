use steer::time_series::ChartSnapshot;

/// Smallest vertical span shown, so a flat signal does not fill the chart
const MIN_HALF_SPAN: f64 = 1.0;

/// Symmetric Y bounds covering every sample in the snapshot
pub fn compute_y_bounds(snapshot: &ChartSnapshot) -> [f64; 2] {
    let peak = snapshot
        .target
        .iter()
        .chain(snapshot.output.iter())
        .flatten()
        .filter(|v| v.is_finite())
        .fold(MIN_HALF_SPAN, |acc, v| acc.max(v.abs()));
    let half = (peak * 10.0).ceil() / 10.0;
    [-half, half]
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn snapshot(target: Vec<Option<f64>>, output: Vec<Option<f64>>) -> ChartSnapshot {
        ChartSnapshot {
            time_axis: Arc::from(vec![0.0; target.len()]),
            target,
            output,
        }
    }

    #[test]
    fn test_bounds_empty_snapshot() {
        assert_eq!(compute_y_bounds(&snapshot(vec![None; 3], vec![None; 3])), [-1.0, 1.0]);
    }

    #[test]
    fn test_bounds_cover_overshoot() {
        let s = snapshot(vec![Some(0.5), Some(1.0)], vec![Some(-1.23), Some(0.2)]);
        assert_eq!(compute_y_bounds(&s), [-1.3, 1.3]);
    }

    #[test]
    fn test_bounds_skip_non_finite() {
        let s = snapshot(vec![Some(f64::INFINITY)], vec![Some(0.1)]);
        assert_eq!(compute_y_bounds(&s), [-1.0, 1.0]);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(-10.0), "-10");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
