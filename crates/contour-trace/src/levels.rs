//! Level list helpers.

/// Generate evenly spaced iso-values covering `[min_value, max_value]`.
///
/// Levels start at the first multiple of `interval` at or above
/// `min_value` and step by `interval` up to `max_value` inclusive. The
/// step is computed by index so a regenerated list is bit-identical to
/// the original, which matters when comparing against cached results.
///
/// # Arguments
/// * `min_value` - Lower bound of the value range
/// * `max_value` - Upper bound of the value range
/// * `interval` - Spacing between consecutive levels
pub fn level_steps(min_value: f64, max_value: f64, interval: f64) -> Vec<f64> {
    if !interval.is_finite() || interval <= 0.0 || max_value < min_value {
        return vec![];
    }

    // Start from first multiple of interval at or above min_value.
    let start = (min_value / interval).ceil() * interval;
    let mut levels = Vec::new();

    let mut step = 0u64;
    loop {
        let level = start + step as f64 * interval;
        if level > max_value {
            break;
        }
        levels.push(level);
        step += 1;
    }

    levels
}
