//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let floored = value.floor();
    if floored >= max {
        return i64::MAX;
    }
    if floored <= min {
        return i64::MIN;
    }
    cast::<f64, i64>(floored).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert a collection length to f64 for averaging.
#[must_use]
pub fn len_to_f64(len: usize) -> f64 {
    cast::<usize, f64>(len).unwrap_or(0.0)
}

/// Round to a fixed number of decimal places.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

/// `value / divisor` capped into `[0, 1]`.
#[must_use]
pub fn capped_ratio(value: f64, divisor: f64) -> f64 {
    if divisor <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / divisor).clamp(0.0, 1.0)
}

/// Arithmetic mean, `0.0` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / len_to_f64(values.len())
}
