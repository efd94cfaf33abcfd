use chrono::{DateTime, Duration, Utc};

const MINUTE_MS: i64 = 60 * 1_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Returns the current wall-clock instant in UTC.
pub fn current_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Returns `age` clamped so that negative (clock-skewed) values become zero.
pub fn clamp_non_negative(age: Duration) -> Duration {
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}

/// Formats an age with minute granularity, e.g. `1m ago`, `2h ago`, `3d ago`.
///
/// Anything up to one minute (including negative ages) reads as `1m ago`.
/// The unit is chosen from the rounded count, so 59m40s reads as `1h ago`.
pub fn format_relative_age(age: Duration) -> String {
    let age_ms = clamp_non_negative(age).num_milliseconds();
    if age_ms <= MINUTE_MS {
        return "1m ago".to_string();
    }
    let minutes = rounded_units(age_ms, MINUTE_MS);
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = rounded_units(age_ms, HOUR_MS);
    if hours < 48 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", rounded_units(age_ms, DAY_MS))
}

fn rounded_units(value_ms: i64, unit_ms: i64) -> i64 {
    (value_ms as f64 / unit_ms as f64).round() as i64
}

/// Formats `value` with a fixed number of decimals, rounding half away from zero.
pub fn format_fixed(value: f64, decimals: u32) -> String {
    let precision = decimals as usize;
    if !value.is_finite() {
        return value.to_string();
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid rendering "-0.00" for values that round to zero.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.precision$}")
}
