//! Pace conversion between stored milliseconds and displayed seconds.

use crate::error::ValidationError;

/// Convert a pace edited in seconds to whole milliseconds.
///
/// Rounds to the nearest millisecond. Rejects non-finite values and anything
/// that rounds below one millisecond.
pub fn seconds_to_millis(seconds: f64) -> Result<u64, ValidationError> {
    if !seconds.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: "pace",
            message: format!("{seconds} is not a number of seconds"),
        });
    }
    let millis = (seconds * 1000.0).round();
    if millis < 1.0 {
        return Err(ValidationError::NonPositive { field: "pace" });
    }
    Ok(millis as u64)
}

pub fn millis_to_seconds(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

/// One decimal, e.g. `"0.5"` or `"1.0"`.
pub fn format_pace(millis: u64) -> String {
    format!("{:.1}", millis_to_seconds(millis))
}
