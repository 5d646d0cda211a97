//! Duration parsing for the `since` filter.
//!
//! Accepts the duration grammar the configuration format uses: an optional
//! sign followed by one or more `<decimal><unit>` terms, e.g. `90s`, `1h30m`,
//! `1.5h`, `300ms`. Units are `ns`, `us` (`µs`, `μs`), `ms`, `s`, `m` and `h`.
//! A bare `0` needs no unit.

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

// Durations are bounded the same way a signed 64-bit nanosecond count is.
const MAX_NANOS: u128 = i64::MAX as u128;

/// Errors raised while parsing a duration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// The input is empty or has no number where one is expected.
    #[error("invalid duration '{0}'")]
    Invalid(String),

    /// A term has no unit.
    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),

    /// A term has a unit that is not recognised.
    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit {
        /// The unit as written.
        unit: String,
        /// The full input.
        input: String,
    },

    /// The value does not fit.
    #[error("duration '{0}' is out of range")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parses a duration string.
///
/// Negative durations are valid input but carry no meaning as a time window,
/// so they resolve to [`Duration::ZERO`].
///
/// # Errors
///
/// Returns an error for empty input, terms without a number or unit, unknown
/// units, and values beyond the representable range.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use regsync_core::duration::parse_duration;
///
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5_400));
/// assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1_500));
/// assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
/// assert!(parse_duration("not-a-duration").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_number) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, remainder) = after_number.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationError::Overflow(input.to_string());
        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        if !frac_part.is_empty() {
            // Digits beyond nanosecond precision of the largest unit add nothing.
            let digits = &frac_part[..frac_part.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| invalid())?;
            let denominator = 10u128.pow(u32::try_from(digits.len()).map_err(|_| invalid())?);
            let fraction = numerator * scale / denominator;
            nanos = nanos.checked_add(fraction).ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        if total > MAX_NANOS {
            return Err(overflow());
        }
        rest = remainder;
    }

    if negative {
        return Ok(Duration::ZERO);
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| DurationError::Overflow(input.to_string()))?;
    let subsec = u32::try_from(total % NANOS_PER_SEC).map_err(|_| DurationError::Overflow(input.to_string()))?;
    Ok(Duration::new(secs, subsec))
}
