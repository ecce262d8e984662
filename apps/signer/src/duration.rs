//! Parsing of validity durations such as `15m`, `1h30m` or `1.5h`.
//!
//! Accepts the same syntax as Go's `time.ParseDuration`: an optional sign and
//! a sequence of decimal numbers, each with an optional fraction and a unit
//! suffix (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`). A bare `0` is allowed.
//! Negative durations are rejected since they cannot describe a validity
//! window.

use std::time::Duration;

use crate::AppError;

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3600 * 1_000_000_000),
];

/// `frac * scale` stays within `u128` for the largest unit.
const MAX_FRACTION_DIGITS: usize = 18;

pub fn parse_duration(input: &str) -> Result<Duration, AppError> {
    let invalid = || AppError::invalid_duration(format!("invalid duration: {input}"));

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

    let mut total_nanos: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_num) = match after_int.strip_prefix('.') {
            Some(frac) => {
                let frac_len = frac.bytes().take_while(u8::is_ascii_digit).count();
                frac.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }

        let unit_len = after_num
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map_or(after_num.len(), |(i, _)| i);
        let (unit, tail) = after_num.split_at(unit_len);

        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| {
                if unit.is_empty() {
                    AppError::invalid_duration(format!("missing unit in duration: {input}"))
                } else {
                    AppError::invalid_duration(format!(
                        "unknown unit {unit} in duration: {input}"
                    ))
                }
            })?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;

        if !frac_part.is_empty() {
            // Digits past nanosecond precision of any unit are dropped.
            let digits = frac_part.len().min(MAX_FRACTION_DIGITS) as u32;
            let frac: u128 = frac_part[..digits as usize].parse().map_err(|_| invalid())?;
            let divisor = 10u128.checked_pow(digits).ok_or_else(invalid)?;
            nanos = nanos
                .checked_add(frac.checked_mul(scale).ok_or_else(invalid)? / divisor)
                .ok_or_else(invalid)?;
        }

        total_nanos = total_nanos.checked_add(nanos).ok_or_else(invalid)?;
        rest = tail;
    }

    if negative && total_nanos > 0 {
        return Err(AppError::invalid_duration(format!(
            "negative duration: {input}"
        )));
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).map_err(|_| invalid())?;
    let subsec = (total_nanos % 1_000_000_000) as u32;
    Ok(Duration::new(secs, subsec))
}
