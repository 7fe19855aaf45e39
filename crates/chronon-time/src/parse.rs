//! Parsing of time literals such as `"1.5ms"`, `"-3ns"` or `"1e-3s"`.
//!
//! Grammar: `[+-] digits [. digits] [(e|E) [+-] digits] [unit]`, with
//! optional whitespace around the number and before the unit. A missing
//! unit means seconds. The value is computed with integer arithmetic;
//! digits below one femtosecond are truncated.

use crate::{Time, TimeError, Unit};

pub(crate) fn parse_time(input: &str) -> Result<Time, TimeError> {
    let err = |reason: &'static str| TimeError::Parse {
        input: input.to_string(),
        reason,
    };

    let s = input.trim();
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut mantissa: i128 = 0;
    let mut digits = 0usize;
    let mut scale: i32 = 0;

    // Negative literals accumulate downwards so that `i128::MIN` fits.
    let mut push_digit = |d: u8| -> Result<(), TimeError> {
        let digit = i128::from(d - b'0');
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| {
                if negative {
                    m.checked_sub(digit)
                } else {
                    m.checked_add(digit)
                }
            })
            .ok_or(TimeError::Overflow)?;
        digits += 1;
        Ok(())
    };

    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        push_digit(bytes[pos])?;
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            push_digit(bytes[pos])?;
            scale -= 1;
            pos += 1;
        }
    }
    if digits == 0 {
        return Err(err("expected digits"));
    }

    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos += 1;
        let exp_negative = match bytes.get(pos) {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if start == pos {
            return Err(err("expected exponent digits"));
        }
        let exp: i32 = s[start..pos].parse().map_err(|_| err("exponent out of range"))?;
        scale = if exp_negative {
            scale.checked_sub(exp)
        } else {
            scale.checked_add(exp)
        }
        .ok_or_else(|| err("exponent out of range"))?;
    }

    let suffix = s[pos..].trim_start();
    let unit = if suffix.is_empty() {
        Unit::S
    } else {
        Unit::from_suffix(suffix).ok_or_else(|| err("unknown time unit"))?
    };

    let mut femtos = mantissa
        .checked_mul(unit.femtos())
        .ok_or(TimeError::Overflow)?;
    if scale >= 0 {
        let factor = 10i128
            .checked_pow(scale.unsigned_abs())
            .ok_or(TimeError::Overflow)?;
        femtos = femtos.checked_mul(factor).ok_or(TimeError::Overflow)?;
    } else {
        // Divisors past 10^38 leave nothing above a femtosecond.
        femtos = match 10i128.checked_pow(scale.unsigned_abs()) {
            Some(divisor) => femtos / divisor,
            None => 0,
        };
    }

    Ok(Time::from_femtos_i128(femtos))
}
