//! The [`Time`] value type.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::unit::{FS_PER_MS, FS_PER_NS, FS_PER_PS, FS_PER_S, FS_PER_US};
use crate::{TimeError, Unit};

// ============================================================================
// Time
// ============================================================================

/// A signed, exact point or span of simulated time.
///
/// Stored as a count of femtoseconds in an `i128`, so every unit from
/// years down to femtoseconds is represented without rounding. Values are
/// `Copy` and immutable; all arithmetic produces a new value.
///
/// The operator impls (`+`, `-`, `* i64`) panic on overflow, like integer
/// arithmetic in debug builds. Use the `checked_*` methods where the
/// operands come from outside the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time(i128);

impl Time {
    /// Zero time.
    pub const ZERO: Time = Time(0);
    /// The earliest representable time.
    pub const MIN: Time = Time(i128::MIN);
    /// The latest representable time ("never").
    pub const MAX: Time = Time(i128::MAX);

    /// Creates a time from a raw femtosecond count.
    pub const fn from_femtos_i128(femtos: i128) -> Self {
        Self(femtos)
    }

    /// Creates a time from an integer count of `unit`.
    pub fn from_integer(value: i128, unit: Unit) -> Result<Self, TimeError> {
        value
            .checked_mul(unit.femtos())
            .map(Self)
            .ok_or(TimeError::Overflow)
    }

    /// Creates a time from a floating-point count of `unit`, rounding to
    /// the nearest femtosecond.
    pub fn from_f64(value: f64, unit: Unit) -> Result<Self, TimeError> {
        let femtos = value * unit.femtos() as f64;
        if !femtos.is_finite() || femtos >= i128::MAX as f64 || femtos <= i128::MIN as f64 {
            return Err(TimeError::Overflow);
        }
        Ok(Self(femtos.round() as i128))
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs as i128 * FS_PER_S)
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis as i128 * FS_PER_MS)
    }

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros as i128 * FS_PER_US)
    }

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos as i128 * FS_PER_NS)
    }

    pub const fn from_picos(picos: i64) -> Self {
        Self(picos as i128 * FS_PER_PS)
    }

    pub const fn from_femtos(femtos: i64) -> Self {
        Self(femtos as i128)
    }

    /// Converts a wall-clock duration.
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration.as_nanos() as i128 * FS_PER_NS)
    }

    /// Converts to a wall-clock duration, truncating below nanoseconds.
    ///
    /// Returns `None` for negative times and values beyond `Duration::MAX`.
    pub fn to_duration(self) -> Option<Duration> {
        if self.0 < 0 {
            return None;
        }
        let nanos = self.0 / FS_PER_NS;
        let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
        Some(Duration::new(secs, (nanos % 1_000_000_000) as u32))
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Raw femtosecond count.
    pub const fn as_femtos(self) -> i128 {
        self.0
    }

    /// Number of whole `unit`s, truncating toward zero.
    pub const fn to_integer(self, unit: Unit) -> i128 {
        self.0 / unit.femtos()
    }

    /// Value in `unit` as a float. Lossy for large values.
    pub fn to_f64(self, unit: Unit) -> f64 {
        let whole = self.0 / unit.femtos();
        let frac = self.0 % unit.femtos();
        whole as f64 + frac as f64 / unit.femtos() as f64
    }

    pub fn as_secs_f64(self) -> f64 {
        self.to_f64(Unit::S)
    }

    pub fn get_seconds(self) -> f64 {
        self.to_f64(Unit::S)
    }

    pub const fn get_milliseconds(self) -> i128 {
        self.to_integer(Unit::Ms)
    }

    pub const fn get_microseconds(self) -> i128 {
        self.to_integer(Unit::Us)
    }

    pub const fn get_nanoseconds(self) -> i128 {
        self.to_integer(Unit::Ns)
    }

    pub const fn get_picoseconds(self) -> i128 {
        self.to_integer(Unit::Ps)
    }

    pub const fn get_femtoseconds(self) -> i128 {
        self.0
    }

    /// Wraps the value for display in a fixed unit (`"1500us"`, `"1.5ms"`).
    pub fn as_unit(self, unit: Unit) -> TimeWithUnit {
        TimeWithUnit { time: self, unit }
    }

    // ------------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------------

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True for zero and negative values.
    pub const fn is_negative(self) -> bool {
        self.0 <= 0
    }

    /// True for zero and positive values.
    pub const fn is_positive(self) -> bool {
        self.0 >= 0
    }

    pub const fn is_strictly_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_strictly_positive(self) -> bool {
        self.0 > 0
    }

    /// Three-way comparison: `-1`, `0` or `1`.
    pub fn compare(self, other: Time) -> i32 {
        match self.cmp(&other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    // ------------------------------------------------------------------------
    // Arithmetic
    // ------------------------------------------------------------------------

    pub const fn checked_add(self, rhs: Time) -> Option<Time> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Time(v)),
            None => None,
        }
    }

    pub const fn checked_sub(self, rhs: Time) -> Option<Time> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Time(v)),
            None => None,
        }
    }

    pub const fn checked_mul(self, rhs: i64) -> Option<Time> {
        match self.0.checked_mul(rhs as i128) {
            Some(v) => Some(Time(v)),
            None => None,
        }
    }

    /// Divides by a dimensionless integer, truncating toward zero.
    pub fn checked_div(self, rhs: i64) -> Result<Time, TimeError> {
        if rhs == 0 {
            return Err(TimeError::DivisionByZero);
        }
        self.0
            .checked_div(i128::from(rhs))
            .map(Time)
            .ok_or(TimeError::Overflow)
    }

    /// Multiplies by `num / den` exactly, truncating the final quotient.
    pub fn mul_ratio(self, num: i64, den: i64) -> Result<Time, TimeError> {
        if den == 0 {
            return Err(TimeError::DivisionByZero);
        }
        self.0
            .checked_mul(i128::from(num))
            .and_then(|v| v.checked_div(i128::from(den)))
            .map(Time)
            .ok_or(TimeError::Overflow)
    }

    /// Multiplies by a float, rounding to the nearest femtosecond.
    pub fn mul_f64(self, factor: f64) -> Result<Time, TimeError> {
        Time::from_f64(self.0 as f64 * factor, Unit::Fs)
    }

    /// How many whole `rhs` fit in `self`, truncating toward zero.
    pub fn ratio(self, rhs: Time) -> Result<i128, TimeError> {
        if rhs.0 == 0 {
            return Err(TimeError::DivisionByZero);
        }
        self.0.checked_div(rhs.0).ok_or(TimeError::Overflow)
    }

    pub fn abs(self) -> Time {
        Time(self.0.checked_abs().expect("time overflow"))
    }

    // ------------------------------------------------------------------------
    // Resolution bridge
    // ------------------------------------------------------------------------

    /// Converts to a tick count of `resolution`, truncating sub-tick
    /// remainders. Fails for negative values and counts beyond `u64`.
    pub fn to_ticks(self, resolution: Unit) -> Result<u64, TimeError> {
        if self.0 < 0 {
            return Err(TimeError::Overflow);
        }
        u64::try_from(self.0 / resolution.femtos()).map_err(|_| TimeError::Overflow)
    }

    pub const fn from_ticks(ticks: u64, resolution: Unit) -> Time {
        Time(ticks as i128 * resolution.femtos())
    }
}

// ============================================================================
// Operators
// ============================================================================

impl Add for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Time {
        self.checked_add(rhs).expect("time overflow")
    }
}

impl Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Time {
        self.checked_sub(rhs).expect("time overflow")
    }
}

impl Neg for Time {
    type Output = Time;

    fn neg(self) -> Time {
        Time(self.0.checked_neg().expect("time overflow"))
    }
}

impl Mul<i64> for Time {
    type Output = Time;

    fn mul(self, rhs: i64) -> Time {
        self.checked_mul(rhs).expect("time overflow")
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Time) {
        *self = *self + rhs;
    }
}

impl SubAssign for Time {
    fn sub_assign(&mut self, rhs: Time) {
        *self = *self - rhs;
    }
}

impl From<Duration> for Time {
    fn from(duration: Duration) -> Self {
        Time::from_duration(duration)
    }
}

// ============================================================================
// Formatting
// ============================================================================

impl Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0s");
        }
        let unit = Unit::DECIMAL
            .into_iter()
            .find(|u| self.0 % u.femtos() == 0)
            .unwrap_or(Unit::Fs);
        write!(f, "{}{}", self.0 / unit.femtos(), unit.suffix())
    }
}

impl FromStr for Time {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse_time(s)
    }
}

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A [`Time`] printed in a fixed unit, with a decimal fraction if needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWithUnit {
    time: Time,
    unit: Unit,
}

impl Display for TimeWithUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per = self.unit.femtos();
        let v = self.time.0;
        let sign = if v < 0 { "-" } else { "" };
        let whole = (v / per).unsigned_abs();
        let frac = (v % per).unsigned_abs();
        if frac == 0 {
            return write!(f, "{sign}{whole}{}", self.unit.suffix());
        }
        // Non-decimal units (min, h, d, y) fall back to a float fraction.
        match self.unit.decimal_digits() {
            Some(digits) => {
                let frac = format!("{frac:0digits$}");
                write!(f, "{sign}{whole}.{}{}", frac.trim_end_matches('0'), self.unit.suffix())
            }
            None => write!(f, "{}{}", self.time.to_f64(self.unit), self.unit.suffix()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn shorthands_agree_with_from_integer() {
        assert_eq!(Time::from_secs(3), Time::from_integer(3, Unit::S).unwrap());
        assert_eq!(Time::from_millis(-7), Time::from_integer(-7, Unit::Ms).unwrap());
        assert_eq!(Time::from_nanos(10), Time::from_integer(10, Unit::Ns).unwrap());
        assert_eq!(Time::from_femtos(1).as_femtos(), 1);
    }

    #[test]
    fn to_integer_truncates_toward_zero() {
        let t = Time::from_picos(1_999);
        assert_eq!(t.to_integer(Unit::Ns), 1);
        assert_eq!((-t).to_integer(Unit::Ns), -1);
    }

    #[test]
    fn predicates_follow_inclusive_semantics() {
        assert!(Time::ZERO.is_zero());
        assert!(Time::ZERO.is_negative());
        assert!(Time::ZERO.is_positive());
        assert!(!Time::ZERO.is_strictly_negative());
        assert!(!Time::ZERO.is_strictly_positive());
        assert!(Time::from_nanos(-5).is_strictly_negative());
        assert!(!Time::from_nanos(-5).is_positive());
    }

    #[test]
    fn compare_is_tristate() {
        let a = Time::from_nanos(1);
        let b = Time::from_nanos(2);
        assert_eq!(a.compare(b), -1);
        assert_eq!(b.compare(a), 1);
        assert_eq!(a.compare(a), 0);
    }

    #[test]
    fn sentinels_bound_everything() {
        assert!(Time::MIN < Time::from_secs(i64::MIN));
        assert!(Time::MAX > Time::from_secs(i64::MAX));
    }

    #[test]
    fn arithmetic_is_exact() {
        let t = Time::from_nanos(1) + Time::from_femtos(1);
        assert_eq!(t.as_femtos(), 1_000_001);
        assert_eq!(t - Time::from_femtos(1), Time::from_nanos(1));
        assert_eq!(Time::from_micros(3) * 4, Time::from_micros(12));
        assert_eq!(-Time::from_secs(1), Time::from_secs(-1));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(Time::from_secs(1).checked_div(0), Err(TimeError::DivisionByZero));
        assert_eq!(Time::from_secs(1).ratio(Time::ZERO), Err(TimeError::DivisionByZero));
        assert_eq!(Time::from_secs(1).mul_ratio(1, 0), Err(TimeError::DivisionByZero));
    }

    #[test]
    fn scalar_division_and_ratio() {
        assert_eq!(Time::from_millis(10).checked_div(4).unwrap(), Time::from_micros(2_500));
        assert_eq!(Time::from_millis(10).ratio(Time::from_millis(3)).unwrap(), 3);
        assert_eq!(Time::from_secs(1).mul_ratio(1, 3).unwrap().as_femtos(), 333_333_333_333_333);
    }

    #[test]
    fn overflow_is_reported_by_checked_ops() {
        assert_eq!(Time::MAX.checked_add(Time::from_femtos(1)), None);
        assert_eq!(Time::MIN.checked_sub(Time::from_femtos(1)), None);
        assert_eq!(Time::MAX.checked_mul(2), None);
        assert_eq!(Time::from_integer(i128::MAX, Unit::S), Err(TimeError::Overflow));
    }

    #[test]
    #[should_panic(expected = "time overflow")]
    fn operator_overflow_panics() {
        let _ = Time::MAX + Time::from_femtos(1);
    }

    #[test]
    fn ticks_roundtrip_at_resolution() {
        let t = Time::from_micros(1_500);
        assert_eq!(t.to_ticks(Unit::Us).unwrap(), 1_500);
        assert_eq!(t.to_ticks(Unit::Ms).unwrap(), 1);
        assert_eq!(Time::from_ticks(1_500, Unit::Us), t);
        assert_eq!(Time::from_nanos(-1).to_ticks(Unit::Ns), Err(TimeError::Overflow));
    }

    #[test]
    fn sub_tick_negative_is_rejected() {
        assert_eq!(Time::from_femtos(-1).to_ticks(Unit::Ns), Err(TimeError::Overflow));
        assert_eq!(Time::from_femtos(999_999).to_ticks(Unit::Ns), Ok(0));
    }

    #[test]
    fn duration_bridge() {
        let d = Duration::from_micros(1_250);
        let t = Time::from_duration(d);
        assert_eq!(t, Time::from_micros(1_250));
        assert_eq!(t.to_duration(), Some(d));
        assert_eq!(Time::from_nanos(-1).to_duration(), None);
    }

    #[test]
    fn float_conversions() {
        assert!((Time::from_millis(1_500).as_secs_f64() - 1.5).abs() < 1e-12);
        assert_eq!(Time::from_f64(2.5, Unit::Ms).unwrap(), Time::from_micros(2_500));
        assert_eq!(Time::from_secs(2).mul_f64(0.25).unwrap(), Time::from_millis(500));
        assert!(Time::from_f64(f64::NAN, Unit::S).is_err());
    }

    #[test_case(Time::ZERO, "0s")]
    #[test_case(Time::from_millis(100), "100ms")]
    #[test_case(Time::from_nanos(-3), "-3ns")]
    #[test_case(Time::from_secs(120), "120s")]
    #[test_case(Time::from_femtos(1_001), "1001fs")]
    fn display_uses_largest_exact_unit(time: Time, expected: &str) {
        assert_eq!(time.to_string(), expected);
    }

    #[test_case(Time::from_micros(1_500), Unit::Ms, "1.5ms")]
    #[test_case(Time::from_micros(-1_500), Unit::Ms, "-1.5ms")]
    #[test_case(Time::from_millis(2), Unit::Us, "2000us")]
    #[test_case(Time::from_secs(90), Unit::Min, "1.5min")]
    fn as_unit_formats_fractions(time: Time, unit: Unit, expected: &str) {
        assert_eq!(time.as_unit(unit).to_string(), expected);
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&Time::from_micros(250)).unwrap();
        assert_eq!(json, "\"250us\"");
        let back: Time = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Time::from_micros(250));
        assert!(serde_json::from_str::<Time>("\"soon\"").is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_unit() -> impl Strategy<Value = Unit> {
            proptest::sample::select(Unit::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn from_integer_roundtrips(value in any::<i64>(), unit in any_unit()) {
                let t = Time::from_integer(i128::from(value), unit).unwrap();
                prop_assert_eq!(t.to_integer(unit), i128::from(value));
            }

            #[test]
            fn display_parse_roundtrips(femtos in any::<i64>()) {
                let t = Time::from_femtos(femtos);
                let parsed: Time = t.to_string().parse().unwrap();
                prop_assert_eq!(parsed, t);
            }

            #[test]
            fn addition_is_invertible(a in any::<i64>(), b in any::<i64>()) {
                let (a, b) = (Time::from_nanos(a), Time::from_nanos(b));
                prop_assert_eq!(a + b - b, a);
            }
        }
    }
}
