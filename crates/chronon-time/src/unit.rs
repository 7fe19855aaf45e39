//! Time units.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TimeError;

pub(crate) const FS_PER_PS: i128 = 1_000;
pub(crate) const FS_PER_NS: i128 = 1_000_000;
pub(crate) const FS_PER_US: i128 = 1_000_000_000;
pub(crate) const FS_PER_MS: i128 = 1_000_000_000_000;
pub(crate) const FS_PER_S: i128 = 1_000_000_000_000_000;
pub(crate) const FS_PER_MIN: i128 = 60 * FS_PER_S;
pub(crate) const FS_PER_H: i128 = 60 * FS_PER_MIN;
pub(crate) const FS_PER_D: i128 = 24 * FS_PER_H;
pub(crate) const FS_PER_Y: i128 = 365 * FS_PER_D;

/// A unit of time, from years down to femtoseconds.
///
/// Units from [`Unit::S`] down to [`Unit::Fs`] are valid kernel
/// resolutions (see [`Unit::is_resolution`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Year of 365 days.
    #[serde(rename = "y")]
    Y,
    /// Day of 24 hours.
    #[serde(rename = "d")]
    D,
    #[serde(rename = "h")]
    H,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "s")]
    S,
    #[serde(rename = "ms")]
    Ms,
    #[serde(rename = "us")]
    Us,
    #[serde(rename = "ns")]
    Ns,
    #[serde(rename = "ps")]
    Ps,
    #[serde(rename = "fs")]
    Fs,
}

impl Unit {
    /// All units, largest first.
    pub const ALL: [Unit; 10] = [
        Unit::Y,
        Unit::D,
        Unit::H,
        Unit::Min,
        Unit::S,
        Unit::Ms,
        Unit::Us,
        Unit::Ns,
        Unit::Ps,
        Unit::Fs,
    ];

    /// Units with an exact power-of-ten femtosecond factor, largest first.
    pub const DECIMAL: [Unit; 6] = [Unit::S, Unit::Ms, Unit::Us, Unit::Ns, Unit::Ps, Unit::Fs];

    /// Number of femtoseconds in one of this unit.
    pub const fn femtos(self) -> i128 {
        match self {
            Unit::Y => FS_PER_Y,
            Unit::D => FS_PER_D,
            Unit::H => FS_PER_H,
            Unit::Min => FS_PER_MIN,
            Unit::S => FS_PER_S,
            Unit::Ms => FS_PER_MS,
            Unit::Us => FS_PER_US,
            Unit::Ns => FS_PER_NS,
            Unit::Ps => FS_PER_PS,
            Unit::Fs => 1,
        }
    }

    /// The literal suffix used when printing and parsing times.
    pub const fn suffix(self) -> &'static str {
        match self {
            Unit::Y => "y",
            Unit::D => "d",
            Unit::H => "h",
            Unit::Min => "min",
            Unit::S => "s",
            Unit::Ms => "ms",
            Unit::Us => "us",
            Unit::Ns => "ns",
            Unit::Ps => "ps",
            Unit::Fs => "fs",
        }
    }

    /// Returns `true` if this unit may be used as a kernel resolution.
    pub const fn is_resolution(self) -> bool {
        matches!(
            self,
            Unit::S | Unit::Ms | Unit::Us | Unit::Ns | Unit::Ps | Unit::Fs
        )
    }

    /// Number of decimal digits below one of this unit, for decimal units.
    pub(crate) const fn decimal_digits(self) -> Option<usize> {
        match self {
            Unit::S => Some(15),
            Unit::Ms => Some(12),
            Unit::Us => Some(9),
            Unit::Ns => Some(6),
            Unit::Ps => Some(3),
            Unit::Fs => Some(0),
            _ => None,
        }
    }

    pub(crate) fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.suffix() == suffix)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Unit {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_suffix(s.trim()).ok_or_else(|| TimeError::Parse {
            input: s.to_string(),
            reason: "unknown time unit",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Unit::S, 1_000_000_000_000_000; "seconds")]
    #[test_case(Unit::Ns, 1_000_000; "nanoseconds")]
    #[test_case(Unit::Min, 60_000_000_000_000_000; "minutes")]
    #[test_case(Unit::Fs, 1; "femtoseconds")]
    fn femtos_per_unit(unit: Unit, expected: i128) {
        assert_eq!(unit.femtos(), expected);
    }

    #[test]
    fn units_are_ordered_largest_first() {
        for pair in Unit::ALL.windows(2) {
            assert!(pair[0].femtos() > pair[1].femtos());
        }
    }

    #[test]
    fn suffix_roundtrips() {
        for unit in Unit::ALL {
            assert_eq!(unit.suffix().parse::<Unit>().unwrap(), unit);
        }
    }

    #[test]
    fn only_subsecond_units_are_resolutions() {
        assert!(Unit::S.is_resolution());
        assert!(Unit::Fs.is_resolution());
        assert!(!Unit::Min.is_resolution());
        assert!(!Unit::Y.is_resolution());
    }

    #[test]
    fn unknown_unit_is_rejected() {
        assert!(matches!("fortnight".parse::<Unit>(), Err(TimeError::Parse { .. })));
    }

    #[test]
    fn serde_uses_suffix() {
        assert_eq!(serde_json::to_string(&Unit::Us).unwrap(), "\"us\"");
        let unit: Unit = serde_json::from_str("\"ps\"").unwrap();
        assert_eq!(unit, Unit::Ps);
    }
}
