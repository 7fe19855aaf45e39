//! # chronon-time: Exact simulated time
//!
//! [`Time`] is a signed femtosecond count used for every timestamp and
//! delay in the kernel. Arithmetic is exact integer arithmetic; floats
//! only appear in explicit conversions (`as_secs_f64`, `mul_f64`).
//!
//! A simulator picks a *resolution* ([`Unit::S`] down to [`Unit::Fs`])
//! when it is built. Scheduler keys are `u64` tick counts of that unit,
//! obtained with [`Time::to_ticks`].
//!
//! ```
//! use chronon_time::{Time, Unit};
//!
//! let t: Time = "1.5ms".parse().unwrap();
//! assert_eq!(t, Time::from_micros(1_500));
//! assert_eq!(t.to_ticks(Unit::Us).unwrap(), 1_500);
//! assert_eq!(t.to_string(), "1500us");
//! ```

mod error;
mod parse;
mod time;
mod unit;

pub use error::TimeError;
pub use time::{Time, TimeWithUnit};
pub use unit::Unit;
