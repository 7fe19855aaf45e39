//! Time error types.

/// Errors from time construction, conversion and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// A time value was divided by zero.
    #[error("division of time by zero")]
    DivisionByZero,

    /// The result does not fit the representable range of the target.
    #[error("time value out of representable range")]
    Overflow,

    /// A time literal could not be parsed.
    #[error("invalid time literal {input:?}: {reason}")]
    Parse { input: String, reason: &'static str },
}
