//! Result of a façade operation that never fails outright.
//!
//! Every public operation substitutes a documented default when something
//! goes wrong. [`Outcome`] keeps that default but records that it is one,
//! so callers and tests can tell a real answer from a placeholder.

use crate::error::NlpError;

#[derive(Debug)]
pub enum Outcome<T> {
    /// The operation produced a real result.
    Success(T),
    /// The operation failed and `value` is the documented default.
    Fallback { value: T, reason: NlpError },
}

impl<T> Outcome<T> {
    /// Convert a fallible result, substituting `default` on error.
    pub fn or_fallback(result: Result<T, NlpError>, default: impl FnOnce() -> T) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(reason) => Self::Fallback {
                value: default(),
                reason,
            },
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Success(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Success(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// The failure that forced a fallback, if any.
    pub fn reason(&self) -> Option<&NlpError> {
        match self {
            Self::Success(_) => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }

    /// Split into the value and the fallback reason.
    pub fn into_parts(self) -> (T, Option<NlpError>) {
        match self {
            Self::Success(value) => (value, None),
            Self::Fallback { value, reason } => (value, Some(reason)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Fallback { value, reason } => Outcome::Fallback {
                value: f(value),
                reason,
            },
        }
    }
}
