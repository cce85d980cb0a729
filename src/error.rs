//! Error taxonomy for the manager, mirroring the error codes an application
//! reads back from `manager.errorCode` in the original design.

use thiserror::Error;

/// Reported by any public operator that cannot complete.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DdError {
    #[error("allocator exhausted while growing the node arena or a subtable")]
    MemoryOut,
    #[error("live node budget (maxLive) exceeded")]
    TooManyNodes,
    #[error("hard memory cap exceeded")]
    MaxMemExceeded,
    #[error("CPU time limit exceeded")]
    TimeoutExpired,
    #[error("invalid argument: {0}")]
    InvalidArg(&'static str),
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

pub type DdResult<T> = Result<T, DdError>;

/// Tri-state return from every recursive operator body, per DESIGN NOTES §9:
/// a non-local "reordering happened, retry" boolean is modeled as a sum
/// type instead of a side-channel flag plus a null handle.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<T> {
    Value(T),
    Retry,
    Err(DdError),
}

impl<T> Outcome<T> {
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Value(v) => Outcome::Value(f(v)),
            Outcome::Retry => Outcome::Retry,
            Outcome::Err(e) => Outcome::Err(e),
        }
    }
}

/// Propagates a nested `Outcome` out of a function also returning `Outcome`,
/// the `?`-operator equivalent for the tri-state recursion protocol.
macro_rules! try_outcome {
    ($e:expr) => {
        match $e {
            $crate::error::Outcome::Value(v) => v,
            $crate::error::Outcome::Retry => return $crate::error::Outcome::Retry,
            $crate::error::Outcome::Err(e) => return $crate::error::Outcome::Err(e),
        }
    };
}

pub(crate) use try_outcome;
