//! This module contains errors pertaining to the replay of candidate
//! programs.

use thiserror::Error;

use crate::error::container;

/// Errors that occur while a compiled candidate program is interpreted.
///
/// These describe malformed programs, not runtime misbehaviour of a
/// candidate: a candidate that merely computes the wrong thing produces an
/// ordinary traced outcome instead.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("{expression} cannot be the target of an assignment")]
    InvalidAssignmentTarget { expression: String },
}

/// A replay error located at the index of the offending statement.
pub type LocatedError = container::Located<Error>;

/// A container of replay errors.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may produce replay errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach statement indices to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn at_step(self, step: usize) -> Self::Located {
        container::Located {
            step,
            payload: self,
        }
    }
}
