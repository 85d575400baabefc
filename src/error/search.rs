//! This module contains errors produced by the local search engine.

use thiserror::Error;

use crate::error::{container, recording};

/// Errors that abort a search run.
///
/// A candidate that scores badly is never an error; it is simply not
/// accepted. Errors here mean the search itself could not proceed.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("The search was stopped by the watchdog")]
    StoppedByWatchdog,

    #[error(transparent)]
    Recording(#[from] recording::LocatedError),
}

/// A search error located at the iteration during which it occurred.
pub type LocatedError = container::Located<Error>;

/// The result type for methods that may produce search errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach iteration numbers to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn at_step(self, step: usize) -> Self::Located {
        container::Located {
            step,
            payload: self,
        }
    }
}
