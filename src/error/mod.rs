//! This module contains the primary error type for the library's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.

pub mod container;
pub mod recording;
pub mod replay;
pub mod search;

use thiserror::Error;

/// The interface result type for the library.
///
/// Any function considered part of the public interface of the library
/// should return this result type. Subsystems return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, Error>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by
/// clients of the library) are members of this enum.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// Errors from the recording subsystem.
    #[error(transparent)]
    Recording(#[from] recording::LocatedError),

    /// Errors from the candidate replay subsystem.
    #[error(transparent)]
    Replay(#[from] replay::LocatedError),

    /// Errors from the local search engine.
    #[error(transparent)]
    Search(#[from] search::LocatedError),

    /// An unknown error, represented as a string.
    #[error("Unknown Error: {_0:?}")]
    Other(String),
}

impl Error {
    /// Constructs an unknown error with the provided `message`.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
