//! This module contains errors and diagnostics produced while recording the
//! execution of an oracle.

use thiserror::Error;

use crate::{
    error::container,
    oracle::value::{PropKey, Ref},
};

/// Errors that occur while the tracer observes an execution.
///
/// All of these signal a defect in the modelling machinery or misuse of the
/// tool, never a property of the oracle under study. Outcomes of the oracle
/// itself, including thrown runtime errors, are captured in the trace
/// instead.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("No access path is registered for the reachable value {value}")]
    MissingAccessPath { value: String },

    #[error("Object {object} already has an instrumented stand-in")]
    AlreadyInstrumented { object: Ref },

    #[error("The oracle is malformed: {message}")]
    MalformedOracle { message: String },
}

/// A recording error with the ordinal of the operation that produced it.
pub type LocatedError = container::Located<Error>;

/// A container of recording errors.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may produce recording errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach operation ordinals to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn at_step(self, step: usize) -> Self::Located {
        container::Located {
            step,
            payload: self,
        }
    }
}

/// Non-fatal notes about operations the tracer observed but does not model.
///
/// These are buffered on the recording context rather than aborting the
/// recording; the affected operations are forwarded to the raw object so
/// the oracle still executes faithfully.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Diagnostic {
    #[error("Unmodeled read of missing or inherited property {key}")]
    UnmodeledRead { key: PropKey },

    #[error("Unmodeled existence check for {key}")]
    UnmodeledHas { key: PropKey },

    #[error("Unmodeled enumeration of {object}")]
    UnmodeledKeys { object: Ref },

    #[error("Unmodeled invocation of built-in {method:?}")]
    UnmodeledInvoke { method: String },
}

/// A diagnostic with the ordinal of the operation that produced it.
pub type LocatedDiagnostic = container::Located<Diagnostic>;

/// The buffered diagnostics of one recording, in operation order.
pub type Diagnostics = container::Errors<LocatedDiagnostic>;

/// Make it possible to attach operation ordinals to diagnostics.
impl container::Locatable for Diagnostic {
    type Located = LocatedDiagnostic;

    fn at_step(self, step: usize) -> Self::Located {
        container::Located {
            step,
            payload: self,
        }
    }
}
