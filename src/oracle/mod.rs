//! This module contains the runtime domain of the functions under study:
//! values, the object heap, the capability-limited interface through which
//! field operations are dispatched, and the [`Oracle`] trait itself.
//!
//! An oracle is an opaque function. The library never inspects its source;
//! it only observes the field operations the oracle performs through its
//! [`env::Environment`], which is how the tracer interposes on an execution
//! without the oracle cooperating.

pub mod env;
pub mod heap;
pub mod value;

use derivative::Derivative;

use crate::{error, oracle::value::Value};

/// The result of running an oracle (or a compiled candidate) to completion.
pub type Outcome = std::result::Result<Value, Fault>;

/// The ways in which a call can fail to produce a return value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fault {
    /// The call threw. This is a legitimate, modelled outcome of the
    /// function under study, never a tool failure.
    Throw(Thrown),

    /// The oracle itself is malformed and cannot be executed. This is tool
    /// misuse and always fatal.
    Malformed(String),

    /// The modelling machinery failed an internal consistency check. The
    /// defect is in the tool, not the oracle, and is always fatal.
    Internal(error::Error),
}

impl Fault {
    /// Constructs a thrown runtime error of the given `kind`.
    #[must_use]
    pub fn runtime_error(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self::Throw(Thrown::Error {
            kind,
            message: message.into(),
        })
    }

    /// Constructs the fault for a field operation attempted on a primitive.
    #[must_use]
    pub fn not_an_object(value: &Value) -> Self {
        Self::runtime_error(
            RuntimeErrorKind::Type,
            format!("cannot access a property of {}", value.type_name()),
        )
    }
}

/// A value or error thrown by a call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Thrown {
    /// An ordinary runtime error of a recognised category.
    Error {
        kind: RuntimeErrorKind,
        message: String,
    },

    /// Any other thrown value.
    Value(Value),
}

/// The recognised categories of ordinary runtime errors.
///
/// Errors in these categories are captured as `Throw` outcomes in the
/// trace; anything else thrown by an oracle is treated as a thrown value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RuntimeErrorKind {
    /// An unresolvable name was referenced.
    Reference,

    /// An operation was applied to a value of the wrong runtime tag.
    Type,

    /// A numeric argument was outside its valid domain.
    Range,
}

impl std::fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "ReferenceError"),
            Self::Type => write!(f, "TypeError"),
            Self::Range => write!(f, "RangeError"),
        }
    }
}

/// An opaque function whose behaviour can be observed.
///
/// The oracle genuinely executes when called: the library performs dynamic
/// instrumentation, not static analysis. All access to the argument objects
/// must go through the provided environment; that discipline is what makes
/// the same oracle runnable both raw (for verification) and instrumented
/// (for recording).
pub trait Oracle {
    /// The number of arguments the function expects.
    fn arity(&self) -> usize;

    /// Executes the function against `args`, performing all field
    /// operations through `env`.
    fn call(&self, env: &mut dyn env::Environment, args: &[Value]) -> Outcome;
}

/// An [`Oracle`] built from a closure, for oracles defined in host code.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct FnOracle {
    /// The number of arguments the closure expects.
    arity: usize,

    /// The behaviour under study.
    #[derivative(Debug = "ignore")]
    body: Box<dyn Fn(&mut dyn env::Environment, &[Value]) -> Outcome>,
}

impl FnOracle {
    /// Wraps the provided closure as an oracle of the given `arity`.
    pub fn new(
        arity: usize,
        body: impl Fn(&mut dyn env::Environment, &[Value]) -> Outcome + 'static,
    ) -> Self {
        Self {
            arity,
            body: Box::new(body),
        }
    }
}

impl Oracle for FnOracle {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, env: &mut dyn env::Environment, args: &[Value]) -> Outcome {
        (self.body)(env, args)
    }
}
