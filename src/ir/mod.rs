//! This module contains the symbolic intermediate representation: the
//! expressions, statements, traces and programs in which observed behaviour
//! is recorded and candidate implementations are expressed.
//!
//! The IR is purely structural. Recording attaches meaning to it (see
//! [`crate::tracer`]); replay gives it back an operational reading (see
//! [`crate::replay`]).

pub mod expression;
pub mod matching;
pub mod program;
pub mod skeleton;
pub mod statement;
pub mod trace;

pub use expression::{Expression, Variable, VariableSource};
pub use program::Program;
pub use skeleton::Skeleton;
pub use statement::Statement;
pub use trace::Trace;
