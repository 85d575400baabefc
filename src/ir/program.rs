//! This file contains the program type: a trace treated as a candidate
//! implementation of the function under study.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ir::{statement::Statement, trace::Trace};

/// A candidate implementation, expressed as a straight-line statement list
/// of a fixed arity.
///
/// Programs are immutable; the search engine derives mutated copies rather
/// than editing in place. A program can be compiled back into a callable
/// with [`crate::replay::compile`], and serialises to JSON as the output
/// artifact of an analysis.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Program {
    trace: Trace,
    arity: usize,
}

impl Program {
    /// Creates a program from `trace`, callable with `arity` arguments.
    #[must_use]
    pub fn new(trace: Trace, arity: usize) -> Self {
        Self { trace, arity }
    }

    /// Gets the statement list of the program.
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Gets the statements of the program in order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        self.trace.statements()
    }

    /// Gets the number of arguments the program expects.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Gets the number of statements in the program.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trace.len()
    }

    /// Checks whether the program has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    /// Derives a new program with the same arity from `statements`.
    #[must_use]
    pub fn with_statements(&self, statements: Vec<Statement>) -> Self {
        Self {
            trace: Trace::from_statements(statements),
            arity: self.arity,
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let params = (0..self.arity)
            .map(|i| format!("arg{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "function ({params}) {{")?;
        for stmt in self.trace.statements() {
            writeln!(f, "  {stmt}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use crate::ir::{
        expression::Expression, program::Program, statement::Statement, trace::Trace,
    };

    #[test]
    fn programs_render_as_function_text() {
        let trace = Trace::from_statements(vec![Statement::ret(Expression::argument(1))]);
        let program = Program::new(trace, 2);
        assert_eq!(
            program.to_string(),
            "function (arg0, arg1) {\n  return arg1\n}"
        );
    }
}
