//! This file contains the trace type: the ordered record of one observed
//! execution.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ir::{skeleton::Skeleton, statement::Statement};

/// The ordered sequence of statements recorded from one execution.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Trace {
    stmts: Vec<Statement>,
}

impl Trace {
    /// Creates an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a trace from the provided statements.
    #[must_use]
    pub fn from_statements(stmts: impl Into<Vec<Statement>>) -> Self {
        Self {
            stmts: stmts.into(),
        }
    }

    /// Appends `statement` to the end of the trace.
    pub fn extend(&mut self, statement: Statement) {
        self.stmts.push(statement);
    }

    /// Gets the statements of the trace in recording order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        self.stmts.as_slice()
    }

    /// Gets the number of statements in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    /// Checks whether the trace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Computes the skeleton projection of the trace, one atom per
    /// statement.
    #[must_use]
    pub fn skeleton(&self) -> Vec<Skeleton> {
        self.stmts.iter().map(Skeleton::of).collect()
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, stmt) in self.stmts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::ir::{expression::Expression, statement::Statement, trace::Trace};

    #[test]
    fn skeletons_ignore_constant_values() {
        let field = Expression::field(Expression::argument(0), Expression::constant("x"));
        let with_five = Trace::from_statements(vec![
            Statement::assign(field.clone(), Expression::constant(5i64)),
            Statement::ret(Expression::constant(5i64)),
        ]);
        let with_seven = Trace::from_statements(vec![
            Statement::assign(field, Expression::constant(7i64)),
            Statement::ret(Expression::constant(7i64)),
        ]);

        assert_eq!(with_five.skeleton(), with_seven.skeleton());
    }
}
