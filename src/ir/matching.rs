//! This file contains structural comparison of expressions and traces with
//! lazy establishment of a variable correspondence.
//!
//! Candidate programs introduce their own local variables, so comparing a
//! candidate trace against a real one must allow those locals to be
//! alpha-renamed. The correspondence is built lazily as the comparison
//! walks the statements in order: two variables compare equal only if that
//! is consistent with every pairing established earlier in the same
//! comparison, and the mapping is bijective, so two distinct variables on
//! one side can never be unified with a single variable on the other.

use bimap::BiMap;

use crate::ir::{expression::Expression, statement::Statement, trace::Trace};

/// The variable pairings established so far during one structural
/// comparison.
#[derive(Clone, Debug, Default)]
pub struct VariableCorrespondence {
    pairs: BiMap<usize, usize>,
}

impl VariableCorrespondence {
    /// Creates an empty correspondence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to pair variable `left` with variable `right`, reporting
    /// whether the pairing is consistent with what has been established so
    /// far.
    ///
    /// A previously unseen pair is recorded and accepted; a pair that
    /// conflicts with an earlier pairing on either side is rejected and
    /// leaves the correspondence unchanged.
    pub fn unify(&mut self, left: usize, right: usize) -> bool {
        match (
            self.pairs.get_by_left(&left),
            self.pairs.get_by_right(&right),
        ) {
            (Some(bound), _) => *bound == right,
            (None, Some(_)) => false,
            (None, None) => {
                self.pairs.insert(left, right);
                true
            }
        }
    }
}

/// Compares two expressions structurally under `correspondence`.
#[must_use]
pub fn expressions_match(
    left: &Expression,
    right: &Expression,
    correspondence: &mut VariableCorrespondence,
) -> bool {
    match (left, right) {
        (Expression::Argument { index: l }, Expression::Argument { index: r }) => l == r,
        (
            Expression::Field {
                object: lo,
                key: lk,
            },
            Expression::Field {
                object: ro,
                key: rk,
            },
        ) => {
            expressions_match(lo, ro, correspondence) && expressions_match(lk, rk, correspondence)
        }
        (Expression::Constant { value: l }, Expression::Constant { value: r }) => l == r,
        (Expression::Variable { var: l }, Expression::Variable { var: r }) => {
            correspondence.unify(l.id(), r.id())
        }
        _ => false,
    }
}

/// Compares two statements structurally under `correspondence`.
#[must_use]
pub fn statements_match(
    left: &Statement,
    right: &Statement,
    correspondence: &mut VariableCorrespondence,
) -> bool {
    match (left, right) {
        (
            Statement::Assign {
                lhs: ll,
                rhs: lr,
                is_declaration: ld,
            },
            Statement::Assign {
                lhs: rl,
                rhs: rr,
                is_declaration: rd,
            },
        ) => {
            ld == rd
                && expressions_match(ll, rl, correspondence)
                && expressions_match(lr, rr, correspondence)
        }
        (Statement::Return { value: l }, Statement::Return { value: r })
        | (Statement::Throw { value: l }, Statement::Throw { value: r }) => {
            expressions_match(l, r, correspondence)
        }
        (
            Statement::DeleteProperty {
                object: lo,
                key: lk,
            },
            Statement::DeleteProperty {
                object: ro,
                key: rk,
            },
        ) => {
            expressions_match(lo, ro, correspondence) && expressions_match(lk, rk, correspondence)
        }
        _ => false,
    }
}

/// Compares two traces statement by statement, threading one variable
/// correspondence through the whole comparison.
#[must_use]
pub fn traces_match(left: &Trace, right: &Trace) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut correspondence = VariableCorrespondence::new();
    left.statements()
        .iter()
        .zip(right.statements())
        .all(|(l, r)| statements_match(l, r, &mut correspondence))
}

#[cfg(test)]
mod test {
    use crate::ir::{
        expression::{Expression, VariableSource},
        matching::{traces_match, VariableCorrespondence},
        statement::Statement,
        trace::Trace,
    };

    fn field(key: &str) -> Expression {
        Expression::field(Expression::argument(0), Expression::constant(key))
    }

    #[test]
    fn alpha_renamed_locals_are_equal() {
        let mut source = VariableSource::new();
        let (a, b) = (source.fresh(None), source.fresh(None));

        let left = Trace::from_statements(vec![
            Statement::declare(Expression::variable(a.clone()), field("x")),
            Statement::ret(Expression::variable(a)),
        ]);
        let right = Trace::from_statements(vec![
            Statement::declare(Expression::variable(b.clone()), field("x")),
            Statement::ret(Expression::variable(b)),
        ]);

        assert!(traces_match(&left, &right));
    }

    #[test]
    fn distinct_variables_never_unify_with_one() {
        let mut source = VariableSource::new();
        let (a, b, c) = (source.fresh(None), source.fresh(None), source.fresh(None));

        // Left binds two distinct variables; right re-uses one.
        let left = Trace::from_statements(vec![
            Statement::declare(Expression::variable(a.clone()), field("x")),
            Statement::declare(Expression::variable(b.clone()), field("y")),
            Statement::ret(Expression::variable(b)),
        ]);
        let right = Trace::from_statements(vec![
            Statement::declare(Expression::variable(c.clone()), field("x")),
            Statement::declare(Expression::variable(c.clone()), field("y")),
            Statement::ret(Expression::variable(c)),
        ]);

        assert!(!traces_match(&left, &right));
    }

    #[test]
    fn correspondence_is_bijective() {
        let mut correspondence = VariableCorrespondence::new();
        assert!(correspondence.unify(0, 10));
        assert!(correspondence.unify(0, 10));
        assert!(!correspondence.unify(0, 11));
        assert!(!correspondence.unify(1, 10));
        assert!(correspondence.unify(1, 11));
    }

    #[test]
    fn differing_argument_indices_do_not_match() {
        let left = Trace::from_statements(vec![Statement::ret(Expression::argument(0))]);
        let right = Trace::from_statements(vec![Statement::ret(Expression::argument(1))]);
        assert!(!traces_match(&left, &right));
    }
}
