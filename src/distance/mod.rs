//! This module contains the graded dissimilarity measure between two
//! traces, used as the objective of the local search.
//!
//! The measure is computed in two layers. First the traces are reduced to
//! their skeletons and aligned by a longest-common-subsequence diff; every
//! statement that falls outside the aligned (equal) ranges counts as a
//! full structural mismatch. Then, within the aligned ranges, a bounded
//! micro-distance compares the aligned statement pairs value by value. The
//! two layers are combined with fixed weights chosen so that structural
//! correctness always dominates value-level correctness.

use similar::{capture_diff_slices, Algorithm, DiffOp};

use crate::{
    constant::{DISTANCE_NORM, MISMATCH_PENALTY, SKELETON_WEIGHT, VALUE_WEIGHT},
    ir::{
        expression::Expression,
        matching::VariableCorrespondence,
        statement::Statement,
        trace::Trace,
    },
    oracle::value::Value,
};

/// Computes the graded distance between the `real` trace and a
/// `candidate` trace.
///
/// The result is non-negative, and zero exactly when the two traces have
/// identical skeletons and every aligned statement pair is value-identical
/// (up to a consistent renaming of local variables). Degenerate inputs
/// (an empty real trace, or an alignment with no compared statements) make
/// the corresponding term contribute its maximum penalty rather than
/// dividing by zero.
#[must_use]
pub fn distance(real: &Trace, candidate: &Trace) -> f64 {
    let real_skeleton = real.skeleton();
    let candidate_skeleton = candidate.skeleton();
    let ops = capture_diff_slices(Algorithm::Myers, &real_skeleton, &candidate_skeleton);

    // One correspondence is threaded through the entire alignment so that
    // variable pairings established in an early range constrain later
    // ranges.
    let mut correspondence = VariableCorrespondence::new();
    let mut mismatched = 0usize;
    let mut micro = 0.0;
    let mut compared = 0usize;

    for op in ops {
        match op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => {
                for offset in 0..len {
                    let left = &real.statements()[old_index + offset];
                    let right = &candidate.statements()[new_index + offset];
                    micro += statement_distance(left, right, &mut correspondence);
                    compared += 1;
                }
            }
            DiffOp::Delete { old_len, .. } => mismatched += old_len,
            DiffOp::Insert { new_len, .. } => mismatched += new_len,
            DiffOp::Replace {
                old_len, new_len, ..
            } => mismatched += old_len + new_len,
        }
    }

    let skeleton_term = if real_skeleton.is_empty() {
        MISMATCH_PENALTY
    } else {
        mismatched as f64 / real_skeleton.len() as f64
    };
    let value_term = if compared == 0 {
        MISMATCH_PENALTY
    } else {
        micro / compared as f64
    };

    SKELETON_WEIGHT * skeleton_term + VALUE_WEIGHT * value_term
}

/// Computes the micro-distance between two statements of identical
/// skeleton, in `[0, MISMATCH_PENALTY]`.
fn statement_distance(
    real: &Statement,
    candidate: &Statement,
    correspondence: &mut VariableCorrespondence,
) -> f64 {
    match (real, candidate) {
        (
            Statement::Assign {
                lhs: ll, rhs: lr, ..
            },
            Statement::Assign {
                lhs: rl, rhs: rr, ..
            },
        ) => {
            expression_distance(ll, rl, correspondence) / 2.0
                + expression_distance(lr, rr, correspondence) / 2.0
        }
        (Statement::Return { value: l }, Statement::Return { value: r })
        | (Statement::Throw { value: l }, Statement::Throw { value: r }) => {
            expression_distance(l, r, correspondence)
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
            expression_distance(lo, ro, correspondence) / 2.0
                + expression_distance(lk, rk, correspondence) / 2.0
        }
        // Statements of different kinds never share a skeleton atom; if
        // they are compared directly they are simply fully mismatched.
        _ => MISMATCH_PENALTY,
    }
}

/// Computes the micro-distance between two expressions, in
/// `[0, MISMATCH_PENALTY]`.
fn expression_distance(
    real: &Expression,
    candidate: &Expression,
    correspondence: &mut VariableCorrespondence,
) -> f64 {
    match (real, candidate) {
        (Expression::Argument { index: l }, Expression::Argument { index: r }) => {
            if l == r {
                0.0
            } else {
                MISMATCH_PENALTY
            }
        }
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
            expression_distance(lo, ro, correspondence) / 2.0
                + expression_distance(lk, rk, correspondence) / 2.0
        }
        (Expression::Constant { value: l }, Expression::Constant { value: r }) => {
            constant_distance(l, r)
        }
        (Expression::Variable { var: l }, Expression::Variable { var: r }) => {
            if correspondence.unify(l.id(), r.id()) {
                0.0
            } else {
                MISMATCH_PENALTY
            }
        }
        _ => MISMATCH_PENALTY,
    }
}

/// Computes the micro-distance between two constants.
///
/// Numeric constants contribute their normalised absolute difference,
/// capped at the full penalty; any other mismatch, such as differing
/// runtime tags or unrelated strings, contributes the full penalty
/// outright.
fn constant_distance(real: &Value, candidate: &Value) -> f64 {
    if real == candidate {
        return 0.0;
    }
    match (real, candidate) {
        (Value::Int(l), Value::Int(r)) => {
            let difference = (*l as f64 - *r as f64).abs();
            (difference.min(DISTANCE_NORM) / DISTANCE_NORM) * MISMATCH_PENALTY
        }
        _ => MISMATCH_PENALTY,
    }
}
