//! This module contains the equivalence verifier: the check that a
//! candidate program reproduces the oracle's behaviour on one concrete
//! input.
//!
//! The oracle and the compiled candidate run on independently deep-copied
//! inputs; the verifier then compares how the two calls terminated, what
//! they produced, and what they did to their arguments. Any mismatch is
//! purely a negative answer; verification never treats a wrong candidate
//! as an error.

use crate::{
    error,
    ir::program::Program,
    oracle::{
        env::DirectEnvironment,
        heap::Heap,
        value::Value,
        Fault, Oracle, Outcome, Thrown,
    },
    replay::compile,
};

pub use crate::ir::matching::traces_match;

/// Decides whether `candidate` models the behaviour of `oracle` on the
/// provided concrete arguments.
///
/// Both functions run against their own deep copy of `heap`/`args`, so
/// neither can influence the other and the caller's data is untouched.
/// The candidate models the oracle when both calls terminate the same way
/// (return or throw), the produced values are structurally equal, and
/// every argument ends in a structurally equal state.
///
/// # Errors
///
/// Returns [`Err`] only for internal faults or a malformed oracle; a
/// candidate that merely behaves differently yields `Ok(false)`.
pub fn is_model(
    candidate: &Program,
    oracle: &dyn Oracle,
    heap: &Heap,
    args: &[Value],
) -> error::Result<bool> {
    let (mut oracle_heap, oracle_args) = copy_inputs(heap, args);
    let (mut candidate_heap, candidate_args) = copy_inputs(heap, args);

    let oracle_outcome = oracle.call(
        &mut DirectEnvironment::new(&mut oracle_heap),
        &oracle_args,
    );
    let candidate_outcome = compile(candidate).call(
        &mut DirectEnvironment::new(&mut candidate_heap),
        &candidate_args,
    );

    let produced_match = match (check(oracle_outcome)?, check(candidate_outcome)?) {
        (Ok(left), Ok(right)) => oracle_heap.structurally_eq(&left, &candidate_heap, &right),
        (Err(left), Err(right)) => thrown_eq(&oracle_heap, &left, &candidate_heap, &right),
        _ => false,
    };
    if !produced_match {
        return Ok(false);
    }

    // Any mutation the oracle performed on its arguments must be
    // reproduced by the candidate.
    let arguments_match = oracle_args
        .iter()
        .zip(&candidate_args)
        .all(|(left, right)| oracle_heap.structurally_eq(left, &candidate_heap, right));

    Ok(arguments_match)
}

/// Separates legitimate outcomes from tool failures.
fn check(outcome: Outcome) -> error::Result<std::result::Result<Value, Thrown>> {
    match outcome {
        Ok(value) => Ok(Ok(value)),
        Err(Fault::Throw(thrown)) => Ok(Err(thrown)),
        Err(Fault::Internal(error)) => Err(error),
        Err(Fault::Malformed(message)) => {
            Err(error::Error::other(format!("malformed oracle: {message}")))
        }
    }
}

fn thrown_eq(left_heap: &Heap, left: &Thrown, right_heap: &Heap, right: &Thrown) -> bool {
    match (left, right) {
        (
            Thrown::Error {
                kind: lk,
                message: lm,
            },
            Thrown::Error {
                kind: rk,
                message: rm,
            },
        ) => lk == rk && lm == rm,
        (Thrown::Value(l), Thrown::Value(r)) => left_heap.structurally_eq(l, right_heap, r),
        // A thrown runtime error and a thrown string carrying the same
        // message still terminate the call identically from the caller's
        // point of view.
        (Thrown::Error { message, .. }, Thrown::Value(Value::Str(s)))
        | (Thrown::Value(Value::Str(s)), Thrown::Error { message, .. }) => message == s,
        _ => false,
    }
}

fn copy_inputs(heap: &Heap, args: &[Value]) -> (Heap, Vec<Value>) {
    let mut copy = Heap::new();
    let args = args.iter().map(|a| copy.import(a, heap)).collect();
    (copy, args)
}

#[cfg(test)]
mod test {
    use crate::{
        ir::{expression::Expression, program::Program, statement::Statement, trace::Trace},
        oracle::{
            env::Environment,
            heap::{Heap, Object},
            value::{PropKey, Value},
            FnOracle,
        },
        tracer::record,
        verify::is_model,
    };

    fn field(key: &str) -> Expression {
        Expression::field(Expression::argument(0), Expression::constant(key))
    }

    fn copy_field_oracle() -> FnOracle {
        FnOracle::new(1, |env, args| {
            let y = env.get(&args[0], &PropKey::from("y"))?;
            env.set(&args[0], &PropKey::from("x"), y)?;
            env.get(&args[0], &PropKey::from("x"))
        })
    }

    fn input() -> (Heap, Vec<Value>) {
        let mut heap = Heap::new();
        let o = heap.alloc(Object::record_from(vec![("y".into(), Value::Int(5))]));
        (heap, vec![Value::Ref(o)])
    }

    #[test]
    fn the_recorded_program_models_its_oracle() -> anyhow::Result<()> {
        let oracle = copy_field_oracle();
        let (heap, args) = input();

        let program = record(&oracle, &heap, &args, false)?.program();
        assert!(is_model(&program, &oracle, &heap, &args)?);

        Ok(())
    }

    #[test]
    fn a_candidate_missing_the_mutation_is_rejected() -> anyhow::Result<()> {
        let oracle = copy_field_oracle();
        let (heap, args) = input();

        // Returns the right value but never writes `x`.
        let candidate = Program::new(
            Trace::from_statements(vec![Statement::ret(field("y"))]),
            1,
        );
        assert!(!is_model(&candidate, &oracle, &heap, &args)?);

        Ok(())
    }

    #[test]
    fn a_candidate_with_the_wrong_return_is_rejected() -> anyhow::Result<()> {
        let oracle = copy_field_oracle();
        let (heap, args) = input();

        let candidate = Program::new(
            Trace::from_statements(vec![
                Statement::assign(field("x"), field("y")),
                Statement::ret(Expression::constant(99i64)),
            ]),
            1,
        );
        assert!(!is_model(&candidate, &oracle, &heap, &args)?);

        Ok(())
    }

    #[test]
    fn throwing_oracles_are_matched_by_throwing_candidates() -> anyhow::Result<()> {
        let oracle = FnOracle::new(0, |_, _| {
            Err(crate::oracle::Fault::runtime_error(
                crate::oracle::RuntimeErrorKind::Type,
                "bad input",
            ))
        });

        let throwing = Program::new(
            Trace::from_statements(vec![Statement::throw(Expression::constant("bad input"))]),
            0,
        );
        let returning = Program::new(
            Trace::from_statements(vec![Statement::ret(Expression::constant("bad input"))]),
            0,
        );

        assert!(is_model(&throwing, &oracle, &Heap::new(), &[])?);
        assert!(!is_model(&returning, &oracle, &Heap::new(), &[])?);

        Ok(())
    }
}
