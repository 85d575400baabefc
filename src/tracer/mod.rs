//! This module contains the instrumentation layer: it executes an oracle
//! once under observation and produces a symbolic trace of what the oracle
//! did to its arguments.
//!
//! Recording is dynamic instrumentation, not static analysis: the oracle
//! genuinely runs, against a private deep clone of the provided inputs, and
//! every modelled field operation it performs is captured as a statement
//! over access paths rooted in the arguments.

pub mod context;

pub use context::{PrestateExpression, RecordingContext};

use crate::{
    error,
    oracle::{heap::Heap, value::Value, Oracle},
};

/// Records a trace for the given `oracle` applied to `args`.
///
/// In `extended` mode, intermediate results (the value of every field
/// read, and the old value of every field write and delete) are
/// additionally stored in fresh local variables. This is used to make
/// program generation easier.
///
/// The caller's `heap` and `args` are deep-cloned before the call; the
/// originals are never mutated.
///
/// # Errors
///
/// Returns [`Err`] if the recording machinery fails a consistency check or
/// if the oracle is malformed. Ordinary runtime errors thrown by the
/// oracle are *not* errors; they are captured in the trace as `Throw`
/// outcomes.
pub fn record(
    oracle: &dyn Oracle,
    heap: &Heap,
    args: &[Value],
    extended: bool,
) -> error::Result<RecordingContext> {
    let mut ctx = RecordingContext::new(extended, args.len());

    let mut instrumented_args = Vec::with_capacity(args.len());
    for (index, arg) in args.iter().enumerate() {
        let local = ctx.import_argument(arg, heap);
        let bound = ctx.bind_argument(index, local)?;
        instrumented_args.push(bound);
    }

    let outcome = oracle.call(&mut ctx, &instrumented_args);
    ctx.finish(outcome)?;

    Ok(ctx)
}

#[cfg(test)]
mod test {
    use crate::{
        ir::{expression::Expression, statement::Statement},
        oracle::{
            env::Environment,
            heap::{Heap, Object},
            value::{PropKey, Value},
            Fault, FnOracle, RuntimeErrorKind,
        },
        tracer::record,
    };

    fn field(index: usize, key: &str) -> Expression {
        Expression::field(Expression::argument(index), Expression::constant(key))
    }

    /// The oracle `f(o) { o.x = o.y; return o.x }`.
    fn copy_field_oracle() -> FnOracle {
        FnOracle::new(1, |env, args| {
            let y = env.get(&args[0], &PropKey::from("y"))?;
            env.set(&args[0], &PropKey::from("x"), y)?;
            env.get(&args[0], &PropKey::from("x"))
        })
    }

    fn heap_with_y(value: i64) -> (Heap, Vec<Value>) {
        let mut heap = Heap::new();
        let o = heap.alloc(Object::record_from(vec![("y".into(), Value::Int(value))]));
        (heap, vec![Value::Ref(o)])
    }

    #[test]
    fn field_copy_records_argument_relative_paths() -> anyhow::Result<()> {
        let (heap, args) = heap_with_y(5);
        let ctx = record(&copy_field_oracle(), &heap, &args, false)?;

        let expected = vec![
            Statement::assign(field(0, "x"), field(0, "y")),
            Statement::ret(field(0, "x")),
        ];
        assert_eq!(ctx.trace().statements(), expected.as_slice());

        Ok(())
    }

    #[test]
    fn primitive_arguments_are_never_wrapped() -> anyhow::Result<()> {
        let identity = FnOracle::new(1, |_, args| Ok(args[0].clone()));
        let ctx = record(&identity, &Heap::new(), &[Value::Int(5)], false)?;

        assert_eq!(
            ctx.access_path(&Value::Int(5)),
            Some(Expression::argument(0))
        );
        assert_eq!(
            ctx.trace().statements(),
            &[Statement::ret(Expression::argument(0))]
        );

        Ok(())
    }

    #[test]
    fn array_pop_models_the_read_but_not_the_shrink() -> anyhow::Result<()> {
        let pop = FnOracle::new(1, |env, args| env.invoke(&args[0], "pop", &[]));
        let mut heap = Heap::new();
        let a = heap.alloc(Object::array(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
        ]));
        let ctx = record(&pop, &heap, &[Value::Ref(a)], true)?;

        // The read of index 2 is observable; the shrink is not modelled and
        // the returned value is not claimed to flow from the array.
        let stmts = ctx.trace().statements();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(
            &stmts[0],
            Statement::Assign {
                is_declaration: true,
                rhs,
                ..
            } if *rhs == Expression::field(Expression::argument(0), Expression::constant(2i64))
        ));
        assert_eq!(stmts[1], Statement::ret(Expression::constant(3i64)));
        assert!(!ctx.diagnostics().is_empty());

        Ok(())
    }

    #[test]
    fn extended_mode_snapshots_overwritten_values() -> anyhow::Result<()> {
        let (heap, args) = heap_with_y(5);
        let ctx = record(&copy_field_oracle(), &heap, &args, true)?;

        // Reads of `y` and `x` bind locals, and the write to `x` snapshots
        // the old value first.
        let stmts = ctx.trace().statements();
        assert_eq!(stmts.len(), 5);
        assert!(matches!(
            &stmts[1],
            Statement::Assign {
                is_declaration: true,
                ..
            }
        ));
        assert!(matches!(
            &stmts[2],
            Statement::Assign {
                is_declaration: false,
                ..
            }
        ));

        Ok(())
    }

    #[test]
    fn nested_objects_get_variable_rooted_paths() -> anyhow::Result<()> {
        let reach_through = FnOracle::new(1, |env, args| {
            let inner = env.get(&args[0], &PropKey::from("g"))?;
            env.get(&inner, &PropKey::from("h"))
        });

        let mut heap = Heap::new();
        let inner = heap.alloc(Object::record_from(vec![("h".into(), Value::Int(7))]));
        let outer = heap.alloc(Object::record_from(vec![("g".into(), Value::Ref(inner))]));
        let ctx = record(&reach_through, &heap, &[Value::Ref(outer)], false)?;

        let stmts = ctx.trace().statements();
        assert_eq!(stmts.len(), 2);
        // The nested read is rooted in the local bound by the outer read.
        let Statement::Assign { lhs, .. } = &stmts[0] else {
            panic!("expected the outer read to bind a local");
        };
        assert_eq!(
            stmts[1],
            Statement::ret(Expression::field(lhs.clone(), Expression::constant("h")))
        );

        Ok(())
    }

    #[test]
    fn thrown_runtime_errors_become_throw_statements() -> anyhow::Result<()> {
        let thrower = FnOracle::new(0, |_, _| {
            Err(Fault::runtime_error(
                RuntimeErrorKind::Type,
                "o is not an object",
            ))
        });
        let ctx = record(&thrower, &Heap::new(), &[], false)?;

        assert_eq!(
            ctx.trace().statements(),
            &[Statement::throw(Expression::constant("o is not an object"))]
        );

        Ok(())
    }

    #[test]
    fn malformed_oracles_are_fatal() {
        let malformed = FnOracle::new(0, |_, _| Err(Fault::Malformed("unbalanced body".into())));
        let result = record(&malformed, &Heap::new(), &[], false);
        assert!(result.is_err());
    }

    #[test]
    fn missing_properties_are_forwarded_unmodeled() -> anyhow::Result<()> {
        let read_missing = FnOracle::new(1, |env, args| env.get(&args[0], &PropKey::from("nope")));
        let mut heap = Heap::new();
        let o = heap.alloc(Object::record());
        let ctx = record(&read_missing, &heap, &[Value::Ref(o)], false)?;

        assert_eq!(
            ctx.trace().statements(),
            &[Statement::ret(Expression::constant(Value::Undefined))]
        );
        assert_eq!(ctx.diagnostics().len(), 1);

        Ok(())
    }

    #[test]
    fn deletes_are_recorded() -> anyhow::Result<()> {
        let deleter = FnOracle::new(1, |env, args| {
            env.delete(&args[0], &PropKey::from("x"))?;
            Ok(Value::Undefined)
        });
        let mut heap = Heap::new();
        let o = heap.alloc(Object::record_from(vec![("x".into(), Value::Int(1))]));
        let ctx = record(&deleter, &heap, &[Value::Ref(o)], false)?;

        assert_eq!(
            ctx.trace().statements()[0],
            Statement::delete(Expression::argument(0), Expression::constant("x"))
        );

        Ok(())
    }

    #[test]
    fn recording_does_not_mutate_the_callers_heap() -> anyhow::Result<()> {
        let (heap, args) = heap_with_y(5);
        let before = heap.clone();
        record(&copy_field_oracle(), &heap, &args, false)?;

        assert_eq!(heap, before);

        Ok(())
    }
}
