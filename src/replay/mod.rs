//! This module contains the candidate executor: it turns a [`Program`]
//! back into a callable so that candidates can be replayed for
//! verification and re-traced for scoring.
//!
//! A compiled candidate is itself an [`Oracle`]: it performs every field
//! operation through the environment it is handed, so running it under the
//! tracer yields a trace exactly as for a real oracle, and running it
//! under a direct environment yields its concrete behaviour. Re-tracing a
//! compiled candidate on the same inputs is deterministic; candidates have
//! no effects beyond their literal statement list.

use std::collections::HashMap;

use crate::{
    error::{container::Locatable, replay::Error},
    ir::{expression::Expression, program::Program, statement::Statement},
    oracle::{
        env::Environment,
        value::{PropKey, Value},
        Fault, Oracle, Outcome, RuntimeErrorKind, Thrown,
    },
};

/// Compiles `program` into a callable of matching arity.
#[must_use]
pub fn compile(program: &Program) -> CompiledProgram {
    CompiledProgram {
        program: program.clone(),
    }
}

/// A program compiled into callable form.
///
/// The implementation interprets the statement list directly; from the
/// contract's viewpoint this is equivalent to rendering the program to
/// source and invoking it.
#[derive(Clone, Debug)]
pub struct CompiledProgram {
    program: Program,
}

impl Oracle for CompiledProgram {
    fn arity(&self) -> usize {
        self.program.arity()
    }

    fn call(&self, env: &mut dyn Environment, args: &[Value]) -> Outcome {
        let mut locals: HashMap<usize, Value> = HashMap::new();

        for (index, statement) in self.program.statements().iter().enumerate() {
            match statement {
                Statement::Assign { lhs, rhs, .. } => {
                    let value = eval(rhs, env, args, &locals)?;
                    match lhs {
                        Expression::Variable { var } => {
                            locals.insert(var.id(), value);
                        }
                        Expression::Field { object, key } => {
                            let target = eval(object, env, args, &locals)?;
                            let key = prop_key(eval(key, env, args, &locals)?);
                            env.set(&target, &key, value)?;
                        }
                        other => {
                            return Err(Fault::Internal(
                                Error::InvalidAssignmentTarget {
                                    expression: other.to_string(),
                                }
                                .at_step(index)
                                .into(),
                            ));
                        }
                    }
                }
                Statement::Return { value } => {
                    return eval(value, env, args, &locals);
                }
                Statement::Throw { value } => {
                    let thrown = eval(value, env, args, &locals)?;
                    return Err(Fault::Throw(Thrown::Value(thrown)));
                }
                Statement::DeleteProperty { object, key } => {
                    let target = eval(object, env, args, &locals)?;
                    let key = prop_key(eval(key, env, args, &locals)?);
                    env.delete(&target, &key)?;
                }
            }
        }

        // Falling off the end of the statement list returns the absent
        // value, matching the convention of the functions under study.
        Ok(Value::Undefined)
    }
}

/// Evaluates `expression` against the argument and local bindings.
fn eval(
    expression: &Expression,
    env: &mut dyn Environment,
    args: &[Value],
    locals: &HashMap<usize, Value>,
) -> Outcome {
    match expression {
        // Missing arguments read as the absent value rather than failing.
        Expression::Argument { index } => Ok(args.get(*index).cloned().unwrap_or(Value::Undefined)),
        Expression::Constant { value } => Ok(value.clone()),
        Expression::Variable { var } => {
            locals.get(&var.id()).cloned().ok_or_else(|| {
                Fault::runtime_error(
                    RuntimeErrorKind::Reference,
                    format!("{var} is not defined"),
                )
            })
        }
        Expression::Field { object, key } => {
            let target = eval(object, env, args, locals)?;
            let key = prop_key(eval(key, env, args, locals)?);
            env.get(&target, &key)
        }
    }
}

/// Converts an evaluated key value into a property key.
fn prop_key(value: Value) -> PropKey {
    match value {
        Value::Str(name) => PropKey::Name(name),
        Value::Int(index) if index >= 0 => PropKey::Index(index as usize),
        other => PropKey::Name(other.to_string()),
    }
}
