//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use behavior_model_extractor::oracle::{
    env::Environment,
    heap::{Heap, Object},
    value::{PropKey, Value},
    FnOracle,
};

/// Builds the oracle `f(o) { o.x = o.y; return o.x }`.
#[allow(unused)] // It is actually
pub fn copy_field_oracle() -> FnOracle {
    FnOracle::new(1, |env, args| {
        let y = env.get(&args[0], &PropKey::from("y"))?;
        env.set(&args[0], &PropKey::from("x"), y)?;
        env.get(&args[0], &PropKey::from("x"))
    })
}

/// Builds a heap holding the single record argument `{y: <value>}`.
#[allow(unused)] // It is actually
pub fn record_with_y(value: i64) -> (Heap, Vec<Value>) {
    let mut heap = Heap::new();
    let o = heap.alloc(Object::record_from(vec![("y".into(), Value::Int(value))]));
    (heap, vec![Value::Ref(o)])
}

/// Builds the oracle `f(o) { o.x = 1; o.x = 2; o.x = 3; return 0 }`, whose
/// trace repeats one statement shape.
#[allow(unused)] // It is actually
pub fn repeated_write_oracle() -> FnOracle {
    FnOracle::new(1, |env, args| {
        for i in 1..=3i64 {
            env.set(&args[0], &PropKey::from("x"), Value::Int(i))?;
        }
        Ok(Value::Int(0))
    })
}
