//! This module contains the capability-limited interface through which an
//! oracle touches its argument objects, together with the direct
//! (un-instrumented) implementation of that interface.
//!
//! Routing every field operation through an explicit interface, rather
//! than intercepting arbitrary object access, is what lets the tracer
//! observe an execution and the verifier replay one, with the oracle code
//! unchanged between the two.

use crate::oracle::{
    heap::{Heap, Object},
    value::{PropKey, Value},
    Fault, Outcome, RuntimeErrorKind,
};

/// The field-operation interface handed to an executing oracle.
///
/// The modelled operations are property read, write and delete. Existence
/// checks, enumeration and invocation of array built-ins are available to
/// keep realistic oracles runnable, but implementations are free to leave
/// them unmodelled.
pub trait Environment {
    /// Reads the property `key` of `target`.
    ///
    /// Reading a property that does not exist yields [`Value::Undefined`].
    fn get(&mut self, target: &Value, key: &PropKey) -> Outcome;

    /// Writes `value` into the property `key` of `target`.
    fn set(&mut self, target: &Value, key: &PropKey, value: Value) -> Result<(), Fault>;

    /// Deletes the property `key` of `target`, yielding whether it existed.
    fn delete(&mut self, target: &Value, key: &PropKey) -> Result<bool, Fault>;

    /// Checks whether `target` has the property `key`.
    fn has(&mut self, target: &Value, key: &PropKey) -> Result<bool, Fault>;

    /// Lists the own property keys of `target`.
    fn keys(&mut self, target: &Value) -> Result<Vec<PropKey>, Fault>;

    /// Invokes the built-in `method` on `target` with `args`.
    fn invoke(&mut self, target: &Value, method: &str, args: &[Value]) -> Outcome;
}

/// The un-instrumented environment: operations act directly on the heap
/// and observe nothing.
#[derive(Debug)]
pub struct DirectEnvironment<'h> {
    heap: &'h mut Heap,
}

impl<'h> DirectEnvironment<'h> {
    /// Creates a direct environment over the provided `heap`.
    pub fn new(heap: &'h mut Heap) -> Self {
        Self { heap }
    }
}

impl Environment for DirectEnvironment<'_> {
    fn get(&mut self, target: &Value, key: &PropKey) -> Outcome {
        let r = target.as_reference().ok_or_else(|| Fault::not_an_object(target))?;
        let object = self.heap.object(r).ok_or_else(|| Fault::not_an_object(target))?;
        Ok(object.get(key).unwrap_or(Value::Undefined))
    }

    fn set(&mut self, target: &Value, key: &PropKey, value: Value) -> Result<(), Fault> {
        let r = target.as_reference().ok_or_else(|| Fault::not_an_object(target))?;
        let object = self
            .heap
            .object_mut(r)
            .ok_or_else(|| Fault::not_an_object(target))?;
        object.set(key, value);
        Ok(())
    }

    fn delete(&mut self, target: &Value, key: &PropKey) -> Result<bool, Fault> {
        let r = target.as_reference().ok_or_else(|| Fault::not_an_object(target))?;
        let object = self
            .heap
            .object_mut(r)
            .ok_or_else(|| Fault::not_an_object(target))?;
        Ok(object.delete(key))
    }

    fn has(&mut self, target: &Value, key: &PropKey) -> Result<bool, Fault> {
        let r = target.as_reference().ok_or_else(|| Fault::not_an_object(target))?;
        let object = self.heap.object(r).ok_or_else(|| Fault::not_an_object(target))?;
        Ok(object.has(key))
    }

    fn keys(&mut self, target: &Value) -> Result<Vec<PropKey>, Fault> {
        let r = target.as_reference().ok_or_else(|| Fault::not_an_object(target))?;
        let object = self.heap.object(r).ok_or_else(|| Fault::not_an_object(target))?;
        Ok(object.keys())
    }

    fn invoke(&mut self, target: &Value, method: &str, args: &[Value]) -> Outcome {
        let r = target.as_reference().ok_or_else(|| Fault::not_an_object(target))?;
        let object = self
            .heap
            .object_mut(r)
            .ok_or_else(|| Fault::not_an_object(target))?;
        match (object, method) {
            (Object::Array(elements), "pop") => {
                Ok(elements.pop().unwrap_or(Value::Undefined))
            }
            (Object::Array(elements), "push") => {
                elements.extend(args.iter().cloned());
                Ok(Value::Int(elements.len() as i64))
            }
            _ => Err(Fault::runtime_error(
                RuntimeErrorKind::Type,
                format!("{method} is not a function"),
            )),
        }
    }
}
