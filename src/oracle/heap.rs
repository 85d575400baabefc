//! This module contains the arena that owns all objects in an oracle's
//! world, together with deep cloning and structural comparison across
//! arenas.
//!
//! # Identity
//!
//! Objects are identified by their arena index ([`Ref`]), never by their
//! contents. Access paths, candidate lists and the instrumentation mapping
//! are all keyed on that identity, which makes aliased and cyclic object
//! graphs unproblematic: a cycle is just an index that is reachable from
//! itself.

use std::collections::{HashMap, HashSet};

use crate::oracle::value::{PropKey, Ref, Value};

/// The arena that owns every object reachable during one execution.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Heap {
    entries: Vec<HeapEntry>,
}

/// A single slot in the heap arena.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HeapEntry {
    /// A concrete object.
    Object(Object),

    /// An instrumented stand-in for `target`, allocated by the tracer.
    ///
    /// Probes exist only inside the private heap of a recording; the heaps
    /// handed to the library by callers never contain them.
    Probe { target: Ref },
}

impl Heap {
    /// Creates a new heap containing no objects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `object` in the arena and returns its reference.
    pub fn alloc(&mut self, object: Object) -> Ref {
        let r = Ref::new(self.entries.len());
        self.entries.push(HeapEntry::Object(object));
        r
    }

    /// Allocates an instrumented stand-in for `target` and returns its
    /// reference.
    pub fn alloc_probe(&mut self, target: Ref) -> Ref {
        let r = Ref::new(self.entries.len());
        self.entries.push(HeapEntry::Probe { target });
        r
    }

    /// Checks whether `r` names an instrumented stand-in.
    #[must_use]
    pub fn is_probe(&self, r: Ref) -> bool {
        matches!(self.entries.get(r.index()), Some(HeapEntry::Probe { .. }))
    }

    /// Follows `r` through at most one level of instrumentation to the
    /// reference of the underlying concrete object.
    #[must_use]
    pub fn resolve(&self, r: Ref) -> Ref {
        match self.entries.get(r.index()) {
            Some(HeapEntry::Probe { target }) => *target,
            _ => r,
        }
    }

    /// Gets the concrete object behind `r`, following instrumentation.
    #[must_use]
    pub fn object(&self, r: Ref) -> Option<&Object> {
        let r = self.resolve(r);
        match self.entries.get(r.index()) {
            Some(HeapEntry::Object(o)) => Some(o),
            _ => None,
        }
    }

    /// Gets the concrete object behind `r` mutably, following
    /// instrumentation.
    pub fn object_mut(&mut self, r: Ref) -> Option<&mut Object> {
        let r = self.resolve(r);
        match self.entries.get_mut(r.index()) {
            Some(HeapEntry::Object(o)) => Some(o),
            _ => None,
        }
    }

    /// Deep-clones `value` out of `source` into this heap, returning the
    /// corresponding value rooted here.
    ///
    /// Instrumented stand-ins in the source are resolved to their targets,
    /// so the imported graph is always concrete. Aliasing and cycles are
    /// preserved via the identity map built during the walk.
    pub fn import(&mut self, value: &Value, source: &Heap) -> Value {
        let mut seen = HashMap::new();
        self.import_inner(value, source, &mut seen)
    }

    fn import_inner(&mut self, value: &Value, source: &Heap, seen: &mut HashMap<Ref, Ref>) -> Value {
        let Some(r) = value.as_reference() else {
            return value.clone();
        };
        let r = source.resolve(r);
        if let Some(copied) = seen.get(&r) {
            return Value::Ref(*copied);
        }

        // Allocate the clone before walking children so that cycles find it
        // in the identity map.
        let placeholder = match source.object(r) {
            Some(Object::Array(_)) => Object::Array(Vec::new()),
            _ => Object::Record(Vec::new()),
        };
        let copied = self.alloc(placeholder);
        seen.insert(r, copied);

        let rebuilt = match source.object(r) {
            Some(Object::Record(properties)) => {
                let properties = properties
                    .clone()
                    .into_iter()
                    .map(|(name, v)| (name, self.import_inner(&v, source, seen)))
                    .collect();
                Object::Record(properties)
            }
            Some(Object::Array(elements)) => {
                let elements = elements
                    .clone()
                    .into_iter()
                    .map(|v| self.import_inner(&v, source, seen))
                    .collect();
                Object::Array(elements)
            }
            None => Object::Record(Vec::new()),
        };
        if let Some(HeapEntry::Object(slot)) = self.entries.get_mut(copied.index()) {
            *slot = rebuilt;
        }

        Value::Ref(copied)
    }

    /// Compares `a` (rooted in this heap) with `b` (rooted in `other`)
    /// structurally.
    ///
    /// Primitives compare by value; objects compare by kind, key set and
    /// element-wise structural equality. Revisited reference pairs are
    /// assumed equal, which terminates the walk on cyclic graphs.
    #[must_use]
    pub fn structurally_eq(&self, a: &Value, other: &Heap, b: &Value) -> bool {
        let mut assumed = HashSet::new();
        self.structurally_eq_inner(a, other, b, &mut assumed)
    }

    fn structurally_eq_inner(
        &self,
        a: &Value,
        other: &Heap,
        b: &Value,
        assumed: &mut HashSet<(usize, usize)>,
    ) -> bool {
        match (a, b) {
            (Value::Ref(ra), Value::Ref(rb)) => {
                let ra = self.resolve(*ra);
                let rb = other.resolve(*rb);
                if !assumed.insert((ra.index(), rb.index())) {
                    return true;
                }
                match (self.object(ra), other.object(rb)) {
                    (Some(Object::Record(pa)), Some(Object::Record(pb))) => {
                        pa.len() == pb.len()
                            && pa.iter().zip(pb).all(|((ka, va), (kb, vb))| {
                                ka == kb && self.structurally_eq_inner(va, other, vb, assumed)
                            })
                    }
                    (Some(Object::Array(ea)), Some(Object::Array(eb))) => {
                        ea.len() == eb.len()
                            && ea
                                .iter()
                                .zip(eb)
                                .all(|(va, vb)| self.structurally_eq_inner(va, other, vb, assumed))
                    }
                    _ => false,
                }
            }
            (a, b) => a == b,
        }
    }
}

/// A concrete object in the oracle's world.
///
/// Records keep their properties in insertion order, matching the
/// enumeration behaviour the oracle would observe in its source language.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Object {
    /// A keyed collection of named properties.
    Record(Vec<(String, Value)>),

    /// A sequence of elements.
    Array(Vec<Value>),
}

impl Object {
    /// Creates an empty record.
    #[must_use]
    pub fn record() -> Self {
        Self::Record(Vec::new())
    }

    /// Creates a record from the provided named properties.
    #[must_use]
    pub fn record_from(properties: impl Into<Vec<(String, Value)>>) -> Self {
        Self::Record(properties.into())
    }

    /// Creates an array from the provided elements.
    #[must_use]
    pub fn array(elements: impl Into<Vec<Value>>) -> Self {
        Self::Array(elements.into())
    }

    /// Reads the own property stored under `key`, if present.
    ///
    /// On arrays, the element count is exposed under
    /// [`crate::constant::ARRAY_LENGTH_PROPERTY`].
    #[must_use]
    pub fn get(&self, key: &PropKey) -> Option<Value> {
        match (self, key) {
            (Self::Record(properties), PropKey::Name(name)) => properties
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            (Self::Array(elements), PropKey::Index(index)) => elements.get(*index).cloned(),
            (Self::Array(elements), PropKey::Name(name))
                if name == crate::constant::ARRAY_LENGTH_PROPERTY =>
            {
                Some(Value::Int(elements.len() as i64))
            }
            _ => None,
        }
    }

    /// Writes `value` under `key`, creating the property if necessary.
    ///
    /// Writing past the end of an array fills the gap with
    /// [`Value::Undefined`], as an oracle in the source language would
    /// observe.
    pub fn set(&mut self, key: &PropKey, value: Value) {
        match (self, key) {
            (Self::Record(properties), key) => {
                let name = match key {
                    PropKey::Name(name) => name.clone(),
                    PropKey::Index(index) => index.to_string(),
                };
                if let Some(slot) = properties.iter_mut().find(|(n, _)| *n == name) {
                    slot.1 = value;
                } else {
                    properties.push((name, value));
                }
            }
            (Self::Array(elements), PropKey::Index(index)) => {
                while elements.len() <= *index {
                    elements.push(Value::Undefined);
                }
                elements[*index] = value;
            }
            (Self::Array(_), PropKey::Name(_)) => {
                // Named properties on arrays (beyond `length`) are not part
                // of the modelled domain; the write is dropped.
            }
        }
    }

    /// Deletes the own property stored under `key`, reporting whether it
    /// was present.
    ///
    /// Deleting an array element leaves a hole rather than shifting later
    /// elements.
    pub fn delete(&mut self, key: &PropKey) -> bool {
        match (self, key) {
            (Self::Record(properties), PropKey::Name(name)) => {
                let before = properties.len();
                properties.retain(|(n, _)| n != name);
                properties.len() != before
            }
            (Self::Array(elements), PropKey::Index(index)) => {
                if let Some(slot) = elements.get_mut(*index) {
                    *slot = Value::Undefined;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Checks whether an own property exists under `key`.
    #[must_use]
    pub fn has(&self, key: &PropKey) -> bool {
        self.get(key).is_some()
    }

    /// Lists the own property keys of the object in storage order.
    #[must_use]
    pub fn keys(&self) -> Vec<PropKey> {
        match self {
            Self::Record(properties) => properties
                .iter()
                .map(|(name, _)| PropKey::Name(name.clone()))
                .collect(),
            Self::Array(elements) => (0..elements.len()).map(PropKey::Index).collect(),
        }
    }

    /// Gets the element count of an array, or [`None`] for records.
    #[must_use]
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Self::Array(elements) => Some(elements.len()),
            Self::Record(_) => None,
        }
    }
}
