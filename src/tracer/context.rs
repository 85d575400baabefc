//! This module contains the recording context: the mutable state scoped to
//! exactly one top-level traced call.

use std::collections::HashMap;

use bimap::BiMap;
use itertools::Itertools;

use crate::{
    error::{
        container::Locatable,
        recording::{Diagnostic, Diagnostics, Error, Result},
    },
    ir::{
        expression::{Expression, Variable, VariableSource},
        program::Program,
        statement::Statement,
        trace::Trace,
    },
    oracle::{
        env::Environment,
        heap::{Heap, Object},
        value::{PropKey, Ref, Value},
        Fault, Outcome,
    },
};

/// The state accumulated while observing a single top-level call.
///
/// A context is created fresh for each call to [`crate::tracer::record`]
/// and owns everything the recording touches: a private deep clone of the
/// caller's heap, the bijective mapping between objects and their
/// instrumented stand-ins, the access-path and candidate bookkeeping, the
/// prestate, the trace itself and the buffered diagnostics.
///
/// Internal calls made by the oracle are observed through this same
/// context (instrumentation is transitive over the reachable object
/// graph), but the context is never shared between top-level calls.
#[derive(Debug)]
pub struct RecordingContext {
    /// Whether intermediate results (field reads, overwritten values) are
    /// additionally stored in fresh local variables.
    extended: bool,

    /// The arity of the traced call.
    arity: usize,

    /// The private heap of this recording.
    heap: Heap,

    /// The statements recorded so far.
    trace: Trace,

    /// The best-known access path for each reference.
    paths: HashMap<Ref, Expression>,

    /// Every expression that could explain a given value, most recent
    /// first.
    ///
    /// For primitives there is genuine uncertainty in whether an
    /// expression really was the source of the value or whether the two
    /// are equal by coincidence, which is why a list is kept instead of a
    /// single path.
    candidates: HashMap<Value, Vec<Expression>>,

    /// Prestate expressions in the order they were first read.
    prestate: Vec<PrestateExpression>,

    /// The prestate access path for each instrumented reference.
    ///
    /// A `Field` path computed mid-execution becomes stale once aliasing
    /// causes further mutation; these paths are valid in the state before
    /// any mutation and are the ones handed to input generation.
    prestate_refs: HashMap<Ref, Expression>,

    /// The bijective mapping between an object and its instrumented
    /// stand-in.
    instrumented: BiMap<Ref, Ref>,

    /// The source of fresh local variables for this recording.
    variables: VariableSource,

    /// Non-fatal notes about operations that were observed but not
    /// modelled.
    diagnostics: Diagnostics,

    /// The ordinal of the next intercepted operation.
    step: usize,
}

/// A prestate access path together with the value observed at it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PrestateExpression {
    expression: Expression,
    observed: Value,
}

impl PrestateExpression {
    /// Gets the access path, valid in the state before any mutation.
    #[must_use]
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Gets the value observed at the path during recording.
    #[must_use]
    pub fn observed(&self) -> &Value {
        &self.observed
    }
}

impl RecordingContext {
    /// Creates a fresh context for one call of the given `arity`.
    pub(crate) fn new(extended: bool, arity: usize) -> Self {
        Self {
            extended,
            arity,
            heap: Heap::new(),
            trace: Trace::new(),
            paths: HashMap::new(),
            candidates: HashMap::new(),
            prestate: Vec::new(),
            prestate_refs: HashMap::new(),
            instrumented: BiMap::new(),
            variables: VariableSource::new(),
            diagnostics: Diagnostics::new(),
            step: 0,
        }
    }

    /// Checks whether the recording ran in extended mode.
    #[must_use]
    pub fn extended(&self) -> bool {
        self.extended
    }

    /// Gets the trace recorded so far.
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Consumes the context, yielding the recorded trace.
    #[must_use]
    pub fn into_trace(self) -> Trace {
        self.trace
    }

    /// Packages the recorded trace as a candidate program of the traced
    /// call's arity.
    #[must_use]
    pub fn program(&self) -> Program {
        Program::new(self.trace.clone(), self.arity)
    }

    /// Gets the private heap of the recording.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Gets the non-fatal diagnostics buffered during the recording.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Gets the prestate expressions read during the recording, in first
    /// read order and deduplicated by path.
    #[must_use]
    pub fn prestate_expressions(&self) -> Vec<PrestateExpression> {
        self.prestate
            .iter()
            .unique_by(|p| p.expression.clone())
            .cloned()
            .collect()
    }

    /// Gets a handle on the variable pool of this recording.
    ///
    /// Clones share the pool, so identities drawn from the handle can
    /// never collide with variables already present in the trace.
    #[must_use]
    pub fn variable_source(&self) -> VariableSource {
        self.variables.clone()
    }

    /// Gets the expression currently believed to reproduce `value` from
    /// the arguments, if one is known.
    ///
    /// For references this is the registered access path; for primitives
    /// it is the most recently registered candidate expression, falling
    /// back to the literal constant.
    #[must_use]
    pub fn access_path(&self, value: &Value) -> Option<Expression> {
        match value {
            Value::Ref(r) => self.path_for(*r),
            primitive => Some(
                self.first_candidate(primitive)
                    .unwrap_or_else(|| Expression::constant(primitive.clone())),
            ),
        }
    }

    // --- argument setup, used by `record` ---------------------------------

    /// Deep-clones `value` out of the caller's `source` heap into this
    /// recording's private heap.
    pub(crate) fn import_argument(&mut self, value: &Value, source: &Heap) -> Value {
        self.heap.import(value, source)
    }

    /// Tags argument `index` with its path, prestate and candidate,
    /// wrapping reference arguments in an instrumented stand-in.
    pub(crate) fn bind_argument(&mut self, index: usize, value: Value) -> Result<Value> {
        let path = Expression::argument(index);
        let instrumented = match value.as_reference() {
            Some(r) => {
                let probe = self.wrap(r, self.step)?;
                self.set_path(probe, path.clone());
                Value::Ref(probe)
            }
            None => value,
        };
        self.add_prestate(&instrumented, path.clone());
        self.add_candidate(&instrumented, path);
        Ok(instrumented)
    }

    /// Records the termination of the call described by `outcome`.
    ///
    /// Ordinary thrown runtime errors become `Throw` statements; any other
    /// thrown value is resolved to its access path. A malformed oracle or
    /// an internal fault is fatal and propagates.
    pub(crate) fn finish(&mut self, outcome: Outcome) -> crate::error::Result<()> {
        use crate::oracle::Thrown;

        let step = self.next_step();
        match outcome {
            Ok(value) => {
                let path = self.path_expression(&value, step)?;
                self.record(Statement::ret(path));
                Ok(())
            }
            Err(Fault::Throw(Thrown::Error { kind: _, message })) => {
                self.record(Statement::throw(Expression::constant(Value::Str(message))));
                Ok(())
            }
            Err(Fault::Throw(Thrown::Value(value))) => {
                let path = self.path_expression(&value, step)?;
                self.record(Statement::throw(path));
                Ok(())
            }
            Err(Fault::Malformed(message)) => {
                Err(Error::MalformedOracle { message }.at_step(step).into())
            }
            Err(Fault::Internal(error)) => Err(error),
        }
    }

    // --- internal bookkeeping ---------------------------------------------

    fn next_step(&mut self) -> usize {
        let step = self.step;
        self.step += 1;
        step
    }

    fn note(&mut self, diagnostic: Diagnostic, step: usize) {
        self.diagnostics.add(diagnostic.at_step(step));
    }

    /// Resolves `r` to the instrumented side of the mapping, if it has
    /// one.
    fn probe_of(&self, r: Ref) -> Ref {
        if self.heap.is_probe(r) {
            return r;
        }
        self.instrumented.get_by_left(&r).copied().unwrap_or(r)
    }

    fn path_for(&self, r: Ref) -> Option<Expression> {
        if let Some(path) = self.paths.get(&r) {
            return Some(path.clone());
        }
        // Fall back to the counterpart of the instrumentation mapping.
        let counterpart = self
            .instrumented
            .get_by_left(&r)
            .or_else(|| self.instrumented.get_by_right(&r))?;
        self.paths.get(counterpart).cloned()
    }

    fn set_path(&mut self, r: Ref, path: Expression) {
        self.paths.insert(r, path);
    }

    /// Keys under which candidate lists are stored: references normalise
    /// to the underlying object so that a probe and its target share one
    /// list.
    fn candidate_key(&self, value: &Value) -> Value {
        match value.as_reference() {
            Some(r) => Value::Ref(self.heap.resolve(r)),
            None => value.clone(),
        }
    }

    fn add_candidate(&mut self, value: &Value, expression: Expression) {
        let key = self.candidate_key(value);
        self.candidates.entry(key).or_default().insert(0, expression);
    }

    fn first_candidate(&self, value: &Value) -> Option<Expression> {
        self.candidates
            .get(&self.candidate_key(value))
            .and_then(|c| c.first().cloned())
    }

    fn add_prestate(&mut self, value: &Value, expression: Expression) {
        self.prestate.push(PrestateExpression {
            expression: expression.clone(),
            observed: value.clone(),
        });
        if let Some(r) = value.as_reference() {
            self.prestate_refs.insert(self.probe_of(r), expression);
        }
    }

    fn prestate_for(&self, r: Ref) -> Option<Expression> {
        self.prestate_refs.get(&self.probe_of(r)).cloned()
    }

    /// Wraps the object `r` in an instrumented stand-in, or returns the
    /// existing stand-in if one is already registered.
    ///
    /// Registering a stand-in for an object that already has one is a
    /// fatal internal error: the mapping is populated at most once per
    /// object.
    fn wrap(&mut self, r: Ref, step: usize) -> Result<Ref> {
        if self.heap.is_probe(r) {
            return Ok(r);
        }
        if let Some(probe) = self.instrumented.get_by_left(&r) {
            return Ok(*probe);
        }
        self.register_probe(r, step)
    }

    /// Allocates and registers the stand-in for `r`.
    fn register_probe(&mut self, r: Ref, step: usize) -> Result<Ref> {
        if self.instrumented.contains_left(&r) {
            return Err(Error::AlreadyInstrumented { object: r }.at_step(step));
        }
        let probe = self.heap.alloc_probe(r);
        self.instrumented.insert(r, probe);
        Ok(probe)
    }

    fn fresh_variable(&mut self, observed: Option<Value>) -> Variable {
        self.variables.fresh(observed)
    }

    fn record(&mut self, statement: Statement) {
        self.trace.extend(statement);
    }

    /// Resolves `value` to the expression that reproduces it, failing the
    /// consistency invariant if a reference has no registered path.
    fn path_expression(&self, value: &Value, step: usize) -> Result<Expression> {
        match value {
            Value::Ref(r) => self.path_for(*r).ok_or_else(|| {
                Error::MissingAccessPath {
                    value: value.to_string(),
                }
                .at_step(step)
            }),
            primitive => Ok(self
                .first_candidate(primitive)
                .unwrap_or_else(|| Expression::constant(primitive.clone()))),
        }
    }

    fn internal(&self, error: crate::error::recording::LocatedError) -> Fault {
        Fault::Internal(error.into())
    }

    /// Looks up the access path of an operation target, failing the
    /// consistency invariant if none is registered.
    fn target_path(&self, target: &Value, step: usize) -> std::result::Result<(Ref, Expression), Fault> {
        let r = target
            .as_reference()
            .ok_or_else(|| Fault::not_an_object(target))?;
        let path = self.path_for(r).ok_or_else(|| {
            self.internal(
                Error::MissingAccessPath {
                    value: target.to_string(),
                }
                .at_step(step),
            )
        })?;
        Ok((r, path))
    }

    /// Performs an observed read of `key` on the instrumented `target`.
    ///
    /// With `register_candidates` unset (the peek mode used by unmodelled
    /// built-ins), the read still registers prestate and, where a
    /// statement would be emitted, emits it, but makes no claim about the
    /// provenance of the value read.
    fn read_field(
        &mut self,
        target: Ref,
        target_path: Expression,
        key: &PropKey,
        step: usize,
        register_candidates: bool,
    ) -> Outcome {
        let raw = self.heap.resolve(target);
        let value = match self.heap.object(raw) {
            Some(object) => object.get(key),
            None => return Err(Fault::not_an_object(&Value::Ref(target))),
        };
        let Some(value) = value else {
            // Missing and inherited properties are forwarded unmodelled.
            self.note(Diagnostic::UnmodeledRead { key: key.clone() }, step);
            return Ok(Value::Undefined);
        };

        let field = Expression::field(target_path, Expression::constant(key.to_value()));
        if register_candidates {
            self.add_candidate(&value, field.clone());
        }
        // The field path above is only valid in the current state; the
        // prestate needs an expression valid before any mutation.
        let prestate_field = self.prestate_for(target).map(|p| {
            Expression::field(p, Expression::constant(key.to_value()))
        });

        match value.as_reference() {
            None => {
                if let Some(pf) = prestate_field {
                    self.add_prestate(&value, pf);
                }
                if self.extended {
                    let var = self.fresh_variable(Some(value.clone()));
                    self.record(Statement::declare(Expression::variable(var), field));
                }
                Ok(value)
            }
            Some(child) => {
                // Reference reads always bind a fresh local: the variable
                // becomes the nested value's access path so that later
                // operations on it remain argument-relative.
                let var = self.fresh_variable(None);
                self.record(Statement::declare(
                    Expression::variable(var.clone()),
                    field,
                ));
                let probe = self.wrap(child, step).map_err(|e| self.internal(e))?;
                self.set_path(probe, Expression::variable(var));
                let out = Value::Ref(probe);
                if let Some(pf) = prestate_field {
                    self.add_prestate(&out, pf);
                }
                Ok(out)
            }
        }
    }
}

impl Environment for RecordingContext {
    fn get(&mut self, target: &Value, key: &PropKey) -> Outcome {
        let step = self.next_step();
        let (r, path) = self.target_path(target, step)?;
        self.read_field(r, path, key, step, true)
    }

    fn set(&mut self, target: &Value, key: &PropKey, value: Value) -> std::result::Result<(), Fault> {
        let step = self.next_step();
        let (r, path) = self.target_path(target, step)?;
        let field = Expression::field(path, Expression::constant(key.to_value()));

        if self.extended {
            // Snapshot the overwritten value into a fresh local first.
            let raw = self.heap.resolve(r);
            let old = self.heap.object(raw).and_then(|o| o.get(key));
            let var = self.fresh_variable(old);
            self.record(Statement::declare(
                Expression::variable(var),
                field.clone(),
            ));
        }

        let rhs = self
            .path_expression(&value, step)
            .map_err(|e| self.internal(e))?;
        self.record(Statement::assign(field.clone(), rhs));
        self.add_candidate(&value, field);

        let raw = self.heap.resolve(r);
        match self.heap.object_mut(raw) {
            Some(object) => {
                object.set(key, value);
                Ok(())
            }
            None => Err(Fault::not_an_object(target)),
        }
    }

    fn delete(&mut self, target: &Value, key: &PropKey) -> std::result::Result<bool, Fault> {
        let step = self.next_step();
        let (r, path) = self.target_path(target, step)?;

        if self.extended {
            let raw = self.heap.resolve(r);
            let old = self.heap.object(raw).and_then(|o| o.get(key));
            let var = self.fresh_variable(old);
            let field = Expression::field(path.clone(), Expression::constant(key.to_value()));
            self.record(Statement::declare(Expression::variable(var), field));
        }

        self.record(Statement::delete(
            path,
            Expression::constant(key.to_value()),
        ));

        let raw = self.heap.resolve(r);
        match self.heap.object_mut(raw) {
            Some(object) => Ok(object.delete(key)),
            None => Err(Fault::not_an_object(target)),
        }
    }

    fn has(&mut self, target: &Value, key: &PropKey) -> std::result::Result<bool, Fault> {
        let step = self.next_step();
        let (r, _) = self.target_path(target, step)?;
        self.note(Diagnostic::UnmodeledHas { key: key.clone() }, step);
        let raw = self.heap.resolve(r);
        match self.heap.object(raw) {
            Some(object) => Ok(object.has(key)),
            None => Err(Fault::not_an_object(target)),
        }
    }

    fn keys(&mut self, target: &Value) -> std::result::Result<Vec<PropKey>, Fault> {
        let step = self.next_step();
        let (r, _) = self.target_path(target, step)?;
        let raw = self.heap.resolve(r);
        self.note(Diagnostic::UnmodeledKeys { object: raw }, step);
        match self.heap.object(raw) {
            Some(object) => Ok(object.keys()),
            None => Err(Fault::not_an_object(target)),
        }
    }

    fn invoke(&mut self, target: &Value, method: &str, args: &[Value]) -> Outcome {
        let step = self.next_step();
        let (r, path) = self.target_path(target, step)?;
        self.note(
            Diagnostic::UnmodeledInvoke {
                method: method.to_string(),
            },
            step,
        );

        let raw = self.heap.resolve(r);
        let len = self.heap.object(raw).and_then(Object::array_len);
        match (len, method) {
            (Some(0), "pop") => Ok(Value::Undefined),
            (Some(len), "pop") => {
                // The element read is observable; the length shrink is an
                // implicit effect of the built-in and stays unmodelled.
                let element = self.read_field(r, path, &PropKey::Index(len - 1), step, false)?;
                if let Some(Object::Array(elements)) = self.heap.object_mut(raw) {
                    elements.pop();
                }
                Ok(element)
            }
            (Some(len), "push") => {
                if let Some(Object::Array(elements)) = self.heap.object_mut(raw) {
                    elements.extend(args.iter().cloned());
                }
                Ok(Value::Int((len + args.len()) as i64))
            }
            _ => Err(Fault::runtime_error(
                crate::oracle::RuntimeErrorKind::Type,
                format!("{method} is not a function"),
            )),
        }
    }
}
