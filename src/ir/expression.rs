//! This file contains the definition of the symbolic expression type, which
//! describes how to recompute a runtime value from the arguments of the
//! function under study.
//!
//! It is intentionally kept separate from the recording context to ensure
//! that fresh variables cannot be created without going through a
//! [`VariableSource`].

use std::{
    fmt::{Display, Formatter},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::oracle::value::Value;

/// A symbolic expression over the arguments of the traced function.
///
/// Expressions form trees: a `Field` access names both the object being
/// read and the key under which it is read, and either side may itself be
/// an arbitrary expression. Expressions are immutable once built.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Expression {
    /// The `index`th argument of the traced call.
    Argument { index: usize },

    /// A property of `object` stored under `key`.
    Field {
        object: Box<Expression>,
        key: Box<Expression>,
    },

    /// A literal value.
    Constant { value: Value },

    /// A local variable introduced during recording or mutation.
    Variable { var: Variable },
}

impl Expression {
    /// Constructs the expression naming the `index`th argument.
    #[must_use]
    pub fn argument(index: usize) -> Self {
        Self::Argument { index }
    }

    /// Constructs a field access of `key` on `object`.
    #[must_use]
    pub fn field(object: Self, key: Self) -> Self {
        Self::Field {
            object: Box::new(object),
            key: Box::new(key),
        }
    }

    /// Constructs a literal expression from `value`.
    #[must_use]
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant {
            value: value.into(),
        }
    }

    /// Constructs a reference to the local variable `var`.
    #[must_use]
    pub fn variable(var: Variable) -> Self {
        Self::Variable { var }
    }

    /// Checks whether the expression has a shape that may appear on the
    /// left-hand side of an assignment.
    #[must_use]
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Self::Field { .. } | Self::Variable { .. })
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Argument { index } => write!(f, "arg{index}"),
            Self::Field { object, key } => write!(f, "{object}[{key}]"),
            Self::Constant { value } => write!(f, "{value}"),
            Self::Variable { var } => write!(f, "{var}"),
        }
    }
}

/// A local variable in the symbolic IR.
///
/// Identity is the `id` alone: the observed value is display metadata
/// captured at recording time and takes no part in comparison or hashing,
/// so a variable re-created with a different observation is still the same
/// variable.
#[derive(Clone, Debug, Derivative, Deserialize, Serialize)]
#[derivative(Eq, Hash, PartialEq)]
pub struct Variable {
    /// The identity of the variable within its source pool.
    id: usize,

    /// The runtime value observed for this variable, if any.
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    observed: Option<Value>,
}

impl Variable {
    /// Gets the identity of the variable.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Gets the runtime value observed for the variable, if any.
    #[must_use]
    pub fn observed(&self) -> Option<&Value> {
        self.observed.as_ref()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.id)
    }
}

/// A source of fresh, unique variables.
///
/// It is guaranteed that no matter how many times the source is cloned, all
/// clones draw from the same underlying pool and hence cannot allocate
/// duplicate identities.
///
/// # Variable Pools
///
/// Care must be taken not to mix variables from independent pools inside
/// one program, as these _could_ produce duplicate identities. Each
/// recording context owns its own source; the search engine extends the
/// recorded pool rather than creating a new one.
#[derive(Clone, Debug)]
pub struct VariableSource {
    last_var: Arc<AtomicUsize>,
}

impl VariableSource {
    /// Creates a new source of unique variables.
    #[must_use]
    pub fn new() -> Self {
        let last_var = Arc::new(AtomicUsize::from(0));
        Self { last_var }
    }

    /// Requests a fresh variable from the source, attaching the provided
    /// observed value.
    #[must_use]
    pub fn fresh(&mut self, observed: Option<Value>) -> Variable {
        let id = self.last_var.fetch_add(1, Ordering::Relaxed);
        Variable { id, observed }
    }

    /// Gets the number of variables that have been allocated by this
    /// source.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.last_var.load(Ordering::Relaxed)
    }
}

impl Default for VariableSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use crate::{
        ir::expression::{Expression, VariableSource},
        oracle::value::Value,
    };

    #[test]
    fn sources_allocate_unique_identities_across_clones() {
        let mut source = VariableSource::new();
        let mut cloned = source.clone();

        let a = source.fresh(None);
        let b = cloned.fresh(None);
        let c = source.fresh(None);

        assert_ne!(a.id(), b.id());
        assert_ne!(b.id(), c.id());
        assert_eq!(source.allocated_count(), 3);
    }

    #[test]
    fn variable_identity_ignores_the_observed_value() {
        let mut source = VariableSource::new();
        let v = source.fresh(Some(Value::Int(1)));
        let mut with_other_observation = v.clone();
        with_other_observation.observed = Some(Value::Int(9));

        assert_eq!(v, with_other_observation);
    }

    #[test]
    fn expressions_display_compactly() {
        let e = Expression::field(
            Expression::field(Expression::argument(0), Expression::constant("x")),
            Expression::constant(3i64),
        );
        assert_eq!(e.to_string(), "arg0[\"x\"][3]");
    }
}
