//! This file contains the skeleton projection of traces: a structure-only
//! rendering that erases literal constants and variable identities while
//! preserving statement kind, expression shape, argument indices and
//! field-name identity.
//!
//! The projection is a canonical serialisation of statement shapes into
//! plain atoms, compared as explicit sequences rather than through a
//! general-purpose pattern engine. Two statements have equal skeletons
//! exactly when they perform the same structural operation, regardless of
//! the concrete values involved.

use std::fmt::{Display, Formatter, Write};

use crate::{
    ir::{expression::Expression, statement::Statement},
    oracle::value::Value,
};

/// The skeleton atom of a single statement.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Skeleton {
    text: String,
}

impl Skeleton {
    /// Computes the skeleton atom of `statement`.
    #[must_use]
    pub fn of(statement: &Statement) -> Self {
        let mut text = String::new();
        match statement {
            Statement::Assign {
                lhs,
                rhs,
                is_declaration,
            } => {
                text.push_str(if *is_declaration { "decl(" } else { "set(" });
                shape(lhs, &mut text);
                text.push(',');
                shape(rhs, &mut text);
                text.push(')');
            }
            Statement::Return { value } => {
                text.push_str("ret(");
                shape(value, &mut text);
                text.push(')');
            }
            Statement::Throw { value } => {
                text.push_str("thr(");
                shape(value, &mut text);
                text.push(')');
            }
            Statement::DeleteProperty { object, key } => {
                text.push_str("del(");
                shape(object, &mut text);
                text.push(',');
                key_shape(key, &mut text);
                text.push(')');
            }
        }
        Self { text }
    }

    /// Gets the canonical text of the atom.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Display for Skeleton {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Renders the shape of `expression` into `out`.
///
/// Constants render as `*` so that traces differing only in values project
/// to identical skeletons; argument indices are structure and are kept.
fn shape(expression: &Expression, out: &mut String) {
    match expression {
        Expression::Argument { index } => {
            let _ = write!(out, "arg({index})");
        }
        Expression::Field { object, key } => {
            out.push_str("fld(");
            shape(object, out);
            out.push(',');
            key_shape(key, out);
            out.push(')');
        }
        Expression::Constant { .. } => out.push('*'),
        Expression::Variable { .. } => out.push_str("var"),
    }
}

/// Renders the shape of a field key into `out`.
///
/// Unlike other constants, constant keys are identity: `o["x"]` and
/// `o["y"]` are structurally different operations, so the key text is
/// preserved.
fn key_shape(key: &Expression, out: &mut String) {
    match key {
        Expression::Constant {
            value: Value::Str(name),
        } => out.push_str(name),
        Expression::Constant {
            value: Value::Int(index),
        } => {
            let _ = write!(out, "{index}");
        }
        other => shape(other, out),
    }
}

#[cfg(test)]
mod test {
    use crate::ir::{expression::Expression, skeleton::Skeleton, statement::Statement};

    fn field(key: &str) -> Expression {
        Expression::field(Expression::argument(0), Expression::constant(key))
    }

    #[test]
    fn skeletons_are_deterministic() {
        let stmt = Statement::assign(field("x"), field("y"));
        assert_eq!(Skeleton::of(&stmt), Skeleton::of(&stmt.clone()));
        assert_eq!(
            Skeleton::of(&stmt).text(),
            "set(fld(arg(0),x),fld(arg(0),y))"
        );
    }

    #[test]
    fn constants_are_erased_but_keys_are_kept() {
        let with_five = Statement::assign(field("x"), Expression::constant(5i64));
        let with_seven = Statement::assign(field("x"), Expression::constant(7i64));
        let other_key = Statement::assign(field("y"), Expression::constant(5i64));

        assert_eq!(Skeleton::of(&with_five), Skeleton::of(&with_seven));
        assert_ne!(Skeleton::of(&with_five), Skeleton::of(&other_key));
    }

    #[test]
    fn variable_identity_is_erased() {
        let mut source = crate::ir::expression::VariableSource::new();
        let a = Statement::declare(Expression::variable(source.fresh(None)), field("x"));
        let b = Statement::declare(Expression::variable(source.fresh(None)), field("x"));

        assert_eq!(Skeleton::of(&a), Skeleton::of(&b));
        assert_eq!(Skeleton::of(&a).text(), "decl(var,fld(arg(0),x))");
    }

    #[test]
    fn statement_kinds_are_distinguished() {
        let ret = Statement::ret(Expression::constant(1i64));
        let thr = Statement::throw(Expression::constant(1i64));
        assert_ne!(Skeleton::of(&ret), Skeleton::of(&thr));
    }
}
