//! This file contains the definition of the symbolic statement type: the
//! unit in which observed behaviour is recorded into a trace.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ir::expression::Expression;

/// A single recorded operation.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Statement {
    /// Stores the value of `rhs` into `lhs`.
    ///
    /// With `is_declaration` set, the left-hand side is a fresh local
    /// variable being bound for the first time; otherwise the left-hand
    /// side names an existing storage location.
    Assign {
        lhs: Expression,
        rhs: Expression,
        is_declaration: bool,
    },

    /// Terminates the call, producing `value`.
    Return { value: Expression },

    /// Terminates the call by throwing `value`.
    Throw { value: Expression },

    /// Removes the property `key` from `object`.
    DeleteProperty {
        object: Expression,
        key: Expression,
    },
}

impl Statement {
    /// Constructs an assignment of `rhs` into `lhs`.
    #[must_use]
    pub fn assign(lhs: Expression, rhs: Expression) -> Self {
        Self::Assign {
            lhs,
            rhs,
            is_declaration: false,
        }
    }

    /// Constructs a declaration binding `rhs` to the fresh variable `lhs`.
    #[must_use]
    pub fn declare(lhs: Expression, rhs: Expression) -> Self {
        Self::Assign {
            lhs,
            rhs,
            is_declaration: true,
        }
    }

    /// Constructs a return of `value`.
    #[must_use]
    pub fn ret(value: Expression) -> Self {
        Self::Return { value }
    }

    /// Constructs a throw of `value`.
    #[must_use]
    pub fn throw(value: Expression) -> Self {
        Self::Throw { value }
    }

    /// Constructs a deletion of `key` from `object`.
    #[must_use]
    pub fn delete(object: Expression, key: Expression) -> Self {
        Self::DeleteProperty { object, key }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assign {
                lhs,
                rhs,
                is_declaration,
            } => {
                if *is_declaration {
                    write!(f, "let {lhs} = {rhs}")
                } else {
                    write!(f, "{lhs} = {rhs}")
                }
            }
            Self::Return { value } => write!(f, "return {value}"),
            Self::Throw { value } => write!(f, "throw {value}"),
            Self::DeleteProperty { object, key } => write!(f, "delete {object}[{key}]"),
        }
    }
}
