// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Field and resource constraints.
//!
//! A constraint is the single source of truth for both the generated
//! validation code and the generated DDL.
//!
//! | Constraint | Validation | DDL |
//! |------------|------------|-----|
//! | `@min(n)` / `@max(n)` | length or value check | `CHECK` |
//! | `@unique` | | `CREATE UNIQUE INDEX` |
//! | `@index` | | `CREATE INDEX` |
//! | `@primary` | | `PRIMARY KEY` |
//! | `@auto` | | server default |
//! | `@auto_update` | | server default |
//! | `@required` | non-empty check | |
//! | `@pattern("re")` | regexp match | |
//! | `@email` / `@url` | format check | |

use serde::{Deserialize, Serialize};

use crate::{ExprNode, LiteralValue};

/// A constraint attached to a field or a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintNode {
    /// Constraint name without the `@` sigil.
    pub name: String,

    /// Literal arguments in declaration order.
    #[serde(default)]
    pub arguments: Vec<ExprNode>,

    /// Custom message replacing the generated one.
    #[serde(default)]
    pub error: Option<String>,

    /// Events the constraint is limited to (`create`, `update`).
    #[serde(default)]
    pub on: Vec<String>
}

impl ConstraintNode {
    /// Constraint without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:      name.into(),
            arguments: Vec::new(),
            error:     None,
            on:        Vec::new()
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, argument: ExprNode) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Set the custom error message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Limit the constraint to one event.
    #[must_use]
    pub fn on_event(mut self, event: impl Into<String>) -> Self {
        self.on.push(event.into());
        self
    }

    /// Whether this constraint has the given name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Literal argument at `index`, if the argument is a literal.
    #[must_use]
    pub fn literal(&self, index: usize) -> Option<&LiteralValue> {
        match self.arguments.get(index)? {
            ExprNode::Literal { value } => Some(value),
            _ => None
        }
    }

    /// Whether the constraint applies to every event.
    #[must_use]
    pub fn is_unconditional(&self) -> bool {
        self.on.is_empty()
    }
}
