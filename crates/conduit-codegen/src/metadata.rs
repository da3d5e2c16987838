// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Structured inventory of a compiled resource.
//!
//! The document describes what was generated, not how: field types on both
//! sides of the mapping, the hook methods and their flags, validation rules
//! and relationship loaders. Compressing, embedding or registering it is up
//! to the caller.
//!
//! ```json
//! {
//!   "name": "Post",
//!   "table": "public.posts",
//!   "fields": [
//!     { "name": "title", "go_name": "Title", "go_type": "string", "sql_type": "TEXT", ... }
//!   ],
//!   "hooks": [{ "method": "BeforeCreate", "timing": "before", "event": "create", ... }]
//! }
//! ```

use conduit_ast::{ExprNode, HookEvent, HookTiming, LiteralValue, RelationshipKind};
use serde::Serialize;
use serde_json::Value;

use crate::{context::Context, hooks::CompiledHooks, relations::Relation};

/// Metadata of one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceMetadata {
    /// Resource name as declared.
    pub name:          String,
    /// Schema-qualified table.
    pub table:         String,
    /// Documentation comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Fields in struct order, including a synthesized key.
    pub fields:        Vec<FieldMetadata>,
    /// Hook methods in declaration order.
    pub hooks:         Vec<HookMetadata>,
    /// Resource-level validation rules.
    pub validations:   Vec<ValidationMetadata>,
    /// Relationship loaders.
    pub relationships: Vec<RelationshipMetadata>
}

/// Metadata of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMetadata {
    /// DSL name.
    pub name:        String,
    /// Go identifier.
    pub go_name:     String,
    /// Go type.
    pub go_type:     String,
    /// Column type; absent for associations.
    pub sql_type:    Option<String>,
    /// Column name; absent for associations.
    pub column:      Option<String>,
    /// Whether the value may be absent.
    pub nullable:    bool,
    /// Whether this is the primary key.
    pub primary:     bool,
    /// Declared constraints.
    pub constraints: Vec<ConstraintMetadata>
}

/// Metadata of one constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintMetadata {
    /// Name without `@`.
    pub name:      String,
    /// Literal arguments; other expressions are reported by kind.
    pub arguments: Vec<Value>,
    /// Custom message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message:   Option<String>,
    /// Events the constraint is limited to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on:        Vec<String>
}

/// Metadata of one hook method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookMetadata {
    /// Go method name.
    pub method:          String,
    /// Before or after.
    pub timing:          HookTiming,
    /// Triggering event.
    pub event:           HookEvent,
    /// Runs in its own transaction.
    pub transaction:     bool,
    /// Runs entirely in the background.
    pub is_async:        bool,
    /// Spawns background blocks.
    pub has_async_block: bool
}

/// Metadata of one validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationMetadata {
    /// Rule name.
    pub name:    String,
    /// Reported message.
    pub message: String
}

/// Metadata of one relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipMetadata {
    /// Relationship name.
    pub name:        String,
    /// Cardinality.
    pub kind:        RelationshipKind,
    /// Target resource.
    pub target:      String,
    /// Foreign key column.
    pub foreign_key: String,
    /// Loader method.
    pub method:      String
}

impl ResourceMetadata {
    /// Collect the metadata of a compiled resource.
    #[must_use]
    pub fn extract(ctx: &Context<'_>, hooks: &CompiledHooks, relations: &[Relation<'_>]) -> Self {
        let fields = ctx
            .fields
            .iter()
            .map(|f| FieldMetadata {
                name:        f.name.clone(),
                go_name:     f.go_name.clone(),
                go_type:     f.ty.go.clone(),
                sql_type:    f.sql.as_ref().map(|s| s.to_sql_string()),
                column:      f.is_persisted().then(|| f.column.clone()),
                nullable:    f.is_nullable(),
                primary:     f.primary,
                constraints: f
                    .constraints()
                    .iter()
                    .map(|c| ConstraintMetadata {
                        name:      c.name.clone(),
                        arguments: c.arguments.iter().map(argument).collect(),
                        message:   c.error.clone(),
                        on:        c.on.clone()
                    })
                    .collect()
            })
            .collect();

        let hooks = hooks
            .methods
            .iter()
            .map(|m| HookMetadata {
                method:          m.name.clone(),
                timing:          m.timing,
                event:           m.event,
                transaction:     m.transaction,
                is_async:        m.is_async,
                has_async_block: m.has_async_block
            })
            .collect();

        let validations = ctx
            .resource
            .validations
            .iter()
            .map(|v| ValidationMetadata {
                name:    v.name.clone(),
                message: v.message.clone()
            })
            .collect();

        let relationships = relations
            .iter()
            .map(|r| RelationshipMetadata {
                name:        r.node.name.clone(),
                kind:        r.node.kind,
                target:      r.node.target.clone(),
                foreign_key: r.foreign_key.clone(),
                method:      r.method.clone()
            })
            .collect();

        Self {
            name: ctx.resource.name.clone(),
            table: ctx.table.clone(),
            documentation: ctx.resource.documentation.clone(),
            fields,
            hooks,
            validations,
            relationships
        }
    }

    /// Pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; the metadata types themselves always
    /// serialize.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn argument(expr: &ExprNode) -> Value {
    match expr {
        ExprNode::Literal { value } => match value {
            LiteralValue::Null => Value::Null,
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Int(i) => Value::from(*i),
            LiteralValue::Float(f) => Value::from(*f),
            LiteralValue::String(s) => Value::String(s.clone())
        },
        ExprNode::Identifier { name } => Value::String(name.clone()),
        other => Value::String(format!("<{}>", other.kind_name()))
    }
}
