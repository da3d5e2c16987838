// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Resource, field, relationship and validation nodes.
//!
//! # Architecture
//!
//! ```text
//! ResourceNode
//! ├── fields[]         FieldNode { name, type, nullable, constraints[], default }
//! ├── relationships[]  RelationshipNode { name, kind, target, foreign_key, on_delete }
//! ├── hooks[]          HookNode { timing, event, is_transaction, is_async, body[] }
//! ├── validations[]    ValidationNode { name, condition, message }
//! └── constraints[]    ConstraintNode (resource level, e.g. composite unique)
//! ```
//!
//! A resource is created by the parser and never mutated afterwards; the
//! compiler reads it once per compilation.

use serde::{Deserialize, Serialize};

use crate::{AstError, ConstraintNode, ExprNode, HookEvent, HookNode, HookTiming, TypeNode};

/// A declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    /// Field name as written in the DSL (snake case).
    pub name: String,

    /// Declared type.
    #[serde(rename = "type")]
    pub ty: TypeNode,

    /// Field-level nullability (`title: string?`).
    #[serde(default)]
    pub nullable: bool,

    /// Constraints in declaration order.
    #[serde(default)]
    pub constraints: Vec<ConstraintNode>,

    /// Default value expression.
    #[serde(default)]
    pub default: Option<ExprNode>
}

impl FieldNode {
    /// Non-nullable field without constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            constraints: Vec::new(),
            default: None
        }
    }

    /// Mark the field nullable.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.nullable = true;
        self.ty.set_nullable(true);
        self
    }

    /// Append a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: ConstraintNode) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Set the default expression.
    #[must_use]
    pub fn default_value(mut self, default: ExprNode) -> Self {
        self.default = Some(default);
        self
    }

    /// Effective nullability from either the field or its type.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable || self.ty.is_nullable()
    }

    /// First constraint with the given name.
    #[must_use]
    pub fn find_constraint(&self, name: &str) -> Option<&ConstraintNode> {
        self.constraints.iter().find(|c| c.is(name))
    }

    /// Whether a constraint with the given name is declared.
    #[must_use]
    pub fn has_constraint(&self, name: &str) -> bool {
        self.find_constraint(name).is_some()
    }
}

/// Relationship cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// This resource holds the foreign key.
    BelongsTo,
    /// The target holds a foreign key to this resource, at most one row.
    HasOne,
    /// The target holds a foreign key to this resource.
    HasMany
}

/// Referential action for foreign key `ON DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// Delete child rows when the parent is deleted.
    Cascade,

    /// Set the foreign key to NULL.
    SetNull,

    /// Set the foreign key to its default value.
    SetDefault,

    /// Prevent deletion if children exist.
    Restrict,

    /// Prevent deletion if children exist (deferred check).
    NoAction
}

impl ReferentialAction {
    /// SQL spelling.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION"
        }
    }
}

/// A relationship to another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipNode {
    /// Relationship name (`author`, `comments`).
    pub name: String,

    /// Cardinality.
    pub kind: RelationshipKind,

    /// Target resource name.
    pub target: String,

    /// Foreign key column; derived from the names when absent.
    #[serde(default)]
    pub foreign_key: Option<String>,

    /// `ON DELETE` action for `belongs_to`.
    #[serde(default)]
    pub on_delete: Option<ReferentialAction>
}

impl RelationshipNode {
    /// Relationship without explicit foreign key.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RelationshipKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            foreign_key: None,
            on_delete: None
        }
    }

    /// Set the foreign key column.
    #[must_use]
    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    /// Set the `ON DELETE` action.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}

/// Resource-level validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationNode {
    /// Rule name, reported as the failing key.
    pub name: String,

    /// Condition that must hold.
    pub condition: ExprNode,

    /// Message reported when the condition does not hold.
    pub message: String
}

/// A resource definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Resource name (PascalCase).
    pub name: String,

    /// Documentation comment.
    #[serde(default)]
    pub documentation: Option<String>,

    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldNode>,

    /// Relationships in declaration order.
    #[serde(default)]
    pub relationships: Vec<RelationshipNode>,

    /// Hooks in declaration order.
    #[serde(default)]
    pub hooks: Vec<HookNode>,

    /// Resource-level validation rules.
    #[serde(default)]
    pub validations: Vec<ValidationNode>,

    /// Resource-level constraints.
    #[serde(default)]
    pub constraints: Vec<ConstraintNode>
}

impl ResourceNode {
    /// Empty resource.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:          name.into(),
            documentation: None,
            fields:        Vec::new(),
            relationships: Vec::new(),
            hooks:         Vec::new(),
            validations:   Vec::new(),
            constraints:   Vec::new()
        }
    }

    /// Decode a resource from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::Json`] for malformed input.
    pub fn from_json(input: &str) -> Result<Self, AstError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Set the documentation comment.
    #[must_use]
    pub fn documented(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    /// Append a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldNode) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipNode) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Append a hook.
    #[must_use]
    pub fn with_hook(mut self, hook: HookNode) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Append a validation rule.
    #[must_use]
    pub fn with_validation(mut self, validation: ValidationNode) -> Self {
        self.validations.push(validation);
        self
    }

    /// Append a resource-level constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: ConstraintNode) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether a field literally named `id` is declared.
    #[must_use]
    pub fn has_id_field(&self) -> bool {
        self.field("id").is_some()
    }

    /// Hooks for a timing/event pair, in declaration order.
    pub fn hooks_for(
        &self,
        timing: HookTiming,
        event: HookEvent
    ) -> impl Iterator<Item = &HookNode> {
        self.hooks
            .iter()
            .filter(move |h| h.timing == timing && h.event == event)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn post() -> ResourceNode {
        ResourceNode::new("Post")
            .with_field(FieldNode::new("title", TypeNode::primitive("string")))
            .with_field(FieldNode::new("bio", TypeNode::primitive("text")).optional())
            .with_hook(HookNode::new(HookTiming::Before, HookEvent::Create))
            .with_hook(HookNode::new(HookTiming::Before, HookEvent::Save))
            .with_hook(HookNode::new(HookTiming::Before, HookEvent::Create).transaction())
    }

    #[test]
    fn field_lookup() {
        let post = post();
        assert!(post.field("title").is_some());
        assert!(post.field("missing").is_none());
        assert!(!post.has_id_field());
    }

    #[test]
    fn optional_sets_both_flags() {
        let post = post();
        let bio = post.field("bio").unwrap();
        assert!(bio.nullable);
        assert!(bio.ty.is_nullable());
        assert!(bio.is_nullable());
    }

    #[test]
    fn type_nullability_alone_is_enough() {
        let field = FieldNode::new("x", TypeNode::primitive("int").optional());
        assert!(field.is_nullable());
    }

    #[test]
    fn hooks_for_keeps_declaration_order() {
        let post = post();
        let hooks: Vec<_> = post
            .hooks_for(HookTiming::Before, HookEvent::Create)
            .map(|h| h.is_transaction)
            .collect();
        assert_eq!(hooks, [false, true]);
    }

    #[test]
    fn from_json_reads_relationships() {
        let res = ResourceNode::from_json(
            r#"{
                "name": "Comment",
                "relationships": [
                    { "name": "post", "kind": "belongs_to", "target": "Post", "on_delete": "cascade" }
                ]
            }"#
        )
        .unwrap();
        assert_eq!(res.relationships[0].kind, RelationshipKind::BelongsTo);
        assert_eq!(
            res.relationships[0].on_delete.map(ReferentialAction::as_sql),
            Some("CASCADE")
        );
    }

    #[test]
    fn from_json_reports_errors() {
        assert!(ResourceNode::from_json("{").is_err());
    }
}
