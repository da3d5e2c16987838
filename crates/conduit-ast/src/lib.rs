// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Resource-definition AST for the conduit compiler.
//!
//! The upstream lexer, parser and type-checker produce a validated graph of
//! [`ResourceNode`] values. This crate only describes that graph; it performs
//! no semantic checks of its own.
//!
//! # Overview
//!
//! | Node | Purpose |
//! |------|---------|
//! | [`ResourceNode`] | One resource: fields, relationships, hooks, validations |
//! | [`FieldNode`] | One declared field with its type and constraints |
//! | [`TypeNode`] | Primitive, array, hash, enum or resource reference |
//! | [`ConstraintNode`] | `@min(5)`, `@unique`, `@auto`, ... |
//! | [`HookNode`] | `@before create @transaction { ... }` |
//! | [`StmtNode`] / [`ExprNode`] | Hook bodies and expressions |
//!
//! # Input
//!
//! Nodes are plain data with `serde` support, so the parser can hand them over
//! in-process or as JSON:
//!
//! ```rust
//! use conduit_ast::ResourceNode;
//!
//! let post = ResourceNode::from_json(r#"{
//!     "name": "Post",
//!     "fields": [
//!         { "name": "title", "type": { "kind": "primitive", "name": "string" } }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(post.fields.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod constraint;
mod error;
mod expr;
mod hook;
mod resource;
mod stmt;
mod types;

pub use constraint::ConstraintNode;
pub use error::AstError;
pub use expr::{BinaryOp, ExprNode, HashEntry, InterpolationPart, LiteralValue, LogicalOp, UnaryOp};
pub use hook::{HookEvent, HookNode, HookTiming};
pub use resource::{
    FieldNode, ReferentialAction, RelationshipKind, RelationshipNode, ResourceNode, ValidationNode
};
pub use stmt::{ElseIf, StmtNode};
pub use types::TypeNode;

/// Decode a batch of resources from a JSON array.
///
/// # Errors
///
/// Returns [`AstError::Json`] if the input is not an array of resources.
pub fn from_json_batch(input: &str) -> Result<Vec<ResourceNode>, AstError> {
    Ok(serde_json::from_str(input)?)
}
