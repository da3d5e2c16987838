// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Code generation backend of the conduit compiler.
//!
//! Turns one validated [`ResourceNode`](conduit_ast::ResourceNode) into a
//! self-contained Go file, a PostgreSQL migration and a metadata document.
//!
//! # Quick Start
//!
//! ```rust
//! use conduit_ast::ResourceNode;
//! use conduit_codegen::{CompilerConfig, IdStrategy, ResourceCompiler};
//!
//! let tag = ResourceNode::from_json(r#"{
//!     "name": "Tag",
//!     "fields": [
//!         { "name": "label", "type": { "kind": "primitive", "name": "string" } }
//!     ]
//! }"#).unwrap();
//!
//! let compiler = ResourceCompiler::new(
//!     CompilerConfig::default().with_id_strategy(IdStrategy::Serial)
//! );
//! let out = compiler.compile(&tag).unwrap();
//!
//! assert!(out.source.contains("type Tag struct {"));
//! assert!(out.schema.up.contains("id BIGSERIAL PRIMARY KEY"));
//! ```
//!
//! # Generated Code Overview
//!
//! For a `Post` resource the Go file contains:
//!
//! | Declaration | Description |
//! |-------------|-------------|
//! | `type Post struct` | Fields with `json`, `db` and `form` tags |
//! | `NewPost()` | Constructor applying declared defaults |
//! | `Create`, `Update`, `Delete` | Transactional writes calling hooks |
//! | `FindPostByID`, `FindAllPosts`, `FindPostsWhere` | Reads |
//! | `PatchPost` | Partial update from a JSON payload |
//! | `Validate`, `ValidateOn` | Constraint and rule checks |
//! | `BeforeCreate`, `AfterSave`, ... | Hook methods |
//! | `LoadAuthor`, ... | Relationship loaders |
//!
//! The Go support package the file imports is available from [`runtime`].
//!
//! # Modules
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`types`] | DSL type to Go and SQL type mapping |
//! | [`naming`] | Identifier, table and literal conventions |
//! | [`translate`] | Expressions and statements to Go |
//! | [`hooks`] | Lifecycle hook methods |
//! | [`validation`] | `Validate` method |
//! | [`crud`] | Persistence methods |
//! | [`schema`] | DDL |
//! | [`metadata`] | Inventory document |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod compiler;
pub mod config;
pub mod context;
pub mod crud;
pub mod emit;
pub mod error;
pub mod hooks;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod relations;
pub mod runtime;
pub mod schema;
pub mod translate;
pub mod types;
pub mod validation;

pub use compiler::{BatchOutput, CompiledResource, GENERATED_HEADER, ResourceCompiler};
pub use config::{CompilerConfig, IdStrategy};
pub use error::{CompileError, Diagnostic, PLACEHOLDER_MARKER};
pub use metadata::ResourceMetadata;
pub use runtime::GeneratedFile;
pub use schema::Schema;
