// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # conduit
//!
//! One crate, all features. Re-exports:
//! - the AST from `conduit-ast` ([`ResourceNode`], [`FieldNode`], ...)
//! - the compiler from `conduit-codegen` ([`ResourceCompiler`],
//!   [`CompilerConfig`], [`runtime`])
//!
//! # Quick Start
//!
//! ```rust
//! use conduit::{CompilerConfig, compile_json};
//!
//! let out = compile_json(
//!     r#"[{
//!         "name": "Post",
//!         "fields": [
//!             { "name": "title", "type": { "kind": "primitive", "name": "string" } }
//!         ]
//!     }]"#,
//!     &CompilerConfig::default()
//! )
//! .unwrap();
//!
//! assert_eq!(out.resources[0].file_name, "post.go");
//! assert!(out.migration().up.contains("CREATE TABLE IF NOT EXISTS public.posts"));
//! ```

pub use conduit_ast::*;
pub use conduit_codegen::{
    BatchOutput, CompileError, CompiledResource, CompilerConfig, Diagnostic, GENERATED_HEADER,
    GeneratedFile, IdStrategy, PLACEHOLDER_MARKER, ResourceCompiler, ResourceMetadata, Schema,
    runtime
};
use thiserror::Error;

/// Failure of [`compile_json`].
#[derive(Debug, Error)]
pub enum Error {
    /// The input is not a valid resource batch.
    #[error(transparent)]
    Ast(#[from] AstError),

    /// A resource failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError)
}

/// Decode a JSON array of resources and compile them.
///
/// # Errors
///
/// Returns [`Error::Ast`] for malformed input and [`Error::Compile`] for the
/// first resource that fails to compile.
pub fn compile_json(input: &str, config: &CompilerConfig) -> Result<BatchOutput, Error> {
    let resources = from_json_batch(input)?;
    Ok(ResourceCompiler::new(config.clone()).compile_batch(&resources)?)
}
