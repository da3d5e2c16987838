// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! DSL expression and statement translation.
//!
//! # Architecture
//!
//! ```text
//! ExprNode ──► ExprTranslator ──► Fragment { code, imports, ty, diagnostics }
//!                   │
//!                   ├── Scope      receiver, fields, locals
//!                   └── stdlib     "Namespace.function" → template
//!
//! StmtNode ──► StmtTranslator ──► Emitter lines + StmtOutput { imports, diagnostics }
//! ```
//!
//! Translation is total: node kinds without a mapping become a placeholder
//! marked with [`PLACEHOLDER_MARKER`](crate::PLACEHOLDER_MARKER) and a
//! [`Diagnostic`].

mod expr;
mod scope;
pub mod stdlib;
mod stmt;

pub use expr::ExprTranslator;
pub use scope::Scope;
pub use stmt::{CommitMode, StmtOutput, StmtTranslator};

use crate::{
    emit::ImportSet,
    error::Diagnostic,
    types::{GoKind, GoTypeMapper, TypeRef}
};

/// Result of translating one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Go expression text.
    pub code: String,

    /// Packages the text references.
    pub imports: ImportSet,

    /// Inferred Go type, when known.
    pub ty: Option<TypeRef>,

    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>
}

impl Fragment {
    /// Untyped fragment without imports.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Set the inferred type.
    #[must_use]
    pub fn typed(mut self, ty: TypeRef) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Set or clear the inferred type.
    #[must_use]
    pub fn with_ty(mut self, ty: Option<TypeRef>) -> Self {
        self.ty = ty;
        self
    }

    /// Add a standard library import.
    #[must_use]
    pub fn import_std(mut self, path: &str) -> Self {
        self.imports.add_std(path);
        self
    }

    /// Move the imports and diagnostics of `part` into `self` and return its
    /// code.
    pub fn absorb(&mut self, part: Fragment) -> String {
        self.imports.merge(&part.imports);
        self.diagnostics.extend(part.diagnostics);
        part.code
    }

    /// Record that the code spells out `ty`.
    pub fn spells(&mut self, ty: &TypeRef) {
        self.imports.merge(&ty.imports);
    }
}

/// Adapt `value` to be stored into a place of type `target`.
///
/// Plain values stored into a `types.Null[T]` are wrapped with an explicit
/// instantiation so untyped constants convert (`types.Some[int64](5)`); `nil`
/// becomes the absent wrapper.
#[must_use]
pub fn coerce(value: Fragment, target: &TypeRef, go_types: &GoTypeMapper) -> Fragment {
    let GoKind::Null(inner) = &target.kind else {
        return value;
    };
    if value.ty.as_ref().is_some_and(TypeRef::is_null_wrapper) {
        return value;
    }
    let wrapper = go_types.null_of(inner.as_ref().clone());
    let mut out = Fragment::default().typed(wrapper.clone());
    out.spells(&wrapper);
    let code = if value.code == "nil" {
        out.absorb(value);
        format!("{}{{}}", wrapper.go)
    } else {
        let v = out.absorb(value);
        format!("types.Some[{}]({v})", inner.go)
    };
    out.code = code;
    out
}
