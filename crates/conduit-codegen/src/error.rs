// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Fatal errors and non-fatal diagnostics.
//!
//! Compilation follows a two-tier policy:
//!
//! | Tier | Type | Examples | Effect |
//! |------|------|----------|--------|
//! | Structural | [`CompileError`] | empty name, unsupported type | nothing is emitted for the resource |
//! | Expression | [`Diagnostic`] | unknown node, unmapped stdlib call | placeholder emitted, compilation continues |
//!
//! Structural failures cannot be patched over without risking a broken data
//! layer. Expression-level gaps only mean the DSL is ahead of the mapping
//! tables, so they degrade to a placeholder that carries [`PLACEHOLDER_MARKER`].

use serde::Serialize;
use thiserror::Error;

/// Marker embedded in every placeholder so incomplete output can be grepped.
pub const PLACEHOLDER_MARKER: &str = "conduit: unsupported";

/// Structural compilation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The resource has no name.
    #[error("resource name must not be empty")]
    EmptyResourceName,

    /// A field has no name.
    #[error("resource `{resource}`: field #{index} has an empty name")]
    EmptyFieldName {
        /// Resource name.
        resource: String,
        /// Zero-based field position.
        index:    usize
    },

    /// Two fields share a name.
    #[error("resource `{resource}`: field `{field}` is declared more than once")]
    DuplicateField {
        /// Resource name.
        resource: String,
        /// Field name.
        field:    String
    },

    /// The field type has no Go or SQL mapping.
    #[error("resource `{resource}`: field `{field}`: unsupported type `{ty}`")]
    UnsupportedType {
        /// Resource name.
        resource: String,
        /// Field name.
        field:    String,
        /// Type as written.
        ty:       String
    },

    /// A constraint cannot be applied to its field.
    #[error("resource `{resource}`: field `{field}`: constraint `@{constraint}`: {reason}")]
    InvalidConstraint {
        /// Resource name.
        resource:   String,
        /// Field name, or `*` for resource-level constraints.
        field:      String,
        /// Constraint name.
        constraint: String,
        /// What is wrong.
        reason:     String
    },

    /// A `belongs_to` relationship names a foreign key that is not a field.
    #[error(
        "resource `{resource}`: relationship `{relationship}`: foreign key `{foreign_key}` is not a declared field"
    )]
    MissingForeignKey {
        /// Resource name.
        resource:     String,
        /// Relationship name.
        relationship: String,
        /// Expected foreign key field.
        foreign_key:  String
    }
}

/// Non-fatal finding attached to a compiled resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Resource being compiled.
    pub resource: String,

    /// Where the finding was made (`BeforeCreate`, `Validate`, ...).
    pub location: String,

    /// Human-readable description.
    pub message: String
}

impl Diagnostic {
    /// Create a diagnostic and report it through `tracing`.
    #[must_use]
    pub fn warn(resource: &str, location: &str, message: String) -> Self {
        tracing::warn!(resource, location, "{message}");
        Self {
            resource: resource.to_string(),
            location: location.to_string(),
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_carries_context() {
        let err = CompileError::UnsupportedType {
            resource: "Post".into(),
            field:    "body".into(),
            ty:       "blob!".into()
        };
        assert_eq!(
            err.to_string(),
            "resource `Post`: field `body`: unsupported type `blob!`"
        );
    }

    #[test]
    fn invalid_constraint_message() {
        let err = CompileError::InvalidConstraint {
            resource:   "Post".into(),
            field:      "title".into(),
            constraint: "min".into(),
            reason:     "expected an integer argument".into()
        };
        assert!(err.to_string().contains("`@min`"));
    }

    #[test]
    fn diagnostic_keeps_location() {
        let d = Diagnostic::warn("Post", "BeforeCreate", "unmapped call".into());
        assert_eq!(d.location, "BeforeCreate");
        assert_eq!(d.resource, "Post");
    }
}
