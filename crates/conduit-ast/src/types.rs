// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Field types.
//!
//! Every [`TypeNode`] carries its own `nullable` flag, so optionality is never
//! implied by context.
//!
//! ```text
//! string!            Primitive { name: "string", nullable: false }
//! array<string>?     Array { element: string!, nullable: true }
//! hash<string, int>! Hash { key: string!, value: int!, nullable: false }
//! enum[draft, live]! Enum { values: ["draft", "live"], nullable: false }
//! User?              Resource { name: "User", nullable: true }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A DSL type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeNode {
    /// Built-in scalar such as `string`, `int` or `timestamp`.
    Primitive {
        /// Primitive name as written in the DSL.
        name:     String,
        /// Whether the value may be absent.
        #[serde(default)]
        nullable: bool
    },

    /// Ordered list of elements.
    Array {
        /// Element type.
        element:  Box<TypeNode>,
        /// Whether the list itself may be absent.
        #[serde(default)]
        nullable: bool
    },

    /// Key/value map.
    Hash {
        /// Key type.
        key:      Box<TypeNode>,
        /// Value type.
        value:    Box<TypeNode>,
        /// Whether the map itself may be absent.
        #[serde(default)]
        nullable: bool
    },

    /// Closed set of string values.
    Enum {
        /// Allowed values in declaration order.
        values:   Vec<String>,
        /// Whether the value may be absent.
        #[serde(default)]
        nullable: bool
    },

    /// Reference to another resource.
    Resource {
        /// Referenced resource name.
        name:     String,
        /// Whether the reference may be absent.
        #[serde(default)]
        nullable: bool
    }
}

impl TypeNode {
    /// Non-nullable primitive.
    #[must_use]
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::Primitive {
            name:     name.into(),
            nullable: false
        }
    }

    /// Non-nullable array of `element`.
    #[must_use]
    pub fn array(element: TypeNode) -> Self {
        Self::Array {
            element:  Box::new(element),
            nullable: false
        }
    }

    /// Non-nullable hash.
    #[must_use]
    pub fn hash(key: TypeNode, value: TypeNode) -> Self {
        Self::Hash {
            key:      Box::new(key),
            value:    Box::new(value),
            nullable: false
        }
    }

    /// Non-nullable enum.
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        Self::Enum {
            values:   values.into_iter().map(Into::into).collect(),
            nullable: false
        }
    }

    /// Non-nullable resource reference.
    #[must_use]
    pub fn resource(name: impl Into<String>) -> Self {
        Self::Resource {
            name:     name.into(),
            nullable: false
        }
    }

    /// Same type with the nullable flag set.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.set_nullable(true);
        self
    }

    /// Whether the value may be absent.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Primitive { nullable, .. }
            | Self::Array { nullable, .. }
            | Self::Hash { nullable, .. }
            | Self::Enum { nullable, .. }
            | Self::Resource { nullable, .. } => *nullable
        }
    }

    /// Overwrite the nullable flag.
    pub fn set_nullable(&mut self, value: bool) {
        match self {
            Self::Primitive { nullable, .. }
            | Self::Array { nullable, .. }
            | Self::Hash { nullable, .. }
            | Self::Enum { nullable, .. }
            | Self::Resource { nullable, .. } => *nullable = value
        }
    }

    /// Primitive name, if this is a primitive.
    #[must_use]
    pub fn primitive_name(&self) -> Option<&str> {
        match self {
            Self::Primitive { name, .. } => Some(name),
            _ => None
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive { name, .. } => write!(f, "{name}")?,
            Self::Array { element, .. } => write!(f, "array<{element}>")?,
            Self::Hash { key, value, .. } => write!(f, "hash<{key}, {value}>")?,
            Self::Enum { values, .. } => write!(f, "enum[{}]", values.join(", "))?,
            Self::Resource { name, .. } => write!(f, "{name}")?
        }
        f.write_str(if self.is_nullable() { "?" } else { "!" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_marks_nullability() {
        assert_eq!(TypeNode::primitive("string").to_string(), "string!");
        assert_eq!(
            TypeNode::array(TypeNode::primitive("int")).optional().to_string(),
            "array<int!>?"
        );
        assert_eq!(
            TypeNode::enumeration(["draft", "live"]).to_string(),
            "enum[draft, live]!"
        );
    }

    #[test]
    fn nullable_defaults_to_false() {
        let ty: TypeNode = serde_json::from_str(r#"{"kind":"primitive","name":"uuid"}"#).unwrap();
        assert!(!ty.is_nullable());
        assert_eq!(ty.primitive_name(), Some("uuid"));
    }

    #[test]
    fn nested_types_decode() {
        let ty: TypeNode = serde_json::from_str(
            r#"{
                "kind": "hash",
                "key": { "kind": "primitive", "name": "string" },
                "value": { "kind": "array", "element": { "kind": "primitive", "name": "int" } },
                "nullable": true
            }"#
        )
        .unwrap();
        assert_eq!(
            ty,
            TypeNode::hash(
                TypeNode::primitive("string"),
                TypeNode::array(TypeNode::primitive("int"))
            )
            .optional()
        );
    }
}
