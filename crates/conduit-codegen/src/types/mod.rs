// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Type mapping from DSL types to Go types and PostgreSQL columns.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Type Mapping System                           │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  DSL Type            GoTypeMapper         PostgresTypeMapper        │
//! │                                                                     │
//! │  string!       ──►   string          ──►  TEXT NOT NULL             │
//! │  int?          ──►   types.Null[int64] ─► BIGINT                    │
//! │  timestamp!    ──►   time.Time       ──►  TIMESTAMPTZ NOT NULL      │
//! │  array<int!>   ──►   []int64         ──►  BIGINT[]                  │
//! │  array<date!>  ──►   []time.Time     ──►  JSONB                     │
//! │  hash<k, v>    ──►   map[K]V         ──►  JSONB                     │
//! │  User?         ──►   *User           ──►  (no column)               │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both mappers classify a field the same way through [`Storage`], so the Go
//! struct, the scan/bind code and the DDL cannot disagree about which fields
//! are columns.

mod go;
mod postgres;

use conduit_ast::TypeNode;
pub use go::{GoKind, GoTypeMapper, TypeRef};
pub use postgres::PostgresTypeMapper;

/// Error returned when a DSL type has no mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmappedType;

/// Trait for mapping DSL types to a target representation.
pub trait TypeMapper {
    /// Mapped representation.
    type Output;

    /// Map a DSL type.
    ///
    /// # Errors
    ///
    /// Returns [`UnmappedType`] for unknown primitives, empty enums and
    /// unsupported hash keys.
    fn map_type(&self, ty: &TypeNode) -> Result<Self::Output, UnmappedType>;
}

/// Textual primitive flavor; drives implicit format validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// No format.
    Plain,
    /// `email`
    Email,
    /// `url`
    Url
}

/// Built-in scalar families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `string`, `text`, `markdown`, `email`, `url`, `slug`, `phone`
    Text(TextFormat),
    /// `int`, `integer`, `bigint`
    Integer,
    /// `float`
    Float,
    /// `decimal`
    Decimal,
    /// `bool`, `boolean`
    Bool,
    /// `timestamp`, `datetime`
    Timestamp,
    /// `date`
    Date,
    /// `uuid`
    Uuid,
    /// `json`
    Json
}

impl Primitive {
    /// Classify a primitive name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let primitive = match name {
            "string" | "text" | "markdown" | "slug" | "phone" => Self::Text(TextFormat::Plain),
            "email" => Self::Text(TextFormat::Email),
            "url" => Self::Text(TextFormat::Url),
            "int" | "integer" | "bigint" => Self::Integer,
            "float" => Self::Float,
            "decimal" => Self::Decimal,
            "bool" | "boolean" => Self::Bool,
            "timestamp" | "datetime" => Self::Timestamp,
            "date" => Self::Date,
            "uuid" => Self::Uuid,
            "json" => Self::Json,
            _ => return None
        };
        Some(primitive)
    }

    /// Classify a type node, if it is a primitive.
    #[must_use]
    pub fn of(ty: &TypeNode) -> Option<Self> {
        ty.primitive_name().and_then(Self::parse)
    }

    /// Whether values are strings.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Whether values are numbers.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Decimal)
    }

    /// Whether values are points in time.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Timestamp | Self::Date)
    }
}

/// How a field is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Scalar column scanned and bound directly.
    Column,
    /// PostgreSQL array column, bound through `pq.Array`. Only element types
    /// pq scans from array text: strings, numbers, booleans and UUIDs.
    PgArray,
    /// JSONB column, bound through the runtime `types.JSON` adapter.
    Json,
    /// Association to another resource; not a column.
    Association
}

impl Storage {
    /// Classify a field type.
    #[must_use]
    pub fn of(ty: &TypeNode) -> Self {
        match ty {
            TypeNode::Primitive { .. } | TypeNode::Enum { .. } => Self::Column,
            TypeNode::Resource { .. } => Self::Association,
            TypeNode::Array { element, .. } => match element.as_ref() {
                TypeNode::Enum { .. } => Self::PgArray,
                TypeNode::Primitive { .. } => match Primitive::of(element) {
                    Some(p) if p.is_temporal() || p == Primitive::Json => Self::Json,
                    _ => Self::PgArray
                },
                TypeNode::Resource { .. } => Self::Association,
                TypeNode::Array { .. } | TypeNode::Hash { .. } => Self::Json
            },
            TypeNode::Hash { .. } => Self::Json
        }
    }

    /// Whether the field has a column.
    #[must_use]
    pub const fn is_persisted(self) -> bool {
        !matches!(self, Self::Association)
    }
}

/// Mapped SQL type representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlType {
    /// SQL type name (e.g., "UUID", "TEXT", "BIGINT").
    pub name: String,

    /// Whether this type allows NULL values.
    pub nullable: bool,

    /// Array dimension (0 = scalar, 1 = T[]).
    pub array_dim: usize
}

impl SqlType {
    /// Create a non-nullable SQL type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:      name.into(),
            nullable:  false,
            array_dim: 0
        }
    }

    /// Set nullability.
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Get the full SQL type string with array suffix.
    #[must_use]
    pub fn to_sql_string(&self) -> String {
        if self.array_dim > 0 {
            format!("{}{}", self.name, "[]".repeat(self.array_dim))
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_families() {
        assert_eq!(Primitive::parse("slug"), Some(Primitive::Text(TextFormat::Plain)));
        assert_eq!(Primitive::parse("email"), Some(Primitive::Text(TextFormat::Email)));
        assert_eq!(Primitive::parse("bigint"), Some(Primitive::Integer));
        assert_eq!(Primitive::parse("datetime"), Some(Primitive::Timestamp));
        assert_eq!(Primitive::parse("blob"), None);
        assert!(Primitive::Decimal.is_numeric());
        assert!(Primitive::Date.is_temporal());
    }

    #[test]
    fn storage_classification() {
        assert_eq!(Storage::of(&TypeNode::primitive("string")), Storage::Column);
        assert_eq!(
            Storage::of(&TypeNode::array(TypeNode::primitive("string"))),
            Storage::PgArray
        );
        assert_eq!(
            Storage::of(&TypeNode::array(TypeNode::primitive("uuid"))),
            Storage::PgArray
        );
        assert_eq!(
            Storage::of(&TypeNode::array(TypeNode::array(TypeNode::primitive("int")))),
            Storage::Json
        );
        for element in ["timestamp", "date", "json"] {
            assert_eq!(
                Storage::of(&TypeNode::array(TypeNode::primitive(element))),
                Storage::Json,
                "{element}"
            );
        }
        assert_eq!(
            Storage::of(&TypeNode::hash(
                TypeNode::primitive("string"),
                TypeNode::primitive("int")
            )),
            Storage::Json
        );
        assert_eq!(Storage::of(&TypeNode::resource("User")), Storage::Association);
        assert!(!Storage::Association.is_persisted());
    }

    #[test]
    fn sql_type_to_sql_string() {
        assert_eq!(SqlType::new("UUID").to_sql_string(), "UUID");
        let ty = SqlType {
            name:      "TEXT".to_string(),
            nullable:  false,
            array_dim: 1
        };
        assert_eq!(ty.to_sql_string(), "TEXT[]");
    }
}
