// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! PostgreSQL type mapping.
//!
//! | DSL Type | PostgreSQL Type | Notes |
//! |----------|-----------------|-------|
//! | textual | `TEXT` | |
//! | integer | `BIGINT` | |
//! | `float` | `DOUBLE PRECISION` | |
//! | `decimal` | `NUMERIC` | |
//! | boolean | `BOOLEAN` | |
//! | `timestamp` | `TIMESTAMPTZ` | |
//! | `date` | `DATE` | |
//! | `uuid` | `UUID` | |
//! | `json` | `JSONB` | |
//! | enum | `TEXT` | values enforced by `CHECK` |
//! | `array<primitive>` | `T[]` | PostgreSQL array |
//! | `array<timestamp>`, `array<date>`, `array<json>` | `JSONB` | pq cannot scan these arrays |
//! | nested array, hash | `JSONB` | |
//! | resource | none | association, not a column |

use conduit_ast::TypeNode;

use super::{Primitive, SqlType, Storage, TypeMapper, UnmappedType};

/// PostgreSQL type mapper; `None` means the type has no column.
pub struct PostgresTypeMapper;

impl TypeMapper for PostgresTypeMapper {
    type Output = Option<SqlType>;

    fn map_type(&self, ty: &TypeNode) -> Result<Option<SqlType>, UnmappedType> {
        let mapped = match ty {
            TypeNode::Primitive { name, nullable } => {
                let primitive = Primitive::parse(name).ok_or(UnmappedType)?;
                Some(SqlType::new(primitive_name(primitive)).with_nullable(*nullable))
            }
            TypeNode::Enum { values, nullable } => {
                if values.is_empty() {
                    return Err(UnmappedType);
                }
                Some(SqlType::new("TEXT").with_nullable(*nullable))
            }
            TypeNode::Array { element, nullable } => match Storage::of(ty) {
                Storage::PgArray => {
                    let mut inner = self.map_type(element)?.ok_or(UnmappedType)?;
                    inner.array_dim += 1;
                    inner.nullable = *nullable;
                    Some(inner)
                }
                Storage::Json => {
                    self.map_type(element)?;
                    Some(SqlType::new("JSONB").with_nullable(*nullable))
                }
                Storage::Column | Storage::Association => None
            },
            TypeNode::Hash {
                key,
                value,
                nullable
            } => {
                self.map_type(key)?;
                self.map_type(value)?;
                Some(SqlType::new("JSONB").with_nullable(*nullable))
            }
            TypeNode::Resource { .. } => None
        };
        Ok(mapped)
    }
}

fn primitive_name(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Text(_) => "TEXT",
        Primitive::Integer => "BIGINT",
        Primitive::Float => "DOUBLE PRECISION",
        Primitive::Decimal => "NUMERIC",
        Primitive::Bool => "BOOLEAN",
        Primitive::Timestamp => "TIMESTAMPTZ",
        Primitive::Date => "DATE",
        Primitive::Uuid => "UUID",
        Primitive::Json => "JSONB"
    }
}
