// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Go type mapping.
//!
//! | DSL Type | Go Type | Absent value |
//! |----------|---------|--------------|
//! | textual, enum | `string` | `types.Null[string]` |
//! | integer | `int64` | `types.Null[int64]` |
//! | `float`, `decimal` | `float64` | `types.Null[float64]` |
//! | boolean | `bool` | `types.Null[bool]` |
//! | `timestamp`, `date` | `time.Time` | `types.Null[time.Time]` |
//! | `uuid` | `uuid.UUID` | `types.Null[uuid.UUID]` |
//! | `json` | `json.RawMessage` | `nil` |
//! | `array<T>` | `[]T` | `nil` |
//! | `hash<K, V>` | `map[K]V` | `nil` |
//! | resource | `Name` | `*Name` |

use conduit_ast::TypeNode;

use super::{Primitive, TypeMapper, UnmappedType};
use crate::{emit::ImportSet, naming::go_name};

const UUID_IMPORT: &str = "github.com/google/uuid";

/// Shape of a Go type, as far as code generation cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoKind {
    /// Plain value; never absent.
    Value,
    /// `types.Null[T]`; present value is `x.V`.
    Null(Box<TypeRef>),
    /// `*T`; present value is `*x`.
    Pointer(Box<TypeRef>),
    /// `[]T`; absent is `nil`.
    Slice(Box<TypeRef>),
    /// `map[K]V`; absent is `nil`.
    Map(Box<TypeRef>, Box<TypeRef>),
    /// `json.RawMessage`; absent is `nil`.
    Raw
}

/// A Go type together with the imports its spelling needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Go spelling.
    pub go: String,

    /// Shape.
    pub kind: GoKind,

    /// Packages referenced by `go`.
    pub imports: ImportSet
}

impl TypeRef {
    /// Plain value type without imports (`string`, `bool`).
    #[must_use]
    pub fn value(go: impl Into<String>) -> Self {
        Self {
            go:      go.into(),
            kind:    GoKind::Value,
            imports: ImportSet::new()
        }
    }

    /// `string`
    #[must_use]
    pub fn string() -> Self {
        Self::value("string")
    }

    /// `int64`
    #[must_use]
    pub fn int() -> Self {
        Self::value("int64")
    }

    /// `float64`
    #[must_use]
    pub fn float() -> Self {
        Self::value("float64")
    }

    /// `bool`
    #[must_use]
    pub fn boolean() -> Self {
        Self::value("bool")
    }

    /// `error`
    #[must_use]
    pub fn error() -> Self {
        Self::value("error")
    }

    /// `time.Time`
    #[must_use]
    pub fn time() -> Self {
        let mut ty = Self::value("time.Time");
        ty.imports.add_std("time");
        ty
    }

    /// `uuid.UUID`
    #[must_use]
    pub fn uuid() -> Self {
        let mut ty = Self::value("uuid.UUID");
        ty.imports.add_external(UUID_IMPORT);
        ty
    }

    /// `[]elem`
    #[must_use]
    pub fn slice(elem: TypeRef) -> Self {
        Self {
            go:      format!("[]{}", elem.go),
            imports: elem.imports.clone(),
            kind:    GoKind::Slice(Box::new(elem))
        }
    }

    /// `map[key]value`
    #[must_use]
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        let mut imports = key.imports.clone();
        imports.merge(&value.imports);
        Self {
            go: format!("map[{}]{}", key.go, value.go),
            imports,
            kind: GoKind::Map(Box::new(key), Box::new(value))
        }
    }

    /// Whether the Go zero value represents absence (`nil`).
    #[must_use]
    pub fn is_nilable(&self) -> bool {
        matches!(
            self.kind,
            GoKind::Pointer(_) | GoKind::Slice(_) | GoKind::Map(..) | GoKind::Raw
        )
    }

    /// Whether this is a `types.Null[T]` wrapper.
    #[must_use]
    pub fn is_null_wrapper(&self) -> bool {
        matches!(self.kind, GoKind::Null(_))
    }

    /// Type of the present value: the wrapped type for wrappers, itself
    /// otherwise.
    #[must_use]
    pub fn present(&self) -> &TypeRef {
        match &self.kind {
            GoKind::Null(inner) => inner,
            _ => self
        }
    }

    /// Element type for slices and value type for maps.
    #[must_use]
    pub fn element(&self) -> Option<&TypeRef> {
        match &self.kind {
            GoKind::Slice(elem) => Some(elem),
            GoKind::Map(_, value) => Some(value),
            _ => None
        }
    }
}

/// Maps DSL types to Go types.
#[derive(Debug, Clone)]
pub struct GoTypeMapper {
    types_import: String
}

impl GoTypeMapper {
    /// Mapper whose nullable wrapper lives at `types_import`.
    #[must_use]
    pub fn new(types_import: impl Into<String>) -> Self {
        Self {
            types_import: types_import.into()
        }
    }

    /// `types.Null[inner]`
    #[must_use]
    pub fn null_of(&self, inner: TypeRef) -> TypeRef {
        let mut imports = inner.imports.clone();
        imports.add_external(self.types_import.clone());
        TypeRef {
            go: format!("types.Null[{}]", inner.go),
            imports,
            kind: GoKind::Null(Box::new(inner))
        }
    }

    fn scalar(primitive: Primitive) -> TypeRef {
        match primitive {
            Primitive::Text(_) => TypeRef::string(),
            Primitive::Integer => TypeRef::int(),
            Primitive::Float | Primitive::Decimal => TypeRef::float(),
            Primitive::Bool => TypeRef::boolean(),
            Primitive::Timestamp | Primitive::Date => TypeRef::time(),
            Primitive::Uuid => TypeRef::uuid(),
            Primitive::Json => TypeRef {
                go:      "json.RawMessage".to_string(),
                kind:    GoKind::Raw,
                imports: ImportSet::std("encoding/json")
            }
        }
    }

    fn nullable(&self, base: TypeRef, nullable: bool) -> TypeRef {
        if nullable && !base.is_nilable() {
            self.null_of(base)
        } else {
            base
        }
    }
}

impl TypeMapper for GoTypeMapper {
    type Output = TypeRef;

    fn map_type(&self, ty: &TypeNode) -> Result<TypeRef, UnmappedType> {
        match ty {
            TypeNode::Primitive { name, nullable } => {
                let primitive = Primitive::parse(name).ok_or(UnmappedType)?;
                Ok(self.nullable(Self::scalar(primitive), *nullable))
            }
            TypeNode::Enum { values, nullable } => {
                if values.is_empty() {
                    return Err(UnmappedType);
                }
                Ok(self.nullable(TypeRef::string(), *nullable))
            }
            TypeNode::Array { element, .. } => Ok(TypeRef::slice(self.map_type(element)?)),
            TypeNode::Hash { key, value, .. } => {
                let key = self.map_type(key)?;
                let comparable = key.kind == GoKind::Value && key.go != "time.Time";
                if !comparable {
                    return Err(UnmappedType);
                }
                Ok(TypeRef::map(key, self.map_type(value)?))
            }
            TypeNode::Resource { name, nullable } => {
                let base = TypeRef::value(go_name(name));
                if *nullable {
                    Ok(TypeRef {
                        go:      format!("*{}", base.go),
                        imports: ImportSet::new(),
                        kind:    GoKind::Pointer(Box::new(base))
                    })
                } else {
                    Ok(base)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> GoTypeMapper {
        GoTypeMapper::new("app/runtime/types")
    }

    fn go(ty: TypeNode) -> String {
        mapper().map_type(&ty).unwrap().go
    }

    #[test]
    fn scalars_map_directly() {
        assert_eq!(go(TypeNode::primitive("string")), "string");
        assert_eq!(go(TypeNode::primitive("int")), "int64");
        assert_eq!(go(TypeNode::primitive("decimal")), "float64");
        assert_eq!(go(TypeNode::primitive("timestamp")), "time.Time");
        assert_eq!(go(TypeNode::primitive("uuid")), "uuid.UUID");
        assert_eq!(go(TypeNode::enumeration(["a", "b"])), "string");
    }

    #[test]
    fn nullable_scalars_use_wrapper() {
        let ty = mapper()
            .map_type(&TypeNode::primitive("text").optional())
            .unwrap();
        assert_eq!(ty.go, "types.Null[string]");
        assert!(ty.is_null_wrapper());
        assert_eq!(ty.present().go, "string");
        assert!(ty.imports.contains("app/runtime/types"));
    }

    #[test]
    fn nullable_time_keeps_inner_import() {
        let ty = mapper()
            .map_type(&TypeNode::primitive("timestamp").optional())
            .unwrap();
        assert_eq!(ty.go, "types.Null[time.Time]");
        assert!(ty.imports.contains("time"));
    }

    #[test]
    fn nilable_types_stay_unwrapped() {
        assert_eq!(go(TypeNode::primitive("json").optional()), "json.RawMessage");
        assert_eq!(
            go(TypeNode::array(TypeNode::primitive("string")).optional()),
            "[]string"
        );
        assert_eq!(go(TypeNode::resource("User").optional()), "*User");
        assert_eq!(go(TypeNode::resource("User")), "User");
    }

    #[test]
    fn collections_nest() {
        assert_eq!(
            go(TypeNode::hash(
                TypeNode::primitive("string"),
                TypeNode::array(TypeNode::primitive("int"))
            )),
            "map[string][]int64"
        );
        let ty = mapper()
            .map_type(&TypeNode::array(TypeNode::primitive("uuid")))
            .unwrap();
        assert_eq!(ty.element().map(|e| e.go.as_str()), Some("uuid.UUID"));
        assert!(ty.imports.contains(UUID_IMPORT));
    }

    #[test]
    fn unsupported_types() {
        assert!(mapper().map_type(&TypeNode::primitive("blob")).is_err());
        assert!(mapper()
            .map_type(&TypeNode::enumeration(Vec::<String>::new()))
            .is_err());
        let bad_key = TypeNode::hash(TypeNode::primitive("json"), TypeNode::primitive("int"));
        assert!(mapper().map_type(&bad_key).is_err());
    }
}
