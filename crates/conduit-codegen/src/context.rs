// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation context and column plan.
//!
//! [`Context`] precomputes every identifier, type and SQL fragment needed by
//! the generators. The field list ([`FieldPlan`]) is derived exactly once per
//! resource and then read by the struct declaration, scanning, binding, the
//! CRUD statements and the DDL, so the column order is identical everywhere.
//!
//! # Column subsets
//!
//! | Subset | Excludes | Used by |
//! |--------|----------|---------|
//! | [`Context::columns`] | associations | `SELECT`, `scanRes`, DDL |
//! | [`Context::insert_columns`] | server-generated keys | `INSERT` |
//! | [`Context::update_columns`] | primary key, creation timestamps | `UPDATE` |
//! | [`Context::read_only`] | writable fields | `PatchRes` |
//!
//! Building a context is also where structural errors surface: empty or
//! duplicate names, unmapped types and constraints that cannot apply.

use std::collections::HashSet;

use conduit_ast::{ConstraintNode, FieldNode, ResourceNode, TypeNode};

use crate::{
    config::{CompilerConfig, IdStrategy},
    emit::ImportSet,
    error::CompileError,
    naming::{column_name, go_name, pluralize, receiver_name, table_name},
    types::{GoTypeMapper, PostgresTypeMapper, Primitive, SqlType, Storage, TypeMapper, TypeRef}
};

const PQ_IMPORT: &str = "github.com/lib/pq";

/// Value the generated code fills in on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoValue {
    /// Supplied by the caller.
    None,
    /// `uuid.New()` before hooks run; `DEFAULT gen_random_uuid()` in DDL.
    Uuid,
    /// `BIGSERIAL`; read back with `RETURNING`.
    Serial,
    /// Set on create.
    CreatedAt,
    /// Set on create and update.
    UpdatedAt
}

impl AutoValue {
    /// Whether the value is a timestamp.
    #[must_use]
    pub const fn is_timestamp(self) -> bool {
        matches!(self, Self::CreatedAt | Self::UpdatedAt)
    }
}

/// One field of the column plan.
#[derive(Debug, Clone)]
pub struct FieldPlan<'a> {
    /// DSL name; also the JSON and form key.
    pub name: String,

    /// Declaration, `None` for a synthesized primary key.
    pub node: Option<&'a FieldNode>,

    /// Exported Go identifier.
    pub go_name: String,

    /// Go type.
    pub ty: TypeRef,

    /// SQL type; `None` for associations.
    pub sql: Option<SqlType>,

    /// Column name.
    pub column: String,

    /// Persistence strategy.
    pub storage: Storage,

    /// Scalar family, for primitives.
    pub primitive: Option<Primitive>,

    /// Whether this is the primary key.
    pub primary: bool,

    /// Generated value, if any.
    pub auto: AutoValue
}

impl FieldPlan<'_> {
    /// Whether the field has a column.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.storage.is_persisted()
    }

    /// Effective nullability.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.node.is_some_and(FieldNode::is_nullable)
    }

    /// Declared constraints.
    #[must_use]
    pub fn constraints(&self) -> &[ConstraintNode] {
        self.node
            .map(|n| n.constraints.as_slice())
            .unwrap_or_default()
    }

    /// First constraint with the given name.
    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&ConstraintNode> {
        self.constraints().iter().find(|c| c.is(name))
    }

    /// Declared type, `None` for a synthesized primary key.
    #[must_use]
    pub fn declared_type(&self) -> Option<&TypeNode> {
        self.node.map(|n| &n.ty)
    }

    /// Struct tag: `json`, `db`, `form` in this order.
    #[must_use]
    pub fn tag(&self) -> String {
        let omit = if self.is_nullable() && self.ty.is_nilable() {
            ",omitempty"
        } else {
            ""
        };
        let db = if self.is_persisted() {
            self.column.as_str()
        } else {
            "-"
        };
        format!(
            "`json:\"{name}{omit}\" db:\"{db}\" form:\"{name}{omit}\"`",
            name = self.name
        )
    }

    /// Expression passed to `Scan` for this field of `recv`.
    #[must_use]
    pub fn scan_target(&self, recv: &str) -> String {
        match self.storage {
            Storage::PgArray => format!("pq.Array(&{recv}.{})", self.go_name),
            Storage::Json => format!("types.JSON(&{recv}.{})", self.go_name),
            Storage::Column | Storage::Association => format!("&{recv}.{}", self.go_name)
        }
    }

    /// Expression bound as a query argument for this field of `recv`.
    #[must_use]
    pub fn bind_value(&self, recv: &str) -> String {
        match self.storage {
            Storage::PgArray => format!("pq.Array({recv}.{})", self.go_name),
            Storage::Json => format!("types.JSON(&{recv}.{})", self.go_name),
            Storage::Column | Storage::Association => format!("{recv}.{}", self.go_name)
        }
    }
}

/// Context for Go and DDL generation.
///
/// # Fields
///
/// | Field | Example |
/// |-------|---------|
/// | `type_name` | `BlogPost` |
/// | `receiver` | `b` |
/// | `plural` | `BlogPosts` |
/// | `table` | `public.blog_posts` |
/// | `bare_table` | `blog_posts` |
#[derive(Debug)]
pub struct Context<'a> {
    /// Resource being compiled.
    pub resource: &'a ResourceNode,

    /// Compiler options.
    pub config: &'a CompilerConfig,

    /// Go type name.
    pub type_name: String,

    /// Method receiver identifier.
    pub receiver: String,

    /// Pluralized Go type name.
    pub plural: String,

    /// Schema-qualified table name.
    pub table: String,

    /// Table name without schema, used in index names.
    pub bare_table: String,

    /// Column plan in struct order.
    pub fields: Vec<FieldPlan<'a>>,

    /// Position of the primary key in `fields`.
    id_index: usize,

    /// Go type mapper bound to the configured runtime import.
    pub go_types: GoTypeMapper
}

impl<'a> Context<'a> {
    /// Analyze a resource.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found, see [`CompileError`].
    pub fn new(resource: &'a ResourceNode, config: &'a CompilerConfig) -> Result<Self, CompileError> {
        let type_name = go_name(&resource.name);
        if type_name.is_empty() {
            return Err(CompileError::EmptyResourceName);
        }
        let go_types = GoTypeMapper::new(config.types_import());

        let mut fields = Vec::with_capacity(resource.fields.len() + 1);
        if !resource.has_id_field() {
            fields.push(synthesized_id(config));
        }

        let mut seen = HashSet::new();
        for (index, node) in resource.fields.iter().enumerate() {
            if node.name.trim().is_empty() {
                return Err(CompileError::EmptyFieldName {
                    resource: resource.name.clone(),
                    index
                });
            }
            if !seen.insert(column_name(&node.name)) {
                return Err(CompileError::DuplicateField {
                    resource: resource.name.clone(),
                    field:    node.name.clone()
                });
            }
            fields.push(plan_field(resource, node, &go_types)?);
        }

        let id_index = fields.iter().position(|f| f.primary).unwrap_or_default();
        let bare_table = table_name(&resource.name);
        Ok(Self {
            resource,
            config,
            receiver: receiver_name(&type_name),
            plural: pluralize(&type_name),
            table: config.qualify(&bare_table),
            bare_table,
            type_name,
            fields,
            id_index,
            go_types
        })
    }

    /// Resource name in prose: `blog post`.
    #[must_use]
    pub fn noun(&self) -> String {
        column_name(&self.type_name).replace('_', " ")
    }

    /// Plural resource name in prose: `blog posts`.
    #[must_use]
    pub fn nouns(&self) -> String {
        column_name(&self.plural).replace('_', " ")
    }

    /// Primary key field.
    #[must_use]
    pub fn id(&self) -> &FieldPlan<'a> {
        &self.fields[self.id_index]
    }

    /// Field by DSL name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldPlan<'a>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Persisted fields in struct order.
    pub fn columns(&self) -> impl Iterator<Item = &FieldPlan<'a>> {
        self.fields.iter().filter(|f| f.is_persisted())
    }

    /// Fields written by `INSERT`.
    pub fn insert_columns(&self) -> impl Iterator<Item = &FieldPlan<'a>> {
        self.columns().filter(|f| f.auto != AutoValue::Serial)
    }

    /// Fields written by `UPDATE`.
    pub fn update_columns(&self) -> impl Iterator<Item = &FieldPlan<'a>> {
        self.columns()
            .filter(|f| !f.primary && f.auto != AutoValue::CreatedAt)
    }

    /// Fields a partial update must not touch.
    pub fn read_only(&self) -> impl Iterator<Item = &FieldPlan<'a>> {
        self.columns()
            .filter(|f| f.primary || f.auto.is_timestamp())
    }

    /// Whether the primary key is generated by the database.
    #[must_use]
    pub fn returns_id(&self) -> bool {
        self.id().auto == AutoValue::Serial
    }

    /// Comma-separated column list for `SELECT`.
    #[must_use]
    pub fn select_list(&self) -> String {
        join_columns(self.columns())
    }

    /// Imports needed to scan and bind the persisted fields.
    #[must_use]
    pub fn storage_imports(&self) -> ImportSet {
        let mut imports = ImportSet::new();
        for field in self.columns() {
            match field.storage {
                Storage::PgArray => imports.add_external(PQ_IMPORT),
                Storage::Json => imports.add_external(self.config.types_import()),
                Storage::Column | Storage::Association => {}
            }
        }
        imports
    }

    /// Error for a constraint that cannot apply to `field`.
    pub fn invalid_constraint(
        &self,
        field: &str,
        constraint: &str,
        reason: impl Into<String>
    ) -> CompileError {
        invalid(self.resource, field, constraint, reason)
    }
}

/// Join column names into a comma-separated list.
pub fn join_columns<'f, 'a: 'f>(fields: impl Iterator<Item = &'f FieldPlan<'a>>) -> String {
    fields
        .map(|f| f.column.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `$start, $start+1, ...` for `count` parameters.
#[must_use]
pub fn placeholders(count: usize, start: usize) -> String {
    (start..start + count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn invalid(
    resource: &ResourceNode,
    field: &str,
    constraint: &str,
    reason: impl Into<String>
) -> CompileError {
    CompileError::InvalidConstraint {
        resource:   resource.name.clone(),
        field:      field.to_string(),
        constraint: constraint.to_string(),
        reason:     reason.into()
    }
}

fn synthesized_id<'a>(config: &CompilerConfig) -> FieldPlan<'a> {
    let (ty, sql, primitive, auto) = match config.id_strategy {
        IdStrategy::Uuid => (
            TypeRef::uuid(),
            SqlType::new("UUID"),
            Primitive::Uuid,
            AutoValue::Uuid
        ),
        IdStrategy::Serial => (
            TypeRef::int(),
            SqlType::new("BIGSERIAL"),
            Primitive::Integer,
            AutoValue::Serial
        )
    };
    FieldPlan {
        name: "id".to_string(),
        node: None,
        go_name: "ID".to_string(),
        ty,
        sql: Some(sql),
        column: "id".to_string(),
        storage: Storage::Column,
        primitive: Some(primitive),
        primary: true,
        auto
    }
}

fn plan_field<'a>(
    resource: &ResourceNode,
    node: &'a FieldNode,
    go_types: &GoTypeMapper
) -> Result<FieldPlan<'a>, CompileError> {
    let mut ty = node.ty.clone();
    ty.set_nullable(node.is_nullable());

    let unsupported = || CompileError::UnsupportedType {
        resource: resource.name.clone(),
        field:    node.name.clone(),
        ty:       ty.to_string()
    };
    let go_ty = go_types.map_type(&ty).map_err(|_| unsupported())?;
    let mut sql = PostgresTypeMapper.map_type(&ty).map_err(|_| unsupported())?;

    let primitive = Primitive::of(&ty);
    let storage = Storage::of(&ty);
    let primary = node.name == "id";

    if node.has_constraint("primary") && !primary {
        return Err(invalid(
            resource,
            &node.name,
            "primary",
            "the primary key is always the `id` field"
        ));
    }
    if primary && (node.is_nullable() || storage != Storage::Column) {
        return Err(invalid(
            resource,
            &node.name,
            "primary",
            "the primary key must be a non-nullable scalar"
        ));
    }

    let auto = auto_value(resource, node, primitive, primary)?;
    if auto == AutoValue::Serial
        && let Some(sql) = sql.as_mut()
    {
        sql.name = "BIGSERIAL".to_string();
    }

    Ok(FieldPlan {
        name: node.name.clone(),
        node: Some(node),
        go_name: go_name(&node.name),
        ty: go_ty,
        sql,
        column: column_name(&node.name),
        storage,
        primitive,
        primary,
        auto
    })
}

fn auto_value(
    resource: &ResourceNode,
    node: &FieldNode,
    primitive: Option<Primitive>,
    primary: bool
) -> Result<AutoValue, CompileError> {
    let auto = node.has_constraint("auto");
    let auto_update = node.has_constraint("auto_update");
    let temporal = primitive.is_some_and(Primitive::is_temporal);

    if auto_update {
        if !temporal {
            return Err(invalid(
                resource,
                &node.name,
                "auto_update",
                "only timestamp fields can be refreshed on update"
            ));
        }
        return Ok(AutoValue::UpdatedAt);
    }
    if !auto {
        return Ok(AutoValue::None);
    }
    match primitive {
        Some(p) if p.is_temporal() => Ok(AutoValue::CreatedAt),
        Some(Primitive::Uuid) if primary => Ok(AutoValue::Uuid),
        Some(Primitive::Integer) if primary => Ok(AutoValue::Serial),
        _ => Err(invalid(
            resource,
            &node.name,
            "auto",
            "expected a timestamp, or a uuid/int primary key"
        ))
    }
}

#[cfg(test)]
mod tests {
    use conduit_ast::{ConstraintNode, FieldNode, TypeNode};
    use pretty_assertions::assert_eq;

    use super::*;

    fn post() -> ResourceNode {
        ResourceNode::new("Post")
            .with_field(FieldNode::new("title", TypeNode::primitive("string")))
            .with_field(FieldNode::new("tags", TypeNode::array(TypeNode::primitive("string"))))
            .with_field(FieldNode::new("author", TypeNode::resource("User").optional()))
            .with_field(
                FieldNode::new("created_at", TypeNode::primitive("timestamp"))
                    .constraint(ConstraintNode::new("auto"))
            )
            .with_field(
                FieldNode::new("updated_at", TypeNode::primitive("timestamp"))
                    .constraint(ConstraintNode::new("auto_update"))
            )
    }

    #[test]
    fn synthesizes_uuid_id_first() {
        let config = CompilerConfig::default();
        let resource = post();
        let ctx = Context::new(&resource, &config).unwrap();
        assert_eq!(ctx.fields.len(), resource.fields.len() + 1);
        assert_eq!(ctx.fields[0].go_name, "ID");
        assert_eq!(ctx.id().ty.go, "uuid.UUID");
        assert_eq!(ctx.id().auto, AutoValue::Uuid);
        assert_eq!(ctx.table, "public.posts");
        assert_eq!(ctx.receiver, "p");
        assert_eq!(ctx.plural, "Posts");
    }

    #[test]
    fn serial_strategy() {
        let config = CompilerConfig::default().with_id_strategy(IdStrategy::Serial);
        let resource = post();
        let ctx = Context::new(&resource, &config).unwrap();
        assert_eq!(ctx.id().ty.go, "int64");
        assert!(ctx.returns_id());
        assert!(!ctx.insert_columns().any(|f| f.primary));
    }

    #[test]
    fn declared_id_is_kept() {
        let config = CompilerConfig::default();
        let resource = ResourceNode::new("Tag")
            .with_field(
                FieldNode::new("id", TypeNode::primitive("int"))
                    .constraint(ConstraintNode::new("auto"))
            )
            .with_field(FieldNode::new("label", TypeNode::primitive("string")));
        let ctx = Context::new(&resource, &config).unwrap();
        assert_eq!(ctx.fields.len(), 2);
        assert_eq!(ctx.id().auto, AutoValue::Serial);
        assert_eq!(ctx.id().sql.as_ref().unwrap().name, "BIGSERIAL");
    }

    #[test]
    fn column_subsets() {
        let config = CompilerConfig::default();
        let resource = post();
        let ctx = Context::new(&resource, &config).unwrap();
        assert_eq!(ctx.select_list(), "id, title, tags, created_at, updated_at");
        assert_eq!(join_columns(ctx.insert_columns()), "id, title, tags, created_at, updated_at");
        assert_eq!(join_columns(ctx.update_columns()), "title, tags, updated_at");
        assert_eq!(join_columns(ctx.read_only()), "id, created_at, updated_at");
        assert!(ctx.storage_imports().contains(PQ_IMPORT));
    }

    #[test]
    fn tags_follow_storage() {
        let config = CompilerConfig::default();
        let resource = post();
        let ctx = Context::new(&resource, &config).unwrap();
        assert_eq!(
            ctx.field("title").unwrap().tag(),
            "`json:\"title\" db:\"title\" form:\"title\"`"
        );
        assert_eq!(
            ctx.field("author").unwrap().tag(),
            "`json:\"author,omitempty\" db:\"-\" form:\"author,omitempty\"`"
        );
        assert_eq!(ctx.field("tags").unwrap().scan_target("p"), "pq.Array(&p.Tags)");
        assert_eq!(ctx.field("tags").unwrap().bind_value("p"), "pq.Array(p.Tags)");
    }

    #[test]
    fn timestamp_arrays_are_stored_as_json() {
        let config = CompilerConfig::default();
        let resource = ResourceNode::new("Event")
            .with_field(FieldNode::new(
                "occurrences",
                TypeNode::array(TypeNode::primitive("timestamp"))
            ))
            .with_field(FieldNode::new("scores", TypeNode::array(TypeNode::primitive("int"))));
        let ctx = Context::new(&resource, &config).unwrap();

        let occurrences = ctx.field("occurrences").unwrap();
        assert_eq!(occurrences.storage, Storage::Json);
        assert_eq!(occurrences.ty.go, "[]time.Time");
        assert_eq!(occurrences.sql.as_ref().unwrap().to_sql_string(), "JSONB");
        assert_eq!(occurrences.scan_target("e"), "types.JSON(&e.Occurrences)");
        assert_eq!(occurrences.bind_value("e"), "types.JSON(&e.Occurrences)");

        let scores = ctx.field("scores").unwrap();
        assert_eq!(scores.storage, Storage::PgArray);
        assert_eq!(scores.sql.as_ref().unwrap().to_sql_string(), "BIGINT[]");
        assert_eq!(scores.scan_target("e"), "pq.Array(&e.Scores)");
    }

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(placeholders(3, 1), "$1, $2, $3");
        assert_eq!(placeholders(1, 4), "$4");
        assert_eq!(placeholders(0, 1), "");
    }

    #[test]
    fn structural_errors() {
        let config = CompilerConfig::default();

        let unnamed = ResourceNode::new("");
        assert_eq!(
            Context::new(&unnamed, &config).unwrap_err(),
            CompileError::EmptyResourceName
        );

        let duplicate = ResourceNode::new("Post")
            .with_field(FieldNode::new("title", TypeNode::primitive("string")))
            .with_field(FieldNode::new("title", TypeNode::primitive("text")));
        assert!(matches!(
            Context::new(&duplicate, &config),
            Err(CompileError::DuplicateField { .. })
        ));

        let blank = ResourceNode::new("Post")
            .with_field(FieldNode::new(" ", TypeNode::primitive("string")));
        assert!(matches!(
            Context::new(&blank, &config),
            Err(CompileError::EmptyFieldName { index: 0, .. })
        ));

        let unknown = ResourceNode::new("Post")
            .with_field(FieldNode::new("body", TypeNode::primitive("blob")));
        assert_eq!(
            Context::new(&unknown, &config).unwrap_err(),
            CompileError::UnsupportedType {
                resource: "Post".into(),
                field:    "body".into(),
                ty:       "blob!".into()
            }
        );

        let empty_enum = ResourceNode::new("Post").with_field(FieldNode::new(
            "status",
            TypeNode::enumeration(Vec::<String>::new())
        ));
        assert!(matches!(
            Context::new(&empty_enum, &config),
            Err(CompileError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn misplaced_key_constraints() {
        let config = CompilerConfig::default();
        let primary = ResourceNode::new("Post").with_field(
            FieldNode::new("slug", TypeNode::primitive("string"))
                .constraint(ConstraintNode::new("primary"))
        );
        assert!(matches!(
            Context::new(&primary, &config),
            Err(CompileError::InvalidConstraint { .. })
        ));

        let auto = ResourceNode::new("Post").with_field(
            FieldNode::new("title", TypeNode::primitive("string"))
                .constraint(ConstraintNode::new("auto"))
        );
        assert!(matches!(
            Context::new(&auto, &config),
            Err(CompileError::InvalidConstraint { .. })
        ));
    }
}
