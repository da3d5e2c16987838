// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! DDL generation for PostgreSQL.
//!
//! Generates `CREATE TABLE`, `CREATE INDEX` and `DROP TABLE` statements from
//! the same column plan the Go code uses.
//!
//! # Constraint Mapping
//!
//! | Declaration | DDL |
//! |-------------|-----|
//! | `id` | `PRIMARY KEY` |
//! | non-nullable | `NOT NULL` |
//! | `@min(a) @max(b)` on text | `CHECK (char_length(col) BETWEEN a AND b)` |
//! | `@min(a)` on a number | `CHECK (col >= a)` |
//! | enum | `CHECK (col IN ('a', 'b'))` |
//! | `@auto` uuid | `DEFAULT gen_random_uuid()` |
//! | `@auto` / `@auto_update` timestamp | `DEFAULT NOW()` |
//! | literal default | `DEFAULT <literal>` |
//! | `belongs_to` key | `REFERENCES schema.targets(id) [ON DELETE ...]` |
//! | `@unique` / `@index` | `CREATE [UNIQUE] INDEX` |
//! | resource `@unique(a, b)` | composite unique index |
//!
//! Event-scoped constraints (`on: [create]`) only exist in `ValidateOn`;
//! a table check would also reject the other event.

use conduit_ast::{ConstraintNode, ExprNode, LiteralValue, TypeNode, UnaryOp};

use crate::{
    context::{AutoValue, Context, FieldPlan},
    error::CompileError,
    naming::{column_name, sql_string},
    relations::Relation,
    types::Primitive
};

/// Migration pair for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// `CREATE TABLE` and indexes.
    pub up:   String,
    /// `DROP TABLE`.
    pub down: String
}

/// Generate the up and down migrations.
///
/// # Errors
///
/// Returns [`CompileError::InvalidConstraint`] for resource-level
/// constraints that are not indexes or that name unknown fields.
pub fn generate(ctx: &Context<'_>, relations: &[Relation<'_>]) -> Result<Schema, CompileError> {
    let mut up = create_table(ctx, relations);

    for field in ctx.columns() {
        if field.primary {
            continue;
        }
        let unique = unconditional(field, "unique");
        if unique || unconditional(field, "index") {
            up.push_str(&index(ctx, &[field.column.as_str()], unique));
        }
    }

    for constraint in &ctx.resource.constraints {
        let unique = constraint.is("unique");
        if !unique && !constraint.is("index") {
            return Err(ctx.invalid_constraint(
                "*",
                &constraint.name,
                "only unique and index apply to a whole resource"
            ));
        }
        let columns = composite_columns(ctx, constraint)?;
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        up.push_str(&index(ctx, &columns, unique));
    }

    Ok(Schema {
        up,
        down: format!("DROP TABLE IF EXISTS {} CASCADE;\n", ctx.table)
    })
}

fn unconditional(field: &FieldPlan<'_>, name: &str) -> bool {
    field
        .constraints()
        .iter()
        .any(|c| c.is(name) && c.is_unconditional())
}

/// Generate CREATE TABLE statement.
fn create_table(ctx: &Context<'_>, relations: &[Relation<'_>]) -> String {
    let columns: Vec<String> = ctx
        .columns()
        .map(|field| column_def(field, relations))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
        ctx.table,
        columns.join(",\n")
    )
}

/// Generate a single column definition.
fn column_def(field: &FieldPlan<'_>, relations: &[Relation<'_>]) -> String {
    let mut parts = vec![format!("    {}", field.column)];
    if let Some(sql) = &field.sql {
        parts.push(sql.to_sql_string());
    }

    if field.primary {
        parts.push("PRIMARY KEY".to_string());
    } else if !field.is_nullable() {
        parts.push("NOT NULL".to_string());
    }

    if let Some(default) = default_value(field) {
        parts.push(format!("DEFAULT {default}"));
    }

    if let Some(check) = bounds_check(field) {
        parts.push(format!("CHECK ({check})"));
    }
    if let Some(TypeNode::Enum { values, .. }) = field.declared_type() {
        let values: Vec<String> = values.iter().map(|v| sql_string(v)).collect();
        parts.push(format!("CHECK ({} IN ({}))", field.column, values.join(", ")));
    }

    if let Some(relation) = relations
        .iter()
        .find(|r| r.is_owning() && r.foreign_key == field.column)
    {
        let mut reference = format!("REFERENCES {}(id)", relation.target_table);
        if let Some(action) = relation.on_delete() {
            reference.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        parts.push(reference);
    }

    parts.join(" ")
}

fn default_value(field: &FieldPlan<'_>) -> Option<String> {
    match field.auto {
        AutoValue::Uuid => return Some("gen_random_uuid()".to_string()),
        AutoValue::CreatedAt | AutoValue::UpdatedAt => return Some("NOW()".to_string()),
        AutoValue::Serial | AutoValue::None => {}
    }
    sql_literal(field.node?.default.as_ref()?)
}

/// SQL spelling of a literal default; other expressions only run in `NewRes`.
fn sql_literal(expr: &ExprNode) -> Option<String> {
    match expr {
        ExprNode::Literal { value } => match value {
            LiteralValue::Null => None,
            LiteralValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            LiteralValue::Int(i) => Some(i.to_string()),
            LiteralValue::Float(f) if f.is_finite() => Some(format!("{f:?}")),
            LiteralValue::Float(_) => None,
            LiteralValue::String(s) => Some(sql_string(s))
        },
        ExprNode::Unary {
            op: UnaryOp::Neg,
            operand
        } => match operand.as_ref() {
            ExprNode::Literal {
                value: LiteralValue::Int(_) | LiteralValue::Float(_)
            } => sql_literal(operand).map(|v| format!("-{v}")),
            _ => None
        },
        ExprNode::Paren { inner } => sql_literal(inner),
        _ => None
    }
}

fn bound(field: &FieldPlan<'_>, name: &str) -> Option<String> {
    let constraint = field
        .constraints()
        .iter()
        .find(|c| c.is(name) && c.is_unconditional())?;
    match constraint.literal(0)? {
        LiteralValue::Int(i) => Some(i.to_string()),
        LiteralValue::Float(f) if f.is_finite() => Some(format!("{f:?}")),
        _ => None
    }
}

/// Length check for text, value check for numbers.
fn bounds_check(field: &FieldPlan<'_>) -> Option<String> {
    let subject = match field.primitive? {
        Primitive::Text(_) => format!("char_length({})", field.column),
        p if p.is_numeric() => field.column.clone(),
        _ => return None
    };
    match (bound(field, "min"), bound(field, "max")) {
        (Some(min), Some(max)) => Some(format!("{subject} BETWEEN {min} AND {max}")),
        (Some(min), None) => Some(format!("{subject} >= {min}")),
        (None, Some(max)) => Some(format!("{subject} <= {max}")),
        (None, None) => None
    }
}

/// Column names of a composite index.
fn composite_columns(
    ctx: &Context<'_>,
    constraint: &ConstraintNode
) -> Result<Vec<String>, CompileError> {
    if constraint.arguments.is_empty() {
        return Err(ctx.invalid_constraint("*", &constraint.name, "expects field names"));
    }
    constraint
        .arguments
        .iter()
        .map(|arg| {
            let name = match arg {
                ExprNode::Identifier { name } => name.as_str(),
                ExprNode::Literal {
                    value: LiteralValue::String(name)
                } => name.as_str(),
                _ => {
                    return Err(ctx.invalid_constraint(
                        "*",
                        &constraint.name,
                        "expects field names"
                    ));
                }
            };
            let column = column_name(name);
            if ctx.columns().any(|f| f.column == column) {
                Ok(column)
            } else {
                Err(ctx.invalid_constraint(
                    name,
                    &constraint.name,
                    "not a persisted field of the resource"
                ))
            }
        })
        .collect()
}

/// Generate CREATE INDEX.
fn index(ctx: &Context<'_>, columns: &[&str], unique: bool) -> String {
    let name = format!("idx_{}_{}", ctx.bare_table, columns.join("_"));
    let unique = if unique { "UNIQUE " } else { "" };
    format!(
        "CREATE {unique}INDEX IF NOT EXISTS {name} ON {} ({});\n",
        ctx.table,
        columns.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use conduit_ast::{FieldNode, ReferentialAction, RelationshipKind, RelationshipNode, ResourceNode};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::{CompilerConfig, IdStrategy},
        relations
    };

    fn compile(resource: &ResourceNode, config: &CompilerConfig) -> Result<Schema, CompileError> {
        let ctx = Context::new(resource, config)?;
        let relations = relations::resolve(&ctx)?;
        generate(&ctx, &relations)
    }

    #[test]
    fn post_table() {
        let resource = ResourceNode::new("Post")
            .with_field(
                FieldNode::new("title", TypeNode::primitive("string"))
                    .constraint(ConstraintNode::new("min").arg(ExprNode::int(5)))
                    .constraint(ConstraintNode::new("max").arg(ExprNode::int(200)))
            )
            .with_field(
                FieldNode::new("slug", TypeNode::primitive("slug"))
                    .constraint(ConstraintNode::new("unique"))
            )
            .with_field(
                FieldNode::new("status", TypeNode::enumeration(["draft", "published"]))
                    .default_value(ExprNode::string("draft"))
            )
            .with_field(FieldNode::new("views", TypeNode::primitive("int")).optional())
            .with_field(
                FieldNode::new("created_at", TypeNode::primitive("timestamp"))
                    .constraint(ConstraintNode::new("auto"))
            );
        let schema = compile(&resource, &CompilerConfig::default()).unwrap();
        assert_eq!(
            schema.up,
            "CREATE TABLE IF NOT EXISTS public.posts (\n\
             \x20   id UUID PRIMARY KEY DEFAULT gen_random_uuid(),\n\
             \x20   title TEXT NOT NULL CHECK (char_length(title) BETWEEN 5 AND 200),\n\
             \x20   slug TEXT NOT NULL,\n\
             \x20   status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'published')),\n\
             \x20   views BIGINT,\n\
             \x20   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()\n\
             );\n\
             CREATE UNIQUE INDEX IF NOT EXISTS idx_posts_slug ON public.posts (slug);\n"
        );
        assert_eq!(schema.down, "DROP TABLE IF EXISTS public.posts CASCADE;\n");
    }

    #[test]
    fn serial_key_and_numeric_bounds() {
        let resource = ResourceNode::new("Score").with_field(
            FieldNode::new("points", TypeNode::primitive("float"))
                .constraint(ConstraintNode::new("min").arg(ExprNode::float(0.5)))
        );
        let config = CompilerConfig::default()
            .with_id_strategy(IdStrategy::Serial)
            .with_schema("");
        let up = compile(&resource, &config).unwrap().up;
        assert!(up.contains("    id BIGSERIAL PRIMARY KEY,\n"));
        assert!(up.contains("    points DOUBLE PRECISION NOT NULL CHECK (points >= 0.5)\n"));
        assert!(up.starts_with("CREATE TABLE IF NOT EXISTS scores ("));
    }

    #[test]
    fn foreign_key_references_target() {
        let resource = ResourceNode::new("Comment")
            .with_field(
                FieldNode::new("post_id", TypeNode::primitive("uuid"))
                    .constraint(ConstraintNode::new("index"))
            )
            .with_relationship(
                RelationshipNode::new("post", RelationshipKind::BelongsTo, "Post")
                    .on_delete(ReferentialAction::Cascade)
            );
        let up = compile(&resource, &CompilerConfig::default()).unwrap().up;
        assert!(up.contains(
            "    post_id UUID NOT NULL REFERENCES public.posts(id) ON DELETE CASCADE\n"
        ));
        assert!(up.contains(
            "CREATE INDEX IF NOT EXISTS idx_comments_post_id ON public.comments (post_id);\n"
        ));
    }

    #[test]
    fn composite_unique_index() {
        let resource = ResourceNode::new("Membership")
            .with_field(FieldNode::new("user_id", TypeNode::primitive("uuid")))
            .with_field(FieldNode::new("team_id", TypeNode::primitive("uuid")))
            .with_constraint(
                ConstraintNode::new("unique")
                    .arg(ExprNode::ident("user_id"))
                    .arg(ExprNode::string("team_id"))
            );
        let up = compile(&resource, &CompilerConfig::default()).unwrap().up;
        assert!(up.ends_with(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_memberships_user_id_team_id ON public.memberships (user_id, team_id);\n"
        ));
    }

    #[test]
    fn composite_index_on_unknown_field_fails() {
        let resource = ResourceNode::new("Membership")
            .with_constraint(ConstraintNode::new("unique").arg(ExprNode::ident("ghost")));
        assert!(matches!(
            compile(&resource, &CompilerConfig::default()),
            Err(CompileError::InvalidConstraint { field, .. }) if field == "ghost"
        ));
    }

    #[test]
    fn scoped_constraints_stay_out_of_ddl() {
        let resource = ResourceNode::new("Post").with_field(
            FieldNode::new("title", TypeNode::primitive("string")).constraint(
                ConstraintNode::new("min")
                    .arg(ExprNode::int(3))
                    .on_event("create")
            )
        );
        let up = compile(&resource, &CompilerConfig::default()).unwrap().up;
        assert!(!up.contains("CHECK"));
    }

    #[test]
    fn literal_defaults() {
        assert_eq!(sql_literal(&ExprNode::boolean(true)).as_deref(), Some("TRUE"));
        assert_eq!(
            sql_literal(&ExprNode::unary(UnaryOp::Neg, ExprNode::int(3))).as_deref(),
            Some("-3")
        );
        assert_eq!(sql_literal(&ExprNode::string("it's")).as_deref(), Some("'it''s'"));
        assert_eq!(sql_literal(&ExprNode::null()), None);
        assert_eq!(sql_literal(&ExprNode::ident("now")), None);
    }
}
