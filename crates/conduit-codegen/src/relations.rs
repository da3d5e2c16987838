// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Relationship loader methods.
//!
//! | Kind | Foreign key lives on | Default key | Loader |
//! |------|---------------------|-------------|--------|
//! | `belongs_to author -> User` | this resource | `author_id` | `LoadAuthor` via `FindUserByID` |
//! | `has_many comments -> Comment` | the target | `post_id` | `LoadComments` via `FindCommentsWhere` |
//! | `has_one profile -> Profile` | the target | `user_id` | `LoadProfile`, first row or `nil` |
//!
//! A `belongs_to` key must be a declared, persisted field; the schema adds
//! a `REFERENCES` clause for it. When the resource also declares a field
//! named after the relationship with a matching resource type (`User`,
//! `User?`, or `[Comment]` for a list), the loader stores the result there.

use conduit_ast::{ReferentialAction, RelationshipKind, RelationshipNode};

use crate::{
    context::{Context, FieldPlan},
    emit::{Emitter, ImportSet},
    error::CompileError,
    naming::{column_name, go_name, pluralize, table_name},
    types::{GoKind, Storage}
};

/// A relationship with its names resolved.
#[derive(Debug, Clone)]
pub struct Relation<'r> {
    /// Declaration.
    pub node:         &'r RelationshipNode,
    /// Loader method name: `LoadAuthor`.
    pub method:       String,
    /// Go type of the target: `User`.
    pub target:       String,
    /// Foreign key column, on this table for `belongs_to`, on the target
    /// table otherwise.
    pub foreign_key:  String,
    /// Schema-qualified target table.
    pub target_table: String
}

impl Relation<'_> {
    /// Whether this resource holds the key.
    #[must_use]
    pub fn is_owning(&self) -> bool {
        self.node.kind == RelationshipKind::BelongsTo
    }

    /// `ON DELETE` action, if declared.
    #[must_use]
    pub fn on_delete(&self) -> Option<ReferentialAction> {
        self.node.on_delete
    }
}

/// Resolve every relationship of a resource.
///
/// # Errors
///
/// Returns [`CompileError::MissingForeignKey`] when a `belongs_to` key is
/// not a persisted field of the resource.
pub fn resolve<'r>(ctx: &Context<'r>) -> Result<Vec<Relation<'r>>, CompileError> {
    ctx.resource
        .relationships
        .iter()
        .map(|node| {
            let foreign_key = match (&node.foreign_key, node.kind) {
                (Some(key), _) => column_name(key),
                (None, RelationshipKind::BelongsTo) => format!("{}_id", column_name(&node.name)),
                (None, _) => format!("{}_id", column_name(&ctx.resource.name))
            };
            if node.kind == RelationshipKind::BelongsTo && key_field(ctx, &foreign_key).is_none() {
                return Err(CompileError::MissingForeignKey {
                    resource:     ctx.resource.name.clone(),
                    relationship: node.name.clone(),
                    foreign_key
                });
            }
            Ok(Relation {
                node,
                method: format!("Load{}", go_name(&node.name)),
                target: go_name(&node.target),
                foreign_key,
                target_table: ctx.config.qualify(&table_name(&node.target))
            })
        })
        .collect()
}

/// Persisted field holding a `belongs_to` key.
pub fn key_field<'c, 'a>(ctx: &'c Context<'a>, column: &str) -> Option<&'c FieldPlan<'a>> {
    ctx.columns()
        .find(|f| f.column == column && f.node.is_some())
}

/// Store a loaded value in the association field named after the
/// relationship, when its type fits: `*T` or `T` for a single row, `[]*T`
/// or `[]T` for a list.
fn cache(
    ctx: &Context<'_>,
    relation: &Relation<'_>,
    loaded: &str,
    many: bool,
    out: &mut Emitter
) {
    let Some(field) = ctx.field(&relation.node.name) else {
        return;
    };
    if field.storage != Storage::Association {
        return;
    }
    let place = format!("{}.{}", ctx.receiver, field.go_name);
    let is_target = |go: &str| go == relation.target;
    match (&field.ty.kind, many) {
        (GoKind::Pointer(inner), false) if is_target(&inner.go) => {
            out.line(format!("{place} = {loaded}"));
        }
        (GoKind::Value, false) if is_target(&field.ty.go) => {
            out.line(format!("{place} = *{loaded}"));
        }
        (GoKind::Slice(elem), true) => match &elem.kind {
            GoKind::Pointer(inner) if is_target(&inner.go) => {
                out.line(format!("{place} = {loaded}"));
            }
            GoKind::Value if is_target(&elem.go) => {
                out.line(format!("{place} = make([]{}, 0, len({loaded}))", relation.target));
                out.open(format!("for _, item := range {loaded} {{"));
                out.line(format!("{place} = append({place}, *item)"));
                out.close("}");
            }
            _ => {}
        },
        _ => {}
    }
}

fn belongs_to(ctx: &Context<'_>, relation: &Relation<'_>, out: &mut Emitter) {
    let recv = &ctx.receiver;
    let Some(key) = key_field(ctx, &relation.foreign_key) else {
        return;
    };
    out.line(format!(
        "// {} loads the {} this {} belongs to.",
        relation.method, relation.target, ctx.type_name
    ));
    out.open(format!(
        "func ({recv} *{}) {}(ctx context.Context, db *sql.DB) (*{}, error) {{",
        ctx.type_name, relation.method, relation.target
    ));
    let mut value = format!("{recv}.{}", key.go_name);
    if key.ty.is_null_wrapper() {
        out.open(format!("if !{value}.Valid {{"));
        out.line("return nil, nil");
        out.close("}");
        value.push_str(".V");
    }
    out.line(format!(
        "item, err := Find{}ByID(ctx, db, {value})",
        relation.target
    ));
    out.open("if err != nil {");
    out.line(format!(
        "return nil, fmt.Errorf(\"load {} {}: %w\", err)",
        ctx.noun(),
        relation.node.name
    ));
    out.close("}");
    cache(ctx, relation, "item", false, out);
    out.line("return item, nil");
    out.close("}");
}

/// Loader for keys held by the target; `has_one` keeps the first row.
fn has_many(ctx: &Context<'_>, relation: &Relation<'_>, out: &mut Emitter) {
    let recv = &ctx.receiver;
    let plural = pluralize(&relation.target);
    let single = relation.node.kind == RelationshipKind::HasOne;

    if single {
        out.line(format!(
            "// {} loads the {} that belongs to this {}, or nil.",
            relation.method, relation.target, ctx.type_name
        ));
    } else {
        out.line(format!(
            "// {} loads the {plural} that belong to this {}.",
            relation.method, ctx.type_name
        ));
    }
    let returns = if single {
        format!("*{}", relation.target)
    } else {
        format!("[]*{}", relation.target)
    };
    out.open(format!(
        "func ({recv} *{}) {}(ctx context.Context, db *sql.DB) ({returns}, error) {{",
        ctx.type_name, relation.method
    ));
    out.line(format!(
        "items, err := Find{plural}Where(ctx, db, \"{} = $1\", {recv}.{})",
        relation.foreign_key,
        ctx.id().go_name
    ));
    out.open("if err != nil {");
    out.line(format!(
        "return nil, fmt.Errorf(\"load {} {}: %w\", err)",
        ctx.noun(),
        relation.node.name
    ));
    out.close("}");
    if single {
        out.open("if len(items) == 0 {");
        out.line("return nil, nil");
        out.close("}");
        cache(ctx, relation, "items[0]", false, out);
        out.line("return items[0], nil");
    } else {
        cache(ctx, relation, "items", true, out);
        out.line("return items, nil");
    }
    out.close("}");
}

/// Generate the loader methods, separated by blank lines.
pub fn generate(ctx: &Context<'_>, relations: &[Relation<'_>]) -> (String, ImportSet) {
    let mut imports = ImportSet::new();
    let mut sections = Vec::with_capacity(relations.len());
    for relation in relations {
        let mut out = Emitter::new();
        match relation.node.kind {
            RelationshipKind::BelongsTo => belongs_to(ctx, relation, &mut out),
            RelationshipKind::HasOne | RelationshipKind::HasMany => has_many(ctx, relation, &mut out)
        }
        sections.push(out.finish());
    }
    if !sections.is_empty() {
        for path in ["context", "database/sql", "fmt"] {
            imports.add_std(path);
        }
    }
    (sections.join("\n"), imports)
}
