// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

use conduit_ast::{
    ConstraintNode, ExprNode, FieldNode, HookEvent, HookNode, HookTiming, ResourceNode, StmtNode,
    TypeNode
};
use pretty_assertions::assert_eq;

use super::*;
use crate::{
    config::{CompilerConfig, IdStrategy},
    hooks, validation
};

fn post() -> ResourceNode {
    ResourceNode::new("Post")
        .with_field(
            FieldNode::new("title", TypeNode::primitive("string"))
                .constraint(ConstraintNode::new("min").arg(ExprNode::int(5)))
        )
        .with_field(FieldNode::new("bio", TypeNode::primitive("text")).optional())
        .with_field(
            FieldNode::new("created_at", TypeNode::primitive("timestamp"))
                .constraint(ConstraintNode::new("auto"))
        )
        .with_field(
            FieldNode::new("updated_at", TypeNode::primitive("timestamp"))
                .constraint(ConstraintNode::new("auto_update"))
        )
        .with_hook(HookNode::new(HookTiming::Before, HookEvent::Save))
        .with_hook(HookNode::new(HookTiming::Before, HookEvent::Create))
        .with_hook(HookNode::new(HookTiming::After, HookEvent::Create))
}

fn parts(resource: &ResourceNode, config: &CompilerConfig) -> (CompiledHooks, CompiledValidation) {
    let ctx = Context::new(resource, config).unwrap();
    (hooks::generate(&ctx), validation::generate(&ctx).unwrap())
}

fn position(src: &str, needle: &str) -> usize {
    src.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{src}"))
}

#[test]
fn create_runs_steps_in_order() {
    let config = CompilerConfig::default();
    let resource = post();
    let ctx = Context::new(&resource, &config).unwrap();
    let (hooks, validation) = parts(&resource, &config);
    let (src, imports) = ctx.create_method(&hooks, &validation);

    let order = [
        "p.ID = uuid.New()",
        "now := time.Now().UTC()",
        "p.CreatedAt = now",
        "p.UpdatedAt = now",
        "p.BeforeCreate(ctx, db)",
        "p.BeforeSave(ctx, db)",
        "p.Validate()",
        "db.BeginTx(ctx, nil)",
        "defer tx.Rollback()",
        "tx.ExecContext(ctx, query, p.ID, p.Title, p.Bio, p.CreatedAt, p.UpdatedAt)",
        "p.AfterCreate(ctx, db)",
        "tx.Commit()"
    ];
    let positions: Vec<_> = order.iter().map(|n| position(&src, n)).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{src}");

    assert!(src.contains(
        "const query = `INSERT INTO public.posts (id, title, bio, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)`"
    ));
    assert!(src.contains("return fmt.Errorf(\"post before create hook: %w\", err)"));
    assert!(src.contains("return fmt.Errorf(\"validate post: %w\", err)"));
    assert!(src.ends_with("\treturn nil\n}\n"));
    assert!(imports.contains("time"));
}

#[test]
fn background_after_hooks_start_after_commit() {
    let config = CompilerConfig::default();
    let resource = ResourceNode::new("Post")
        .with_field(FieldNode::new("title", TypeNode::primitive("string")))
        .with_hook(
            HookNode::new(HookTiming::After, HookEvent::Create)
                .transaction()
                .with_body(vec![StmtNode::async_block(vec![StmtNode::expr(
                    ExprNode::call("Logger", "info", vec![ExprNode::self_field("title")])
                )])])
        )
        .with_hook(HookNode::new(HookTiming::After, HookEvent::Save))
        .with_hook(HookNode::new(HookTiming::After, HookEvent::Delete).detached());
    let ctx = Context::new(&resource, &config).unwrap();
    let (hooks, validation) = parts(&resource, &config);

    let (create, _) = ctx.create_method(&hooks, &validation);
    let order = [
        "tx.ExecContext(ctx, query, p.ID, p.Title)",
        "hookCtx, pending := types.Defer(ctx)",
        "p.AfterCreate(hookCtx, db)",
        "p.AfterSave(hookCtx, db)",
        "tx.Commit()",
        "pending.Start()",
        "return nil"
    ];
    let positions: Vec<_> = order.iter().map(|n| position(&create, n)).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{create}");
    assert!(create.contains(
        "\tif err := tx.Commit(); err != nil {\n\t\treturn fmt.Errorf(\"commit post create: %w\", err)\n\t}\n\tpending.Start()\n"
    ));

    let (update, _) = ctx.update_method(&hooks, &validation);
    assert!(update.contains("p.AfterSave(ctx, db)"));
    assert!(!update.contains("pending"));

    let delete = ctx.delete_method(&hooks);
    assert!(position(&delete, "p.AfterDelete(hookCtx, db)") < position(&delete, "tx.Commit()"));
    assert!(position(&delete, "tx.Commit()") < position(&delete, "pending.Start()"));
}

#[test]
fn serial_key_is_read_back() {
    let config = CompilerConfig::default().with_id_strategy(IdStrategy::Serial);
    let resource = ResourceNode::new("Tag")
        .with_field(FieldNode::new("label", TypeNode::primitive("string")));
    let ctx = Context::new(&resource, &config).unwrap();
    let (hooks, validation) = parts(&resource, &config);
    let (src, _) = ctx.create_method(&hooks, &validation);

    assert!(src.contains(
        "\tconst query = `INSERT INTO public.tags (label) VALUES ($1) RETURNING id`\n\
         \tif err := tx.QueryRowContext(ctx, query, t.Label).Scan(&t.ID); err != nil {\n\
         \t\treturn fmt.Errorf(\"insert tag: %w\", err)\n\
         \t}\n"
    ));
    assert!(!src.contains("uuid.New()"));
    assert!(!src.contains("now :="));
}

#[test]
fn conditional_validation_passes_the_event() {
    let config = CompilerConfig::default();
    let resource = ResourceNode::new("Post").with_field(
        FieldNode::new("title", TypeNode::primitive("string"))
            .constraint(ConstraintNode::new("required").on_event("create"))
    );
    let ctx = Context::new(&resource, &config).unwrap();
    let (hooks, validation) = parts(&resource, &config);
    let (create, _) = ctx.create_method(&hooks, &validation);
    let (update, _) = ctx.update_method(&hooks, &validation);
    assert!(create.contains("p.ValidateOn(\"create\")"));
    assert!(update.contains("p.ValidateOn(\"update\")"));
}

#[test]
fn update_skips_creation_columns() {
    let config = CompilerConfig::default();
    let resource = post();
    let ctx = Context::new(&resource, &config).unwrap();
    let (hooks, validation) = parts(&resource, &config);
    let (src, _) = ctx.update_method(&hooks, &validation);

    assert!(src.contains(
        "const query = `UPDATE public.posts SET title = $1, bio = $2, updated_at = $3 WHERE id = $4`"
    ));
    assert!(src.contains("res, err := tx.ExecContext(ctx, query, p.Title, p.Bio, p.UpdatedAt, p.ID)"));
    assert!(src.contains("return fmt.Errorf(\"post %v: %w\", p.ID, types.ErrNotFound)"));
    assert!(!src.contains("p.CreatedAt = now"));
    assert!(position(&src, "p.UpdatedAt = now") < position(&src, "p.BeforeSave(ctx, db)"));
}

#[test]
fn delete_checks_affected_rows() {
    let config = CompilerConfig::default();
    let resource = post();
    let ctx = Context::new(&resource, &config).unwrap();
    let (hooks, _) = parts(&resource, &config);
    let src = ctx.delete_method(&hooks);

    assert!(src.contains("const query = `DELETE FROM public.posts WHERE id = $1`"));
    assert!(src.contains("\tif affected == 0 {\n"));
    assert!(position(&src, "tx.ExecContext") < position(&src, "tx.Commit()"));
    assert!(!src.contains("BeforeCreate"));
}

#[test]
fn patch_rejects_read_only_and_unknown_keys() {
    let config = CompilerConfig::default();
    let resource = post();
    let ctx = Context::new(&resource, &config).unwrap();
    let (src, imports) = ctx.patch_method();

    assert!(src.contains(
        "\t\tswitch key {\n\
         \t\tcase \"id\", \"created_at\", \"updated_at\":\n\
         \t\t\treturn nil, &types.PatchError{Field: key, Message: \"field is read-only\"}\n\
         \t\tcase \"bio\", \"title\":\n\
         \t\tdefault:\n\
         \t\t\treturn nil, &types.PatchError{Field: key, Message: \"unknown field; valid fields: bio, title\"}\n\
         \t\t}\n\
         \t}\n"
    ));
    assert!(src.contains("return nil, &types.PatchError{Message: \"empty patch\"}"));
    assert!(position(&src, "slices.Sort(keys)") < position(&src, "FindPostByID(ctx, db, id)"));
    assert!(position(&src, "json.Unmarshal(payload, p)") < position(&src, "p.Update(ctx, db)"));
    assert!(imports.contains("slices"));
    assert!(imports.contains("encoding/json"));
}

#[test]
fn find_all_clamps_the_limit() {
    let config = CompilerConfig::default().with_page_sizes(10, 50);
    let resource = post();
    let ctx = Context::new(&resource, &config).unwrap();
    let src = ctx.find_all_method();
    assert!(src.contains(
        "\tif limit <= 0 {\n\t\tlimit = 10\n\t}\n\tif limit > 50 {\n\t\tlimit = 50\n\t}\n"
    ));
    assert!(src.contains("ORDER BY id LIMIT $1 OFFSET $2`"));
    assert!(src.contains("return collectPosts(rows)"));
}

#[test]
fn constructor_applies_defaults() {
    let config = CompilerConfig::default();
    let resource = ResourceNode::new("Post")
        .with_field(
            FieldNode::new("status", TypeNode::primitive("string"))
                .default_value(ExprNode::string("draft"))
        )
        .with_field(
            FieldNode::new("views", TypeNode::primitive("int"))
                .optional()
                .default_value(ExprNode::int(0))
        );
    let ctx = Context::new(&resource, &config).unwrap();
    assert_eq!(
        ctx.constructor().code,
        "// NewPost returns a Post with its declared defaults applied.\n\
         func NewPost() *Post {\n\
         \tp := &Post{}\n\
         \tp.Status = \"draft\"\n\
         \tp.Views = types.Some[int64](0)\n\
         \treturn p\n\
         }\n"
    );
}

#[test]
fn generate_collects_every_import() {
    let config = CompilerConfig::default();
    let resource = post();
    let ctx = Context::new(&resource, &config).unwrap();
    let (hooks, validation) = parts(&resource, &config);
    let crud = generate(&ctx, &hooks, &validation);

    for path in [
        "context",
        "database/sql",
        "encoding/json",
        "errors",
        "fmt",
        "slices",
        "time",
        "github.com/google/uuid",
        "app/runtime/types"
    ] {
        assert!(crud.imports.contains(path), "missing import {path}");
    }
    let methods = [
        "func NewPost() *Post {",
        "func (p *Post) Create(",
        "func FindPostByID(",
        "func FindAllPosts(",
        "func FindPostsWhere(",
        "func (p *Post) Update(",
        "func PatchPost(",
        "func (p *Post) Delete(",
        "func scanPost(",
        "func collectPosts("
    ];
    let positions: Vec<_> = methods.iter().map(|m| position(&crud.source, m)).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}
