// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! End-to-end compilation of the blog fixture.
//!
//! Run with: `cargo test -p conduit --test compile`

use conduit::{
    BatchOutput, CompiledResource, CompilerConfig, FieldNode, ResourceCompiler, ResourceNode,
    TypeNode, compile_json, from_json_batch
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const BLOG: &str = include_str!("fixtures/blog.json");

fn blog() -> BatchOutput {
    compile_json(BLOG, &CompilerConfig::default()).expect("blog compiles")
}

fn resource<'a>(batch: &'a BatchOutput, name: &str) -> &'a CompiledResource {
    batch
        .resources
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("{name} missing"))
}

fn position(src: &str, needle: &str) -> usize {
    src.find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not found in:\n{src}"))
}

/// Body of the struct declaration, one line per field.
fn struct_lines<'a>(src: &'a str, type_name: &str) -> Vec<&'a str> {
    let start = position(src, &format!("type {type_name} struct {{\n"));
    src[start..]
        .lines()
        .skip(1)
        .take_while(|line| *line != "}")
        .collect()
}

#[test]
fn batch_is_sorted_and_clean() {
    let batch = blog();
    let names: Vec<_> = batch.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Comment", "Post", "User"]);
    for compiled in &batch.resources {
        assert!(
            compiled.diagnostics.is_empty(),
            "{}: {:?}",
            compiled.name,
            compiled.diagnostics
        );
        assert!(compiled.source.starts_with(conduit::GENERATED_HEADER));
        assert!(!compiled.source.contains(conduit::PLACEHOLDER_MARKER));
    }
    assert_eq!(resource(&batch, "Post").file_name, "post.go");
}

#[test]
fn post_scenario() {
    let batch = blog();
    let post = resource(&batch, "Post");
    let src = &post.source;

    assert!(src.contains("// Post is a blog entry.\ntype Post struct {\n"));
    assert!(src.contains("\tp.Slug = stdlib.Slugify(p.Title)\n"));
    assert!(src.contains("\tif utf8.RuneCountInString(p.Title) < 5 {\n"));
    assert!(src.contains("\tif utf8.RuneCountInString(p.Title) > 200 {\n"));
    assert!(src.contains("func FindPostByID(ctx context.Context, db *sql.DB, id uuid.UUID) (*Post, error) {"));
    assert!(src.contains("func (p *Post) LoadAuthor(ctx context.Context, db *sql.DB) (*User, error) {"));
    assert!(src.contains("func (p *Post) LoadComments(ctx context.Context, db *sql.DB) ([]*Comment, error) {"));

    let up = &post.schema.up;
    assert!(up.contains("    title TEXT NOT NULL CHECK (char_length(title) BETWEEN 5 AND 200),\n"));
    assert!(up.contains("    author_id UUID NOT NULL REFERENCES public.users(id) ON DELETE CASCADE,\n"));
    assert!(up.contains("CREATE UNIQUE INDEX IF NOT EXISTS idx_posts_slug ON public.posts (slug);\n"));
    assert!(!up.contains("author UUID"));
}

#[test]
fn transactional_after_create_commits_before_spawning() {
    let batch = blog();
    let src = &resource(&batch, "Post").source;
    let hook = &src[position(src, "func (p *Post) AfterCreate(")..];
    let hook = &hook[..position(hook, "\n}\n")];

    let rollback = position(hook, "defer tx.Rollback()");
    let commit = position(hook, "tx.Commit()");
    let spawn = position(hook, "types.Spawn(ctx, *p, func(p Post) {");
    assert!(rollback < commit && commit < spawn, "{hook}");
    assert_eq!(hook.matches("tx.Commit()").count(), 1);
    assert!(hook.contains("slog.Info(p.Title)"));
}

#[test]
fn create_calls_hooks_before_validation() {
    let batch = blog();
    let src = &resource(&batch, "Post").source;
    let create = &src[position(src, "func (p *Post) Create(")..];

    let before_create = position(create, "p.BeforeCreate(ctx, db)");
    let before_save = position(create, "p.BeforeSave(ctx, db)");
    let validate = position(create, "p.Validate()");
    let after_create = position(create, "p.AfterCreate(hookCtx, db)");
    assert!(before_create < before_save && before_save < validate && validate < after_create);
}

#[test]
fn create_starts_background_work_after_its_commit() {
    let batch = blog();
    let src = &resource(&batch, "Post").source;
    let create = &src[position(src, "func (p *Post) Create(")..];
    let create = &create[..position(create, "\n}\n")];

    let insert = position(create, "tx.ExecContext(ctx, query");
    let deferred = position(create, "hookCtx, pending := types.Defer(ctx)");
    let after_create = position(create, "p.AfterCreate(hookCtx, db)");
    let commit = position(create, "tx.Commit()");
    let start = position(create, "pending.Start()");
    assert!(insert < deferred && deferred < after_create, "{create}");
    assert!(after_create < commit && commit < start, "{create}");
}

#[test]
fn tags_are_ordered() {
    let batch = blog();
    for compiled in &batch.resources {
        for line in struct_lines(&compiled.source, &compiled.name) {
            let json = position(line, "json:\"");
            let db = position(line, " db:\"");
            let form = position(line, " form:\"");
            assert!(json < db && db < form, "{line}");
        }
    }
}

#[test]
fn synthesized_key_adds_one_field() {
    let input = from_json_batch(BLOG).unwrap();
    let batch = blog();
    for node in &input {
        let compiled = resource(&batch, &node.name);
        assert_eq!(compiled.metadata.fields.len(), node.fields.len() + 1);
        assert_eq!(
            struct_lines(&compiled.source, &node.name).len(),
            node.fields.len() + 1
        );
    }
}

#[test]
fn migration_follows_references() {
    let migration = blog().migration();
    let users = position(&migration.up, "CREATE TABLE IF NOT EXISTS public.users");
    let posts = position(&migration.up, "CREATE TABLE IF NOT EXISTS public.posts");
    let comments = position(&migration.up, "CREATE TABLE IF NOT EXISTS public.comments");
    assert!(users < posts && posts < comments);
    assert_eq!(
        migration.down,
        "DROP TABLE IF EXISTS public.comments CASCADE;\n\
         DROP TABLE IF EXISTS public.posts CASCADE;\n\
         DROP TABLE IF EXISTS public.users CASCADE;\n"
    );
}

#[test]
fn metadata_document() {
    let batch = blog();
    let doc: serde_json::Value =
        serde_json::from_str(&resource(&batch, "Post").metadata.to_json().unwrap()).unwrap();
    assert_eq!(doc["table"], "public.posts");
    assert_eq!(doc["hooks"][2]["method"], "AfterCreate");
    assert_eq!(doc["hooks"][2]["transaction"], true);
    assert_eq!(doc["hooks"][2]["has_async_block"], true);
    assert_eq!(doc["relationships"][1]["foreign_key"], "post_id");
}

#[test]
fn runtime_ships_with_batch() {
    let batch = blog();
    let paths: Vec<_> = batch.runtime.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "types/null.go",
            "types/json.go",
            "types/errors.go",
            "types/spawn.go",
            "stdlib/stdlib.go"
        ]
    );
    assert!(conduit::runtime::nullable_source().contains("return []byte(\"null\"), nil"));
}

#[test]
fn malformed_input_is_rejected() {
    let err = compile_json("{}", &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, conduit::Error::Ast(_)));

    let err = compile_json(r#"[{ "name": "" }]"#, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, conduit::Error::Compile(_)));
}

const PRIMITIVES: &[&str] = &["string", "text", "int", "float", "bool", "uuid", "timestamp"];

fn arbitrary_resource() -> impl Strategy<Value = ResourceNode> {
    prop::collection::btree_map(
        "[a-z]{1,8}".prop_filter("reserved key", |name| *name != "id"),
        (prop::sample::select(PRIMITIVES), any::<bool>()),
        1..8
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .fold(ResourceNode::new("Widget"), |resource, (name, (ty, nullable))| {
                let field = FieldNode::new(name, TypeNode::primitive(ty));
                resource.with_field(if nullable { field.optional() } else { field })
            })
    })
}

proptest! {
    #[test]
    fn fresh_compilers_agree(resource in arbitrary_resource()) {
        let first = ResourceCompiler::new(CompilerConfig::default()).compile(&resource).unwrap();
        let second = ResourceCompiler::new(CompilerConfig::default()).compile(&resource).unwrap();
        prop_assert_eq!(&first.source, &second.source);
        prop_assert_eq!(&first.schema, &second.schema);
        prop_assert_eq!(first.metadata.to_json().unwrap(), second.metadata.to_json().unwrap());
        prop_assert_eq!(first.metadata.fields.len(), resource.fields.len() + 1);
    }
}
