// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Lifecycle hook methods.
//!
//! Every hook declaration becomes one method on the resource, named after
//! its timing and event. The CRUD methods call them in declaration order.
//!
//! # Generated Code
//!
//! ```go
//! // BeforeCreate runs before a Post is created.
//! func (p *Post) BeforeCreate(ctx context.Context, db *sql.DB) error {
//!     p.Slug = stdlib.Slugify(p.Title)
//!     return nil
//! }
//! ```
//!
//! # Naming
//!
//! | Declaration | Method |
//! |-------------|--------|
//! | first `@before create` | `BeforeCreate` |
//! | second `@before create` | `BeforeCreate2` |
//! | `@after save` | `AfterSave` |
//!
//! # Transactions
//!
//! `@transaction` hooks open their own transaction with a deferred rollback
//! and commit on successful completion. Background blocks only ever see
//! committed data: the commit happens right before the first goroutine is
//! spawned (see [`CommitMode`]). Spawns go through `types.Spawn`, so a CRUD
//! method calling an after hook holds them until its own commit.

use std::collections::HashMap;

use conduit_ast::{HookEvent, HookNode, HookTiming, StmtNode};
use convert_case::{Case, Casing};

use crate::{
    context::Context,
    emit::{Emitter, ImportSet},
    error::Diagnostic,
    translate::{CommitMode, Scope, StmtTranslator}
};

/// One generated hook method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookMethod {
    /// Go method name.
    pub name:            String,
    /// Description used in wrapped errors: `post before create hook`.
    pub label:           String,
    /// Before or after.
    pub timing:          HookTiming,
    /// Triggering event.
    pub event:           HookEvent,
    /// Runs in its own transaction.
    pub transaction:     bool,
    /// Declared `@async` as a whole.
    pub is_async:        bool,
    /// Body spawns background work.
    pub has_async_block: bool
}

/// All hook methods of a resource.
#[derive(Debug, Default)]
pub struct CompiledHooks {
    /// Methods in declaration order.
    pub methods:     Vec<HookMethod>,
    /// Method declarations, separated by blank lines.
    pub source:      String,
    /// Packages the declarations use.
    pub imports:     ImportSet,
    /// Non-fatal findings from the bodies.
    pub diagnostics: Vec<Diagnostic>
}

impl CompiledHooks {
    /// Methods to call for a timing/event pair, in call order.
    pub fn methods_for(
        &self,
        timing: HookTiming,
        event: HookEvent
    ) -> impl Iterator<Item = &HookMethod> {
        self.methods
            .iter()
            .filter(move |m| m.timing == timing && m.event == event)
    }
}

/// Base method name: `BeforeCreate`.
fn base_name(timing: HookTiming, event: HookEvent) -> String {
    format!(
        "{}{}",
        timing.as_str().to_case(Case::Pascal),
        event.as_str().to_case(Case::Pascal)
    )
}

fn past_tense(event: HookEvent) -> &'static str {
    match event {
        HookEvent::Create => "created",
        HookEvent::Update => "updated",
        HookEvent::Delete => "deleted",
        HookEvent::Save => "saved"
    }
}

/// Commit strategy for a body: background blocks nested in control flow need
/// the guarded closure.
fn commit_mode(hook: &HookNode, body: &[StmtNode]) -> CommitMode {
    if !hook.is_transaction {
        return CommitMode::None;
    }
    let nested = body
        .iter()
        .any(|stmt| stmt.contains_async() && !stmt.is_async_block());
    if nested {
        CommitMode::Guarded
    } else {
        CommitMode::Static
    }
}

/// Generate all hook methods of a resource.
pub fn generate(ctx: &Context<'_>) -> CompiledHooks {
    let mut compiled = CompiledHooks::default();
    let mut counts: HashMap<(HookTiming, HookEvent), usize> = HashMap::new();

    for hook in &ctx.resource.hooks {
        let count = counts.entry((hook.timing, hook.event)).or_default();
        *count += 1;
        let mut name = base_name(hook.timing, hook.event);
        if *count > 1 {
            name.push_str(&count.to_string());
        }

        let mut label = format!("{} {} {} hook", ctx.noun(), hook.timing, hook.event);
        if *count > 1 {
            label.push_str(&format!(" {count}"));
        }

        if !compiled.source.is_empty() {
            compiled.source.push('\n');
        }
        let (source, imports, diagnostics) = method(ctx, hook, &name, &label);
        compiled.source.push_str(&source);
        compiled.imports.merge(&imports);
        compiled.diagnostics.extend(diagnostics);

        compiled.methods.push(HookMethod {
            name,
            label,
            timing: hook.timing,
            event: hook.event,
            transaction: hook.is_transaction,
            is_async: hook.is_async,
            has_async_block: hook.has_async_block()
        });
    }
    compiled
}

fn method(
    ctx: &Context<'_>,
    hook: &HookNode,
    name: &str,
    label: &str
) -> (String, ImportSet, Vec<Diagnostic>) {
    let recv = &ctx.receiver;

    let wrapped;
    let body: &[StmtNode] = if hook.is_async {
        wrapped = [StmtNode::async_block(hook.body.clone())];
        &wrapped
    } else {
        &hook.body
    };
    let mode = commit_mode(hook, body);

    let mut imports = ImportSet::new();
    imports.add_std("context");
    imports.add_std("database/sql");

    let mut out = Emitter::new();
    out.line(format!(
        "// {name} runs {} a {} is {}.",
        hook.timing,
        ctx.type_name,
        past_tense(hook.event)
    ));
    out.open(format!(
        "func ({recv} *{}) {name}(ctx context.Context, db *sql.DB) error {{",
        ctx.type_name
    ));

    if hook.is_transaction {
        imports.add_std("fmt");
        out.line("tx, err := db.BeginTx(ctx, nil)");
        out.open("if err != nil {");
        out.line(format!("return fmt.Errorf(\"begin {label}: %w\", err)"));
        out.close("}");
        out.line("defer tx.Rollback()");
    }
    if mode == CommitMode::Guarded {
        out.line("committed := false");
        out.open("commit := func() error {");
        out.open("if committed {");
        out.line("return nil");
        out.close("}");
        out.line("committed = true");
        out.line("return tx.Commit()");
        out.close("}");
    }

    let mut scope = Scope::new(ctx, name);
    let mut translator = StmtTranslator::new(&mut scope, &mut out, mode, label);
    translator.statements(body);
    let output = translator.finish();
    out.close("}");

    imports.merge(&output.imports);
    (out.finish(), imports, output.diagnostics)
}
