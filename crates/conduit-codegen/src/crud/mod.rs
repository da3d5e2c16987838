// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! CRUD method generators.
//!
//! | Method | SQL Operation |
//! |--------|---------------|
//! | [`NewRes`](Context::constructor) | none, applies field defaults |
//! | [`Create`](Context::create_method) | `INSERT INTO ... VALUES ...` |
//! | [`FindResByID`](Context::find_by_id_method) | `SELECT ... WHERE id = $1` |
//! | [`FindAllRes`](Context::find_all_method) | `SELECT ... ORDER BY id LIMIT $1 OFFSET $2` |
//! | [`FindResWhere`](Context::find_where_method) | `SELECT ... WHERE <condition>` |
//! | [`Update`](Context::update_method) | `UPDATE ... SET ... WHERE id = $n` |
//! | [`PatchRes`](Context::patch_method) | decode, check keys, `Update` |
//! | [`Delete`](Context::delete_method) | `DELETE FROM ... WHERE id = $1` |
//!
//! # Execution Order
//!
//! ```text
//! Create:  auto fields ─► BeforeCreate ─► BeforeSave ─► Validate ─► BEGIN
//!          ─► INSERT ─► AfterCreate ─► AfterSave ─► COMMIT
//! Update:  auto_update ─► BeforeUpdate ─► BeforeSave ─► Validate ─► BEGIN
//!          ─► UPDATE ─► AfterUpdate ─► AfterSave ─► COMMIT
//! Delete:  BeforeDelete ─► BEGIN ─► DELETE ─► AfterDelete ─► COMMIT
//! ```
//!
//! Every transaction is followed by `defer tx.Rollback()`, so any early
//! return leaves no partial state behind.
//!
//! After hooks that spawn background work are called with a context from
//! `types.Defer`; their goroutines start only after `COMMIT` succeeds and
//! are dropped on rollback.

mod constructor;
mod patch;
mod read;
mod write;

use conduit_ast::{HookEvent, HookTiming};

use crate::{
    context::Context,
    emit::{Emitter, ImportSet},
    error::Diagnostic,
    hooks::CompiledHooks,
    validation::CompiledValidation
};

/// Generated CRUD methods of a resource.
#[derive(Debug, Default)]
pub struct CompiledCrud {
    /// Constructor, persistence methods and helpers, in file order.
    pub source:      String,
    /// Packages the methods use.
    pub imports:     ImportSet,
    /// Non-fatal findings from default expressions.
    pub diagnostics: Vec<Diagnostic>
}

/// `if err := call; err != nil { return <zero>fmt.Errorf("wrap: %w", err) }`
fn check(out: &mut Emitter, call: &str, wrap: &str, zero: &str) {
    out.open(format!("if err := {call}; err != nil {{"));
    out.line(format!("return {zero}fmt.Errorf(\"{wrap}: %w\", err)"));
    out.close("}");
}

/// Calls to the hooks of `timing` for each of `events`, in order, passing
/// `ctx` as the context argument.
fn hook_calls(
    out: &mut Emitter,
    recv: &str,
    ctx: &str,
    hooks: &CompiledHooks,
    timing: HookTiming,
    events: &[HookEvent]
) {
    for event in events {
        for method in hooks.methods_for(timing, *event) {
            check(
                out,
                &format!("{recv}.{}({ctx}, db)", method.name),
                &method.label,
                ""
            );
        }
    }
}

/// After hooks run inside the operation's transaction. When any of them
/// spawns background work, they get a deferring context and the spawns are
/// started once the operation commits.
struct AfterHooks {
    deferred: bool
}

impl AfterHooks {
    /// Emit the after hook calls for `events`.
    fn call(
        out: &mut Emitter,
        recv: &str,
        hooks: &CompiledHooks,
        events: &[HookEvent]
    ) -> Self {
        let deferred = events.iter().any(|event| {
            hooks
                .methods_for(HookTiming::After, *event)
                .any(|m| m.is_async || m.has_async_block)
        });
        let ctx = if deferred {
            out.line("hookCtx, pending := types.Defer(ctx)");
            "hookCtx"
        } else {
            "ctx"
        };
        hook_calls(out, recv, ctx, hooks, HookTiming::After, events);
        Self { deferred }
    }

    /// Commit the operation, then start the held spawns.
    fn commit(self, out: &mut Emitter, wrap: &str) {
        check(out, "tx.Commit()", wrap, "");
        if self.deferred {
            out.line("pending.Start()");
        }
    }
}

/// `BEGIN` with the deferred rollback.
fn begin(out: &mut Emitter, wrap: &str, zero: &str) {
    out.line("tx, err := db.BeginTx(ctx, nil)");
    out.open("if err != nil {");
    out.line(format!("return {zero}fmt.Errorf(\"begin {wrap}: %w\", err)"));
    out.close("}");
    out.line("defer tx.Rollback()");
}

/// Fail with `ErrNotFound` when no row was touched.
fn require_rows(out: &mut Emitter, ctx: &Context<'_>, res: &str, what: &str, id: &str) {
    out.line(format!("affected, err := {res}.RowsAffected()"));
    out.open("if err != nil {");
    out.line(format!("return fmt.Errorf(\"{what} {}: %w\", err)", ctx.noun()));
    out.close("}");
    out.open("if affected == 0 {");
    out.line(format!(
        "return fmt.Errorf(\"{} %v: %w\", {id}, types.ErrNotFound)",
        ctx.noun()
    ));
    out.close("}");
}

/// Generate the constructor and every persistence method.
pub fn generate(
    ctx: &Context<'_>,
    hooks: &CompiledHooks,
    validation: &CompiledValidation
) -> CompiledCrud {
    let mut imports = ImportSet::new();
    for path in ["context", "database/sql", "errors", "fmt"] {
        imports.add_std(path);
    }
    imports.add_external(ctx.config.types_import());
    imports.merge(&ctx.id().ty.imports);
    imports.merge(&ctx.storage_imports());

    let constructor = ctx.constructor();
    imports.merge(&constructor.imports);
    let mut sections = vec![constructor.code];

    let (create, create_imports) = ctx.create_method(hooks, validation);
    imports.merge(&create_imports);
    sections.push(create);
    sections.push(ctx.find_by_id_method());
    sections.push(ctx.find_all_method());
    sections.push(ctx.find_where_method());
    let (update, update_imports) = ctx.update_method(hooks, validation);
    imports.merge(&update_imports);
    sections.push(update);
    let (patch, patch_imports) = ctx.patch_method();
    imports.merge(&patch_imports);
    sections.push(patch);
    sections.push(ctx.delete_method(hooks));
    sections.push(ctx.scan_helper());
    sections.push(ctx.collect_helper());

    CompiledCrud {
        source: sections.join("\n"),
        imports,
        diagnostics: constructor.diagnostics
    }
}

#[cfg(test)]
mod tests;
