// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Statement translation for hook bodies.
//!
//! Statements are written straight into an [`Emitter`]; imports and
//! diagnostics accumulate in the translator and come back as a
//! [`StmtOutput`].
//!
//! # Background blocks
//!
//! An `@async` block becomes a goroutine over a copy of the record:
//!
//! ```text
//! types.Spawn(ctx, *p, func(p Post) {
//!     defer func() {
//!         if r := recover(); r != nil {
//!             slog.Error("background hook failed", ...)
//!         }
//!     }()
//!     ...
//! })
//! ```
//!
//! `types.Spawn` starts the goroutine at once, or holds it until the caller's
//! transaction commits when the CRUD method passed a deferring context.
//! Blocks nested inside a goroutine use a plain `go` over the copy.
//!
//! Inside a transactional hook the hook's own transaction is committed before
//! the first spawn, see [`CommitMode`].

use conduit_ast::{ElseIf, ExprNode, StmtNode};

use super::{ExprTranslator, Fragment, Scope, coerce, scope::Binding};
use crate::{
    emit::{Emitter, ImportSet},
    error::{Diagnostic, PLACEHOLDER_MARKER},
    types::TypeRef
};

/// How a transactional hook commits around background blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// No transaction.
    None,
    /// Every background block is top level; `tx.Commit()` is written once,
    /// right before the first one.
    Static,
    /// Background blocks sit in branches; an idempotent `commit()` closure is
    /// called before each one and at the end.
    Guarded
}

/// How `return` leaves the code being generated. A bare `return` in an
/// error-returning body ends it early with `nil`; the deferred rollback
/// discards uncommitted work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnStyle {
    /// Hook method or `rescue` closure returning `error`.
    Error,
    /// Goroutine body.
    Bare
}

/// Collected side products of a statement translation.
#[derive(Debug, Default)]
pub struct StmtOutput {
    /// Packages referenced by the emitted code.
    pub imports:     ImportSet,
    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether a static commit was written.
    pub committed:   bool
}

/// Translates hook statements into an emitter.
#[derive(Debug)]
pub struct StmtTranslator<'s, 'a> {
    scope:        &'s mut Scope<'a>,
    out:          &'s mut Emitter,
    imports:      ImportSet,
    diagnostics:  Vec<Diagnostic>,
    returns:      ReturnStyle,
    commit:       CommitMode,
    committed:    bool,
    in_goroutine: bool,
    terminated:   bool,
    label:        String
}

impl<'s, 'a> StmtTranslator<'s, 'a> {
    /// Translator for one hook method. `label` describes the hook in error
    /// messages (`post after create hook`).
    pub fn new(
        scope: &'s mut Scope<'a>,
        out: &'s mut Emitter,
        commit: CommitMode,
        label: impl Into<String>
    ) -> Self {
        Self {
            scope,
            out,
            imports: ImportSet::new(),
            diagnostics: Vec::new(),
            returns: ReturnStyle::Error,
            commit,
            committed: false,
            in_goroutine: false,
            terminated: false,
            label: label.into()
        }
    }

    /// Translate statements at the current block level.
    pub fn statements(&mut self, body: &[StmtNode]) {
        for stmt in body {
            self.statement(stmt);
        }
    }

    /// Close the method body: silence locals that were never read, commit a
    /// pending transaction and return `nil`, unless the body already ended
    /// with a `return`.
    pub fn finish(mut self) -> StmtOutput {
        if !self.terminated {
            for name in self.scope.silence() {
                self.out.line(format!("_ = {name}"));
            }
            match self.commit {
                CommitMode::Static if !self.committed => {
                    self.check_commit("tx.Commit()");
                    self.committed = true;
                }
                CommitMode::Guarded => self.check_commit("commit()"),
                CommitMode::None | CommitMode::Static => {}
            }
            self.out.line("return nil");
        }
        StmtOutput {
            imports:     self.imports,
            diagnostics: self.diagnostics,
            committed:   self.committed
        }
    }

    fn expr(&mut self, expr: &ExprNode) -> String {
        let frag = ExprTranslator::new(self.scope).translate(expr);
        self.absorb(frag)
    }

    fn absorb(&mut self, frag: Fragment) -> String {
        self.imports.merge(&frag.imports);
        self.diagnostics.extend(frag.diagnostics);
        frag.code
    }

    fn statement(&mut self, stmt: &StmtNode) {
        match stmt {
            StmtNode::Expr { expr } => {
                let frag = ExprTranslator::new(self.scope).translate(expr);
                let bare = matches!(expr, ExprNode::Call { .. }) && frag.ty.is_none();
                let code = self.absorb(frag);
                if bare {
                    self.out.line(code);
                } else {
                    self.out.line(format!("_ = {code}"));
                }
            }
            StmtNode::Assignment { target, value } => self.assignment(target, value),
            StmtNode::Let { name, value } => self.let_binding(name, value),
            StmtNode::If {
                condition,
                then,
                elseifs,
                otherwise
            } => self.conditional(condition, then, elseifs, otherwise.as_deref()),
            StmtNode::Return { value } => self.return_statement(value.as_ref()),
            StmtNode::Block {
                is_async: false,
                body
            } => {
                self.out.open("{");
                self.block(body);
                self.out.close("}");
            }
            StmtNode::Block {
                is_async: true,
                body
            } => self.background(body),
            StmtNode::Rescue {
                body,
                error_var,
                rescue_body
            } => self.rescue(body, error_var, rescue_body),
            StmtNode::Unknown => {
                self.out
                    .line(format!("// {PLACEHOLDER_MARKER} statement `{}`", stmt.kind_name()));
                self.diagnostics.push(Diagnostic::warn(
                    self.scope.resource(),
                    self.scope.location(),
                    format!("unsupported statement `{}` skipped", stmt.kind_name())
                ));
            }
        }
        self.terminated = matches!(stmt, StmtNode::Return { .. });
    }

    /// Statements in a nested Go block with their own locals.
    fn block(&mut self, body: &[StmtNode]) {
        self.scope.push();
        self.statements(body);
        for name in self.scope.pop() {
            self.out.line(format!("_ = {name}"));
        }
    }

    fn assignment(&mut self, target: &ExprNode, value: &ExprNode) {
        let value = ExprTranslator::new(self.scope).translate(value);

        if let ExprNode::Identifier { name } = target {
            match self.scope.peek(name) {
                Some(binding) => self.reassign(&binding, value),
                None => self.declare(name, value)
            }
            return;
        }

        let place = ExprTranslator::new(self.scope).translate(target);
        let value = match &place.ty {
            Some(ty) => coerce(value, ty, self.scope.go_types()),
            None => value
        };
        let place = self.absorb(place);
        let value = self.absorb(value);
        self.out.line(format!("{place} = {value}"));
    }

    fn let_binding(&mut self, name: &str, value: &ExprNode) {
        let value = ExprTranslator::new(self.scope).translate(value);
        if self.scope.declared_in_block(name)
            && let Some(binding) = self.scope.peek(name)
        {
            self.reassign(&binding, value);
            return;
        }
        self.declare(name, value);
    }

    fn reassign(&mut self, binding: &Binding, value: Fragment) {
        let value = match &binding.ty {
            Some(ty) => coerce(value, ty, self.scope.go_types()),
            None => value
        };
        let code = self.absorb(value);
        self.out.line(format!("{} = {code}", binding.go));
    }

    fn declare(&mut self, name: &str, value: Fragment) {
        let ty = value.ty.clone();
        let code = self.absorb(value);
        let go = self.scope.declare(name, ty);
        if code == "nil" {
            self.out.line(format!("var {go} any"));
        } else {
            self.out.line(format!("{go} := {code}"));
        }
    }

    fn conditional(
        &mut self,
        condition: &ExprNode,
        then: &[StmtNode],
        elseifs: &[ElseIf],
        otherwise: Option<&[StmtNode]>
    ) {
        let cond = ExprTranslator::new(self.scope).condition(condition);
        let cond = self.absorb(cond);
        self.out.open(format!("if {cond} {{"));
        self.block(then);
        for branch in elseifs {
            let cond = ExprTranslator::new(self.scope).condition(&branch.condition);
            let cond = self.absorb(cond);
            self.out.reopen(format!("}} else if {cond} {{"));
            self.block(&branch.body);
        }
        if let Some(body) = otherwise {
            self.out.reopen("} else {");
            self.block(body);
        }
        self.out.close("}");
    }

    fn return_statement(&mut self, value: Option<&ExprNode>) {
        for name in self.scope.silence() {
            self.out.line(format!("_ = {name}"));
        }
        if self.returns == ReturnStyle::Bare {
            if let Some(value) = value {
                let code = self.expr(value);
                self.out.line(format!("_ = {code}"));
            }
            self.out.line("return");
            return;
        }

        let Some(value) = value else {
            self.out.line("return nil");
            return;
        };
        let frag = ExprTranslator::new(self.scope).translate(value);
        let is_error = frag.ty.as_ref().is_some_and(|t| t.go == "error");
        let code = self.absorb(frag);
        if is_error {
            self.out.line(format!("return {code}"));
        } else {
            self.imports.add_std("fmt");
            self.out.line(format!("return fmt.Errorf(\"%v\", {code})"));
        }
    }

    fn check_commit(&mut self, call: &str) {
        self.imports.add_std("fmt");
        self.out.open(format!("if err := {call}; err != nil {{"));
        self.out
            .line(format!("return fmt.Errorf(\"commit {}: %w\", err)", self.label));
        self.out.close("}");
    }

    fn background(&mut self, body: &[StmtNode]) {
        if !self.in_goroutine {
            match self.commit {
                CommitMode::Static if !self.committed => {
                    self.check_commit("tx.Commit()");
                    self.committed = true;
                }
                CommitMode::Guarded => self.check_commit("commit()"),
                CommitMode::None | CommitMode::Static => {}
            }
        }

        let ctx = self.scope.context();
        let receiver = ctx.receiver.clone();
        let nested = self.in_goroutine;
        self.imports.add_std("log/slog");
        if nested {
            self.out
                .open(format!("go func({receiver} {}) {{", ctx.type_name));
        } else {
            self.imports.add_external(ctx.config.types_import());
            self.out.open(format!(
                "types.Spawn(ctx, *{receiver}, func({receiver} {}) {{",
                ctx.type_name
            ));
        }
        self.out.open("defer func() {");
        self.out.open("if r := recover(); r != nil {");
        self.out.line(format!(
            "slog.Error(\"background hook failed\", \"resource\", \"{}\", \"hook\", \"{}\", \"panic\", r)",
            ctx.type_name,
            self.scope.location()
        ));
        self.out.close("}");
        self.out.close("}()");

        let returns = std::mem::replace(&mut self.returns, ReturnStyle::Bare);
        let in_goroutine = std::mem::replace(&mut self.in_goroutine, true);
        self.block(body);
        self.returns = returns;
        self.in_goroutine = in_goroutine;

        if nested {
            self.out.close(format!("}}({receiver})"));
        } else {
            self.out.close("})");
        }
    }

    fn rescue(&mut self, body: &[StmtNode], error_var: &str, rescue_body: &[StmtNode]) {
        self.imports.add_std("fmt");
        self.out.open("if err := func() (err error) {");
        self.out.open("defer func() {");
        self.out.open("if r := recover(); r != nil {");
        self.out.line("err = fmt.Errorf(\"panic: %v\", r)");
        self.out.close("}");
        self.out.close("}()");

        let returns = std::mem::replace(&mut self.returns, ReturnStyle::Error);
        self.block(body);
        self.returns = returns;
        self.out.line("return nil");

        self.out.reopen("}(); err != nil {");
        self.scope.push();
        let go = self.scope.declare(error_var, Some(TypeRef::error()));
        self.out.line(format!("{go} := err"));
        self.statements(rescue_body);
        for name in self.scope.pop() {
            self.out.line(format!("_ = {name}"));
        }
        self.out.close("}");
    }
}

#[cfg(test)]
mod tests {
    use conduit_ast::{BinaryOp, FieldNode, ResourceNode, TypeNode};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{config::CompilerConfig, context::Context};

    fn post() -> ResourceNode {
        ResourceNode::new("Post")
            .with_field(FieldNode::new("title", TypeNode::primitive("string")))
            .with_field(FieldNode::new("views", TypeNode::primitive("int")).optional())
    }

    fn run(body: &[StmtNode], commit: CommitMode) -> (String, StmtOutput) {
        let config = CompilerConfig::default();
        let resource = post();
        let ctx = Context::new(&resource, &config).unwrap();
        let mut scope = Scope::new(&ctx, "AfterCreate");
        let mut out = Emitter::new();
        let mut translator = StmtTranslator::new(&mut scope, &mut out, commit, "post after create hook");
        translator.statements(body);
        let output = translator.finish();
        (out.finish(), output)
    }

    #[test]
    fn assignment_wraps_nullable_target() {
        let (code, output) = run(
            &[StmtNode::assign(ExprNode::self_field("views"), ExprNode::int(3))],
            CommitMode::None
        );
        assert_eq!(code, "p.Views = types.Some[int64](3)\nreturn nil\n");
        assert!(output.imports.contains("app/runtime/types"));
    }

    #[test]
    fn let_declares_and_silences_unused() {
        let (code, _) = run(
            &[StmtNode::let_("count", ExprNode::int(1))],
            CommitMode::None
        );
        assert_eq!(code, "count := 1\n_ = count\nreturn nil\n");
    }

    #[test]
    fn let_nil_is_untyped_var() {
        let (code, _) = run(&[StmtNode::let_("x", ExprNode::null())], CommitMode::None);
        assert_eq!(code, "var x any\n_ = x\nreturn nil\n");
    }

    #[test]
    fn call_statement_is_bare() {
        let (code, output) = run(
            &[StmtNode::expr(ExprNode::call(
                "Logger",
                "info",
                vec![ExprNode::string("saved")]
            ))],
            CommitMode::None
        );
        assert_eq!(code, "slog.Info(\"saved\")\nreturn nil\n");
        assert!(output.imports.contains("log/slog"));

        let (code, _) = run(
            &[StmtNode::expr(ExprNode::self_field("title"))],
            CommitMode::None
        );
        assert_eq!(code, "_ = p.Title\nreturn nil\n");
    }

    #[test]
    fn if_else_chain() {
        let stmt = StmtNode::If {
            condition: ExprNode::self_field("views"),
            then:      vec![StmtNode::let_("a", ExprNode::int(1))],
            elseifs:   vec![ElseIf {
                condition: ExprNode::binary(
                    BinaryOp::Eq,
                    ExprNode::self_field("title"),
                    ExprNode::string("")
                ),
                body:      vec![]
            }],
            otherwise: Some(vec![StmtNode::Return { value: None }])
        };
        let (code, _) = run(&[stmt], CommitMode::None);
        assert_eq!(
            code,
            "if p.Views.Valid {\n\ta := 1\n\t_ = a\n} else if p.Title == \"\" {\n} else {\n\treturn nil\n}\nreturn nil\n"
        );
    }

    #[test]
    fn reassignment_keeps_local_unread() {
        let (code, _) = run(
            &[
                StmtNode::let_("n", ExprNode::int(1)),
                StmtNode::assign(ExprNode::ident("n"), ExprNode::int(2))
            ],
            CommitMode::None
        );
        assert_eq!(code, "n := 1\nn = 2\n_ = n\nreturn nil\n");
    }

    #[test]
    fn return_value_becomes_error() {
        let (code, _) = run(
            &[StmtNode::Return {
                value: Some(ExprNode::string("bad"))
            }],
            CommitMode::None
        );
        assert_eq!(code, "return fmt.Errorf(\"%v\", \"bad\")\n");
    }

    #[test]
    fn static_commit_before_first_background_block() {
        let body = [
            StmtNode::async_block(vec![]),
            StmtNode::async_block(vec![])
        ];
        let (code, output) = run(&body, CommitMode::Static);
        assert!(output.committed);
        assert_eq!(code.matches("tx.Commit()").count(), 1);
        assert!(code.ends_with("})\nreturn nil\n"));
        assert!(code.find("tx.Commit()") < code.find("types.Spawn(ctx, *p, func(p Post) {"));
        assert_eq!(code.matches("types.Spawn(ctx, *p, ").count(), 2);
    }

    #[test]
    fn guarded_commit_in_branches() {
        let body = [StmtNode::if_(
            ExprNode::boolean(true),
            vec![StmtNode::async_block(vec![StmtNode::Return { value: None }])]
        )];
        let (code, output) = run(&body, CommitMode::Guarded);
        assert!(!output.committed);
        assert!(code.contains("\tif err := commit(); err != nil {\n"));
        assert!(code.contains("commit post after create hook: %w"));
        assert!(code.contains("\t\treturn\n"));
    }

    #[test]
    fn nested_background_passes_copy() {
        let body = [StmtNode::async_block(vec![StmtNode::async_block(vec![])])];
        let (code, output) = run(&body, CommitMode::None);
        assert!(code.starts_with("types.Spawn(ctx, *p, func(p Post) {\n"));
        assert!(code.contains("\tgo func(p Post) {\n"));
        assert!(code.contains("\t}(p)\n"));
        assert!(code.ends_with("})\nreturn nil\n"));
        assert!(code.contains("\"hook\", \"AfterCreate\""));
        assert!(output.imports.contains("app/runtime/types"));
    }

    #[test]
    fn rescue_binds_error() {
        let stmt = StmtNode::Rescue {
            body:        vec![StmtNode::Return {
                value: Some(ExprNode::string("boom"))
            }],
            error_var:   "err".into(),
            rescue_body: vec![StmtNode::expr(ExprNode::call(
                "Logger",
                "error",
                vec![ExprNode::ident("err")]
            ))]
        };
        let (code, output) = run(&[stmt], CommitMode::None);
        assert!(code.starts_with("if err := func() (err error) {\n"));
        assert!(code.contains("\treturn fmt.Errorf(\"%v\", \"boom\")\n\treturn nil\n}(); err != nil {\n"));
        assert!(code.contains("\terr_ := err\n\tslog.Error(fmt.Sprint(err_))\n"));
        assert!(output.imports.contains("fmt"));
    }

    #[test]
    fn static_commit_at_end_without_spawn() {
        let (code, output) = run(&[], CommitMode::Static);
        assert!(output.committed);
        assert_eq!(
            code,
            "if err := tx.Commit(); err != nil {\n\treturn fmt.Errorf(\"commit post after create hook: %w\", err)\n}\nreturn nil\n"
        );
    }

    #[test]
    fn trailing_return_skips_commit() {
        let (code, output) = run(&[StmtNode::Return { value: None }], CommitMode::Static);
        assert!(!output.committed);
        assert_eq!(code, "return nil\n");
    }

    #[test]
    fn unknown_statement_is_reported() {
        let (code, output) = run(&[StmtNode::Unknown], CommitMode::None);
        assert!(code.contains(PLACEHOLDER_MARKER));
        assert_eq!(output.diagnostics.len(), 1);
    }
}
