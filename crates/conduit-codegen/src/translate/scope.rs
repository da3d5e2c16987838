// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Symbol table for translation.
//!
//! `self` resolves to the receiver through the scope; it is never a text
//! substitution. Locals live in a stack of frames, one per Go block, and
//! remember whether they were read so unused declarations can be silenced
//! (`_ = x`) before the block closes.

use std::cell::Cell;

use crate::{
    context::{Context, FieldPlan},
    naming::local_name,
    types::{GoTypeMapper, TypeRef}
};

/// Identifiers owned by generated code.
const RESERVED: &[&str] = &[
    "ctx", "db", "tx", "err", "commit", "committed", "verr", "now", "snapshot", "v", "r"
];

/// Packages and predeclared names that generated expressions refer to.
const GO_NAMES: &[&str] = &[
    "context", "errors", "fmt", "json", "math", "slices", "slog", "sql", "stdlib", "strings",
    "time", "types", "utf8", "uuid", "any", "bool", "float64", "int", "int64", "len", "string"
];

#[derive(Debug)]
struct Local {
    dsl:  String,
    go:   String,
    ty:   Option<TypeRef>,
    used: Cell<bool>
}

/// Resolved local variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Go identifier.
    pub go: String,
    /// Inferred type.
    pub ty: Option<TypeRef>
}

/// Translation scope of one generated method.
#[derive(Debug)]
pub struct Scope<'a> {
    ctx:      &'a Context<'a>,
    location: String,
    frames:   Vec<Vec<Local>>
}

impl<'a> Scope<'a> {
    /// Scope for a method of the resource; `location` names the method in
    /// diagnostics.
    #[must_use]
    pub fn new(ctx: &'a Context<'a>, location: impl Into<String>) -> Self {
        Self {
            ctx,
            location: location.into(),
            frames: vec![Vec::new()]
        }
    }

    /// Receiver identifier.
    #[must_use]
    pub fn receiver(&self) -> &str {
        &self.ctx.receiver
    }

    /// Resource name for diagnostics.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.ctx.resource.name
    }

    /// Method name for diagnostics.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Generation context.
    #[must_use]
    pub fn context(&self) -> &'a Context<'a> {
        self.ctx
    }

    /// Go type mapper.
    #[must_use]
    pub fn go_types(&self) -> &GoTypeMapper {
        &self.ctx.go_types
    }

    /// Field of the resource by DSL name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldPlan<'a>> {
        self.ctx.field(name)
    }

    /// Open a block.
    pub fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Close a block, returning the Go names of locals that were never read.
    pub fn pop(&mut self) -> Vec<String> {
        self.frames
            .pop()
            .unwrap_or_default()
            .into_iter()
            .filter(|l| !l.used.get())
            .map(|l| l.go)
            .collect()
    }

    /// Go names of all locals not read so far, across every open frame.
    /// They count as read afterwards, since the caller writes `_ = x`.
    pub fn silence(&self) -> Vec<String> {
        self.frames
            .iter()
            .flatten()
            .filter(|l| !l.used.replace(true))
            .map(|l| l.go.clone())
            .collect()
    }

    /// Whether `name` is declared in the innermost frame.
    #[must_use]
    pub fn declared_in_block(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.iter().any(|l| l.dsl == name))
    }

    /// Declare a local in the innermost frame and return its Go name.
    pub fn declare(&mut self, name: &str, ty: Option<TypeRef>) -> String {
        let mut go = local_name(name);
        while go == self.ctx.receiver
            || RESERVED.contains(&go.as_str())
            || GO_NAMES.contains(&go.as_str())
        {
            go.push('_');
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.push(Local {
                dsl: name.to_string(),
                go: go.clone(),
                ty,
                used: Cell::new(false)
            });
        }
        go
    }

    /// Resolve a local, innermost frame first, and mark it read.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.find(name).map(|l| {
            l.used.set(true);
            Binding {
                go: l.go.clone(),
                ty: l.ty.clone()
            }
        })
    }

    /// Resolve a local without marking it read; assignment targets.
    #[must_use]
    pub fn peek(&self, name: &str) -> Option<Binding> {
        self.find(name).map(|l| Binding {
            go: l.go.clone(),
            ty: l.ty.clone()
        })
    }

    fn find(&self, name: &str) -> Option<&Local> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|l| l.dsl == name)
    }
}

#[cfg(test)]
mod tests {
    use conduit_ast::{FieldNode, ResourceNode, TypeNode};

    use super::*;
    use crate::config::CompilerConfig;

    #[test]
    fn locals_shadow_and_report_unused() {
        let config = CompilerConfig::default();
        let resource = ResourceNode::new("Post")
            .with_field(FieldNode::new("title", TypeNode::primitive("string")));
        let ctx = Context::new(&resource, &config).unwrap();
        let mut scope = Scope::new(&ctx, "BeforeCreate");

        assert_eq!(scope.declare("total_count", Some(TypeRef::int())), "totalCount");
        scope.push();
        assert_eq!(scope.declare("total_count", None), "totalCount");
        assert_eq!(scope.lookup("total_count").unwrap().ty, None);
        assert!(scope.declared_in_block("total_count"));
        assert!(scope.pop().is_empty());
        assert_eq!(scope.lookup("total_count").unwrap().ty, Some(TypeRef::int()));
        assert!(scope.silence().is_empty());
    }

    #[test]
    fn silence_reports_each_local_once() {
        let config = CompilerConfig::default();
        let resource = ResourceNode::new("Post");
        let ctx = Context::new(&resource, &config).unwrap();
        let mut scope = Scope::new(&ctx, "BeforeCreate");
        scope.declare("a", None);
        scope.push();
        scope.declare("b", None);
        assert_eq!(scope.silence(), vec!["a".to_string(), "b".to_string()]);
        assert!(scope.silence().is_empty());
        assert!(scope.pop().is_empty());
    }

    #[test]
    fn generated_names_are_not_reused() {
        let config = CompilerConfig::default();
        let resource = ResourceNode::new("Post");
        let ctx = Context::new(&resource, &config).unwrap();
        let mut scope = Scope::new(&ctx, "AfterCreate");
        assert_eq!(scope.declare("p", None), "p_");
        assert_eq!(scope.declare("err", None), "err_");
        assert_eq!(scope.declare("tx", None), "tx_");
        assert_eq!(scope.receiver(), "p");
        assert!(scope.field("id").is_some());
    }

    #[test]
    fn package_names_are_not_shadowed() {
        let config = CompilerConfig::default();
        let resource = ResourceNode::new("Post");
        let ctx = Context::new(&resource, &config).unwrap();
        let mut scope = Scope::new(&ctx, "BeforeSave");
        assert_eq!(scope.declare("time", Some(TypeRef::time())), "time_");
        assert_eq!(scope.declare("fmt", None), "fmt_");
        assert_eq!(scope.declare("types", None), "types_");
        assert_eq!(scope.declare("len", None), "len_");
        assert_eq!(scope.lookup("time").unwrap().go, "time_");
        assert_eq!(scope.declare("timer", None), "timer");
    }
}
