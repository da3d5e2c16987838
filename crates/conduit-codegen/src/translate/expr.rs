// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Expression translation.
//!
//! | DSL | Go |
//! |-----|----|
//! | `self.title` | `p.Title` |
//! | `a ** b` | `math.Pow(float64(a), float64(b))` |
//! | `a and b` / `not a` | `a && b` / `!a` |
//! | `self.bio!` | `p.Bio.V` |
//! | `self.author?.name` | `func() any { if v := p.Author; v != nil { return v.Name }; return nil }()` |
//! | `self.bio ?? ""` | `func() string { if v := p.Bio; v.Valid { return v.V }; return "" }()` |
//! | `"Hi #{name}"` | `fmt.Sprintf("Hi %v", name)` |
//!
//! Operator precedence follows Go; nested operators are parenthesized only
//! where Go would otherwise regroup them.

use conduit_ast::{
    BinaryOp, ExprNode, HashEntry, InterpolationPart, LiteralValue, LogicalOp, UnaryOp
};

use super::{Fragment, Scope, stdlib};
use crate::{
    error::{Diagnostic, PLACEHOLDER_MARKER},
    naming::{go_name, go_string, local_name},
    types::{GoKind, TypeRef}
};

const UNARY: u8 = 6;
const ATOM: u8 = 7;

/// Go binding power of the operator at the root of `expr`.
fn precedence(expr: &ExprNode) -> u8 {
    match expr {
        ExprNode::Binary { op, .. } => match op {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 5,
            BinaryOp::Add | BinaryOp::Sub => 4,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 3,
            BinaryOp::Pow => ATOM
        },
        ExprNode::Logical { op: LogicalOp::And, .. } => 2,
        ExprNode::Logical { op: LogicalOp::Or, .. } => 1,
        ExprNode::Unary { op: UnaryOp::ForceUnwrap, .. } => ATOM,
        ExprNode::Unary { .. } => UNARY,
        _ => ATOM
    }
}

fn format_float(value: f64) -> Fragment {
    if value.is_nan() {
        return Fragment::new("math.NaN()")
            .import_std("math")
            .typed(TypeRef::float());
    }
    if value.is_infinite() {
        let sign = if value > 0.0 { 1 } else { -1 };
        return Fragment::new(format!("math.Inf({sign})"))
            .import_std("math")
            .typed(TypeRef::float());
    }
    Fragment::new(format!("{value:?}")).typed(TypeRef::float())
}

/// Translates expressions within one [`Scope`].
#[derive(Debug, Clone, Copy)]
pub struct ExprTranslator<'s, 'a> {
    scope: &'s Scope<'a>
}

impl<'s, 'a> ExprTranslator<'s, 'a> {
    /// Translator reading names from `scope`.
    #[must_use]
    pub fn new(scope: &'s Scope<'a>) -> Self {
        Self { scope }
    }

    /// Translate one expression.
    #[must_use]
    pub fn translate(&self, expr: &ExprNode) -> Fragment {
        match expr {
            ExprNode::Literal { value } => self.literal(value),
            ExprNode::Identifier { name } => self.identifier(name),
            ExprNode::SelfRef => Fragment::new(self.scope.receiver()),
            ExprNode::FieldAccess { object, field } => self.field_access(object, field),
            ExprNode::SafeNavigation { object, field } => self.safe_navigation(object, field),
            ExprNode::Call {
                namespace,
                function,
                args
            } => self.call(namespace.as_deref(), function, args),
            ExprNode::Binary { op, left, right } => self.binary(expr, *op, left, right),
            ExprNode::Unary { op, operand } => self.unary(*op, operand),
            ExprNode::Logical { op, left, right } => self.logical(expr, *op, left, right),
            ExprNode::NullCoalesce { left, right } => self.coalesce(left, right),
            ExprNode::ArrayLiteral { elements } => self.array(elements),
            ExprNode::HashLiteral { entries } => self.hash(entries),
            ExprNode::Index { object, index } => self.index(object, index),
            ExprNode::Paren { inner } => {
                let inner = self.translate(inner);
                let ty = inner.ty.clone();
                let mut out = Fragment::default().with_ty(ty);
                let code = out.absorb(inner);
                out.code = format!("({code})");
                out
            }
            ExprNode::InterpolatedString { parts } => self.interpolated(parts),
            ExprNode::Unknown => self.unsupported("expression", expr.kind_name())
        }
    }

    /// Translate an expression used as a condition; absent-capable values
    /// test for presence.
    #[must_use]
    pub fn condition(&self, expr: &ExprNode) -> Fragment {
        presence(self.translate(expr))
    }

    fn unsupported(&self, what: &str, kind: &str) -> Fragment {
        let mut out = Fragment::new(format!("nil /* {PLACEHOLDER_MARKER} {what} `{kind}` */"));
        out.diagnostics.push(Diagnostic::warn(
            self.scope.resource(),
            self.scope.location(),
            format!("unsupported {what} `{kind}` replaced by a placeholder")
        ));
        out
    }

    fn literal(&self, value: &LiteralValue) -> Fragment {
        match value {
            LiteralValue::Null => Fragment::new("nil"),
            LiteralValue::Bool(b) => Fragment::new(b.to_string()).typed(TypeRef::boolean()),
            LiteralValue::Int(i) => Fragment::new(i.to_string()).typed(TypeRef::int()),
            LiteralValue::Float(f) => format_float(*f),
            LiteralValue::String(s) => Fragment::new(go_string(s)).typed(TypeRef::string())
        }
    }

    fn identifier(&self, name: &str) -> Fragment {
        match self.scope.lookup(name) {
            Some(binding) => Fragment::new(binding.go).with_ty(binding.ty),
            None => Fragment::new(local_name(name))
        }
    }

    fn field_access(&self, object: &ExprNode, field: &str) -> Fragment {
        if matches!(object, ExprNode::SelfRef) {
            return match self.scope.field(field) {
                Some(plan) => {
                    Fragment::new(format!("{}.{}", self.scope.receiver(), plan.go_name))
                        .typed(plan.ty.clone())
                }
                None => Fragment::new(format!("{}.{}", self.scope.receiver(), go_name(field)))
            };
        }
        let object = self.operand(object, ATOM, false);
        let mut out = Fragment::default();
        let code = out.absorb(object);
        out.code = format!("{code}.{}", go_name(field));
        out
    }

    fn safe_navigation(&self, object: &ExprNode, field: &str) -> Fragment {
        if matches!(object, ExprNode::SelfRef) {
            return self.field_access(object, field);
        }
        let object = self.operand(object, ATOM, false);
        let field = go_name(field);
        let (present, value) = match object.ty.as_ref().map(|t| &t.kind) {
            Some(GoKind::Value) => {
                let mut out = Fragment::default();
                let code = out.absorb(object);
                out.code = format!("{code}.{field}");
                return out;
            }
            Some(GoKind::Null(_)) => ("v.Valid", format!("v.V.{field}")),
            _ => ("v != nil", format!("v.{field}"))
        };
        let mut out = Fragment::default();
        let code = out.absorb(object);
        out.code = format!(
            "func() any {{ if v := {code}; {present} {{ return {value} }}; return nil }}()"
        );
        out
    }

    fn call(&self, namespace: Option<&str>, function: &str, args: &[ExprNode]) -> Fragment {
        let mut out = Fragment::default();
        let entry = namespace.and_then(|ns| stdlib::lookup(ns, function));
        let mut rendered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let frag = self.translate(arg);
            let is_string = frag.ty.as_ref().is_some_and(|t| t.go == "string");
            let code = out.absorb(frag);
            if i == 0 && entry.is_some_and(|e| e.message) && !is_string {
                out.imports.add_std("fmt");
                rendered.push(format!("fmt.Sprint({code})"));
            } else {
                rendered.push(code);
            }
        }
        if rendered.is_empty() && entry.is_some_and(|e| e.message) {
            rendered.push("\"\"".to_string());
        }

        let Some(namespace) = namespace else {
            out.code = format!("{}({})", local_name(function), rendered.join(", "));
            return out;
        };

        let config = self.scope.context().config;
        match entry {
            Some(entry) => {
                for import in entry.imports {
                    match import {
                        stdlib::Import::Std(path) => out.imports.add_std(path),
                        stdlib::Import::Uuid => out.imports.add_external("github.com/google/uuid"),
                        stdlib::Import::Runtime => out.imports.add_external(config.stdlib_import())
                    }
                }
                out.code = stdlib::render(entry.template, &rendered);
                out.ty = entry.returns.type_ref();
            }
            None => {
                out.imports.add_external(config.stdlib_import());
                out.code = format!(
                    "stdlib.{}_{}({})",
                    go_name(namespace),
                    function,
                    rendered.join(", ")
                );
                out.diagnostics.push(Diagnostic::warn(
                    self.scope.resource(),
                    self.scope.location(),
                    format!("`{namespace}.{function}` has no Go mapping; calling the runtime fallback")
                ));
            }
        }
        out
    }

    /// Translate a child, parenthesizing it when Go would bind it differently.
    fn operand(&self, expr: &ExprNode, parent: u8, right: bool) -> Fragment {
        let child = precedence(expr);
        let frag = self.translate(expr);
        if child < parent || (right && child == parent && child < ATOM) {
            let ty = frag.ty.clone();
            let mut out = Fragment::default().with_ty(ty);
            let code = out.absorb(frag);
            out.code = format!("({code})");
            out
        } else {
            frag
        }
    }

    fn binary(&self, expr: &ExprNode, op: BinaryOp, left: &ExprNode, right: &ExprNode) -> Fragment {
        if op == BinaryOp::Pow {
            let mut out = Fragment::default()
                .import_std("math")
                .typed(TypeRef::float());
            let l = out.absorb(self.translate(left));
            let r = out.absorb(self.translate(right));
            out.code = format!("math.Pow(float64({l}), float64({r}))");
            return out;
        }
        if let Some(test) = self.nil_comparison(op, left, right) {
            return test;
        }

        let prec = precedence(expr);
        let l = self.operand(left, prec, false);
        let r = self.operand(right, prec, true);
        let ty = if op.is_comparison() {
            Some(TypeRef::boolean())
        } else {
            l.ty.clone().or_else(|| r.ty.clone())
        };
        let mut out = Fragment::default().with_ty(ty);
        let l = out.absorb(l);
        let r = out.absorb(r);
        out.code = format!("{l} {} {r}", op.symbol());
        out
    }

    /// `x == nil` against a `types.Null[T]` becomes a presence test.
    fn nil_comparison(&self, op: BinaryOp, left: &ExprNode, right: &ExprNode) -> Option<Fragment> {
        let is_nil = |e: &ExprNode| {
            matches!(
                e,
                ExprNode::Literal {
                    value: LiteralValue::Null
                }
            )
        };
        let other = match (is_nil(left), is_nil(right)) {
            (false, true) => left,
            (true, false) => right,
            _ => return None
        };
        if !matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            return None;
        }
        let frag = self.operand(other, ATOM, false);
        if !frag.ty.as_ref().is_some_and(TypeRef::is_null_wrapper) {
            return None;
        }
        let mut out = Fragment::default().typed(TypeRef::boolean());
        let code = out.absorb(frag);
        out.code = if op == BinaryOp::Eq {
            format!("!{code}.Valid")
        } else {
            format!("{code}.Valid")
        };
        Some(out)
    }

    fn unary(&self, op: UnaryOp, operand: &ExprNode) -> Fragment {
        match op {
            UnaryOp::Neg => {
                let inner = self.operand(operand, UNARY, false);
                let ty = inner.ty.clone();
                let mut out = Fragment::default().with_ty(ty);
                let code = out.absorb(inner);
                out.code = format!("-{code}");
                out
            }
            UnaryOp::Not => {
                let inner = self.operand(operand, UNARY, false);
                let mut out = Fragment::default().typed(TypeRef::boolean());
                let code = out.absorb(inner);
                out.code = format!("!{code}");
                out
            }
            UnaryOp::ForceUnwrap => {
                let inner = self.operand(operand, ATOM, false);
                let ty = inner.ty.clone();
                let mut out = Fragment::default();
                let code = out.absorb(inner);
                match ty {
                    Some(TypeRef {
                        kind: GoKind::Null(value),
                        ..
                    }) => {
                        out.code = format!("{code}.V");
                        out.ty = Some(*value);
                    }
                    Some(TypeRef {
                        kind: GoKind::Pointer(value),
                        ..
                    }) => {
                        out.code = format!("*{code}");
                        out.ty = Some(*value);
                    }
                    Some(ty) => {
                        out.code = code;
                        out.ty = Some(ty);
                    }
                    None => out.code = format!("*{code}")
                }
                out
            }
        }
    }

    fn logical(&self, expr: &ExprNode, op: LogicalOp, left: &ExprNode, right: &ExprNode) -> Fragment {
        let prec = precedence(expr);
        let l = self.condition_operand(left, prec, false);
        let r = self.condition_operand(right, prec, true);
        let mut out = Fragment::default().typed(TypeRef::boolean());
        let l = out.absorb(l);
        let r = out.absorb(r);
        let symbol = match op {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||"
        };
        out.code = format!("{l} {symbol} {r}");
        out
    }

    fn condition_operand(&self, expr: &ExprNode, parent: u8, right: bool) -> Fragment {
        let frag = self.operand(expr, parent, right);
        if precedence(expr) == ATOM {
            presence(frag)
        } else {
            frag
        }
    }

    fn coalesce(&self, left: &ExprNode, right: &ExprNode) -> Fragment {
        let l = self.translate(left);
        let r = self.translate(right);
        let mut out = Fragment::default();
        let kind = l.ty.as_ref().map(|t| t.kind.clone());
        let left_ty = l.ty.clone();
        let lc = out.absorb(l);
        let rc = out.absorb(r);

        match (kind, left_ty) {
            (Some(GoKind::Null(inner)), _) => {
                out.spells(&inner);
                out.code = format!(
                    "func() {} {{ if v := {lc}; v.Valid {{ return v.V }}; return {rc} }}()",
                    inner.go
                );
                out.ty = Some(*inner);
            }
            (Some(GoKind::Value), Some(ty)) => {
                out.code = lc;
                out.ty = Some(ty);
            }
            (Some(_), Some(ty)) => {
                out.spells(&ty);
                out.code = format!(
                    "func() {} {{ if v := {lc}; v != nil {{ return v }}; return {rc} }}()",
                    ty.go
                );
                out.ty = Some(ty);
            }
            _ => {
                out.code = format!(
                    "func() any {{ if v := any({lc}); v != nil {{ return v }}; return {rc} }}()"
                );
            }
        }
        out
    }

    fn array(&self, elements: &[ExprNode]) -> Fragment {
        let mut out = Fragment::default();
        let parts: Vec<Fragment> = elements.iter().map(|e| self.translate(e)).collect();
        let elem = common_type(parts.iter().map(|p| p.ty.as_ref()));
        let rendered: Vec<String> = parts.into_iter().map(|p| out.absorb(p)).collect();
        let elem_go = match &elem {
            Some(ty) => {
                out.spells(ty);
                ty.go.clone()
            }
            None => "any".to_string()
        };
        out.code = format!("[]{elem_go}{{{}}}", rendered.join(", "));
        out.ty = elem.map(TypeRef::slice);
        out
    }

    fn hash(&self, entries: &[HashEntry]) -> Fragment {
        let mut out = Fragment::default();
        let keys: Vec<Fragment> = entries.iter().map(|e| self.translate(&e.key)).collect();
        let values: Vec<Fragment> = entries.iter().map(|e| self.translate(&e.value)).collect();
        let key_ty = common_type(keys.iter().map(|k| k.ty.as_ref()));
        let value_ty = common_type(values.iter().map(|v| v.ty.as_ref()));

        let pairs: Vec<String> = keys
            .into_iter()
            .zip(values)
            .map(|(k, v)| {
                let k = out.absorb(k);
                let v = out.absorb(v);
                format!("{k}: {v}")
            })
            .collect();

        let spell = |ty: &Option<TypeRef>, out: &mut Fragment| match ty {
            Some(ty) => {
                out.spells(ty);
                ty.go.clone()
            }
            None => "any".to_string()
        };
        let k = spell(&key_ty, &mut out);
        let v = spell(&value_ty, &mut out);
        out.code = format!("map[{k}]{v}{{{}}}", pairs.join(", "));
        if let (Some(key), Some(value)) = (key_ty, value_ty) {
            out.ty = Some(TypeRef::map(key, value));
        }
        out
    }

    fn index(&self, object: &ExprNode, index: &ExprNode) -> Fragment {
        let object = self.operand(object, ATOM, false);
        let ty = object.ty.as_ref().and_then(TypeRef::element).cloned();
        let mut out = Fragment::default().with_ty(ty);
        let o = out.absorb(object);
        let i = out.absorb(self.translate(index));
        out.code = format!("{o}[{i}]");
        out
    }

    fn interpolated(&self, parts: &[InterpolationPart]) -> Fragment {
        let has_exprs = parts
            .iter()
            .any(|p| matches!(p, InterpolationPart::Expr { .. }));
        if !has_exprs {
            let text: String = parts
                .iter()
                .filter_map(|p| match p {
                    InterpolationPart::Text { text } => Some(text.as_str()),
                    InterpolationPart::Expr { .. } => None
                })
                .collect();
            return Fragment::new(go_string(&text)).typed(TypeRef::string());
        }

        let mut out = Fragment::default()
            .import_std("fmt")
            .typed(TypeRef::string());
        let mut format = String::new();
        let mut args = Vec::new();
        for part in parts {
            match part {
                InterpolationPart::Text { text } => format.push_str(&text.replace('%', "%%")),
                InterpolationPart::Expr { expr } => {
                    format.push_str("%v");
                    args.push(out.absorb(self.translate(expr)));
                }
            }
        }
        out.code = format!("fmt.Sprintf({}, {})", go_string(&format), args.join(", "));
        out
    }
}

/// Presence test for values that can be absent; other fragments pass through.
fn presence(frag: Fragment) -> Fragment {
    let test = match frag.ty.as_ref().map(|t| &t.kind) {
        Some(GoKind::Null(_)) => "{}.Valid",
        Some(GoKind::Pointer(_) | GoKind::Slice(_) | GoKind::Map(..) | GoKind::Raw) => "{} != nil",
        _ => return frag
    };
    let mut out = Fragment::default().typed(TypeRef::boolean());
    let code = out.absorb(frag);
    out.code = test.replace("{}", &code);
    out
}

/// Shared type of all items, if every item has the same known type.
fn common_type<'t>(mut types: impl Iterator<Item = Option<&'t TypeRef>>) -> Option<TypeRef> {
    let first = types.next()??.clone();
    types
        .all(|t| t.is_some_and(|t| t.go == first.go))
        .then_some(first)
}
