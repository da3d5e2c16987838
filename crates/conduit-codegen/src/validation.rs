// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `Validate` method generation.
//!
//! Field constraints and resource-level validation rules compile into one
//! method collecting every failure into a `types.ValidationError`.
//!
//! # Supported Checks
//!
//! | Source | Go condition (failure) |
//! |--------|------------------------|
//! | `@min(n)` on text | `utf8.RuneCountInString(x) < n` |
//! | `@max(n)` on numbers | `x > n` |
//! | `@min(n)` on arrays and hashes | `len(x) < n` |
//! | `@required` | `strings.TrimSpace(x) == ""`, `!x.Valid`, `x == nil` |
//! | `@pattern("re")` | `!resFieldPattern.MatchString(x)` |
//! | `@email`, `email` type | `!stdlib.IsEmail(x)` |
//! | `@url`, `url` type | `!stdlib.IsURL(x)` |
//! | enum type | `!slices.Contains([]string{...}, x)` |
//! | `validate name { cond }` | `!(cond)` |
//!
//! Checks on nullable fields only run when a value is present. Checks
//! limited with `on: create` or `on: update` go to a second method,
//! `ValidateOn(event)`, which runs `Validate` first.

use std::collections::{BTreeMap, HashSet};

use conduit_ast::{ConstraintNode, LiteralValue, TypeNode};

use crate::{
    context::{Context, FieldPlan},
    emit::{Emitter, ImportSet},
    error::{CompileError, Diagnostic},
    naming::{go_string, local_name},
    translate::{ExprTranslator, Scope},
    types::{GoKind, Primitive, TextFormat}
};

/// Constraints that only affect the schema or generated values.
const SCHEMA_ONLY: &[&str] = &["unique", "index", "primary", "auto", "auto_update"];

/// Events a constraint can be limited to.
const EVENTS: &[&str] = &["create", "update"];

/// Generated validation methods.
#[derive(Debug, Default)]
pub struct CompiledValidation {
    /// `Validate` and, when needed, pattern variables and `ValidateOn`.
    pub source:      String,
    /// Packages the methods use.
    pub imports:     ImportSet,
    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether `ValidateOn` was generated.
    pub conditional: bool
}

#[derive(Debug)]
struct Check {
    field:   String,
    cond:    String,
    message: String,
    on:      Vec<String>
}

/// Go expressions for reading a field inside a check.
struct Access {
    /// Present value (`p.Bio.V` for wrappers).
    value: String,
    /// Presence guard for wrappers.
    guard: Option<String>
}

impl Access {
    fn of(recv: &str, field: &FieldPlan<'_>) -> Self {
        let place = format!("{recv}.{}", field.go_name);
        if field.ty.is_null_wrapper() {
            Self {
                value: format!("{place}.V"),
                guard: Some(format!("{place}.Valid"))
            }
        } else {
            Self {
                value: place,
                guard: None
            }
        }
    }

    fn when_present(&self, cond: String) -> String {
        match &self.guard {
            Some(guard) => format!("{guard} && {cond}"),
            None => cond
        }
    }
}

struct Builder<'c, 'a> {
    ctx:         &'c Context<'a>,
    checks:      Vec<Check>,
    patterns:    Vec<(String, String)>,
    names:       HashSet<String>,
    imports:     ImportSet,
    diagnostics: Vec<Diagnostic>
}

fn number(value: &LiteralValue) -> Option<String> {
    match value {
        LiteralValue::Int(i) => Some(i.to_string()),
        LiteralValue::Float(f) if f.is_finite() => Some(format!("{f:?}")),
        _ => None
    }
}

/// Go raw string when possible, interpreted literal otherwise.
fn regexp_literal(pattern: &str) -> String {
    if pattern.contains('`') {
        go_string(pattern)
    } else {
        format!("`{pattern}`")
    }
}

impl<'c, 'a> Builder<'c, 'a> {
    fn new(ctx: &'c Context<'a>) -> Self {
        let mut imports = ImportSet::new();
        imports.add_external(ctx.config.types_import());
        Self {
            ctx,
            checks: Vec::new(),
            patterns: Vec::new(),
            names: HashSet::new(),
            imports,
            diagnostics: Vec::new()
        }
    }

    fn push(&mut self, field: &FieldPlan<'_>, cond: String, message: String, on: &[String]) {
        self.checks.push(Check {
            field: field.name.clone(),
            cond,
            message,
            on: on.to_vec()
        });
    }

    fn field(&mut self, field: &FieldPlan<'_>) -> Result<(), CompileError> {
        if field.node.is_none() {
            return Ok(());
        }
        let access = Access::of(&self.ctx.receiver, field);

        if let Some(TypeNode::Enum { values, .. }) = field.declared_type() {
            self.imports.add_std("slices");
            let list = values
                .iter()
                .map(|v| go_string(v))
                .collect::<Vec<_>>()
                .join(", ");
            let cond = access.when_present(format!(
                "!slices.Contains([]string{{{list}}}, {})",
                access.value
            ));
            self.push(field, cond, format!("must be one of: {}", values.join(", ")), &[]);
        }
        if let Some(Primitive::Text(format)) = field.primitive
            && format != TextFormat::Plain
            && field.constraint(format_constraint(format)).is_none()
        {
            self.format_check(field, &access, format, None);
        }

        for constraint in field.constraints() {
            self.check_events(field, constraint)?;
            match constraint.name.as_str() {
                "min" | "max" => self.bound(field, &access, constraint)?,
                "required" => self.required(field, &access, constraint),
                "pattern" => self.pattern(field, &access, constraint)?,
                "email" | "url" => {
                    if !matches!(field.primitive, Some(Primitive::Text(_))) {
                        return Err(self.ctx.invalid_constraint(
                            &field.name,
                            &constraint.name,
                            "applies to text fields only"
                        ));
                    }
                    let format = if constraint.is("email") {
                        TextFormat::Email
                    } else {
                        TextFormat::Url
                    };
                    self.format_check(field, &access, format, Some(constraint));
                }
                name if SCHEMA_ONLY.contains(&name) => {}
                name => self.diagnostics.push(Diagnostic::warn(
                    &self.ctx.resource.name,
                    "Validate",
                    format!("unknown constraint `@{name}` on `{}` ignored", field.name)
                ))
            }
        }
        Ok(())
    }

    fn check_events(
        &self,
        field: &FieldPlan<'_>,
        constraint: &ConstraintNode
    ) -> Result<(), CompileError> {
        match constraint.on.iter().find(|e| !EVENTS.contains(&e.as_str())) {
            Some(event) => Err(self.ctx.invalid_constraint(
                &field.name,
                &constraint.name,
                format!("unknown event `{event}` in `on`, expected create or update")
            )),
            None => Ok(())
        }
    }

    fn bound(
        &mut self,
        field: &FieldPlan<'_>,
        access: &Access,
        constraint: &ConstraintNode
    ) -> Result<(), CompileError> {
        let ctx = self.ctx;
        let invalid = |reason: &str| ctx.invalid_constraint(&field.name, &constraint.name, reason);
        let literal = constraint
            .literal(0)
            .ok_or_else(|| invalid("expects a numeric literal argument"))?;
        let limit = number(literal).ok_or_else(|| invalid("expects a numeric literal argument"))?;
        let integral = matches!(literal, LiteralValue::Int(_));
        let is_min = constraint.is("min");
        let op = if is_min { "<" } else { ">" };
        let word = if is_min { "least" } else { "most" };

        let (cond, message) = match field.primitive {
            Some(Primitive::Text(_)) => {
                if !integral {
                    return Err(invalid("expects an integer length"));
                }
                self.imports.add_std("unicode/utf8");
                (
                    format!("utf8.RuneCountInString({}) {op} {limit}", access.value),
                    format!("must be at {word} {limit} characters")
                )
            }
            Some(Primitive::Integer) if !integral => {
                return Err(invalid("expects an integer bound for an integer field"));
            }
            Some(p) if p.is_numeric() => (
                format!("{} {op} {limit}", access.value),
                format!("must be at {word} {limit}")
            ),
            _ if matches!(field.ty.kind, GoKind::Slice(_) | GoKind::Map(..)) => {
                if !integral {
                    return Err(invalid("expects an integer item count"));
                }
                (
                    format!("len({}) {op} {limit}", access.value),
                    format!("must contain at {word} {limit} items")
                )
            }
            _ => return Err(invalid("applies to text, numbers and collections"))
        };
        let message = constraint.error.clone().unwrap_or(message);
        self.push(field, access.when_present(cond), message, &constraint.on);
        Ok(())
    }

    fn required(&mut self, field: &FieldPlan<'_>, access: &Access, constraint: &ConstraintNode) {
        let place = format!("{}.{}", self.ctx.receiver, field.go_name);
        let textual = matches!(field.primitive, Some(Primitive::Text(_)));
        let cond = match &field.ty.kind {
            GoKind::Null(_) if textual => {
                self.imports.add_std("strings");
                format!("!{place}.Valid || strings.TrimSpace({}) == \"\"", access.value)
            }
            GoKind::Null(_) => format!("!{place}.Valid"),
            GoKind::Pointer(_) => format!("{place} == nil"),
            GoKind::Slice(_) | GoKind::Map(..) | GoKind::Raw => format!("len({place}) == 0"),
            GoKind::Value if textual => {
                self.imports.add_std("strings");
                format!("strings.TrimSpace({place}) == \"\"")
            }
            GoKind::Value => match field.primitive {
                Some(Primitive::Timestamp | Primitive::Date) => format!("{place}.IsZero()"),
                Some(Primitive::Uuid) => {
                    self.imports.add_external("github.com/google/uuid");
                    format!("{place} == uuid.Nil")
                }
                _ => return
            }
        };
        let message = constraint
            .error
            .clone()
            .unwrap_or_else(|| "is required".to_string());
        self.push(field, cond, message, &constraint.on);
    }

    fn pattern(
        &mut self,
        field: &FieldPlan<'_>,
        access: &Access,
        constraint: &ConstraintNode
    ) -> Result<(), CompileError> {
        let Some(LiteralValue::String(pattern)) = constraint.literal(0) else {
            return Err(self.ctx.invalid_constraint(
                &field.name,
                &constraint.name,
                "expects a string literal argument"
            ));
        };
        if !matches!(field.primitive, Some(Primitive::Text(_))) {
            return Err(self.ctx.invalid_constraint(
                &field.name,
                &constraint.name,
                "applies to text fields only"
            ));
        }

        let base = format!(
            "{}{}Pattern",
            local_name(&self.ctx.type_name),
            field.go_name
        );
        let mut name = base.clone();
        let mut n = 1;
        while !self.names.insert(name.clone()) {
            n += 1;
            name = format!("{base}{n}");
        }
        self.imports.add_std("regexp");
        self.patterns.push((name.clone(), regexp_literal(pattern)));

        let cond = access.when_present(format!("!{name}.MatchString({})", access.value));
        let message = constraint
            .error
            .clone()
            .unwrap_or_else(|| "has an invalid format".to_string());
        self.push(field, cond, message, &constraint.on);
        Ok(())
    }

    fn format_check(
        &mut self,
        field: &FieldPlan<'_>,
        access: &Access,
        format: TextFormat,
        constraint: Option<&ConstraintNode>
    ) {
        let (func, default) = match format {
            TextFormat::Url => ("IsURL", "must be a valid URL"),
            TextFormat::Email | TextFormat::Plain => ("IsEmail", "must be a valid email address")
        };
        self.imports.add_external(self.ctx.config.stdlib_import());
        let cond = access.when_present(format!(
            "{v} != \"\" && !stdlib.{func}({v})",
            v = access.value
        ));
        let message = constraint
            .and_then(|c| c.error.clone())
            .unwrap_or_else(|| default.to_string());
        let on = constraint.map(|c| c.on.as_slice()).unwrap_or_default();
        self.push(field, cond, message, on);
    }

    fn emit_check(out: &mut Emitter, check: &Check) {
        out.open(format!("if {} {{", check.cond));
        out.line(format!(
            "verr.Add({}, {})",
            go_string(&check.field),
            go_string(&check.message)
        ));
        out.close("}");
    }

    fn finish(mut self) -> CompiledValidation {
        let ctx = self.ctx;
        let recv = &ctx.receiver;
        let mut out = Emitter::new();

        for (name, literal) in &self.patterns {
            out.line(format!("var {name} = regexp.MustCompile({literal})"));
        }
        if !self.patterns.is_empty() {
            out.blank();
        }

        out.line(format!(
            "// Validate checks the constraints of a {} and reports every failure.",
            ctx.type_name
        ));
        out.open(format!("func ({recv} *{}) Validate() error {{", ctx.type_name));
        out.line("verr := &types.ValidationError{}");
        for check in self.checks.iter().filter(|c| c.on.is_empty()) {
            Self::emit_check(&mut out, check);
        }

        let scope = Scope::new(ctx, "Validate");
        for rule in &ctx.resource.validations {
            let cond = ExprTranslator::new(&scope).condition(&rule.condition);
            self.imports.merge(&cond.imports);
            self.diagnostics.extend(cond.diagnostics);
            out.open(format!("if !({}) {{", cond.code));
            out.line(format!(
                "verr.Add({}, {})",
                go_string(&rule.name),
                go_string(&rule.message)
            ));
            out.close("}");
        }
        out.line("return verr.OrNil()");
        out.close("}");

        let mut grouped: BTreeMap<Vec<String>, Vec<&Check>> = BTreeMap::new();
        for check in self.checks.iter().filter(|c| !c.on.is_empty()) {
            let mut events = check.on.clone();
            events.sort();
            events.dedup();
            grouped.entry(events).or_default().push(check);
        }
        let conditional = !grouped.is_empty();
        if conditional {
            out.blank();
            out.line("// ValidateOn runs Validate and the checks limited to event.");
            out.open(format!(
                "func ({recv} *{}) ValidateOn(event string) error {{",
                ctx.type_name
            ));
            out.line("verr := &types.ValidationError{}");
            out.line(format!("verr.Merge({recv}.Validate())"));
            for (events, checks) in &grouped {
                let cond = events
                    .iter()
                    .map(|e| format!("event == {}", go_string(e)))
                    .collect::<Vec<_>>()
                    .join(" || ");
                out.open(format!("if {cond} {{"));
                for check in checks {
                    Self::emit_check(&mut out, check);
                }
                out.close("}");
            }
            out.line("return verr.OrNil()");
            out.close("}");
        }

        CompiledValidation {
            source: out.finish(),
            imports: self.imports,
            diagnostics: self.diagnostics,
            conditional
        }
    }
}

fn format_constraint(format: TextFormat) -> &'static str {
    match format {
        TextFormat::Url => "url",
        TextFormat::Email | TextFormat::Plain => "email"
    }
}

/// Generate the validation methods of a resource.
///
/// # Errors
///
/// Returns [`CompileError::InvalidConstraint`] for constraints with
/// malformed arguments, constraints that cannot apply to the field type and
/// unknown `on` events.
pub fn generate(ctx: &Context<'_>) -> Result<CompiledValidation, CompileError> {
    let mut builder = Builder::new(ctx);
    for field in &ctx.fields {
        builder.field(field)?;
    }
    Ok(builder.finish())
}
