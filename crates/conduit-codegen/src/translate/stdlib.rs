// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Standard library call table.
//!
//! Namespaced DSL calls dispatch through a static table keyed by
//! `"Namespace.function"`. Templates use `{0}`, `{1}`, ... for positional
//! arguments and `{args}` for the full argument list.
//!
//! | Key | Go |
//! |-----|----|
//! | `String.slugify` | `stdlib.Slugify({0})` |
//! | `String.upcase` | `strings.ToUpper({0})` |
//! | `Time.now` | `time.Now().UTC()` |
//! | `Math.pow` | `math.Pow(float64({0}), float64({1}))` |
//! | `UUID.generate` | `uuid.New()` |
//! | `Logger.info` | `slog.Info({args})` |
//!
//! `Logger` messages must be Go strings: a first argument of any other type
//! is rendered with `fmt.Sprint`, and a missing one becomes `""`.
//!
//! Calls missing from the table fall back to `stdlib.<Namespace>_<function>`
//! in the runtime package and are reported as diagnostics.

use std::{collections::HashMap, sync::LazyLock};

use crate::types::TypeRef;

/// Package an entry needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Import {
    /// Go standard library package.
    Std(&'static str),
    /// `github.com/google/uuid`
    Uuid,
    /// Runtime `stdlib` package.
    Runtime
}

/// Static result type of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// `string`
    String,
    /// `[]string`
    Strings,
    /// `int64`
    Int,
    /// `float64`
    Float,
    /// `bool`
    Bool,
    /// `time.Time`
    Time,
    /// `uuid.UUID`
    Uuid,
    /// Nothing useful; the call is made for its effect.
    Unit
}

impl Returns {
    /// Go type, `None` for [`Returns::Unit`].
    #[must_use]
    pub fn type_ref(self) -> Option<TypeRef> {
        let ty = match self {
            Self::String => TypeRef::string(),
            Self::Strings => TypeRef::slice(TypeRef::string()),
            Self::Int => TypeRef::int(),
            Self::Float => TypeRef::float(),
            Self::Bool => TypeRef::boolean(),
            Self::Time => TypeRef::time(),
            Self::Uuid => TypeRef::uuid(),
            Self::Unit => return None
        };
        Some(ty)
    }
}

/// One table entry.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    /// Call template.
    pub template: &'static str,
    /// Packages referenced by the template.
    pub imports:  &'static [Import],
    /// Result type.
    pub returns:  Returns,
    /// The first argument is a Go `string` message; other values go through
    /// `fmt.Sprint`.
    pub message:  bool
}

const fn entry(template: &'static str, imports: &'static [Import], returns: Returns) -> Entry {
    Entry {
        template,
        imports,
        returns,
        message: false
    }
}

/// `slog` call taking a message and key/value pairs.
const fn logger(template: &'static str) -> Entry {
    Entry {
        template,
        imports: SLOG,
        returns: Returns::Unit,
        message: true
    }
}

const STRINGS: &[Import] = &[Import::Std("strings")];
const MATH: &[Import] = &[Import::Std("math")];
const TIME: &[Import] = &[Import::Std("time")];
const SLOG: &[Import] = &[Import::Std("log/slog")];
const RUNTIME: &[Import] = &[Import::Runtime];
const NONE: &[Import] = &[];

static TABLE: LazyLock<HashMap<&'static str, Entry>> = LazyLock::new(|| {
    HashMap::from([
        ("String.upcase", entry("strings.ToUpper({0})", STRINGS, Returns::String)),
        ("String.downcase", entry("strings.ToLower({0})", STRINGS, Returns::String)),
        ("String.trim", entry("strings.TrimSpace({0})", STRINGS, Returns::String)),
        ("String.capitalize", entry("stdlib.Capitalize({0})", RUNTIME, Returns::String)),
        ("String.contains", entry("strings.Contains({0}, {1})", STRINGS, Returns::Bool)),
        ("String.starts_with", entry("strings.HasPrefix({0}, {1})", STRINGS, Returns::Bool)),
        ("String.ends_with", entry("strings.HasSuffix({0}, {1})", STRINGS, Returns::Bool)),
        ("String.replace", entry("strings.ReplaceAll({0}, {1}, {2})", STRINGS, Returns::String)),
        ("String.split", entry("strings.Split({0}, {1})", STRINGS, Returns::Strings)),
        ("String.join", entry("strings.Join({0}, {1})", STRINGS, Returns::String)),
        (
            "String.length",
            entry(
                "int64(utf8.RuneCountInString({0}))",
                &[Import::Std("unicode/utf8")],
                Returns::Int
            )
        ),
        ("String.slugify", entry("stdlib.Slugify({0})", RUNTIME, Returns::String)),
        ("String.truncate", entry("stdlib.Truncate({0}, int({1}))", RUNTIME, Returns::String)),
        ("Time.now", entry("time.Now().UTC()", TIME, Returns::Time)),
        ("Time.format", entry("{0}.Format({1})", NONE, Returns::String)),
        ("Time.year", entry("int64({0}.Year())", NONE, Returns::Int)),
        ("Time.add_days", entry("{0}.AddDate(0, 0, int({1}))", NONE, Returns::Time)),
        ("Time.since", entry("time.Since({0}).Seconds()", TIME, Returns::Float)),
        ("Math.abs", entry("math.Abs(float64({0}))", MATH, Returns::Float)),
        ("Math.floor", entry("math.Floor(float64({0}))", MATH, Returns::Float)),
        ("Math.ceil", entry("math.Ceil(float64({0}))", MATH, Returns::Float)),
        ("Math.round", entry("math.Round(float64({0}))", MATH, Returns::Float)),
        ("Math.sqrt", entry("math.Sqrt(float64({0}))", MATH, Returns::Float)),
        ("Math.max", entry("math.Max(float64({0}), float64({1}))", MATH, Returns::Float)),
        ("Math.min", entry("math.Min(float64({0}), float64({1}))", MATH, Returns::Float)),
        ("Math.pow", entry("math.Pow(float64({0}), float64({1}))", MATH, Returns::Float)),
        ("Array.length", entry("int64(len({0}))", NONE, Returns::Int)),
        (
            "Array.contains",
            entry("slices.Contains({0}, {1})", &[Import::Std("slices")], Returns::Bool)
        ),
        ("UUID.generate", entry("uuid.New()", &[Import::Uuid], Returns::Uuid)),
        ("JSON.encode", entry("stdlib.JSONEncode({0})", RUNTIME, Returns::String)),
        ("Logger.debug", logger("slog.Debug({args})")),
        ("Logger.info", logger("slog.Info({args})")),
        ("Logger.warn", logger("slog.Warn({args})")),
        ("Logger.error", logger("slog.Error({args})"))
    ])
});

/// Look up a namespaced call.
#[must_use]
pub fn lookup(namespace: &str, function: &str) -> Option<&'static Entry> {
    TABLE.get(format!("{namespace}.{function}").as_str())
}

/// Substitute arguments into a template. Missing positional arguments
/// render as `nil`.
#[must_use]
pub fn render(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        if key == "args" {
            out.push_str(&args.join(", "));
        } else if let Ok(index) = key.parse::<usize>() {
            out.push_str(args.get(index).map_or("nil", String::as_str));
        } else {
            out.push('{');
            out.push_str(key);
            out.push('}');
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
