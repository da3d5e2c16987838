// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Identifier casing, pluralization and literal quoting.
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `author_id` | [`go_name`] | `AuthorID` |
//! | `api_url` | [`local_name`] | `apiURL` |
//! | `createdAt` | [`column_name`] | `created_at` |
//! | `BlogPost` | [`table_name`] | `blog_posts` |
//! | `Category` | [`pluralize`] | `Categories` |
//!
//! Pluralization is a fixed suffix heuristic; irregular plurals
//! (`person` → `people`) are not recognized.

use convert_case::{Case, Casing};

/// Segments rendered fully upper-case in Go identifiers.
const INITIALISMS: &[&str] = &[
    "id", "url", "uri", "uuid", "api", "http", "json", "xml", "html", "css", "sql", "ip", "tcp",
    "udp"
];

/// Go keywords and predeclared names that cannot be used as locals.
const GO_RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var", "nil", "true", "false", "len", "cap",
    "new", "make", "append", "copy", "delete", "panic", "recover", "string", "error", "any"
];

/// Normalize any casing to snake case.
///
/// Already-snake names pass through untouched so digits stay attached
/// (`line2` is not split into `line_2`).
#[must_use]
pub fn column_name(name: &str) -> String {
    let is_snake = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if is_snake {
        name.to_string()
    } else {
        name.to_case(Case::Snake)
    }
}

fn segments(name: &str) -> Vec<String> {
    column_name(name)
        .split('_')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn capitalize(segment: &str) -> String {
    if INITIALISMS.contains(&segment) {
        return segment.to_ascii_uppercase();
    }
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new()
    }
}

/// Exported Go identifier for a field or resource name.
#[must_use]
pub fn go_name(name: &str) -> String {
    segments(name).iter().map(|s| capitalize(s)).collect()
}

/// Unexported Go identifier for a local variable.
#[must_use]
pub fn local_name(name: &str) -> String {
    let mut parts = segments(name).into_iter();
    let Some(first) = parts.next() else {
        return "_".to_string();
    };
    let mut out = first;
    for part in parts {
        out.push_str(&capitalize(&part));
    }
    if GO_RESERVED.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

/// Pluralize an identifier by its trailing letters.
#[must_use]
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{word}es");
    }
    if let Some(stem) = word.strip_suffix(['y', 'Y']) {
        let consonant_before = stem
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphabetic() && !"aeiouAEIOU".contains(c));
        if consonant_before {
            return format!("{stem}ies");
        }
    }
    format!("{word}s")
}

/// Table name for a resource: pluralized snake case.
#[must_use]
pub fn table_name(resource: &str) -> String {
    pluralize(&column_name(resource))
}

/// Receiver identifier: lowercase first letter of the type name.
#[must_use]
pub fn receiver_name(type_name: &str) -> String {
    type_name
        .chars()
        .next()
        .map_or_else(|| "r".to_string(), |c| c.to_ascii_lowercase().to_string())
}

/// Quote text as a Go interpreted string literal.
#[must_use]
pub fn go_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c)
        }
    }
    out.push('"');
    out
}

/// Quote text as a SQL string literal.
#[must_use]
pub fn sql_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
