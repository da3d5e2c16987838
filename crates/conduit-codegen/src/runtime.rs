// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Go runtime support package.
//!
//! Generated models import two packages below the configured
//! `runtime_import`:
//!
//! | Package | File | Provides |
//! |---------|------|----------|
//! | `types` | `null.go` | `Null[T]`, `Some`, JSON and SQL support |
//! | `types` | `json.go` | `JSON(&v)` adapter for JSONB columns |
//! | `types` | `errors.go` | `ErrNotFound`, `ValidationError`, `PatchError` |
//! | `types` | `spawn.go` | `Spawn`, `Defer`, `Pending` for background hooks |
//! | `stdlib` | `stdlib.go` | `Slugify`, `IsEmail`, `IsURL`, ... |
//!
//! The files do not depend on the configuration and are written once per
//! project, next to the generated models.

use serde::Serialize;

const NULL_GO: &str = include_str!("../runtime/types/null.go");
const JSON_GO: &str = include_str!("../runtime/types/json.go");
const ERRORS_GO: &str = include_str!("../runtime/types/errors.go");
const SPAWN_GO: &str = include_str!("../runtime/types/spawn.go");
const STDLIB_GO: &str = include_str!("../runtime/stdlib/stdlib.go");

/// A file to write below the runtime import root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    /// Path relative to the runtime root: `types/null.go`.
    pub path:     String,
    /// File contents.
    pub contents: String
}

impl GeneratedFile {
    fn new(path: &str, contents: &str) -> Self {
        Self {
            path:     path.to_string(),
            contents: contents.to_string()
        }
    }
}

/// `Null[T]` with JSON and database support.
#[must_use]
pub fn nullable_source() -> &'static str {
    NULL_GO
}

/// JSONB column adapter.
#[must_use]
pub fn json_source() -> &'static str {
    JSON_GO
}

/// Error types returned by generated code.
#[must_use]
pub fn errors_source() -> &'static str {
    ERRORS_GO
}

/// Background goroutines held back until a commit.
#[must_use]
pub fn spawn_source() -> &'static str {
    SPAWN_GO
}

/// Library helpers behind namespaced DSL calls.
#[must_use]
pub fn stdlib_source() -> &'static str {
    STDLIB_GO
}

/// Every runtime file, `types` first.
#[must_use]
pub fn files() -> Vec<GeneratedFile> {
    vec![
        GeneratedFile::new("types/null.go", NULL_GO),
        GeneratedFile::new("types/json.go", JSON_GO),
        GeneratedFile::new("types/errors.go", ERRORS_GO),
        GeneratedFile::new("types/spawn.go", SPAWN_GO),
        GeneratedFile::new("stdlib/stdlib.go", STDLIB_GO)
    ]
}
