// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Compiler configuration.
//!
//! Loading the configuration (CLI flags, project files) is the caller's job;
//! this module only defines the shape and the defaults. The type deserializes
//! with `#[serde(default)]`, so a partial document is enough:
//!
//! ```rust
//! use conduit_codegen::{CompilerConfig, IdStrategy};
//!
//! let config: CompilerConfig =
//!     serde_json::from_str(r#"{ "package": "store", "id_strategy": "serial" }"#).unwrap();
//!
//! assert_eq!(config.package, "store");
//! assert_eq!(config.id_strategy, IdStrategy::Serial);
//! assert_eq!(config.schema, "public");
//! ```
//!
//! # Options
//!
//! | Option | Default | Effect |
//! |--------|---------|--------|
//! | `package` | `"models"` | Go package clause of generated files |
//! | `runtime_import` | `"app/runtime"` | Import prefix of the runtime support package |
//! | `schema` | `"public"` | SQL schema; empty string for unqualified tables |
//! | `id_strategy` | `uuid` | Type of a synthesized `id` field |
//! | `default_page_size` | `20` | `FindAll` limit when none is given |
//! | `max_page_size` | `100` | Upper bound for `FindAll` limit |

use serde::{Deserialize, Serialize};

/// Strategy for the synthesized primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// `uuid.UUID` generated by the application before hooks run.
    #[default]
    Uuid,

    /// `int64` generated by the database (`BIGSERIAL`).
    Serial
}

/// Options shared by every compilation of a [`ResourceCompiler`](crate::ResourceCompiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Go package name.
    pub package: String,

    /// Import path prefix of the runtime support package.
    pub runtime_import: String,

    /// SQL schema name.
    pub schema: String,

    /// Synthesized primary key strategy.
    pub id_strategy: IdStrategy,

    /// Page size used when the caller passes no limit.
    pub default_page_size: u32,

    /// Largest accepted page size.
    pub max_page_size: u32
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            package:           "models".to_string(),
            runtime_import:    "app/runtime".to_string(),
            schema:            "public".to_string(),
            id_strategy:       IdStrategy::Uuid,
            default_page_size: 20,
            max_page_size:     100
        }
    }
}

impl CompilerConfig {
    /// Set the Go package name.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Set the runtime import prefix.
    #[must_use]
    pub fn with_runtime_import(mut self, import: impl Into<String>) -> Self {
        self.runtime_import = import.into();
        self
    }

    /// Set the SQL schema.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Set the primary key strategy.
    #[must_use]
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// Set the page sizes for `FindAll`.
    #[must_use]
    pub fn with_page_sizes(mut self, default: u32, max: u32) -> Self {
        self.default_page_size = default;
        self.max_page_size = max.max(default);
        self
    }

    /// Import path of the runtime `types` package.
    #[must_use]
    pub fn types_import(&self) -> String {
        format!("{}/types", self.runtime_import.trim_end_matches('/'))
    }

    /// Import path of the runtime `stdlib` package.
    #[must_use]
    pub fn stdlib_import(&self) -> String {
        format!("{}/stdlib", self.runtime_import.trim_end_matches('/'))
    }

    /// Table name qualified with the schema, if any.
    #[must_use]
    pub fn qualify(&self, table: &str) -> String {
        if self.schema.is_empty() {
            table.to_string()
        } else {
            format!("{}.{}", self.schema, table)
        }
    }
}
