// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Lifecycle hook declarations.
//!
//! ```text
//! @before create { self.slug = String.slugify(self.title) }
//! @after create @transaction { ... @async { ... } }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StmtNode;

/// When the hook runs relative to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookTiming {
    /// Before the write.
    Before,
    /// After the write.
    After
}

/// Which operation triggers the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    /// Insert.
    Create,
    /// Full or partial update.
    Update,
    /// Delete.
    Delete,
    /// Virtual event: create or update.
    Save
}

impl HookTiming {
    /// DSL spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after"
        }
    }
}

impl HookEvent {
    /// DSL spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Save => "save"
        }
    }
}

impl fmt::Display for HookTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookNode {
    /// Before or after.
    pub timing: HookTiming,

    /// Triggering event.
    pub event: HookEvent,

    /// `@transaction`: the body runs inside its own transaction.
    #[serde(default)]
    pub is_transaction: bool,

    /// `@async`: the hook was declared asynchronous as a whole.
    #[serde(default)]
    pub is_async: bool,

    /// Hook body.
    #[serde(default)]
    pub body: Vec<StmtNode>
}

impl HookNode {
    /// Hook with an empty body.
    #[must_use]
    pub fn new(timing: HookTiming, event: HookEvent) -> Self {
        Self {
            timing,
            event,
            is_transaction: false,
            is_async: false,
            body: Vec::new()
        }
    }

    /// Mark as `@transaction`.
    #[must_use]
    pub fn transaction(mut self) -> Self {
        self.is_transaction = true;
        self
    }

    /// Mark as `@async`.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<StmtNode>) -> Self {
        self.body = body;
        self
    }

    /// Whether any statement of the body is or contains an async block.
    #[must_use]
    pub fn has_async_block(&self) -> bool {
        self.body.iter().any(StmtNode::contains_async)
    }
}
