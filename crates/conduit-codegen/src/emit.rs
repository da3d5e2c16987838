// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Emission buffer and import sets.
//!
//! [`Emitter`] is the (buffer, indent) pair of one compilation call. It is
//! never shared: every public entry point creates a fresh one.
//!
//! [`ImportSet`] is a value. Translators return one alongside each fragment
//! and callers merge them upward, so there is no compiler-wide import state.
//!
//! ```text
//! Fragment { code, imports } ──┐
//! Fragment { code, imports } ──┼──► ImportSet::merge ──► render() ──► import ( ... )
//! CRUD imports ────────────────┘
//! ```

use std::collections::BTreeSet;

/// Indentation-aware text buffer producing gofmt-style output (tabs).
#[derive(Debug, Default)]
pub struct Emitter {
    buf:    String,
    indent: usize
}

impl Emitter {
    /// Empty buffer at indent level zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indent. Empty text writes a bare newline.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push('\t');
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Write an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Write a line and indent the following ones (`if x {`).
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    /// Dedent and write a line (`}`).
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// Dedent, write a line, indent again (`} else {`).
    pub fn reopen(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
        self.indent += 1;
    }

    /// Write pre-rendered text, re-indenting each of its lines.
    pub fn block(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    /// Current indent level.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.indent
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the emitter and return the text.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Import group, in gofmt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum ImportGroup {
    Std,
    External
}

/// Sorted, de-duplicated set of Go import paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    paths: BTreeSet<(ImportGroup, String)>
}

impl ImportSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding one standard library package.
    #[must_use]
    pub fn std(path: &str) -> Self {
        let mut set = Self::new();
        set.add_std(path);
        set
    }

    /// Set holding one third-party or project package.
    #[must_use]
    pub fn external(path: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.add_external(path);
        set
    }

    /// Add a standard library package.
    pub fn add_std(&mut self, path: &str) {
        self.paths.insert((ImportGroup::Std, path.to_string()));
    }

    /// Add a third-party or project package.
    pub fn add_external(&mut self, path: impl Into<String>) {
        self.paths.insert((ImportGroup::External, path.into()));
    }

    /// Merge another set into this one.
    pub fn merge(&mut self, other: &ImportSet) {
        self.paths.extend(other.paths.iter().cloned());
    }

    /// Whether `path` is present.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|(_, p)| p == path)
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths in render order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|(_, p)| p.as_str())
    }

    /// Render a Go import declaration; standard packages come first, then a
    /// blank line, then everything else.
    #[must_use]
    pub fn render(&self) -> String {
        if self.paths.is_empty() {
            return String::new();
        }
        let mut out = String::from("import (\n");
        let mut previous = None;
        for (group, path) in &self.paths {
            if previous.is_some_and(|p| p != *group) {
                out.push('\n');
            }
            out.push_str(&format!("\t\"{path}\"\n"));
            previous = Some(*group);
        }
        out.push_str(")\n");
        out
    }
}
