// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Errors raised while handing an AST over to the compiler.

use thiserror::Error;

/// AST decoding error.
#[derive(Debug, Error)]
pub enum AstError {
    /// The JSON document does not describe a resource graph.
    #[error("failed to decode resource AST: {0}")]
    Json(#[from] serde_json::Error)
}
