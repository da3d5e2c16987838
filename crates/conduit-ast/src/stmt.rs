// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Statement nodes used in hook bodies.

use serde::{Deserialize, Serialize};

use crate::ExprNode;

/// `elsif condition { body }` branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIf {
    /// Branch condition.
    pub condition: ExprNode,
    /// Branch body.
    pub body:      Vec<StmtNode>
}

/// Statement node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StmtNode {
    /// Expression evaluated for its effect.
    Expr {
        /// The expression.
        expr: ExprNode
    },

    /// `target = value`
    Assignment {
        /// Assigned place (identifier or field access).
        target: ExprNode,
        /// New value.
        value:  ExprNode
    },

    /// `let name = value`
    Let {
        /// Local name.
        name:  String,
        /// Initial value.
        value: ExprNode
    },

    /// `if` / `elsif` / `else`
    If {
        /// Condition of the first branch.
        condition: ExprNode,
        /// Body of the first branch.
        then:      Vec<StmtNode>,
        /// `elsif` branches in order.
        #[serde(default)]
        elseifs:   Vec<ElseIf>,
        /// `else` body.
        #[serde(default, rename = "else")]
        otherwise: Option<Vec<StmtNode>>
    },

    /// `return` / `return value`
    Return {
        /// Returned value.
        #[serde(default)]
        value: Option<ExprNode>
    },

    /// Nested block; `@async` blocks run in the background.
    Block {
        /// Whether the block is detached.
        #[serde(default)]
        is_async: bool,
        /// Block body.
        body:     Vec<StmtNode>
    },

    /// `try { ... } rescue err { ... }`
    Rescue {
        /// Protected statements.
        #[serde(rename = "try")]
        body:        Vec<StmtNode>,
        /// Name bound to the captured error.
        error_var:   String,
        /// Statements run on failure.
        rescue_body: Vec<StmtNode>
    },

    /// A node kind this compiler does not know yet.
    #[serde(other)]
    Unknown
}

impl StmtNode {
    /// Expression statement.
    #[must_use]
    pub fn expr(expr: ExprNode) -> Self {
        Self::Expr { expr }
    }

    /// `target = value`
    #[must_use]
    pub fn assign(target: ExprNode, value: ExprNode) -> Self {
        Self::Assignment { target, value }
    }

    /// `let name = value`
    #[must_use]
    pub fn let_(name: impl Into<String>, value: ExprNode) -> Self {
        Self::Let {
            name: name.into(),
            value
        }
    }

    /// `if condition { then }` without other branches.
    #[must_use]
    pub fn if_(condition: ExprNode, then: Vec<StmtNode>) -> Self {
        Self::If {
            condition,
            then,
            elseifs: Vec::new(),
            otherwise: None
        }
    }

    /// `@async { body }`
    #[must_use]
    pub fn async_block(body: Vec<StmtNode>) -> Self {
        Self::Block {
            is_async: true,
            body
        }
    }

    /// Whether this statement is, or contains, an async block.
    #[must_use]
    pub fn contains_async(&self) -> bool {
        match self {
            Self::Block { is_async: true, .. } => true,
            Self::Block { body, .. } => body.iter().any(Self::contains_async),
            Self::If {
                then,
                elseifs,
                otherwise,
                ..
            } => {
                then.iter().any(Self::contains_async)
                    || elseifs
                        .iter()
                        .any(|b| b.body.iter().any(Self::contains_async))
                    || otherwise
                        .as_ref()
                        .is_some_and(|body| body.iter().any(Self::contains_async))
            }
            Self::Rescue {
                body, rescue_body, ..
            } => body.iter().chain(rescue_body).any(Self::contains_async),
            Self::Expr { .. }
            | Self::Assignment { .. }
            | Self::Let { .. }
            | Self::Return { .. }
            | Self::Unknown => false
        }
    }

    /// Whether this statement is a top-level async block.
    #[must_use]
    pub fn is_async_block(&self) -> bool {
        matches!(self, Self::Block { is_async: true, .. })
    }

    /// DSL name of the node kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Expr { .. } => "expr",
            Self::Assignment { .. } => "assignment",
            Self::Let { .. } => "let",
            Self::If { .. } => "if",
            Self::Return { .. } => "return",
            Self::Block { .. } => "block",
            Self::Rescue { .. } => "rescue",
            Self::Unknown => "unknown"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn async_inside_if_is_detected() {
        let stmt = StmtNode::if_(
            ExprNode::boolean(true),
            vec![StmtNode::async_block(vec![])]
        );
        assert!(stmt.contains_async());
        assert!(!stmt.is_async_block());
    }

    #[test]
    fn plain_block_without_async() {
        let stmt = StmtNode::Block {
            is_async: false,
            body:     vec![StmtNode::expr(ExprNode::int(1))]
        };
        assert!(!stmt.contains_async());
    }

    #[test]
    fn rescue_decodes_try_key() {
        let stmt: StmtNode = serde_json::from_str(
            r#"{
                "kind": "rescue",
                "try": [ { "kind": "return" } ],
                "error_var": "err",
                "rescue_body": []
            }"#
        )
        .unwrap();
        assert_eq!(
            stmt,
            StmtNode::Rescue {
                body:        vec![StmtNode::Return { value: None }],
                error_var:   "err".into(),
                rescue_body: vec![]
            }
        );
    }

    #[test]
    fn unknown_statement_kind() {
        let stmt: StmtNode = serde_json::from_str(r#"{ "kind": "while" }"#).unwrap();
        assert_eq!(stmt, StmtNode::Unknown);
        assert_eq!(stmt.kind_name(), "unknown");
    }
}
