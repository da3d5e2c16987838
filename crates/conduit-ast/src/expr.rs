// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Expression nodes.
//!
//! The family is a closed sum type: translators match it exhaustively, so a
//! new DSL construct is a compile error there rather than a silent fallback.
//! The only escape hatch is [`ExprNode::Unknown`], which exists so that a
//! JSON document produced by a newer parser still decodes.

use serde::{Deserialize, Serialize};

/// Literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// `nil`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal (already unescaped).
    String(String)
}

/// Arithmetic and comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `+`
    #[serde(rename = "+")]
    Add,
    /// `-`
    #[serde(rename = "-")]
    Sub,
    /// `*`
    #[serde(rename = "*")]
    Mul,
    /// `/`
    #[serde(rename = "/")]
    Div,
    /// `%`
    #[serde(rename = "%")]
    Rem,
    /// `**`
    #[serde(rename = "**")]
    Pow,
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge
}

impl BinaryOp {
    /// Operator as written in the DSL.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">="
        }
    }

    /// Whether the operator yields a boolean.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    #[serde(rename = "-")]
    Neg,
    /// `not x`
    #[serde(rename = "not")]
    Not,
    /// `x!`, force unwrap of a nullable value.
    #[serde(rename = "!")]
    ForceUnwrap
}

/// Short-circuit boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    /// `and`
    And,
    /// `or`
    Or
}

/// One `key: value` entry of a hash literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashEntry {
    /// Key expression.
    pub key:   ExprNode,
    /// Value expression.
    pub value: ExprNode
}

/// Segment of an interpolated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpolationPart {
    /// Literal text.
    Text {
        /// Text as written.
        text: String
    },
    /// Embedded `#{...}` expression.
    Expr {
        /// Embedded expression.
        expr: ExprNode
    }
}

/// Expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprNode {
    /// Literal value.
    Literal {
        /// The value.
        value: LiteralValue
    },

    /// Local variable or parameter.
    Identifier {
        /// Identifier as written.
        name: String
    },

    /// The implicit receiver (`self`).
    #[serde(rename = "self")]
    SelfRef,

    /// `object.field`
    FieldAccess {
        /// Receiver expression.
        object: Box<ExprNode>,
        /// Field name.
        field:  String
    },

    /// `object?.field`
    SafeNavigation {
        /// Receiver expression that may be absent.
        object: Box<ExprNode>,
        /// Field name.
        field:  String
    },

    /// `Namespace.function(args)` or `function(args)`.
    Call {
        /// Standard library namespace (`String`, `Time`, ...).
        #[serde(default)]
        namespace: Option<String>,
        /// Function name.
        function:  String,
        /// Arguments in order.
        #[serde(default)]
        args:      Vec<ExprNode>
    },

    /// Arithmetic or comparison.
    Binary {
        /// Operator.
        op:    BinaryOp,
        /// Left operand.
        left:  Box<ExprNode>,
        /// Right operand.
        right: Box<ExprNode>
    },

    /// Prefix operator.
    Unary {
        /// Operator.
        op:      UnaryOp,
        /// Operand.
        operand: Box<ExprNode>
    },

    /// `and` / `or`.
    Logical {
        /// Operator.
        op:    LogicalOp,
        /// Left operand.
        left:  Box<ExprNode>,
        /// Right operand.
        right: Box<ExprNode>
    },

    /// `left ?? right`
    NullCoalesce {
        /// Value that may be absent.
        left:  Box<ExprNode>,
        /// Fallback.
        right: Box<ExprNode>
    },

    /// `[a, b, c]`
    ArrayLiteral {
        /// Elements in order.
        #[serde(default)]
        elements: Vec<ExprNode>
    },

    /// `{k: v}`
    HashLiteral {
        /// Entries in order.
        #[serde(default)]
        entries: Vec<HashEntry>
    },

    /// `object[index]`
    Index {
        /// Indexed expression.
        object: Box<ExprNode>,
        /// Index expression.
        index:  Box<ExprNode>
    },

    /// `(inner)`
    Paren {
        /// Wrapped expression.
        inner: Box<ExprNode>
    },

    /// `"Hello #{name}"`
    InterpolatedString {
        /// Segments in source order.
        parts: Vec<InterpolationPart>
    },

    /// A node kind this compiler does not know yet.
    #[serde(other)]
    Unknown
}

impl ExprNode {
    /// Integer literal.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Literal {
            value: LiteralValue::Int(value)
        }
    }

    /// Float literal.
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::Literal {
            value: LiteralValue::Float(value)
        }
    }

    /// String literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal {
            value: LiteralValue::String(value.into())
        }
    }

    /// Boolean literal.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::Literal {
            value: LiteralValue::Bool(value)
        }
    }

    /// `nil`
    #[must_use]
    pub fn null() -> Self {
        Self::Literal {
            value: LiteralValue::Null
        }
    }

    /// Identifier.
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier { name: name.into() }
    }

    /// `object.field`
    #[must_use]
    pub fn field(object: ExprNode, field: impl Into<String>) -> Self {
        Self::FieldAccess {
            object: Box::new(object),
            field:  field.into()
        }
    }

    /// `self.field`
    #[must_use]
    pub fn self_field(field: impl Into<String>) -> Self {
        Self::field(Self::SelfRef, field)
    }

    /// `object?.field`
    #[must_use]
    pub fn safe_nav(object: ExprNode, field: impl Into<String>) -> Self {
        Self::SafeNavigation {
            object: Box::new(object),
            field:  field.into()
        }
    }

    /// `Namespace.function(args)`
    #[must_use]
    pub fn call(namespace: &str, function: &str, args: Vec<ExprNode>) -> Self {
        Self::Call {
            namespace: Some(namespace.to_string()),
            function: function.to_string(),
            args
        }
    }

    /// Binary operation.
    #[must_use]
    pub fn binary(op: BinaryOp, left: ExprNode, right: ExprNode) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right)
        }
    }

    /// Unary operation.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: ExprNode) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand)
        }
    }

    /// Logical operation.
    #[must_use]
    pub fn logical(op: LogicalOp, left: ExprNode, right: ExprNode) -> Self {
        Self::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right)
        }
    }

    /// `left ?? right`
    #[must_use]
    pub fn coalesce(left: ExprNode, right: ExprNode) -> Self {
        Self::NullCoalesce {
            left:  Box::new(left),
            right: Box::new(right)
        }
    }

    /// Interpolated string from parts.
    #[must_use]
    pub fn interpolated(parts: Vec<InterpolationPart>) -> Self {
        Self::InterpolatedString { parts }
    }

    /// DSL name of the node kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Literal { .. } => "literal",
            Self::Identifier { .. } => "identifier",
            Self::SelfRef => "self",
            Self::FieldAccess { .. } => "field_access",
            Self::SafeNavigation { .. } => "safe_navigation",
            Self::Call { .. } => "call",
            Self::Binary { .. } => "binary",
            Self::Unary { .. } => "unary",
            Self::Logical { .. } => "logical",
            Self::NullCoalesce { .. } => "null_coalesce",
            Self::ArrayLiteral { .. } => "array_literal",
            Self::HashLiteral { .. } => "hash_literal",
            Self::Index { .. } => "index",
            Self::Paren { .. } => "paren",
            Self::InterpolatedString { .. } => "interpolated_string",
            Self::Unknown => "unknown"
        }
    }
}

impl InterpolationPart {
    /// Literal text segment.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Embedded expression segment.
    #[must_use]
    pub fn expr(expr: ExprNode) -> Self {
        Self::Expr { expr }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decodes_slugify_call() {
        let expr: ExprNode = serde_json::from_str(
            r#"{
                "kind": "call",
                "namespace": "String",
                "function": "slugify",
                "args": [
                    { "kind": "field_access", "object": { "kind": "self" }, "field": "title" }
                ]
            }"#
        )
        .unwrap();
        assert_eq!(
            expr,
            ExprNode::call("String", "slugify", vec![ExprNode::self_field("title")])
        );
    }

    #[test]
    fn literal_values_are_untagged() {
        let lit: LiteralValue = serde_json::from_str("42").unwrap();
        assert_eq!(lit, LiteralValue::Int(42));
        let lit: LiteralValue = serde_json::from_str("4.5").unwrap();
        assert_eq!(lit, LiteralValue::Float(4.5));
        let lit: LiteralValue = serde_json::from_str("null").unwrap();
        assert_eq!(lit, LiteralValue::Null);
        let lit: LiteralValue = serde_json::from_str(r#""x""#).unwrap();
        assert_eq!(lit, LiteralValue::String("x".into()));
    }

    #[test]
    fn operators_use_dsl_symbols() {
        let expr: ExprNode = serde_json::from_str(
            r#"{
                "kind": "binary",
                "op": "**",
                "left": { "kind": "literal", "value": 2 },
                "right": { "kind": "literal", "value": 8 }
            }"#
        )
        .unwrap();
        assert_eq!(
            expr,
            ExprNode::binary(BinaryOp::Pow, ExprNode::int(2), ExprNode::int(8))
        );
        assert_eq!(BinaryOp::Pow.symbol(), "**");
        assert!(BinaryOp::Ge.is_comparison());
        assert!(!BinaryOp::Rem.is_comparison());
    }

    #[test]
    fn newer_node_kinds_decode_as_unknown() {
        let expr: ExprNode =
            serde_json::from_str(r#"{ "kind": "lambda", "params": [] }"#).unwrap();
        assert_eq!(expr, ExprNode::Unknown);
        assert_eq!(expr.kind_name(), "unknown");
    }

    #[test]
    fn interpolation_parts_decode() {
        let expr: ExprNode = serde_json::from_str(
            r#"{
                "kind": "interpolated_string",
                "parts": [
                    { "kind": "text", "text": "Hi " },
                    { "kind": "expr", "expr": { "kind": "identifier", "name": "name" } }
                ]
            }"#
        )
        .unwrap();
        assert_eq!(
            expr,
            ExprNode::interpolated(vec![
                InterpolationPart::text("Hi "),
                InterpolationPart::expr(ExprNode::ident("name"))
            ])
        );
    }
}
