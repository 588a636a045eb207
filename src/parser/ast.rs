//! Syntax tree for Extended JSON text.
//!
//! Literals keep their source text where precision matters (numbers), and
//! every composite node carries its span for error reporting.

use std::ops::Range;

/// Span information for source locations
pub type Span = Range<usize>;

/// Root expression type
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Object literal: { key: value, ... }
    Object(ObjectExpr),
    /// Array literal: [1, 2, 3]
    Array(ArrayExpr),
    /// String literal: "hello" or 'world'
    String(String),
    /// Number literal, unsigned, as written
    Number(String),
    /// Boolean literal: true or false
    Boolean(bool),
    /// Null literal
    Null,
    /// Bare identifier: undefined, MinKey, Infinity, ...
    Ident(String, Span),
    /// Regular expression literal: /pattern/flags
    Regex { pattern: String, flags: String },
    /// Constructor call, with or without `new`: ObjectId("..")
    Call(Box<CallExpr>),
    /// Signed expression: -5, +3
    Unary(Box<UnaryExpr>),
}

/// Object expression: { key: value, ... }
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
    pub properties: Vec<Property>,
    pub span: Span,
}

impl ObjectExpr {
    pub fn new(properties: Vec<Property>, span: Span) -> Self {
        Self { properties, span }
    }
}

/// Object property: key: value
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    pub span: Span,
}

impl Property {
    pub fn new(key: PropertyKey, value: Expr, span: Span) -> Self {
        Self { key, value, span }
    }
}

/// Property key (can be identifier, string, or number)
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Ident(String),
    String(String),
    Number(String),
}

impl PropertyKey {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyKey::Ident(s) | PropertyKey::String(s) | PropertyKey::Number(s) => s,
        }
    }
}

/// Array expression: [1, 2, 3]
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

impl ArrayExpr {
    pub fn new(elements: Vec<Expr>, span: Span) -> Self {
        Self { elements, span }
    }
}

/// Constructor call: Name(args) or new Name(args)
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: String,
    pub arguments: Vec<Expr>,
    /// Whether the call was written with `new`
    pub is_new: bool,
    pub span: Span,
}

impl CallExpr {
    pub fn new(callee: String, arguments: Vec<Expr>, is_new: bool, span: Span) -> Self {
        Self {
            callee,
            arguments,
            is_new,
            span,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
}

/// Unary expression: -x, +x
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    pub argument: Expr,
    pub span: Span,
}

impl UnaryExpr {
    pub fn new(operator: UnaryOperator, argument: Expr, span: Span) -> Self {
        Self {
            operator,
            argument,
            span,
        }
    }
}
