//! Abstract Syntax Tree node types for Sluice configuration

use serde::{Deserialize, Serialize};

/// Source location span for error reporting and raw-text recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset
    pub end: usize,
    /// Start line (0-indexed)
    pub start_line: usize,
    /// Start column (0-indexed)
    pub start_col: usize,
    /// End line (0-indexed)
    pub end_line: usize,
    /// End column (0-indexed)
    pub end_col: usize,
}

impl Span {
    pub fn new(
        start: usize,
        end: usize,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start,
            end,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a span that covers both self and other
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_line: if self.start <= other.start {
                self.start_line
            } else {
                other.start_line
            },
            start_col: if self.start <= other.start {
                self.start_col
            } else {
                other.start_col
            },
            end_line: if self.end >= other.end {
                self.end_line
            } else {
                other.end_line
            },
            end_col: if self.end >= other.end {
                self.end_col
            } else {
                other.end_col
            },
        }
    }
}

/// Helper function for serde to skip serializing default spans
fn is_default_span(span: &Span) -> bool {
    *span == Span::default()
}

/// A compiled configuration unit - the ordered top-level statements of one
/// source file. An empty source normalizes to a single `return null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDef {
    pub statements: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// One segment of an assignment path (`a.b[k].c = ...`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum PathSegment {
    Prop {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Index {
        expr: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

/// One target of a `def` declaration, optionally typed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclTarget {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Statement AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Stmt {
    /// `include <expr>` - evaluated as a call to `includeConfig(source)`
    Include {
        source: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `a.b[k].c = <expr>` - evaluated as a call to `assign(path, value)`
    Assign {
        path: Vec<PathSegment>,
        value: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `a, b = <expr>` / `(a, b) = <expr>` - multiple assignment
    TupleAssign {
        targets: Vec<(String, Span)>,
        value: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `name { ... }` - evaluated as a call to `block(name, body)`
    Block {
        name: String,
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `kind(target) { ... }` or `kind: target { ... }` - evaluated as a call
    /// to the selector method named by `kind`
    Selector {
        kind: String,
        target: Expr,
        body: Vec<Stmt>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Return {
        value: Option<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Assert {
        condition: Expr,
        message: Option<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    VarDecl {
        targets: Vec<DeclTarget>,
        init: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Expr {
        expr: Expr,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Empty {
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl Stmt {
    /// Get the span of this statement
    pub fn span(&self) -> Span {
        match self {
            Stmt::Include { span, .. } => *span,
            Stmt::Assign { span, .. } => *span,
            Stmt::TupleAssign { span, .. } => *span,
            Stmt::Block { span, .. } => *span,
            Stmt::Selector { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::Assert { span, .. } => *span,
            Stmt::VarDecl { span, .. } => *span,
            Stmt::Expr { span, .. } => *span,
            Stmt::Empty { span } => *span,
        }
    }
}

/// Constant value carried by a `Constant` expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

/// Binary operator kind, resolved from operator text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Eq,
    Ne,
    Cmp,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    /// `..`
    Range,
    /// `..<` or `...`
    RangeExclusive,
}

/// Unary operator kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    BitNot,
    Neg,
    Pos,
}

/// Increment/decrement kind for prefix and postfix forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncDecOp {
    Inc,
    Dec,
}

/// Method name - static text or an interpolated expression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum MethodName {
    Static { name: String },
    Dynamic { expr: Box<Expr> },
}

/// A closure or method parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub variadic: bool,
    #[serde(default, skip_serializing_if = "is_default_span")]
    pub span: Span,
}

/// Expression AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Expr {
    Constant {
        value: Value,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Variable {
        name: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// Interpolated string, GString-shaped: `fragments.len() == values.len() + 1`.
    /// `raw` keeps the original source text verbatim, delimiters included.
    Interp {
        raw: String,
        fragments: Vec<String>,
        values: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Prefix {
        op: IncDecOp,
        operand: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Postfix {
        op: IncDecOp,
        operand: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Ternary {
        cond: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    /// `cond ?: fallback` - its own node so the evaluator can short-circuit
    /// without re-evaluating `cond`; never rewritten to a ternary
    Elvis {
        cond: Box<Expr>,
        fallback: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Cast {
        ty: String,
        operand: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    TypeCheck {
        ty: String,
        operand: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    ListLit {
        elements: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    MapLit {
        /// Entries as (key, value) pairs; keys are constants for literal and
        /// identifier keys, arbitrary expressions for parenthesized keys
        entries: Vec<(Expr, Expr)>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Property {
        receiver: Box<Expr>,
        name: String,
        safe: bool,
        spread_safe: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Index {
        receiver: Box<Expr>,
        index: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    MethodCall {
        receiver: Box<Expr>,
        name: MethodName,
        args: Vec<Expr>,
        implicit_this: bool,
        safe: bool,
        spread_safe: bool,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Closure {
        params: Vec<Param>,
        body: Vec<Stmt>,
        /// Exact source text of the closure literal, braces included; later
        /// consumers content-address closure definitions by this text
        source_text: String,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Construct {
        ty: String,
        args: Vec<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    Spread {
        value: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
    NamedArg {
        key: String,
        value: Box<Expr>,
        #[serde(default, skip_serializing_if = "is_default_span")]
        span: Span,
    },
}

impl Expr {
    /// Get the span of this expression
    pub fn span(&self) -> Span {
        match self {
            Expr::Constant { span, .. } => *span,
            Expr::Variable { span, .. } => *span,
            Expr::Interp { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Unary { span, .. } => *span,
            Expr::Prefix { span, .. } => *span,
            Expr::Postfix { span, .. } => *span,
            Expr::Ternary { span, .. } => *span,
            Expr::Elvis { span, .. } => *span,
            Expr::Cast { span, .. } => *span,
            Expr::TypeCheck { span, .. } => *span,
            Expr::ListLit { span, .. } => *span,
            Expr::MapLit { span, .. } => *span,
            Expr::Property { span, .. } => *span,
            Expr::Index { span, .. } => *span,
            Expr::MethodCall { span, .. } => *span,
            Expr::Closure { span, .. } => *span,
            Expr::Construct { span, .. } => *span,
            Expr::Spread { span, .. } => *span,
            Expr::NamedArg { span, .. } => *span,
        }
    }
}
