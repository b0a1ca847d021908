//! Sluice configuration front end
//!
//! Compiles workflow configuration source into a call-shaped AST for an
//! external evaluator. The evaluator supplies a delegate accepting, by name,
//! `includeConfig(source)`, `assign(path, value)`, `block(name, body)`, and
//! one method per selector kind (`withLabel(target, body)` and friends);
//! this crate only decides which of those calls a piece of source means.
//!
//! Entry point is [`parser::parse_config`]: success is a complete
//! [`ast::ConfigDef`], failure is every diagnostic collected from one
//! attempt.

pub mod ast;
pub mod diagnostics;
pub mod parser;

// Re-export the common surface
pub use ast::{ConfigDef, Expr, Span, Stmt, Value};
pub use diagnostics::{CompileFailure, Diagnostic, DiagnosticKind};
pub use parser::parse_config;
