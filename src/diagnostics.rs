//! Diagnostics for the Sluice configuration front end
//!
//! Builders never report errors one at a time to the caller: everything found
//! while compiling one source unit is accumulated here, in insertion order,
//! and surfaced together. A malformed numeric literal is special-cased into a
//! deferred slot (first occurrence wins) that is only attached once the rest
//! of the module has been assembled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Span;

/// Which stage of the front end produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Malformed token stream; fatal, the precise re-parse is skipped
    Lexer,
    /// Input shape violates an expected grammar alternative
    Syntax,
    /// Structurally valid input with an invalid meaning (duplicate parameter,
    /// misplaced variadic marker, nested-parenthesis tuple target, malformed
    /// numeric literal)
    Semantic,
}

/// A single positioned error produced while compiling one source unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: DiagnosticKind::Lexer,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: DiagnosticKind::Syntax,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: DiagnosticKind::Semantic,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Lexer => "lexer",
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Semantic => "semantic",
        };
        write!(
            f,
            "{} error at line {}, col {}: {}",
            kind,
            self.span.start_line + 1,
            self.span.start_col + 1,
            self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Build-scoped diagnostic accumulator.
///
/// One instance lives for exactly one compilation of one source unit; it is
/// never shared across units.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    deferred_numeric: Option<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Record a malformed-numeric-literal diagnostic without aborting the
    /// build. Set-once: the first occurrence wins.
    pub fn defer_numeric(&mut self, diagnostic: Diagnostic) {
        if self.deferred_numeric.is_none() {
            self.deferred_numeric = Some(diagnostic);
        }
    }

    pub fn has_any(&self) -> bool {
        !self.items.is_empty() || self.deferred_numeric.is_some()
    }

    /// Consume the collector, attaching the deferred numeric diagnostic (if
    /// any) after everything collected during the walk.
    pub fn finish(self) -> Vec<Diagnostic> {
        let mut items = self.items;
        items.extend(self.deferred_numeric);
        items
    }
}

/// The failure side of a compilation attempt: every diagnostic collected from
/// one pass over one source unit, in insertion order. A failed build never
/// yields a partial module.
#[derive(Debug, Error)]
#[error("configuration compilation failed with {} diagnostic(s)", .diagnostics.len())]
pub struct CompileFailure {
    pub diagnostics: Vec<Diagnostic>,
}
