//! Sluice configuration parser - pest-based front end
//!
//! Turns raw configuration source into the call-shaped AST the evaluator
//! executes, with span information for error reporting.
//!
//! Parsing runs in two phases. The fast phase is a plain parse of the strict
//! grammar entry point with no recovery machinery attached; it covers the
//! common well-formed case at minimum cost. When the fast phase fails with
//! anything other than a lexer-level failure (unterminated string, illegal
//! character), the input is re-parsed from the start with the lenient entry
//! point, which captures every unparseable statement region so a precise,
//! position-accurate diagnostic can be reported for each one. Lexer-level
//! failures skip the retry: a fallback parse cannot repair a broken token
//! stream.

use std::collections::HashMap;

use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use tracing::{debug, trace};

use crate::ast::{ConfigDef, Expr, Span, Stmt, Value};
use crate::diagnostics::{CompileFailure, Diagnostic, Diagnostics};

mod expressions;
mod literals;
mod params;
mod statements;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[grammar = "parser/sluice.pest"]
struct SluiceParser;

/* ===================== Span Helpers ===================== */

/// Convert a pest pair's span to our Span type
pub(crate) fn pair_to_span(pair: &Pair<Rule>, source: &str) -> Span {
    let pest_span = pair.as_span();
    let start = pest_span.start();
    let end = pest_span.end();

    let (start_line, start_col) = offset_to_line_col(source, start);
    let (end_line, end_col) = offset_to_line_col(source, end);

    Span::new(start, end, start_line, start_col, end_line, end_col)
}

/// Convert byte offset to (line, column) - 0-indexed
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    let mut current_offset = 0;

    for ch in source.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

/// Span of a pest error, from its input location
fn error_span(err: &pest::error::Error<Rule>, source: &str) -> Span {
    let (start, end) = match err.location {
        InputLocation::Pos(pos) => (pos, pos),
        InputLocation::Span((start, end)) => (start, end),
    };
    let (start_line, start_col) = offset_to_line_col(source, start);
    let (end_line, end_col) = offset_to_line_col(source, end);
    Span::new(start, end, start_line, start_col, end_line, end_col)
}

/* ===================== Build Errors ===================== */

/// Failure of one node's construction path. Propagates to the nearest
/// enclosing statement, where it is recorded and sibling statements continue.
#[derive(Debug)]
pub(crate) struct BuildError(pub(crate) Diagnostic);

pub(crate) type BuildResult<T> = Result<T, BuildError>;

/* ===================== AST Builder ===================== */

/// CST-to-AST builder, scoped to exactly one source unit.
///
/// Holds the mutable build state: the diagnostic collector and the transient
/// parenthesis-depth table consulted during assignment-target resolution and
/// discarded with the builder.
pub(crate) struct AstBuilder<'a> {
    pub(crate) source: &'a str,
    pub(crate) diags: &'a mut Diagnostics,
    paren_depths: HashMap<(usize, usize), u32>,
}

impl<'a> AstBuilder<'a> {
    fn new(source: &'a str, diags: &'a mut Diagnostics) -> Self {
        Self {
            source,
            diags,
            paren_depths: HashMap::new(),
        }
    }

    pub(crate) fn span_of(&self, pair: &Pair<Rule>) -> Span {
        pair_to_span(pair, self.source)
    }

    pub(crate) fn syntax(&self, message: impl Into<String>, span: Span) -> BuildError {
        BuildError(Diagnostic::syntax(message, span))
    }

    pub(crate) fn semantic(&self, message: impl Into<String>, span: Span) -> BuildError {
        BuildError(Diagnostic::semantic(message, span))
    }

    /// Record one enclosing parenthesis group around `expr`. Keyed by the
    /// node's span, which identifies it uniquely within one source unit.
    pub(crate) fn note_paren(&mut self, expr: &Expr) {
        let span = expr.span();
        *self.paren_depths.entry((span.start, span.end)).or_insert(0) += 1;
    }

    /// How many parenthesis groups wrapped this node; 0 if none recorded
    pub(crate) fn paren_depth(&self, span: &Span) -> u32 {
        self.paren_depths
            .get(&(span.start, span.end))
            .copied()
            .unwrap_or(0)
    }
}

/// First child of a pair. Grammar rules invoked through here always have at
/// least one child.
pub(crate) fn first_inner(pair: Pair<Rule>) -> Pair<Rule> {
    pair.into_inner().next().unwrap()
}

/* ===================== Two-Phase Orchestration ===================== */

/// Outcome of the fast parse phase
enum FastParse<'a> {
    /// Parsed cleanly; build from these pairs
    Success(Pairs<'a, Rule>),
    /// Parse failed but the token stream is well-formed; the precise phase
    /// can produce positioned diagnostics
    Retry(Box<pest::error::Error<Rule>>),
    /// The token stream itself is malformed; retrying cannot help
    Fatal(Box<pest::error::Error<Rule>>),
}

fn fast_parse(source: &str) -> FastParse<'_> {
    match SluiceParser::parse(Rule::config, source) {
        Ok(pairs) => {
            trace!(tree = ?pairs, "fast-phase parse tree");
            FastParse::Success(pairs)
        }
        Err(parse_err) => match SluiceParser::parse(Rule::token_stream, source) {
            Ok(_) => FastParse::Retry(Box::new(parse_err)),
            Err(lex_err) => FastParse::Fatal(Box::new(lex_err)),
        },
    }
}

/// Lenient re-parse: one Syntax diagnostic per unparseable region, each
/// re-parsed in isolation to recover the expected-token message and the exact
/// failure position.
fn precise_parse(source: &str, diags: &mut Diagnostics) -> Option<ConfigDef> {
    let mut pairs = match SluiceParser::parse(Rule::config_lenient, source) {
        Ok(pairs) => pairs,
        Err(err) => {
            let span = error_span(&err, source);
            diags.push(Diagnostic::syntax(
                format!("syntax error: {}", err.variant.message()),
                span,
            ));
            return None;
        }
    };

    let root = pairs.next().unwrap();
    let module_span = pair_to_span(&root, source);
    let mut stmt_pairs = Vec::new();
    let mut had_region_errors = false;

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::statement => stmt_pairs.push(pair),
            Rule::error_stmt => {
                had_region_errors = true;
                diags.push(region_diagnostic(&pair, source));
            }
            Rule::stray_brace => {
                had_region_errors = true;
                let span = pair_to_span(&pair, source);
                diags.push(Diagnostic::syntax(
                    format!("unbalanced '{}'", pair.as_str()),
                    span,
                ));
            }
            Rule::EOI => {}
            _ => {}
        }
    }

    if had_region_errors {
        return None;
    }

    // Nothing was actually wrong under the lenient strategy: build the same
    // AST the fast phase would have produced.
    build_module(stmt_pairs, module_span, source, diags)
}

/// Diagnostic for one unparseable region, positioned where the statement
/// grammar actually gives up within it
fn region_diagnostic(pair: &Pair<Rule>, source: &str) -> Diagnostic {
    let region_span = pair_to_span(pair, source);
    let snippet = pair.as_str();
    let base = pair.as_span().start();

    match SluiceParser::parse(Rule::statement, snippet) {
        Err(err) => {
            let rel = match err.location {
                InputLocation::Pos(pos) => pos,
                InputLocation::Span((start, _)) => start,
            };
            let abs = base + rel;
            let (line, col) = offset_to_line_col(source, abs);
            let point = Span::new(abs, abs, line, col, line, col);
            Diagnostic::syntax(format!("syntax error: {}", err.variant.message()), point)
        }
        // A valid statement prefix followed by trailing junk
        Ok(_) => Diagnostic::syntax(
            format!("unexpected input after statement: '{}'", snippet.trim()),
            region_span,
        ),
    }
}

/* ===================== Module Assembly ===================== */

/// Build top-level statements into a module. A failed statement aborts only
/// its own construction; its siblings still build, so one pass reports every
/// diagnostic. Returns None if anything was recorded.
fn build_module(
    stmt_pairs: Vec<Pair<Rule>>,
    module_span: Span,
    source: &str,
    diags: &mut Diagnostics,
) -> Option<ConfigDef> {
    let mut statements = Vec::new();
    let mut builder = AstBuilder::new(source, diags);

    for pair in stmt_pairs {
        match builder.build_statement(pair) {
            Ok(stmt) => statements.push(stmt),
            Err(BuildError(diagnostic)) => builder.diags.push(diagnostic),
        }
    }

    if statements.is_empty() {
        statements.push(Stmt::Return {
            value: Some(Expr::Constant {
                value: Value::Null,
                span: module_span,
            }),
            span: module_span,
        });
    }

    if diags.has_any() {
        None
    } else {
        Some(ConfigDef {
            statements,
            span: module_span,
        })
    }
}

fn statements_of(root: Pair<Rule>) -> Vec<Pair<Rule>> {
    root.into_inner()
        .filter(|pair| pair.as_rule() == Rule::statement)
        .collect()
}

/* ===================== Public API ===================== */

/// Compile a Sluice configuration source string into a module.
///
/// Success yields the complete ordered statement list; failure yields every
/// diagnostic collected from the attempt, never a partial module.
pub fn parse_config(source: &str) -> Result<ConfigDef, CompileFailure> {
    let mut diags = Diagnostics::new();

    let def = match fast_parse(source) {
        FastParse::Success(mut pairs) => {
            let root = pairs.next().unwrap();
            let module_span = pair_to_span(&root, source);
            build_module(statements_of(root), module_span, source, &mut diags)
        }
        FastParse::Retry(err) => {
            debug!(error = %err, "fast parse failed; retrying with precise strategy");
            precise_parse(source, &mut diags)
        }
        FastParse::Fatal(err) => {
            debug!(error = %err, "lexer-level failure; skipping precise retry");
            let span = error_span(&err, source);
            diags.push(Diagnostic::lexer(
                format!("unrecognized token: {}", err.variant.message()),
                span,
            ));
            None
        }
    };

    let diagnostics = diags.finish();
    match def {
        Some(def) if diagnostics.is_empty() => Ok(def),
        _ => Err(CompileFailure { diagnostics }),
    }
}

/// Parse a source string and return its first top-level statement (testing
/// API). An empty source normalizes to a `return null` statement.
pub fn parse(source: &str) -> Result<Stmt, CompileFailure> {
    let def = parse_config(source)?;
    let span = def.span;
    Ok(def
        .statements
        .into_iter()
        .next()
        .unwrap_or(Stmt::Empty { span }))
}
