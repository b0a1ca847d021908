//! Literal normalization - numbers, strings, and interpolation
//!
//! Numeric text parses into canonical values; a malformed literal does not
//! abort the build, it is recorded once and surfaced after the whole module
//! has been assembled, positioned at the literal's span. String literals
//! resolve their delimiter's escape dialect; multi-line and slash-delimited
//! forms strip carriage returns first. Interpolated strings decompose into
//! alternating text fragments and embedded expressions while keeping the
//! original source text verbatim, delimiters included.

use pest::iterators::Pair;

use crate::ast::{Expr, Span, Value};
use crate::diagnostics::Diagnostic;

use super::{first_inner, AstBuilder, BuildResult, Rule};

impl AstBuilder<'_> {
    pub(crate) fn build_literal(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let inner = first_inner(pair);

        match inner.as_rule() {
            Rule::number => Ok(self.build_number(inner, span)),
            Rule::boolean_lit => Ok(Expr::Constant {
                value: Value::Bool(inner.as_str() == "true"),
                span,
            }),
            Rule::null_lit => Ok(Expr::Constant {
                value: Value::Null,
                span,
            }),
            Rule::string_lit => self.build_string(inner),
            _ => Err(self.syntax(
                format!("unrecognized literal: '{}'", inner.as_str()),
                span,
            )),
        }
    }

    /// Underscore separators are stripped before parsing. A value that does
    /// not fit the numeric domain defers a diagnostic and builds a null
    /// placeholder so sibling statements still assemble.
    fn build_number(&mut self, pair: Pair<Rule>, span: Span) -> Expr {
        let raw = pair.as_str();
        let cleaned = raw.replace('_', "");
        let inner = first_inner(pair);

        let parsed = match inner.as_rule() {
            Rule::hex_number => i64::from_str_radix(&cleaned[2..], 16).ok().map(Value::Int),
            Rule::int_number => cleaned.parse::<i64>().ok().map(Value::Int),
            _ => cleaned.parse::<f64>().ok().map(Value::Float),
        };

        match parsed {
            Some(value) => Expr::Constant { value, span },
            None => {
                self.diags.defer_numeric(Diagnostic::semantic(
                    format!("invalid numeric literal '{raw}'"),
                    span,
                ));
                Expr::Constant {
                    value: Value::Null,
                    span,
                }
            }
        }
    }

    /* ===================== Strings ===================== */

    pub(crate) fn build_string(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let raw = pair.as_str().to_string();
        let variant = first_inner(pair);

        match variant.as_rule() {
            Rule::sq_string => {
                let body = first_inner(variant);
                Ok(Expr::Constant {
                    value: Value::Str(unescape_quoted(body.as_str())),
                    span,
                })
            }
            Rule::triple_sq_string => {
                let body = first_inner(variant);
                let text = strip_carriage_returns(body.as_str());
                Ok(Expr::Constant {
                    value: Value::Str(unescape_quoted(&text)),
                    span,
                })
            }
            Rule::dq_string => self.build_interpolated(variant, raw, span, false),
            Rule::triple_dq_string => self.build_interpolated(variant, raw, span, true),
            Rule::slashy_string => self.build_slashy(variant, raw, span),
            _ => Err(self.syntax("unrecognized string literal", span)),
        }
    }

    /// Double-quoted forms: alternating text and interpolations. With no
    /// interpolations the result collapses to a plain string constant.
    fn build_interpolated(
        &mut self,
        pair: Pair<Rule>,
        raw: String,
        span: Span,
        multi_line: bool,
    ) -> BuildResult<Expr> {
        let mut fragments = Vec::new();
        let mut values = Vec::new();
        let mut buf = String::new();

        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::dq_text | Rule::tdq_text => {
                    let text = if multi_line {
                        strip_carriage_returns(part.as_str())
                    } else {
                        part.as_str().to_string()
                    };
                    buf.push_str(&unescape_quoted(&text));
                }
                Rule::lone_dollar => buf.push('$'),
                Rule::interpolation => {
                    let value = self.build_interp_expr(first_inner(part))?;
                    fragments.push(std::mem::take(&mut buf));
                    values.push(value);
                }
                _ => {}
            }
        }
        fragments.push(buf);

        if values.is_empty() {
            Ok(Expr::Constant {
                value: Value::Str(fragments.remove(0)),
                span,
            })
        } else {
            Ok(Expr::Interp {
                raw,
                fragments,
                values,
                span,
            })
        }
    }

    /// Slash-delimited strings: the only escape is `\/`; every other
    /// backslash is literal text. Interpolation works as in double quotes.
    fn build_slashy(&mut self, pair: Pair<Rule>, raw: String, span: Span) -> BuildResult<Expr> {
        let mut fragments = Vec::new();
        let mut values = Vec::new();
        let mut buf = String::new();

        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::slashy_text => {
                    let text = strip_carriage_returns(part.as_str());
                    buf.push_str(&unescape_slashy(&text));
                }
                Rule::lone_dollar => buf.push('$'),
                Rule::interpolation => {
                    let value = self.build_interp_expr(first_inner(part))?;
                    fragments.push(std::mem::take(&mut buf));
                    values.push(value);
                }
                _ => {}
            }
        }
        fragments.push(buf);

        if values.is_empty() {
            Ok(Expr::Constant {
                value: Value::Str(fragments.remove(0)),
                span,
            })
        } else {
            Ok(Expr::Interp {
                raw,
                fragments,
                values,
                span,
            })
        }
    }

    /// One embedded interpolation: `${expr}` holds a full expression, `$a.b`
    /// a property path rooted at a variable.
    fn build_interp_expr(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        match pair.as_rule() {
            Rule::expr_interp => self.build_expression(first_inner(pair)),
            Rule::path_interp => {
                let path = first_inner(pair);
                let mut segments = path.into_inner();
                let head = segments.next().unwrap();
                let head_span = self.span_of(&head);
                let mut expr = Expr::Variable {
                    name: head.as_str().to_string(),
                    span: head_span,
                };
                for segment in segments {
                    let seg_span = self.span_of(&segment);
                    let span = expr.span().merge(&seg_span);
                    expr = Expr::Property {
                        receiver: Box::new(expr),
                        name: segment.as_str().to_string(),
                        safe: false,
                        spread_safe: false,
                        span,
                    };
                }
                Ok(expr)
            }
            _ => {
                let span = self.span_of(&pair);
                Err(self.syntax("unrecognized string interpolation", span))
            }
        }
    }
}

/* ===================== Escape Dialects ===================== */

fn strip_carriage_returns(text: &str) -> String {
    text.replace('\r', "")
}

/// Quoted-string escapes. An unrecognized escape keeps the escaped character
/// with the backslash dropped.
fn unescape_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let digits: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if digits.len() == 4 => out.push(decoded),
                    _ => {
                        out.push('u');
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Slashy-string escapes: only `\/` collapses, everything else is literal
fn unescape_slashy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'/') {
            chars.next();
            out.push('/');
        } else {
            out.push(ch);
        }
    }

    out
}
