//! Expression building and postfix path/call resolution
//!
//! One builder per grammar alternative. Operators resolve through a fixed
//! text table, so spelling synonyms collapse to one operator kind. The
//! postfix walk folds property access, index, call arguments, and trailing
//! closures left-to-right; call and trailing-closure folding share the same
//! receiver classification.

use pest::iterators::Pair;

use crate::ast::{BinaryOp, Expr, IncDecOp, MethodName, Span, UnaryOp, Value};

use super::{first_inner, AstBuilder, BuildResult, Rule};

/// Operator text to operator kind. `..<` and `...` are spellings of the same
/// exclusive range.
const BINARY_OPS: &[(&str, BinaryOp)] = &[
    ("||", BinaryOp::Or),
    ("&&", BinaryOp::And),
    ("<=>", BinaryOp::Cmp),
    ("==", BinaryOp::Eq),
    ("!=", BinaryOp::Ne),
    ("<=", BinaryOp::Le),
    (">=", BinaryOp::Ge),
    ("<", BinaryOp::Lt),
    (">", BinaryOp::Gt),
    ("!in", BinaryOp::NotIn),
    ("in", BinaryOp::In),
    ("..<", BinaryOp::RangeExclusive),
    ("...", BinaryOp::RangeExclusive),
    ("..", BinaryOp::Range),
    ("+", BinaryOp::Add),
    ("-", BinaryOp::Sub),
    ("*", BinaryOp::Mul),
    ("/", BinaryOp::Div),
    ("%", BinaryOp::Mod),
    ("**", BinaryOp::Pow),
];

fn lookup_binary_op(text: &str) -> Option<BinaryOp> {
    BINARY_OPS
        .iter()
        .find(|(op_text, _)| *op_text == text)
        .map(|(_, op)| *op)
}

impl AstBuilder<'_> {
    pub(crate) fn build_expression(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        match pair.as_rule() {
            Rule::expression => self.build_expression(first_inner(pair)),
            Rule::ternary_expr => self.build_ternary(pair),
            Rule::or_expr
            | Rule::and_expr
            | Rule::equality_expr
            | Rule::additive_expr
            | Rule::multiplicative_expr => self.build_binary_chain(pair),
            Rule::relational_expr => self.build_relational(pair),
            Rule::range_expr => self.build_range(pair),
            Rule::power_expr => self.build_power(pair),
            Rule::unary_expr => self.build_unary(pair),
            Rule::postfix_expr => self.build_postfix(pair),
            Rule::primary => self.build_primary(pair),
            _ => {
                let span = self.span_of(&pair);
                Err(self.syntax(
                    format!("unrecognized expression: '{}'", pair.as_str().trim()),
                    span,
                ))
            }
        }
    }

    fn build_ternary(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let mut inner = pair.into_inner();
        let cond = self.build_expression(inner.next().unwrap())?;

        let Some(tail) = inner.next() else {
            return Ok(cond);
        };

        match tail.as_rule() {
            // Elvis is its own node, never rewritten into a ternary: the
            // evaluator short-circuits without re-evaluating `cond`
            Rule::elvis_tail => {
                let fallback = self.build_expression(first_inner(tail))?;
                Ok(Expr::Elvis {
                    cond: Box::new(cond),
                    fallback: Box::new(fallback),
                    span,
                })
            }
            Rule::ternary_tail => {
                let mut branches = tail.into_inner();
                let if_true = self.build_expression(branches.next().unwrap())?;
                let if_false = self.build_expression(branches.next().unwrap())?;
                Ok(Expr::Ternary {
                    cond: Box::new(cond),
                    if_true: Box::new(if_true),
                    if_false: Box::new(if_false),
                    span,
                })
            }
            _ => Err(self.syntax("unrecognized conditional expression", span)),
        }
    }

    /// Left-associative fold over an `operand (op operand)*` chain
    fn build_binary_chain(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let mut inner = pair.into_inner();
        let mut left = self.build_expression(inner.next().unwrap())?;

        while let Some(op_pair) = inner.next() {
            let op = self.binary_op_of(&op_pair)?;
            let right = self.build_expression(inner.next().unwrap())?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    /// Relational tails fold left-to-right: comparison and membership
    /// operators, `as` casts, and `instanceof` checks all live at this level,
    /// so `x as int instanceof Number` parses without lookahead.
    fn build_relational(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let mut inner = pair.into_inner();
        let mut expr = self.build_expression(inner.next().unwrap())?;

        for tail in inner {
            let tail_span = self.span_of(&tail);
            let mut parts = tail.into_inner();
            let first = parts.next().unwrap();
            match first.as_rule() {
                Rule::cast_tail => {
                    let mut cast = first.into_inner();
                    cast.next(); // as keyword
                    let ty = cast.next().unwrap();
                    let span = expr.span().merge(&tail_span);
                    expr = Expr::Cast {
                        ty: ty.as_str().to_string(),
                        operand: Box::new(expr),
                        span,
                    };
                }
                Rule::instanceof_tail => {
                    let mut check = first.into_inner();
                    check.next(); // instanceof keyword
                    let ty = check.next().unwrap();
                    let span = expr.span().merge(&tail_span);
                    expr = Expr::TypeCheck {
                        ty: ty.as_str().to_string(),
                        operand: Box::new(expr),
                        span,
                    };
                }
                _ => {
                    let op = self.binary_op_of(&first)?;
                    let right = self.build_expression(parts.next().unwrap())?;
                    let span = expr.span().merge(&right.span());
                    expr = Expr::Binary {
                        op,
                        left: Box::new(expr),
                        right: Box::new(right),
                        span,
                    };
                }
            }
        }

        Ok(expr)
    }

    fn build_range(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let mut inner = pair.into_inner();
        let left = self.build_expression(inner.next().unwrap())?;

        let Some(op_pair) = inner.next() else {
            return Ok(left);
        };

        let op = self.binary_op_of(&op_pair)?;
        let right = self.build_expression(inner.next().unwrap())?;
        let span = left.span().merge(&right.span());
        Ok(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        })
    }

    /// Exponentiation is right-associative: `a ** b ** c` is `a ** (b ** c)`
    fn build_power(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let mut operands = Vec::new();
        for child in pair.into_inner() {
            if child.as_rule() == Rule::op_power {
                continue;
            }
            operands.push(self.build_expression(child)?);
        }

        let mut result = operands.pop().unwrap();
        while let Some(left) = operands.pop() {
            let span = left.span().merge(&result.span());
            result = Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(left),
                right: Box::new(result),
                span,
            };
        }

        Ok(result)
    }

    fn build_unary(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let mut inner = pair.into_inner();
        let first = inner.next().unwrap();

        if first.as_rule() != Rule::op_prefix {
            return self.build_expression(first);
        }

        let operand = self.build_expression(inner.next().unwrap())?;
        let expr = match first.as_str() {
            "++" => Expr::Prefix {
                op: IncDecOp::Inc,
                operand: Box::new(operand),
                span,
            },
            "--" => Expr::Prefix {
                op: IncDecOp::Dec,
                operand: Box::new(operand),
                span,
            },
            "!" => Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            },
            "~" => Expr::Unary {
                op: UnaryOp::BitNot,
                operand: Box::new(operand),
                span,
            },
            // numeric constants fold their sign into the literal value
            "-" => match operand {
                Expr::Constant {
                    value: Value::Int(n),
                    ..
                } => Expr::Constant {
                    value: Value::Int(-n),
                    span,
                },
                Expr::Constant {
                    value: Value::Float(f),
                    ..
                } => Expr::Constant {
                    value: Value::Float(-f),
                    span,
                },
                other => Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(other),
                    span,
                },
            },
            "+" => match operand {
                Expr::Constant { value, .. } if value.is_numeric() => {
                    Expr::Constant { value, span }
                }
                other => Expr::Unary {
                    op: UnaryOp::Pos,
                    operand: Box::new(other),
                    span,
                },
            },
            other => {
                return Err(
                    self.syntax(format!("unrecognized prefix operator '{other}'"), span)
                )
            }
        };

        Ok(expr)
    }

    fn binary_op_of(&self, pair: &Pair<Rule>) -> BuildResult<BinaryOp> {
        let text = pair.as_str();
        lookup_binary_op(text)
            .ok_or_else(|| self.syntax(format!("unrecognized operator '{text}'"), self.span_of(pair)))
    }

    /* ===================== Postfix Paths and Calls ===================== */

    fn build_postfix(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let mut inner = pair.into_inner();
        let mut expr = self.build_primary(inner.next().unwrap())?;

        for elem in inner {
            match elem.as_rule() {
                Rule::path_element => expr = self.fold_path_element(expr, elem)?,
                Rule::op_postfix => {
                    let op = if elem.as_str() == "++" {
                        IncDecOp::Inc
                    } else {
                        IncDecOp::Dec
                    };
                    expr = Expr::Postfix {
                        op,
                        operand: Box::new(expr),
                        span,
                    };
                }
                _ => {
                    return Err(self.syntax(
                        format!("unrecognized postfix element: '{}'", elem.as_str()),
                        span,
                    ))
                }
            }
        }

        Ok(expr)
    }

    fn fold_path_element(&mut self, receiver: Expr, elem: Pair<Rule>) -> BuildResult<Expr> {
        let elem_span = self.span_of(&elem);
        let span = receiver.span().merge(&elem_span);
        let inner = first_inner(elem);

        match inner.as_rule() {
            Rule::property_elem => self.fold_property(receiver, inner, span),
            Rule::call_args => {
                let args = self.build_args(inner)?;
                self.make_call(receiver, args, span)
            }
            Rule::index_args => {
                let index = self.build_index(inner)?;
                Ok(Expr::Index {
                    receiver: Box::new(receiver),
                    index: Box::new(index),
                    span,
                })
            }
            Rule::closure => {
                let closure = self.build_closure(inner)?;
                self.make_call(receiver, vec![closure], span)
            }
            _ => Err(self.syntax("unrecognized path element", span)),
        }
    }

    fn fold_property(
        &mut self,
        receiver: Expr,
        pair: Pair<Rule>,
        span: Span,
    ) -> BuildResult<Expr> {
        let mut inner = pair.into_inner();
        let nav = inner.next().unwrap();
        let (safe, spread_safe) = match nav.as_str() {
            "?." => (true, false),
            "*." => (false, true),
            _ => (false, false),
        };

        let name_pair = first_inner(inner.next().unwrap());
        let name = match name_pair.as_rule() {
            Rule::prop_ident => name_pair.as_str().to_string(),
            Rule::string_lit => match self.build_string(name_pair)? {
                Expr::Constant {
                    value: Value::Str(s),
                    ..
                } => s,
                other => {
                    return Err(self.syntax(
                        "interpolated strings cannot name a property",
                        other.span(),
                    ))
                }
            },
            _ => return Err(self.syntax("unrecognized property name", span)),
        };

        Ok(Expr::Property {
            receiver: Box::new(receiver),
            name,
            safe,
            spread_safe,
            span,
        })
    }

    /// Call and trailing-closure folding, by receiver shape, in priority
    /// order:
    ///   1. a method call absorbs the new arguments into its argument list
    ///      (this is what folds `foo(1, 2) { x }` into one call)
    ///   2. a property chain becomes an explicit-receiver call named by the
    ///      property; spread-safe navigation degrades to a non-safe,
    ///      spread-safe call
    ///   3. a bare unparenthesized variable, an interpolated string, or a
    ///      string constant becomes an implicit-receiver call named by that
    ///      text
    ///   4. anything else is a generic `call` invocation on the receiver
    fn make_call(
        &mut self,
        receiver: Expr,
        mut new_args: Vec<Expr>,
        span: Span,
    ) -> BuildResult<Expr> {
        match receiver {
            Expr::MethodCall {
                receiver,
                name,
                mut args,
                implicit_this,
                safe,
                spread_safe,
                ..
            } => {
                args.append(&mut new_args);
                Ok(Expr::MethodCall {
                    receiver,
                    name,
                    args,
                    implicit_this,
                    safe,
                    spread_safe,
                    span,
                })
            }
            Expr::Property {
                receiver,
                name,
                safe,
                spread_safe,
                ..
            } => {
                let (safe, spread_safe) = if spread_safe {
                    (false, true)
                } else {
                    (safe, false)
                };
                Ok(Expr::MethodCall {
                    receiver,
                    name: MethodName::Static { name },
                    args: new_args,
                    implicit_this: false,
                    safe,
                    spread_safe,
                    span,
                })
            }
            Expr::Variable {
                name,
                span: var_span,
            } if self.paren_depth(&var_span) == 0 => Ok(Expr::MethodCall {
                receiver: Box::new(Expr::Variable {
                    name: "this".to_string(),
                    span: var_span,
                }),
                name: MethodName::Static { name },
                args: new_args,
                implicit_this: true,
                safe: false,
                spread_safe: false,
                span,
            }),
            interp @ Expr::Interp { .. } => {
                let name_span = interp.span();
                Ok(Expr::MethodCall {
                    receiver: Box::new(Expr::Variable {
                        name: "this".to_string(),
                        span: name_span,
                    }),
                    name: MethodName::Dynamic {
                        expr: Box::new(interp),
                    },
                    args: new_args,
                    implicit_this: true,
                    safe: false,
                    spread_safe: false,
                    span,
                })
            }
            Expr::Constant {
                value: Value::Str(name),
                span: name_span,
            } => Ok(Expr::MethodCall {
                receiver: Box::new(Expr::Variable {
                    name: "this".to_string(),
                    span: name_span,
                }),
                name: MethodName::Static { name },
                args: new_args,
                implicit_this: true,
                safe: false,
                spread_safe: false,
                span,
            }),
            other => Ok(Expr::MethodCall {
                receiver: Box::new(other),
                name: MethodName::Static {
                    name: "call".to_string(),
                },
                args: new_args,
                implicit_this: false,
                safe: false,
                spread_safe: false,
                span,
            }),
        }
    }

    pub(crate) fn build_args(&mut self, pair: Pair<Rule>) -> BuildResult<Vec<Expr>> {
        let mut args = Vec::new();
        if let Some(list) = pair.into_inner().next() {
            for arg in list.into_inner() {
                args.push(self.build_argument(arg)?);
            }
        }
        Ok(args)
    }

    fn build_argument(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let inner = first_inner(pair);

        match inner.as_rule() {
            Rule::named_arg => {
                let mut parts = inner.into_inner();
                let key_pair = first_inner(parts.next().unwrap());
                let key = match key_pair.as_rule() {
                    Rule::identifier => key_pair.as_str().to_string(),
                    Rule::string_lit => match self.build_string(key_pair)? {
                        Expr::Constant {
                            value: Value::Str(s),
                            ..
                        } => s,
                        other => {
                            return Err(self.syntax(
                                "interpolated strings cannot name an argument",
                                other.span(),
                            ))
                        }
                    },
                    _ => return Err(self.syntax("unrecognized argument name", span)),
                };
                let value = self.build_expression(parts.next().unwrap())?;
                Ok(Expr::NamedArg {
                    key,
                    value: Box::new(value),
                    span,
                })
            }
            Rule::spread_arg => {
                let value = self.build_expression(first_inner(inner))?;
                Ok(Expr::Spread {
                    value: Box::new(value),
                    span,
                })
            }
            Rule::expression => self.build_expression(inner),
            _ => Err(self.syntax("unrecognized argument", span)),
        }
    }

    /// Index contents: a single plain element stays a bare expression; a
    /// multi-element or spread index wraps into a list expression.
    fn build_index(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let list = first_inner(pair);

        let mut items = Vec::new();
        let mut has_spread = false;
        for item in list.into_inner() {
            let item_span = self.span_of(&item);
            let inner = first_inner(item);
            match inner.as_rule() {
                Rule::spread_arg => {
                    has_spread = true;
                    let value = self.build_expression(first_inner(inner))?;
                    items.push(Expr::Spread {
                        value: Box::new(value),
                        span: item_span,
                    });
                }
                _ => items.push(self.build_expression(inner)?),
            }
        }

        if items.len() == 1 && !has_spread {
            Ok(items.remove(0))
        } else {
            Ok(Expr::ListLit {
                elements: items,
                span,
            })
        }
    }

    /* ===================== Primaries ===================== */

    fn build_primary(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let inner = first_inner(pair);

        match inner.as_rule() {
            Rule::paren_expr => {
                let expr = self.build_expression(first_inner(inner))?;
                self.note_paren(&expr);
                Ok(expr)
            }
            Rule::construct_expr => {
                let mut parts = inner.into_inner();
                parts.next(); // new keyword
                let ty = parts.next().unwrap().as_str().to_string();
                let args = self.build_args(parts.next().unwrap())?;
                Ok(Expr::Construct { ty, args, span })
            }
            Rule::map_lit => self.build_map(inner, span),
            Rule::stray_comma_lit => {
                Err(self.syntax("stray comma in empty collection literal", span))
            }
            Rule::list_lit => self.build_list(inner, span),
            Rule::closure => self.build_closure(inner),
            Rule::literal => self.build_literal(inner),
            Rule::identifier => Ok(Expr::Variable {
                name: inner.as_str().to_string(),
                span,
            }),
            _ => Err(self.syntax(
                format!("unrecognized expression: '{}'", inner.as_str().trim()),
                span,
            )),
        }
    }

    fn build_list(&mut self, pair: Pair<Rule>, span: Span) -> BuildResult<Expr> {
        let mut elements = Vec::new();
        for item in pair.into_inner() {
            let item_span = self.span_of(&item);
            let inner = first_inner(item);
            match inner.as_rule() {
                Rule::spread_arg => {
                    let value = self.build_expression(first_inner(inner))?;
                    elements.push(Expr::Spread {
                        value: Box::new(value),
                        span: item_span,
                    });
                }
                _ => elements.push(self.build_expression(inner)?),
            }
        }
        Ok(Expr::ListLit { elements, span })
    }

    /// Map literal entries in source order. Identifier and string keys are
    /// string constants; a parenthesized key is an arbitrary expression.
    fn build_map(&mut self, pair: Pair<Rule>, span: Span) -> BuildResult<Expr> {
        let mut entries = Vec::new();
        for entry in pair.into_inner() {
            let mut parts = entry.into_inner();
            let key_pair = first_inner(parts.next().unwrap());
            let key = match key_pair.as_rule() {
                Rule::map_ident => Expr::Constant {
                    value: Value::Str(key_pair.as_str().to_string()),
                    span: self.span_of(&key_pair),
                },
                Rule::string_lit => self.build_string(key_pair)?,
                Rule::paren_expr => self.build_expression(first_inner(key_pair))?,
                _ => return Err(self.syntax("unrecognized map key", span)),
            };
            let value = self.build_expression(parts.next().unwrap())?;
            entries.push((key, value));
        }
        Ok(Expr::MapLit { entries, span })
    }
}
