//! Statement building - maps each statement alternative to its AST variant
//!
//! Declarative forms desugar into the call shapes the evaluator understands:
//! `include e` becomes `includeConfig(e)`, `a.b = e` becomes
//! `assign([a, b], e)`, `name { ... }` becomes `block(name, body)`, and
//! `kind(target) { ... }` becomes `kind(target, body)`. Statement order
//! inside a body is preserved exactly; downstream override semantics depend
//! on it.

use pest::iterators::Pair;

use crate::ast::{DeclTarget, Expr, PathSegment, Span, Stmt};

use super::{first_inner, AstBuilder, BuildResult, Rule};

impl AstBuilder<'_> {
    pub(crate) fn build_statement(&mut self, pair: Pair<Rule>) -> BuildResult<Stmt> {
        let span = self.span_of(&pair);

        match pair.as_rule() {
            Rule::statement => {
                let inner = first_inner(pair);
                self.build_statement(inner)
            }
            Rule::include_stmt => {
                let mut inner = pair.into_inner();
                inner.next(); // include keyword
                let source = self.build_expression(inner.next().unwrap())?;
                Ok(Stmt::Include { source, span })
            }
            Rule::return_stmt => {
                let mut inner = pair.into_inner();
                inner.next(); // return keyword
                let value = match inner.next() {
                    Some(expr_pair) => Some(self.build_expression(expr_pair)?),
                    None => None,
                };
                Ok(Stmt::Return { value, span })
            }
            Rule::assert_stmt => {
                let mut inner = pair.into_inner();
                inner.next(); // assert keyword
                let condition = self.build_expression(inner.next().unwrap())?;
                let message = match inner.next() {
                    Some(expr_pair) => Some(self.build_expression(expr_pair)?),
                    None => None,
                };
                Ok(Stmt::Assert {
                    condition,
                    message,
                    span,
                })
            }
            Rule::var_decl_stmt => self.build_var_decl(pair, span),
            Rule::selector_stmt => {
                let mut inner = pair.into_inner();
                let kind_pair = inner.next().unwrap();
                let kind = kind_pair.as_str().to_string();
                let target_pair = inner.next().unwrap();
                let target = match target_pair.as_rule() {
                    Rule::sel_target => self.build_sel_target(target_pair)?,
                    _ => self.build_expression(target_pair)?,
                };
                let body = self.build_block_body(inner.next().unwrap())?;
                Ok(Stmt::Selector {
                    kind,
                    target,
                    body,
                    span,
                })
            }
            Rule::block_stmt => {
                let mut inner = pair.into_inner();
                let name_pair = inner.next().unwrap();
                let name = name_pair.as_str().to_string();
                let body = self.build_block_body(inner.next().unwrap())?;
                Ok(Stmt::Block { name, body, span })
            }
            Rule::assign_stmt => self.build_assign(pair, span),
            Rule::expr_stmt => {
                let expr = self.build_expression(first_inner(pair))?;
                Ok(Stmt::Expr { expr, span })
            }
            Rule::empty_stmt => Ok(Stmt::Empty { span }),
            _ => Err(self.syntax(
                format!("unrecognized statement: '{}'", pair.as_str().trim()),
                span,
            )),
        }
    }

    /// Colon-form selector target: a literal, a parenthesized expression, or
    /// a dotted path rooted at a variable
    fn build_sel_target(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let inner = first_inner(pair);
        match inner.as_rule() {
            Rule::literal => self.build_literal(inner),
            Rule::paren_expr => self.build_expression(first_inner(inner)),
            Rule::sel_path => {
                let mut segments = inner.into_inner();
                let head = segments.next().unwrap();
                let head_span = self.span_of(&head);
                let mut expr = Expr::Variable {
                    name: head.as_str().to_string(),
                    span: head_span,
                };
                for segment in segments {
                    let seg_span = self.span_of(&segment);
                    let merged = expr.span().merge(&seg_span);
                    expr = Expr::Property {
                        receiver: Box::new(expr),
                        name: segment.as_str().to_string(),
                        safe: false,
                        spread_safe: false,
                        span: merged,
                    };
                }
                Ok(expr)
            }
            _ => Err(self.syntax("unrecognized selector target", span)),
        }
    }

    /// Ordered statements of a `{ ... }` body. A failure inside any statement
    /// aborts the whole body; the enclosing statement reports it.
    pub(crate) fn build_block_body(&mut self, pair: Pair<Rule>) -> BuildResult<Vec<Stmt>> {
        pair.into_inner()
            .map(|stmt_pair| self.build_statement(stmt_pair))
            .collect()
    }

    fn build_var_decl(&mut self, pair: Pair<Rule>, span: Span) -> BuildResult<Stmt> {
        let mut inner = pair.into_inner();
        inner.next(); // def keyword
        let targets_pair = inner.next().unwrap();

        let mut targets = Vec::new();
        for part in targets_pair.into_inner() {
            let part_span = self.span_of(&part);
            let mut part_inner = part.into_inner();
            let first = part_inner.next().unwrap();
            let target = match part_inner.next() {
                Some(name_pair) => DeclTarget {
                    name: name_pair.as_str().to_string(),
                    ty: Some(first.as_str().to_string()),
                    span: part_span,
                },
                None => DeclTarget {
                    name: first.as_str().to_string(),
                    ty: None,
                    span: part_span,
                },
            };
            targets.push(target);
        }

        let init = self.build_expression(inner.next().unwrap())?;
        Ok(Stmt::VarDecl {
            targets,
            init,
            span,
        })
    }

    /* ===================== Assignment Targets ===================== */

    fn build_assign(&mut self, pair: Pair<Rule>, span: Span) -> BuildResult<Stmt> {
        let mut inner = pair.into_inner();
        let target_pair = first_inner(inner.next().unwrap());
        let value = self.build_expression(inner.next().unwrap())?;

        match target_pair.as_rule() {
            Rule::tuple_target => self.build_tuple_assign(target_pair, value, span),
            Rule::expression => {
                let lhs = self.build_expression(target_pair)?;
                self.resolve_assign_target(lhs, value, span)
            }
            _ => Err(self.syntax("invalid assignment target", span)),
        }
    }

    /// Multiple left-hand variables always build a tuple assignment; more
    /// than one wrapping parenthesis group is rejected.
    fn build_tuple_assign(
        &mut self,
        pair: Pair<Rule>,
        value: Expr,
        span: Span,
    ) -> BuildResult<Stmt> {
        let mut wraps = 0;
        let mut current = pair;
        let names = loop {
            if current.as_str().starts_with('(') {
                wraps += 1;
            }
            let inner = first_inner(current);
            match inner.as_rule() {
                Rule::tuple_target => current = inner,
                Rule::ident_list => break inner,
                _ => return Err(self.syntax("invalid assignment target", span)),
            }
        };

        if wraps > 1 {
            return Err(self.semantic(
                "nested parenthesis is not allowed in a tuple assignment target",
                span,
            ));
        }

        let targets = names
            .into_inner()
            .map(|id| (id.as_str().to_string(), self.span_of(&id)))
            .collect();
        Ok(Stmt::TupleAssign {
            targets,
            value,
            span,
        })
    }

    /// A left-hand side is valid only as a bare variable, a property-access
    /// chain, or an index expression. A single parenthesized variable is a
    /// one-element tuple assignment; deeper wrapping is rejected.
    fn resolve_assign_target(
        &mut self,
        lhs: Expr,
        value: Expr,
        span: Span,
    ) -> BuildResult<Stmt> {
        match lhs {
            Expr::Variable {
                name,
                span: var_span,
            } => match self.paren_depth(&var_span) {
                0 => Ok(Stmt::Assign {
                    path: vec![PathSegment::Prop {
                        name,
                        span: var_span,
                    }],
                    value,
                    span,
                }),
                1 => Ok(Stmt::TupleAssign {
                    targets: vec![(name, var_span)],
                    value,
                    span,
                }),
                _ => Err(self.semantic(
                    "nested parenthesis is not allowed in a tuple assignment target",
                    span,
                )),
            },
            lhs @ (Expr::Property { .. } | Expr::Index { .. }) => {
                let mut path = Vec::new();
                self.flatten_target(lhs, &mut path)?;
                Ok(Stmt::Assign { path, value, span })
            }
            other => Err(self.syntax("invalid assignment target", other.span())),
        }
    }

    fn flatten_target(&self, expr: Expr, path: &mut Vec<PathSegment>) -> BuildResult<()> {
        match expr {
            Expr::Variable { name, span } => {
                path.push(PathSegment::Prop { name, span });
                Ok(())
            }
            Expr::Property {
                receiver,
                name,
                safe,
                spread_safe,
                span,
            } => {
                if safe || spread_safe {
                    return Err(
                        self.syntax("safe navigation is not a valid assignment target", span)
                    );
                }
                self.flatten_target(*receiver, path)?;
                path.push(PathSegment::Prop { name, span });
                Ok(())
            }
            Expr::Index {
                receiver,
                index,
                span,
            } => {
                self.flatten_target(*receiver, path)?;
                path.push(PathSegment::Index { expr: *index, span });
                Ok(())
            }
            other => Err(self.syntax("invalid assignment target", other.span())),
        }
    }
}
