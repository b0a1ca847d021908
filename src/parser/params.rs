//! Closure and parameter building with arity/name validation

use pest::iterators::Pair;

use crate::ast::{Expr, Param};

use super::{AstBuilder, BuildResult, Rule};

impl AstBuilder<'_> {
    /// Closures keep both the structured body and the exact source text,
    /// braces included; consumers content-address closure definitions by
    /// that text.
    pub(crate) fn build_closure(&mut self, pair: Pair<Rule>) -> BuildResult<Expr> {
        let span = self.span_of(&pair);
        let source_text = pair.as_str().to_string();

        let mut params = Vec::new();
        let mut body = Vec::new();
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::closure_header => {
                    if let Some(list) = part.into_inner().next() {
                        params = self.build_params(list)?;
                    }
                }
                Rule::statement => body.push(self.build_statement(part)?),
                _ => {}
            }
        }

        Ok(Expr::Closure {
            params,
            body,
            source_text,
            span,
        })
    }

    fn build_params(&mut self, pair: Pair<Rule>) -> BuildResult<Vec<Param>> {
        let params = pair
            .into_inner()
            .map(|decl| self.build_param(decl))
            .collect::<BuildResult<Vec<_>>>()?;
        self.validate_params(&params)?;
        Ok(params)
    }

    fn build_param(&mut self, pair: Pair<Rule>) -> BuildResult<Param> {
        let span = self.span_of(&pair);
        let mut inner = pair.into_inner();

        let mut next = inner.next().unwrap();
        let variadic = next.as_rule() == Rule::variadic_mark;
        if variadic {
            next = inner.next().unwrap();
        }

        let (ty, name) = if next.as_rule() == Rule::type_name {
            let name_pair = inner.next().unwrap();
            (Some(next.as_str().to_string()), name_pair.as_str().to_string())
        } else {
            (None, next.as_str().to_string())
        };

        let default = match inner.next() {
            Some(expr_pair) => Some(self.build_expression(expr_pair)?),
            None => None,
        };

        Ok(Param {
            name,
            ty,
            default,
            variadic,
            span,
        })
    }

    /// A variadic marker is only valid on the final parameter, and no two
    /// parameters may share a name.
    fn validate_params(&mut self, params: &[Param]) -> BuildResult<()> {
        for (idx, param) in params.iter().enumerate() {
            if param.variadic && idx + 1 != params.len() {
                return Err(self.semantic(
                    format!(
                        "variadic parameter '{}' must be the last parameter",
                        param.name
                    ),
                    param.span,
                ));
            }
            for earlier in &params[..idx] {
                if earlier.name == param.name {
                    return Err(self.semantic(
                        format!("duplicate parameter name '{}'", param.name),
                        param.span,
                    ));
                }
            }
        }
        Ok(())
    }
}
