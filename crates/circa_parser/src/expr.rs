//! Integer evaluation of signal dimension and template argument expressions.

use std::collections::HashMap;

use crate::lexer::{Token, TokenKind};

/// A failed evaluation, positioned at the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExprError {
    pub message: String,
    pub offset: usize,
}

/// Evaluates `tokens` as an integer expression.
///
/// Supports literals, names bound in `bindings`, unary minus, parentheses,
/// `+ - * / \ %` and `**`. Division truncates.
pub(crate) fn evaluate(tokens: &[Token], bindings: &HashMap<&str, i64>) -> Result<i64, ExprError> {
    let end = tokens.last().map_or(0, |t| t.end);
    let mut eval = Evaluator {
        tokens,
        pos: 0,
        bindings,
        end,
    };
    let value = eval.expr()?;
    match eval.tokens.get(eval.pos) {
        None => Ok(value),
        Some(tok) => Err(ExprError {
            message: "unexpected token in expression".to_string(),
            offset: tok.start,
        }),
    }
}

struct Evaluator<'a> {
    tokens: &'a [Token],
    pos: usize,
    bindings: &'a HashMap<&'a str, i64>,
    end: usize,
}

impl Evaluator<'_> {
    fn peek_punct(&self, c: char) -> bool {
        self.tokens.get(self.pos).is_some_and(|t| t.is_punct(c))
    }

    fn at_pow(&self) -> bool {
        match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
            (Some(a), Some(b)) => a.is_punct('*') && b.is_punct('*') && a.end == b.start,
            _ => false,
        }
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |t| t.start)
    }

    fn fail<T>(&self, message: &str, offset: usize) -> Result<T, ExprError> {
        Err(ExprError {
            message: message.to_string(),
            offset,
        })
    }

    fn expr(&mut self) -> Result<i64, ExprError> {
        let mut value = self.term()?;
        loop {
            let offset = self.offset();
            let result = if self.peek_punct('+') {
                self.pos += 1;
                value.checked_add(self.term()?)
            } else if self.peek_punct('-') {
                self.pos += 1;
                value.checked_sub(self.term()?)
            } else {
                return Ok(value);
            };
            value = match result {
                Some(v) => v,
                None => return self.fail("arithmetic overflow", offset),
            };
        }
    }

    fn term(&mut self) -> Result<i64, ExprError> {
        let mut value = self.power()?;
        loop {
            if self.at_pow() {
                return Ok(value);
            }
            let offset = self.offset();
            let op = match self.tokens.get(self.pos).map(|t| &t.kind) {
                Some(TokenKind::Punct(c @ ('*' | '/' | '\\' | '%'))) => *c,
                _ => return Ok(value),
            };
            self.pos += 1;
            let rhs = self.power()?;
            if op != '*' && rhs == 0 {
                return self.fail("division by zero", offset);
            }
            let result = match op {
                '*' => value.checked_mul(rhs),
                '%' => value.checked_rem(rhs),
                _ => value.checked_div(rhs),
            };
            value = match result {
                Some(v) => v,
                None => return self.fail("arithmetic overflow", offset),
            };
        }
    }

    fn power(&mut self) -> Result<i64, ExprError> {
        let base = self.unary()?;
        if !self.at_pow() {
            return Ok(base);
        }
        let offset = self.offset();
        self.pos += 2;
        let exponent = self.power()?;
        let Ok(exponent) = u32::try_from(exponent) else {
            return self.fail("exponent must be a non-negative 32-bit integer", offset);
        };
        match base.checked_pow(exponent) {
            Some(v) => Ok(v),
            None => self.fail("arithmetic overflow", offset),
        }
    }

    fn unary(&mut self) -> Result<i64, ExprError> {
        if self.peek_punct('-') {
            let offset = self.offset();
            self.pos += 1;
            let value = self.unary()?;
            return match value.checked_neg() {
                Some(v) => Ok(v),
                None => self.fail("arithmetic overflow", offset),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<i64, ExprError> {
        let offset = self.offset();
        let Some(tok) = self.tokens.get(self.pos) else {
            return self.fail("expected an expression", offset);
        };
        match &tok.kind {
            TokenKind::Number(n) => {
                self.pos += 1;
                Ok(*n)
            }
            TokenKind::Ident(name) => match self.bindings.get(name.as_str()) {
                Some(v) => {
                    self.pos += 1;
                    Ok(*v)
                }
                None => self.fail(&format!("`{name}` is not a known parameter"), offset),
            },
            TokenKind::Punct('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if !self.peek_punct(')') {
                    return self.fail("expected `)`", self.offset());
                }
                self.pos += 1;
                Ok(value)
            }
            _ => self.fail("expected an expression", offset),
        }
    }
}
