//! Literal argument evaluation.
//!
//! Only double-quoted strings, decimal integers and decimal floats are
//! accepted, each optionally preceded by a single `-` (numbers only).

use swc_common::{Span, Spanned};
use swc_ecma_ast::{Expr, Lit, Number, Str, UnaryOp};

use crate::core::annotation::Literal;

/// Why an argument could not be evaluated. Spans point into the annotation text.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum LiteralError {
    /// Some other literal form (single quotes, hex, bigint, boolean, ...).
    Unsupported(Span),
    /// `-"text"`.
    NegatedString(Span),
    UnaryOperator(Span, UnaryOp),
    /// Not a literal at all; for `-Foo` the span covers the whole expression.
    NotLiteral(Span),
    InvalidNumber(Span, String),
}

pub(super) fn evaluate(expr: &Expr) -> Result<Literal, LiteralError> {
    match expr {
        Expr::Lit(lit) => literal(lit, false),
        Expr::Unary(unary) => {
            if unary.op != UnaryOp::Minus {
                return Err(LiteralError::UnaryOperator(unary.span, unary.op));
            }
            match &*unary.arg {
                Expr::Lit(Lit::Str(_)) => Err(LiteralError::NegatedString(unary.span)),
                Expr::Lit(lit) => literal(lit, true),
                _ => Err(LiteralError::NotLiteral(unary.span)),
            }
        }
        other => Err(LiteralError::NotLiteral(other.span())),
    }
}

fn literal(lit: &Lit, negate: bool) -> Result<Literal, LiteralError> {
    match lit {
        Lit::Str(s) => string(s),
        Lit::Num(num) => number(num, negate),
        other => Err(LiteralError::Unsupported(other.span())),
    }
}

fn string(s: &Str) -> Result<Literal, LiteralError> {
    let double_quoted = s.raw.as_deref().is_some_and(|raw| raw.starts_with('"'));
    match s.value.as_str() {
        Some(value) if double_quoted => Ok(Literal::String(value.to_string())),
        _ => Err(LiteralError::Unsupported(s.span)),
    }
}

fn number(num: &Number, negate: bool) -> Result<Literal, LiteralError> {
    let Some(raw) = num.raw.as_deref() else {
        return Err(LiteralError::Unsupported(num.span));
    };
    let decimal = raw.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !decimal {
        return Err(LiteralError::Unsupported(num.span));
    }

    let signed = if negate { format!("-{raw}") } else { raw.to_string() };
    if raw.contains(['.', 'e', 'E']) {
        let value = signed
            .parse::<f64>()
            .map_err(|err| LiteralError::InvalidNumber(num.span, err.to_string()))?;
        // Out-of-range decimals parse to infinity or collapse to zero.
        let mantissa = raw.split(['e', 'E']).next().unwrap_or(raw);
        let underflow = value == 0.0 && mantissa.bytes().any(|b| matches!(b, b'1'..=b'9'));
        if !value.is_finite() || underflow {
            return Err(LiteralError::InvalidNumber(num.span, "value out of range".to_string()));
        }
        Ok(Literal::Float(value))
    } else {
        signed
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|err| LiteralError::InvalidNumber(num.span, err.to_string()))
    }
}
