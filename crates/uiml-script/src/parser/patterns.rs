//! Conversion of parsed expressions into binding patterns.
//!
//! Arrow parameters and destructuring targets are parsed as ordinary
//! expressions first and converted once the parser knows what they are.
//! The same routine serves arrow functions, function declarations,
//! declarations and destructuring assignment.

use super::{PResult, Parser};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::lexer::TokenKind;
use source_map::Span;

/// Why an expression is not a valid pattern.
struct PatternError {
    code: ErrorCode,
    message: &'static str,
    span: Span,
}

impl PatternError {
    fn invalid(span: Span) -> Self {
        Self {
            code: ErrorCode::InvalidDestructuring,
            message: "invalid destructuring target",
            span,
        }
    }

    fn rest_not_last(span: Span) -> Self {
        Self {
            code: ErrorCode::RestNotLast,
            message: "spread must be the last element",
            span,
        }
    }
}

/// Converts an identifier, array/object literal or loose sequence into a
/// binding pattern. Returns `None` for any other shape.
pub fn expression_to_pattern(expr: &Expr) -> Option<Pattern> {
    convert(expr).ok()
}

fn convert(expr: &Expr) -> Result<Pattern, PatternError> {
    match &expr.kind {
        ExprKind::Identifier { name } => Ok(Pattern::Identifier {
            name: name.clone(),
            span: expr.span,
        }),
        ExprKind::ArrayLiteral { items } => convert_array(items, expr.span),
        ExprKind::Sequence { expressions, .. } => convert_array(expressions, expr.span),
        ExprKind::ObjectLiteral { properties } => convert_object(properties, expr.span),
        _ => Err(PatternError::invalid(expr.span)),
    }
}

fn convert_array(items: &[Expr], span: Span) -> Result<Pattern, PatternError> {
    let mut pattern = ArrayPattern {
        items: Vec::with_capacity(items.len()),
        rest: None,
        span,
    };
    for (index, item) in items.iter().enumerate() {
        match &item.kind {
            ExprKind::NoArg => pattern.items.push(None),
            ExprKind::Spread { operand } => {
                if index + 1 != items.len() {
                    return Err(PatternError::rest_not_last(item.span));
                }
                pattern.rest = Some(Box::new(convert(operand)?));
            }
            _ => pattern.items.push(Some(convert(item)?)),
        }
    }
    Ok(Pattern::Array(pattern))
}

fn convert_object(properties: &[ObjectProperty], span: Span) -> Result<Pattern, PatternError> {
    let mut pattern = ObjectPattern {
        properties: Vec::with_capacity(properties.len()),
        rest: None,
        span,
    };
    for (index, property) in properties.iter().enumerate() {
        match property {
            ObjectProperty::Shorthand { name, span } => pattern.properties.push(ObjectPatternProperty {
                key: name.clone(),
                value: Pattern::Identifier {
                    name: name.clone(),
                    span: *span,
                },
            }),
            ObjectProperty::KeyValue {
                key: PropertyKey::Named(key),
                value,
            } => pattern.properties.push(ObjectPatternProperty {
                key: key.clone(),
                value: convert(value)?,
            }),
            ObjectProperty::KeyValue {
                key: PropertyKey::Computed(key),
                ..
            } => return Err(PatternError::invalid(key.span)),
            ObjectProperty::Spread(operand) => {
                if index + 1 != properties.len() {
                    return Err(PatternError::rest_not_last(operand.span));
                }
                match operand.as_identifier() {
                    Some(name) => pattern.rest = Some(name.into()),
                    None => return Err(PatternError::invalid(operand.span)),
                }
            }
        }
    }
    Ok(Pattern::Object(pattern))
}

impl<'src> Parser<'src> {
    /// Converts an expression to a pattern, recording W012/W013 on failure.
    pub(crate) fn to_pattern(&mut self, expr: &Expr) -> PResult<Pattern> {
        convert(expr).map_err(|e| self.error_on(e.code, e.message, e.span))
    }

    /// Converts a parenthesized item list (or `async(...)` arguments) into
    /// a parameter list.
    pub(crate) fn convert_params(&mut self, items: Vec<Expr>) -> PResult<Params> {
        let mut params = Params::default();
        let count = items.len();
        for (index, item) in items.into_iter().enumerate() {
            match &item.kind {
                ExprKind::Spread { operand } => {
                    if index + 1 != count {
                        return Err(self.error_on(
                            ErrorCode::RestNotLast,
                            "spread must be the last parameter",
                            item.span,
                        ));
                    }
                    params.rest = Some(self.to_pattern(operand)?);
                }
                ExprKind::Identifier { .. } | ExprKind::ArrayLiteral { .. } | ExprKind::ObjectLiteral { .. } => {
                    params.items.push(self.to_pattern(&item)?);
                }
                _ => {
                    return Err(self.error_on(
                        ErrorCode::InvalidArrowParams,
                        "invalid arrow function parameter list",
                        item.span,
                    ))
                }
            }
        }
        Ok(params)
    }

    /// Parses a declaration target: a name or a destructuring literal.
    pub(crate) fn parse_binding_target(&mut self) -> PResult<Pattern> {
        match self.peek_kind() {
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Pattern::Identifier {
                    name: token.text,
                    span: token.span,
                })
            }
            TokenKind::LBracket | TokenKind::LBrace => {
                let literal = self.parse_binding_literal()?;
                self.to_pattern(&literal)
            }
            _ => Err(self.error_here(ErrorCode::IdentifierExpected, "identifier expected")),
        }
    }
}
