//! Splitting of attribute values into literal text and `{expression}` parts.
//!
//! `Hello, {user.name}!` becomes a literal, an expression and a literal.
//! `\{` stands for a literal brace. Expressions are parsed in place, so their
//! spans and error positions are offsets into the whole value.

use crate::ast::{Expr, NodeIdGenerator};
use crate::error::{ErrorCode, ParseError};
use crate::lexer::TokenKind;
use crate::parser::Parser;

/// One part of a parameter string.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSegment {
    /// Plain text.
    Literal(String),
    /// The expression between `{` and `}`.
    Expression(Expr),
}

/// The classified form of an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// No expressions at all.
    Literal(String),
    /// Exactly one expression and nothing around it, e.g. `{count + 1}`.
    /// The value keeps the expression's own type at run time.
    Expression(Expr),
    /// Text mixed with expressions; evaluates to a string.
    Template(Vec<ValueSegment>),
}

/// Splits `source` into literal and expression segments.
pub fn parse_parameter_string(source: &str, ids: &NodeIdGenerator) -> Result<Vec<ValueSegment>, ParseError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        if rest.starts_with("\\{") {
            text.push('{');
            pos += 2;
            continue;
        }
        if rest.starts_with('{') {
            if !text.is_empty() {
                segments.push(ValueSegment::Literal(std::mem::take(&mut text)));
            }
            let (expr, end) = parse_interpolation(source, pos + 1, ids)?;
            segments.push(ValueSegment::Expression(expr));
            pos = end;
            continue;
        }
        let Some(c) = rest.chars().next() else {
            break;
        };
        text.push(c);
        pos += c.len_utf8();
    }

    if !text.is_empty() {
        segments.push(ValueSegment::Literal(text));
    }
    Ok(segments)
}

/// Parses and classifies an attribute value.
pub fn parse_property_value(source: &str, ids: &NodeIdGenerator) -> Result<PropertyValue, ParseError> {
    let mut segments = parse_parameter_string(source, ids)?;
    if segments.len() > 1 {
        return Ok(PropertyValue::Template(segments));
    }
    let value = match segments.pop() {
        None => PropertyValue::Literal(String::new()),
        Some(ValueSegment::Literal(text)) => PropertyValue::Literal(text),
        Some(ValueSegment::Expression(expr)) => PropertyValue::Expression(expr),
    };
    Ok(value)
}

/// Parses the expression starting at `start` and the `}` closing it.
/// Returns the expression and the offset just past the `}`.
fn parse_interpolation(source: &str, start: usize, ids: &NodeIdGenerator) -> Result<(Expr, usize), ParseError> {
    let mut parser = Parser::with_offset(source, start, ids.clone());
    let expr = parser.parse_embedded_expression()?;
    let token = parser.next_token();
    if token.kind != TokenKind::RBrace {
        return Err(ParseError::new(ErrorCode::RBraceExpected, "'}' expected", token.span, token.start));
    }
    Ok((expr, parser.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, LiteralValue};
    use pretty_assertions::assert_eq;
    use source_map::Span;

    fn segments(source: &str) -> Vec<ValueSegment> {
        parse_parameter_string(source, &NodeIdGenerator::new()).unwrap()
    }

    #[test]
    fn test_mixed_segments() {
        let parts = segments("Hello, {user.name}! {1 + 1}");
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], ValueSegment::Literal("Hello, ".into()));
        let ValueSegment::Expression(expr) = &parts[1] else {
            panic!("expected expression");
        };
        assert!(matches!(expr.kind, ExprKind::Member { .. }));
        assert_eq!(expr.span, Span::from_offsets(8, 17));
        assert_eq!(parts[2], ValueSegment::Literal("! ".into()));
    }

    #[test]
    fn test_escaped_brace_is_literal() {
        assert_eq!(segments(r"a \{b} c"), vec![ValueSegment::Literal("a {b} c".into())]);
    }

    #[test]
    fn test_braces_inside_expression() {
        let parts = segments("{ {a: '}'}.a }x");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], ValueSegment::Literal("x".into()));
    }

    #[test]
    fn test_property_value_classification() {
        let ids = NodeIdGenerator::new();
        assert_eq!(
            parse_property_value("plain", &ids).unwrap(),
            PropertyValue::Literal("plain".into())
        );
        let PropertyValue::Expression(expr) = parse_property_value("{42}", &ids).unwrap() else {
            panic!("expected expression");
        };
        assert_eq!(expr.as_literal(), Some(&LiteralValue::Number(42.0)));
        assert!(matches!(
            parse_property_value("{a}px", &ids).unwrap(),
            PropertyValue::Template(_)
        ));
    }

    #[test]
    fn test_errors_are_positioned_in_the_value() {
        let ids = NodeIdGenerator::new();
        let error = parse_parameter_string("ab {foo(bar }", &ids).unwrap_err();
        assert_eq!(error.code, ErrorCode::RParenExpected);
        assert_eq!(error.span, Span::from_offsets(12, 13));

        let error = parse_parameter_string("x {a", &ids).unwrap_err();
        assert_eq!(error.code, ErrorCode::RBraceExpected);
        assert_eq!(error.column(), 5);
    }
}
