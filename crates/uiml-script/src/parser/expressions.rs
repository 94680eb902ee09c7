//! Expression parsing.

use super::{PResult, Parser};
use crate::ast::*;
use crate::coerce::number_to_string;
use crate::error::ErrorCode;
use crate::lexer::TokenKind;
use crate::literal::{parse_number, unescape, unescape_quoted, NumericValue};
use smol_str::SmolStr;
use std::sync::Arc;

/// Binary operator and its binding power (higher binds tighter).
fn binary_operator(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let op = match kind {
        TokenKind::NullCoalesce => (BinaryOp::NullCoalesce, 1),
        TokenKind::LogicalOr => (BinaryOp::LogicalOr, 2),
        TokenKind::LogicalAnd => (BinaryOp::LogicalAnd, 3),
        TokenKind::BitwiseOr => (BinaryOp::BitwiseOr, 4),
        TokenKind::BitwiseXor => (BinaryOp::BitwiseXor, 5),
        TokenKind::BitwiseAnd => (BinaryOp::BitwiseAnd, 6),
        TokenKind::Equal => (BinaryOp::Equal, 7),
        TokenKind::NotEqual => (BinaryOp::NotEqual, 7),
        TokenKind::StrictEqual => (BinaryOp::StrictEqual, 7),
        TokenKind::StrictNotEqual => (BinaryOp::StrictNotEqual, 7),
        TokenKind::LessThan => (BinaryOp::LessThan, 8),
        TokenKind::LessThanOrEqual => (BinaryOp::LessThanOrEqual, 8),
        TokenKind::GreaterThan => (BinaryOp::GreaterThan, 8),
        TokenKind::GreaterThanOrEqual => (BinaryOp::GreaterThanOrEqual, 8),
        TokenKind::In => (BinaryOp::In, 8),
        TokenKind::ShiftLeft => (BinaryOp::ShiftLeft, 9),
        TokenKind::SignedShiftRight => (BinaryOp::SignedShiftRight, 9),
        TokenKind::ShiftRight => (BinaryOp::ShiftRight, 9),
        TokenKind::Plus => (BinaryOp::Add, 10),
        TokenKind::Minus => (BinaryOp::Subtract, 10),
        TokenKind::Multiply => (BinaryOp::Multiply, 11),
        TokenKind::Divide => (BinaryOp::Divide, 11),
        TokenKind::Remainder => (BinaryOp::Remainder, 11),
        _ => return None,
    };
    Some(op)
}

fn assignment_operator(kind: TokenKind) -> Option<AssignmentOp> {
    let op = match kind {
        TokenKind::Assign => AssignmentOp::Assign,
        TokenKind::AddAssign => AssignmentOp::Compound(BinaryOp::Add),
        TokenKind::SubtractAssign => AssignmentOp::Compound(BinaryOp::Subtract),
        TokenKind::MultiplyAssign => AssignmentOp::Compound(BinaryOp::Multiply),
        TokenKind::DivideAssign => AssignmentOp::Compound(BinaryOp::Divide),
        TokenKind::RemainderAssign => AssignmentOp::Compound(BinaryOp::Remainder),
        TokenKind::ExponentAssign => AssignmentOp::Compound(BinaryOp::Exponent),
        TokenKind::ShiftLeftAssign => AssignmentOp::Compound(BinaryOp::ShiftLeft),
        TokenKind::SignedShiftRightAssign => AssignmentOp::Compound(BinaryOp::SignedShiftRight),
        TokenKind::ShiftRightAssign => AssignmentOp::Compound(BinaryOp::ShiftRight),
        TokenKind::BitwiseAndAssign => AssignmentOp::Compound(BinaryOp::BitwiseAnd),
        TokenKind::BitwiseOrAssign => AssignmentOp::Compound(BinaryOp::BitwiseOr),
        TokenKind::BitwiseXorAssign => AssignmentOp::Compound(BinaryOp::BitwiseXor),
        TokenKind::LogicalAndAssign => AssignmentOp::Compound(BinaryOp::LogicalAnd),
        TokenKind::LogicalOrAssign => AssignmentOp::Compound(BinaryOp::LogicalOr),
        TokenKind::NullCoalesceAssign => AssignmentOp::Compound(BinaryOp::NullCoalesce),
        _ => return None,
    };
    Some(op)
}

/// Tokens that can begin the operand of a prefix `await`.
fn starts_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::StringLiteral
            | TokenKind::Backtick
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Undefined
            | TokenKind::New
            | TokenKind::Function
            | TokenKind::Typeof
            | TokenKind::LogicalNot
            | TokenKind::BitwiseNot
    )
}

impl<'src> Parser<'src> {
    /// Parses a comma sequence. Elided slots (`a,,b`) make it loose.
    pub(crate) fn parse_expr(&mut self) -> PResult<Expr> {
        let start = self.start();
        let first = self.parse_assignment()?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        let mut loose = false;
        while self.eat(TokenKind::Comma) {
            if self.at(TokenKind::Comma) {
                let hole = self.start();
                expressions.push(self.expr(hole, ExprKind::NoArg));
                loose = true;
                continue;
            }
            expressions.push(self.parse_assignment()?);
        }
        Ok(self.expr(start, ExprKind::Sequence { expressions, loose }))
    }

    /// Parses an assignment-level expression: arrows, conditionals and
    /// assignments.
    pub(crate) fn parse_assignment(&mut self) -> PResult<Expr> {
        let start = self.start();
        let target = self.parse_conditional()?;

        let Some(op) = assignment_operator(self.peek_kind()) else {
            return Ok(target);
        };
        self.check_assignment_target(&target, op == AssignmentOp::Assign)?;
        self.advance();
        let value = self.parse_assignment()?;
        Ok(self.expr(start, ExprKind::Assignment { op, target, value }))
    }

    /// Parses an element of an argument, array or parameter list, where a
    /// leading `...` is allowed.
    pub(crate) fn parse_element(&mut self) -> PResult<Expr> {
        let start = self.start();
        if self.eat(TokenKind::Spread) {
            let operand = self.parse_assignment()?;
            return Ok(self.expr(start, ExprKind::Spread { operand }));
        }
        self.parse_assignment()
    }

    fn parse_conditional(&mut self) -> PResult<Expr> {
        let start = self.start();
        let condition = self.parse_binary(1)?;
        if !self.eat(TokenKind::Question) {
            return Ok(condition);
        }
        let consequent = self.parse_assignment()?;
        self.expect(TokenKind::Colon, ErrorCode::ColonExpected, "':' expected")?;
        let alternate = self.parse_assignment()?;
        Ok(self.expr(
            start,
            ExprKind::Conditional {
                condition,
                consequent,
                alternate,
            },
        ))
    }

    fn parse_binary(&mut self, min_power: u8) -> PResult<Expr> {
        let start = self.start();
        let mut left = self.parse_unary()?;

        while let Some((op, power)) = binary_operator(self.peek_kind()) {
            if power < min_power {
                break;
            }
            self.advance();
            let right = self.parse_binary(power + 1)?;
            left = self.expr(start, ExprKind::Binary { op, left, right });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let op = match self.peek_kind() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::LogicalNot => Some(UnaryOp::Not),
            TokenKind::BitwiseNot => Some(UnaryOp::BitwiseNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.expr(start, ExprKind::Unary { op, operand }));
        }

        let update = match self.peek_kind() {
            TokenKind::IncOp => Some(UpdateOp::Increment),
            TokenKind::DecOp => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let operand = self.parse_unary()?;
            self.check_assignment_target(&operand, false)?;
            return Ok(self.expr(start, ExprKind::Prefix { op, operand }));
        }

        if self.at_word("await") && starts_operand(self.ahead(1).kind) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.expr(start, ExprKind::Await { operand }));
        }

        self.parse_exponent()
    }

    fn parse_exponent(&mut self) -> PResult<Expr> {
        let start = self.start();
        let base = self.parse_postfix()?;
        if !self.eat(TokenKind::Exponent) {
            return Ok(base);
        }
        let exponent = self.parse_unary()?;
        Ok(self.expr(
            start,
            ExprKind::Binary {
                op: BinaryOp::Exponent,
                left: base,
                right: exponent,
            },
        ))
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut expr = if self.at(TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        if matches!(expr.kind, ExprKind::Arrow(_)) {
            return Ok(expr);
        }

        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let member = self.parse_member_name()?;
                    expr = self.expr(
                        start,
                        ExprKind::Member {
                            object: expr,
                            member,
                            optional: false,
                        },
                    );
                }
                TokenKind::OptionalChain => {
                    self.advance();
                    expr = match self.peek_kind() {
                        TokenKind::LParen => {
                            let arguments = self.parse_arguments()?;
                            self.expr(
                                start,
                                ExprKind::Call {
                                    callee: expr,
                                    arguments,
                                    optional: true,
                                },
                            )
                        }
                        TokenKind::LBracket => {
                            let member = self.parse_computed_member()?;
                            self.expr(
                                start,
                                ExprKind::ComputedMember {
                                    object: expr,
                                    member,
                                    optional: true,
                                },
                            )
                        }
                        _ => {
                            let member = self.parse_member_name()?;
                            self.expr(
                                start,
                                ExprKind::Member {
                                    object: expr,
                                    member,
                                    optional: true,
                                },
                            )
                        }
                    };
                }
                TokenKind::LBracket => {
                    let member = self.parse_computed_member()?;
                    expr = self.expr(
                        start,
                        ExprKind::ComputedMember {
                            object: expr,
                            member,
                            optional: false,
                        },
                    );
                }
                TokenKind::LParen => {
                    let arguments = self.parse_arguments()?;
                    if expr.as_identifier() == Some("async")
                        && self.at(TokenKind::Arrow)
                        && !self.newline_before_next()
                    {
                        return self.finish_arrow(start, arguments, true);
                    }
                    expr = self.expr(
                        start,
                        ExprKind::Call {
                            callee: expr,
                            arguments,
                            optional: false,
                        },
                    );
                }
                TokenKind::IncOp | TokenKind::DecOp if !self.newline_before_next() => {
                    let op = if self.at(TokenKind::IncOp) {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    };
                    self.check_assignment_target(&expr, false)?;
                    self.advance();
                    expr = self.expr(start, ExprKind::Postfix { op, operand: expr });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `new` takes a member chain as callee and an optional argument list.
    fn parse_new(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.advance();
        let callee_start = self.start();
        let mut callee = if self.at(TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let member = self.parse_member_name()?;
                    callee = self.expr(
                        callee_start,
                        ExprKind::Member {
                            object: callee,
                            member,
                            optional: false,
                        },
                    );
                }
                TokenKind::LBracket => {
                    let member = self.parse_computed_member()?;
                    callee = self.expr(
                        callee_start,
                        ExprKind::ComputedMember {
                            object: callee,
                            member,
                            optional: false,
                        },
                    );
                }
                _ => break,
            }
        }
        let arguments = if self.at(TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(self.expr(start, ExprKind::New { callee, arguments }))
    }

    fn parse_member_name(&mut self) -> PResult<SmolStr> {
        let token = self.peek();
        if token.kind == TokenKind::Identifier || token.kind.is_keyword() {
            Ok(self.advance().text)
        } else {
            Err(self.error_here(ErrorCode::IdentifierExpected, "identifier expected"))
        }
    }

    fn parse_computed_member(&mut self) -> PResult<Expr> {
        self.advance();
        let member = self.parse_expr()?;
        self.expect(TokenKind::RBracket, ErrorCode::RBracketExpected, "']' expected")?;
        Ok(member)
    }

    /// Parses `( args )`.
    pub(crate) fn parse_arguments(&mut self) -> PResult<Vec<Expr>> {
        self.expect(TokenKind::LParen, ErrorCode::LParenExpected, "'(' expected")?;
        let mut arguments = Vec::new();
        while !self.at(TokenKind::RParen) {
            arguments.push(self.parse_element()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(
            TokenKind::RParen,
            ErrorCode::RParenExpected,
            "')' expected (missing closing parenthesis)",
        )?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let kind = self.peek_kind();
        match kind {
            TokenKind::Number => {
                let token = self.advance();
                match parse_number(&token.text) {
                    Some(value) => Ok(self.expr(start, ExprKind::Literal(value.into()))),
                    None => Err(self.error_at(
                        ErrorCode::InvalidNumber,
                        format!("invalid number literal '{}'", token.text),
                        token.span,
                        token.start,
                    )),
                }
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                let value = unescape_quoted(&token.text);
                Ok(self.expr(start, ExprKind::Literal(LiteralValue::String(value))))
            }
            TokenKind::UnterminatedString => Err(self.error_here(
                ErrorCode::UnterminatedString,
                "string expected (unterminated string literal)",
            )),
            TokenKind::Backtick => self.parse_template(),
            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = LiteralValue::Boolean(kind == TokenKind::True);
                Ok(self.expr(start, ExprKind::Literal(value)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(self.expr(start, ExprKind::Literal(LiteralValue::Null)))
            }
            TokenKind::Undefined => {
                self.advance();
                Ok(self.expr(start, ExprKind::Literal(LiteralValue::Undefined)))
            }
            TokenKind::Identifier => self.parse_identifier_or_arrow(),
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Function => {
                let function = self.parse_function(false, false)?;
                Ok(self.expr(start, ExprKind::Arrow(function)))
            }
            TokenKind::Error => {
                let found = self.peek().text.clone();
                Err(self.error_here(ErrorCode::UnexpectedToken, format!("unexpected character '{found}'")))
            }
            _ => Err(self.error_here(ErrorCode::ExpressionExpected, "expression expected")),
        }
    }

    fn parse_identifier_or_arrow(&mut self) -> PResult<Expr> {
        let start = self.start();

        if self.at_async_function() {
            self.advance();
            let function = self.parse_function(true, false)?;
            return Ok(self.expr(start, ExprKind::Arrow(function)));
        }
        if self.at_word("async") {
            let line = self.peek().end.line;
            let next = self.ahead(1);
            let same_line = next.start.line == line;
            let next_is_name = next.kind == TokenKind::Identifier;
            if same_line && next_is_name && self.ahead(2).kind == TokenKind::Arrow {
                self.advance();
                let param = self.advance();
                let params = Params {
                    items: vec![Pattern::Identifier {
                        name: param.text,
                        span: param.span,
                    }],
                    rest: None,
                };
                return self.parse_arrow_body(start, params, true);
            }
        }

        let token = self.advance();
        if self.at(TokenKind::Arrow) {
            let params = Params {
                items: vec![Pattern::Identifier {
                    name: token.text,
                    span: token.span,
                }],
                rest: None,
            };
            return self.parse_arrow_body(start, params, false);
        }
        Ok(self.expr(start, ExprKind::Identifier { name: token.text }))
    }

    fn parse_parenthesized(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.advance();

        if self.eat(TokenKind::RParen) {
            if self.at(TokenKind::Arrow) {
                return self.parse_arrow_body(start, Params::default(), false);
            }
            return Err(self.error_here(ErrorCode::ExpressionExpected, "expression expected"));
        }

        let mut items = vec![self.parse_element()?];
        let mut loose = false;
        while self.eat(TokenKind::Comma) {
            if self.at(TokenKind::Comma) {
                let hole = self.start();
                items.push(self.expr(hole, ExprKind::NoArg));
                loose = true;
                continue;
            }
            items.push(self.parse_element()?);
        }
        self.expect(
            TokenKind::RParen,
            ErrorCode::RParenExpected,
            "')' expected (missing closing parenthesis)",
        )?;

        if self.at(TokenKind::Arrow) {
            return self.finish_arrow(start, items, false);
        }

        if let Some(spread) = items.iter().find(|e| matches!(e.kind, ExprKind::Spread { .. })) {
            let span = spread.span;
            return Err(self.error_on(ErrorCode::ExpressionExpected, "expression expected", span));
        }
        if items.len() == 1 {
            return Ok(items.remove(0));
        }
        Ok(self.expr(
            start,
            ExprKind::Sequence {
                expressions: items,
                loose,
            },
        ))
    }

    /// Converts an already-parsed item list into parameters and parses the
    /// arrow body that follows.
    fn finish_arrow(&mut self, start: usize, items: Vec<Expr>, is_async: bool) -> PResult<Expr> {
        let params = self.convert_params(items)?;
        self.parse_arrow_body(start, params, is_async)
    }

    fn parse_arrow_body(&mut self, start: usize, params: Params, is_async: bool) -> PResult<Expr> {
        self.expect(TokenKind::Arrow, ErrorCode::UnexpectedToken, "'=>' expected")?;
        let body = if self.at(TokenKind::LBrace) {
            ArrowBody::Block(self.parse_block_body()?)
        } else {
            ArrowBody::Expression(self.parse_assignment()?)
        };
        let function = ArrowFunction {
            name: None,
            params,
            body,
            is_async,
        };
        Ok(self.expr(start, ExprKind::Arrow(Arc::new(function))))
    }

    /// Parses the `[...]` or `{...}` literal of a destructuring declaration.
    pub(crate) fn parse_binding_literal(&mut self) -> PResult<Expr> {
        if self.at(TokenKind::LBracket) {
            self.parse_array_literal()
        } else {
            self.parse_object_literal()
        }
    }

    fn parse_array_literal(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.advance();
        let mut items = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RBracket => break,
                TokenKind::Comma => {
                    let hole = self.start();
                    self.advance();
                    items.push(self.expr(hole, ExprKind::NoArg));
                }
                _ => {
                    items.push(self.parse_element()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(TokenKind::RBracket, ErrorCode::RBracketExpected, "']' expected")?;
        Ok(self.expr(start, ExprKind::ArrayLiteral { items }))
    }

    fn parse_object_literal(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.advance();
        let mut properties = Vec::new();

        while !self.at(TokenKind::RBrace) {
            properties.push(self.parse_object_property()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, ErrorCode::RBraceExpected, "'}' expected")?;
        Ok(self.expr(start, ExprKind::ObjectLiteral { properties }))
    }

    fn parse_object_property(&mut self) -> PResult<ObjectProperty> {
        if self.eat(TokenKind::Spread) {
            return Ok(ObjectProperty::Spread(self.parse_assignment()?));
        }

        let key = match self.peek_kind() {
            TokenKind::LBracket => {
                self.advance();
                let key = self.parse_assignment()?;
                self.expect(TokenKind::RBracket, ErrorCode::RBracketExpected, "']' expected")?;
                PropertyKey::Computed(key)
            }
            TokenKind::Identifier => {
                let token = self.advance();
                if matches!(self.peek_kind(), TokenKind::Comma | TokenKind::RBrace) {
                    return Ok(ObjectProperty::Shorthand {
                        name: token.text,
                        span: token.span,
                    });
                }
                PropertyKey::Named(token.text)
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                PropertyKey::Named(unescape_quoted(&token.text).into())
            }
            TokenKind::Number => {
                let token = self.advance();
                let key = match parse_number(&token.text) {
                    Some(NumericValue::Number(n)) => number_to_string(n),
                    Some(NumericValue::BigInt(b)) => b.to_string(),
                    None => {
                        return Err(self.error_at(
                            ErrorCode::InvalidNumber,
                            format!("invalid number literal '{}'", token.text),
                            token.span,
                            token.start,
                        ))
                    }
                };
                PropertyKey::Named(key.into())
            }
            kind if kind.is_keyword() => PropertyKey::Named(self.advance().text),
            _ => return Err(self.error_here(ErrorCode::IdentifierExpected, "property name expected")),
        };

        self.expect(TokenKind::Colon, ErrorCode::ColonExpected, "':' expected")?;
        let value = self.parse_assignment()?;
        Ok(ObjectProperty::KeyValue { key, value })
    }

    fn parse_template(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.advance();
        let mut parts = Vec::new();

        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Backtick => {
                    self.advance();
                    break;
                }
                TokenKind::TemplateChunk => {
                    self.advance();
                    let value = LiteralValue::String(unescape(&token.text));
                    parts.push(self.expr(token.span.start_usize(), ExprKind::Literal(value)));
                }
                TokenKind::DollarLBrace => {
                    self.advance();
                    parts.push(self.parse_expr()?);
                    self.expect(TokenKind::RBrace, ErrorCode::RBraceExpected, "'}' expected")?;
                }
                _ => {
                    return Err(self.error_here(
                        ErrorCode::UnterminatedTemplate,
                        "unterminated template literal",
                    ))
                }
            }
        }
        Ok(self.expr(start, ExprKind::TemplateLiteral { parts }))
    }

    /// Parses `function name?(params) { body }`; `async` is already consumed.
    pub(crate) fn parse_function(&mut self, is_async: bool, name_required: bool) -> PResult<Arc<ArrowFunction>> {
        self.expect(TokenKind::Function, ErrorCode::UnexpectedToken, "'function' expected")?;
        let name = if self.at(TokenKind::Identifier) {
            Some(self.advance().text)
        } else if name_required {
            return Err(self.error_here(ErrorCode::FunctionNameExpected, "function name expected"));
        } else {
            None
        };

        let items = self.parse_arguments()?;
        let params = self.convert_params(items)?;
        if !self.at(TokenKind::LBrace) {
            return Err(self.error_here(ErrorCode::UnexpectedToken, "'{' expected"));
        }
        let body = self.parse_block_body()?;
        Ok(Arc::new(ArrowFunction {
            name,
            params,
            body: ArrowBody::Block(body),
            is_async,
        }))
    }

    /// Rejects targets that cannot be assigned to. Plain `=` also accepts
    /// array and object literals that form a valid destructuring pattern.
    pub(crate) fn check_assignment_target(&mut self, target: &Expr, allow_pattern: bool) -> PResult<()> {
        match &target.kind {
            ExprKind::Identifier { .. } => Ok(()),
            ExprKind::Member { optional: false, .. } | ExprKind::ComputedMember { optional: false, .. } => Ok(()),
            ExprKind::ArrayLiteral { .. } | ExprKind::ObjectLiteral { .. } if allow_pattern => {
                self.to_pattern(target).map(|_| ())
            }
            _ => Err(self.error_on(
                ErrorCode::InvalidAssignmentTarget,
                "invalid assignment target",
                target.span,
            )),
        }
    }
}
