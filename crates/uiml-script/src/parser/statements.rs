//! Statement parsing.

use super::{PResult, Parser};
use crate::ast::*;
use crate::error::ErrorCode;
use crate::lexer::TokenKind;
use crate::literal::unescape_quoted;
use smol_str::SmolStr;
use std::sync::Arc;

impl<'src> Parser<'src> {
    /// Parses a single statement.
    pub(crate) fn parse_statement(&mut self) -> PResult<Stmt> {
        let start = self.start();
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.stmt(start, StmtKind::Empty))
            }
            TokenKind::LBrace => {
                let body = self.parse_block_body()?;
                Ok(self.stmt(start, StmtKind::Block(body)))
            }
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                let kind = self.parse_declaration()?;
                self.end_statement()?;
                Ok(self.stmt(start, kind))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.end_statement()?;
                Ok(self.stmt(start, StmtKind::Return(value)))
            }
            TokenKind::Break => {
                self.advance();
                self.end_statement()?;
                Ok(self.stmt(start, StmtKind::Break))
            }
            TokenKind::Continue => {
                self.advance();
                self.end_statement()?;
                Ok(self.stmt(start, StmtKind::Continue))
            }
            TokenKind::While => {
                self.advance();
                let condition = self.parse_condition()?;
                let body = self.parse_statement()?;
                Ok(self.stmt(start, StmtKind::While { condition, body }))
            }
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Throw => {
                self.advance();
                let value = self.parse_expr()?;
                self.end_statement()?;
                Ok(self.stmt(start, StmtKind::Throw(value)))
            }
            TokenKind::Try => self.parse_try(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Function => {
                let function = self.parse_function(false, true)?;
                Ok(self.stmt(start, StmtKind::Function(function)))
            }
            TokenKind::Identifier if self.at_async_function() => {
                self.advance();
                let function = self.parse_function(true, true)?;
                Ok(self.stmt(start, StmtKind::Function(function)))
            }
            TokenKind::Import => Err(self.error_here(
                ErrorCode::ImportNotAtStart,
                "import declarations are only allowed at the start of a module",
            )),
            _ => {
                let expr = self.parse_expr()?;
                self.end_statement()?;
                Ok(self.stmt(start, StmtKind::Expression(expr)))
            }
        }
    }

    /// True at `async function` with no line break in between.
    pub(crate) fn at_async_function(&mut self) -> bool {
        if !self.at_word("async") {
            return false;
        }
        let line = self.peek().end.line;
        let next = self.ahead(1);
        next.kind == TokenKind::Function && next.start.line == line
    }

    /// Parses `{ statements }` and returns the statements.
    pub(crate) fn parse_block_body(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace, ErrorCode::UnexpectedToken, "'{' expected")?;
        let mut body = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.at(TokenKind::Eof) {
                return Err(self.error_here(ErrorCode::RBraceExpected, "'}' expected"));
            }
            body.push(self.parse_statement()?);
        }
        self.advance();
        Ok(body)
    }

    /// True where automatic semicolon insertion may end a statement.
    fn at_statement_end(&mut self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) || self.newline_before_next()
    }

    fn end_statement(&mut self) -> PResult<()> {
        if self.eat(TokenKind::Semicolon) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.error_here(ErrorCode::SemicolonExpected, "';' expected"))
        }
    }

    /// Parses `( expr )`.
    fn parse_condition(&mut self) -> PResult<Expr> {
        self.expect(TokenKind::LParen, ErrorCode::LParenExpected, "'(' expected")?;
        let condition = self.parse_expr()?;
        self.expect(
            TokenKind::RParen,
            ErrorCode::RParenExpected,
            "')' expected (missing closing parenthesis)",
        )?;
        Ok(condition)
    }

    /// Parses `let|const|var` declarators, without the terminator.
    fn parse_declaration(&mut self) -> PResult<StmtKind> {
        let keyword = self.advance().kind;
        let mut declarators = Vec::new();
        loop {
            let target = self.parse_binding_target()?;
            declarators.push(self.parse_declarator_init(keyword, target)?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        Ok(declaration_kind(keyword, declarators))
    }

    fn parse_declarator_init(&mut self, keyword: TokenKind, target: Pattern) -> PResult<Declarator> {
        let init = if self.eat(TokenKind::Assign) {
            Some(self.parse_assignment()?)
        } else {
            None
        };
        if init.is_none() {
            if keyword == TokenKind::Const {
                return Err(self.error_here(ErrorCode::ConstWithoutInit, "const declaration requires an initializer"));
            }
            if !matches!(target, Pattern::Identifier { .. }) {
                return Err(self.error_here(ErrorCode::EqualExpected, "'=' expected"));
            }
        }
        Ok(Declarator { target, init })
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.advance();
        let condition = self.parse_condition()?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.eat(TokenKind::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(self.stmt(
            start,
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
        ))
    }

    fn parse_do_while(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.advance();
        let body = self.parse_statement()?;
        self.expect(TokenKind::While, ErrorCode::WhileExpected, "'while' expected")?;
        let condition = self.parse_condition()?;
        self.eat(TokenKind::Semicolon);
        Ok(self.stmt(start, StmtKind::DoWhile { body, condition }))
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.advance();
        self.expect(TokenKind::LParen, ErrorCode::LParenExpected, "'(' expected")?;

        let init = match self.peek_kind() {
            TokenKind::Semicolon => None,
            TokenKind::Let | TokenKind::Const => {
                let init_start = self.start();
                let keyword = self.advance().kind;
                let target = self.parse_binding_target()?;
                if self.at(TokenKind::In) || self.at_word("of") {
                    let binding = if keyword == TokenKind::Let {
                        LoopBinding::Let
                    } else {
                        LoopBinding::Const
                    };
                    return self.parse_for_each(start, binding, target);
                }
                let mut declarators = vec![self.parse_declarator_init(keyword, target)?];
                while self.eat(TokenKind::Comma) {
                    let target = self.parse_binding_target()?;
                    declarators.push(self.parse_declarator_init(keyword, target)?);
                }
                Some(self.stmt(init_start, declaration_kind(keyword, declarators)))
            }
            TokenKind::Var => {
                return Err(self.error_here(ErrorCode::InvalidLoopVariable, "invalid 'for' loop variable"));
            }
            TokenKind::Identifier
                if self.ahead(1).kind == TokenKind::In || self.ahead(1).is_word("of") =>
            {
                let token = self.advance();
                let target = Pattern::Identifier {
                    name: token.text,
                    span: token.span,
                };
                return self.parse_for_each(start, LoopBinding::None, target);
            }
            _ => {
                let init_start = self.start();
                let expr = self.parse_expr()?;
                Some(self.stmt(init_start, StmtKind::Expression(expr)))
            }
        };

        self.expect(TokenKind::Semicolon, ErrorCode::SemicolonExpected, "';' expected")?;
        let condition = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon, ErrorCode::SemicolonExpected, "';' expected")?;
        let update = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(
            TokenKind::RParen,
            ErrorCode::RParenExpected,
            "')' expected (missing closing parenthesis)",
        )?;
        let body = self.parse_statement()?;
        Ok(self.stmt(
            start,
            StmtKind::For {
                init,
                condition,
                update,
                body,
            },
        ))
    }

    fn parse_for_each(&mut self, start: usize, binding: LoopBinding, target: Pattern) -> PResult<Stmt> {
        let is_of = if self.eat(TokenKind::In) {
            false
        } else if self.at_word("of") {
            self.advance();
            true
        } else {
            return Err(self.error_here(ErrorCode::InOrOfExpected, "'in' or 'of' expected"));
        };
        // `for..in` yields keys, so only a plain name makes sense there.
        if !is_of && !matches!(target, Pattern::Identifier { .. }) {
            let span = match &target {
                Pattern::Array(array) => array.span,
                Pattern::Object(object) => object.span,
                Pattern::Identifier { span, .. } => *span,
            };
            return Err(self.error_on(ErrorCode::InvalidLoopVariable, "invalid 'for' loop variable", span));
        }

        let source = self.parse_expr()?;
        self.expect(
            TokenKind::RParen,
            ErrorCode::RParenExpected,
            "')' expected (missing closing parenthesis)",
        )?;
        let body = self.parse_statement()?;
        let each = Arc::new(ForEachLoop {
            binding,
            target,
            source,
            body,
        });
        let kind = if is_of { StmtKind::ForOf(each) } else { StmtKind::ForIn(each) };
        Ok(self.stmt(start, kind))
    }

    fn parse_try(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.advance();
        let block = self.parse_block_body()?;

        let mut catch_param = None;
        let mut catch_block = None;
        if self.eat(TokenKind::Catch) {
            if self.eat(TokenKind::LParen) {
                catch_param = Some(self.parse_binding_target()?);
                self.expect(
                    TokenKind::RParen,
                    ErrorCode::RParenExpected,
                    "')' expected (missing closing parenthesis)",
                )?;
            }
            catch_block = Some(self.parse_block_body()?);
        }
        let finally_block = if self.eat(TokenKind::Finally) {
            Some(self.parse_block_body()?)
        } else {
            None
        };

        if catch_block.is_none() && finally_block.is_none() {
            return Err(self.error_here(ErrorCode::CatchOrFinallyExpected, "'catch' or 'finally' expected"));
        }
        Ok(self.stmt(
            start,
            StmtKind::Try {
                block,
                catch_param,
                catch_block,
                finally_block,
            },
        ))
    }

    fn parse_switch(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.advance();
        let discriminant = self.parse_condition()?;
        self.expect(TokenKind::LBrace, ErrorCode::UnexpectedToken, "'{' expected")?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.eat(TokenKind::RBrace) {
            let test = match self.peek_kind() {
                TokenKind::Case => {
                    self.advance();
                    Some(self.parse_expr()?)
                }
                TokenKind::Default => {
                    if seen_default {
                        return Err(self.error_here(ErrorCode::DuplicateDefault, "duplicate 'default' clause"));
                    }
                    seen_default = true;
                    self.advance();
                    None
                }
                _ => return Err(self.error_here(ErrorCode::CaseOrDefaultExpected, "'case' or 'default' expected")),
            };
            self.expect(TokenKind::Colon, ErrorCode::ColonExpected, "':' expected")?;

            let mut body = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, body });
        }
        Ok(self.stmt(start, StmtKind::Switch { discriminant, cases }))
    }

    /// Parses `import { a, b as c } from "m"` or `import d from "m"`.
    pub(crate) fn parse_import(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.advance();

        let mut specifiers = Vec::new();
        if self.eat(TokenKind::LBrace) {
            while !self.at(TokenKind::RBrace) {
                let imported = self.parse_import_name()?;
                let local = if self.at_word("as") {
                    self.advance();
                    self.parse_import_name()?
                } else {
                    imported.clone()
                };
                specifiers.push(ImportSpecifier { imported, local });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace, ErrorCode::RBraceExpected, "'}' expected")?;
        } else {
            let local = self.parse_import_name()?;
            specifiers.push(ImportSpecifier {
                imported: SmolStr::new_static("default"),
                local,
            });
        }

        if !self.at_word("from") {
            return Err(self.error_here(ErrorCode::FromExpected, "'from' expected"));
        }
        self.advance();
        let module = self.expect(
            TokenKind::StringLiteral,
            ErrorCode::StringLiteralExpected,
            "string literal expected",
        )?;
        self.end_statement()?;
        Ok(self.stmt(
            start,
            StmtKind::Import(ImportDeclaration {
                specifiers,
                module: unescape_quoted(&module.text),
            }),
        ))
    }

    fn parse_import_name(&mut self) -> PResult<SmolStr> {
        if self.at(TokenKind::Identifier) || self.at(TokenKind::Default) {
            Ok(self.advance().text)
        } else {
            Err(self.error_here(ErrorCode::IdentifierExpected, "identifier expected"))
        }
    }
}

fn declaration_kind(keyword: TokenKind, declarators: Vec<Declarator>) -> StmtKind {
    match keyword {
        TokenKind::Const => StmtKind::Const(declarators),
        TokenKind::Var => StmtKind::Var(declarators),
        _ => StmtKind::Let(declarators),
    }
}
