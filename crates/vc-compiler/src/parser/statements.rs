use crate::ast::*;
use crate::lexer::token::TokenKind;

use super::Parser;

impl Parser {
    /// `{ var-decl* stmt* }`
    pub(super) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(TokenKind::LeftBrace)?;

        let mut decls = Vec::new();
        while self.peek().is_type() {
            match self.parse_local_var_decl() {
                Some(list) => decls.extend(list),
                None => self.synchronize(),
            }
        }

        let mut stmts = Vec::new();
        while self.peek() != TokenKind::RightBrace && !self.is_at_end() {
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }

        self.expect(TokenKind::RightBrace)?;
        let span = start.merge(&self.previous_span());
        Some(Block { decls, stmts, span })
    }

    pub(super) fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek() {
            TokenKind::LeftBrace => self.parse_block().map(Stmt::Block),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Break => {
                let span = self.parse_keyword_stmt()?;
                Some(Stmt::Break(span))
            }
            TokenKind::Continue => {
                let span = self.parse_keyword_stmt()?;
                Some(Stmt::Continue(span))
            }
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Semicolon => {
                self.advance();
                Some(Stmt::Empty(self.previous_span()))
            }
            kind if kind.is_type() => {
                let span = self.current_span();
                self.diagnostics.error(
                    "declarations must precede statements in a block",
                    span,
                );
                None
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Some(Stmt::Expr(expr))
            }
        }
    }

    /// `if ( expr ) stmt (else stmt)?`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'if'

        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        let span = start.merge(&self.previous_span());
        Some(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    /// `for ( expr? ; expr? ; expr? ) stmt`
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'for'

        self.expect(TokenKind::LeftParen)?;
        let init = self.parse_optional_expression(TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon)?;
        let condition = self.parse_optional_expression(TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon)?;
        let update = self.parse_optional_expression(TokenKind::RightParen)?;
        self.expect(TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);

        let span = start.merge(&self.previous_span());
        Some(Stmt::For(ForStmt {
            init,
            condition,
            update,
            body,
            span,
        }))
    }

    /// `while ( expr ) stmt`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'while'

        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);

        let span = start.merge(&self.previous_span());
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    /// `return expr? ;`
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.current_span();
        self.advance(); // consume 'return'

        let value = self.parse_optional_expression(TokenKind::Semicolon)?;
        self.expect(TokenKind::Semicolon)?;

        let span = start.merge(&self.previous_span());
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `break ;` or `continue ;`
    fn parse_keyword_stmt(&mut self) -> Option<vc_common::Span> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::Semicolon)?;
        Some(start.merge(&self.previous_span()))
    }

    /// An expression, or nothing when the next token is `terminator`.
    /// The outer `None` signals a parse error.
    fn parse_optional_expression(&mut self, terminator: TokenKind) -> Option<Option<Expr>> {
        if self.peek() == terminator {
            Some(None)
        } else {
            self.parse_expression().map(Some)
        }
    }
}
