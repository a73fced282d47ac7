mod declarations;
mod expressions;
mod statements;

use tracing::debug;
use vc_common::{DiagnosticBag, Span};

use crate::ast::*;
use crate::lexer::token::{Token, TokenKind};

/// Recursive descent parser for VC.
///
/// Uses Pratt parsing for binary operator precedence. The parser builds the
/// undecorated tree only; every semantic rule is left to the checker.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: DiagnosticBag,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by the lexer.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens
                .last()
                .map(|t| t.span.clone())
                .unwrap_or_else(Span::dummy);
            tokens.push(Token::eof(span));
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Parse the entire token stream into a Program.
    pub fn parse(mut self) -> (Program, DiagnosticBag) {
        let mut declarations = Vec::new();
        let start = self.current_span();

        while !self.is_at_end() {
            if self.parse_declaration(&mut declarations).is_none() {
                self.synchronize();
            }
        }

        let end = self.current_span();
        let program = Program {
            declarations,
            span: start.merge(&end),
        };
        debug!(
            declarations = program.declarations.len(),
            errors = self.diagnostics.error_count(),
            "parsing finished"
        );
        (program, self.diagnostics)
    }

    // ========================================================================
    // Token manipulation helpers
    // ========================================================================

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// The token just consumed.
    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    /// Consume a token of the expected kind, or report an error.
    fn expect(&mut self, kind: TokenKind) -> Option<&Token> {
        if self.peek() == kind {
            self.advance();
            Some(self.previous())
        } else {
            self.error_expected(kind.describe());
            None
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek() == TokenKind::Eof
    }

    fn current_span(&self) -> Span {
        self.current().span.clone()
    }

    fn previous_span(&self) -> Span {
        self.previous().span.clone()
    }

    fn error_expected(&mut self, what: &str) {
        let token = self.current();
        let message = format!("expected {}, found {}", what, found(token));
        let span = token.span.clone();
        self.diagnostics.error(message, span);
    }

    /// Error recovery: skip tokens until a statement or declaration boundary.
    /// Always consumes at least one token.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if matches!(
                self.previous().kind,
                TokenKind::Semicolon | TokenKind::RightBrace
            ) {
                return;
            }
            match self.peek() {
                TokenKind::Void
                | TokenKind::Boolean
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::RightBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn found(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of file".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}
