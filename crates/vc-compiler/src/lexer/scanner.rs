use tracing::debug;
use vc_common::{DiagnosticBag, Position};

use super::cursor::Cursor;
use super::token::{Token, TokenKind};

/// Hand-written lexer for VC.
///
/// Errors are reported into the bag and scanning continues, so one pass
/// surfaces every lexical problem in the file.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    diagnostics: DiagnosticBag,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, file: impl Into<String>) -> Self {
        Self {
            cursor: Cursor::new(source, file),
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Tokenize the entire source, returning all tokens and diagnostics.
    /// The last token is always `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token>, DiagnosticBag) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        debug!(tokens = tokens.len(), "lexing finished");
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.cursor.position();
        let ch = match self.cursor.advance() {
            Some(ch) => ch,
            None => return Token::eof(self.cursor.span_from(start)),
        };

        match ch {
            '(' => self.make_token(TokenKind::LeftParen, start),
            ')' => self.make_token(TokenKind::RightParen, start),
            '{' => self.make_token(TokenKind::LeftBrace, start),
            '}' => self.make_token(TokenKind::RightBrace, start),
            '[' => self.make_token(TokenKind::LeftBracket, start),
            ']' => self.make_token(TokenKind::RightBracket, start),
            ',' => self.make_token(TokenKind::Comma, start),
            ';' => self.make_token(TokenKind::Semicolon, start),

            '+' => self.make_token(TokenKind::Plus, start),
            '-' => self.make_token(TokenKind::Minus, start),
            '*' => self.make_token(TokenKind::Star, start),
            '/' => self.make_token(TokenKind::Slash, start),
            '=' => {
                if self.cursor.eat('=') {
                    self.make_token(TokenKind::EqualEqual, start)
                } else {
                    self.make_token(TokenKind::Equal, start)
                }
            }
            '!' => {
                if self.cursor.eat('=') {
                    self.make_token(TokenKind::BangEqual, start)
                } else {
                    self.make_token(TokenKind::Bang, start)
                }
            }
            '<' => {
                if self.cursor.eat('=') {
                    self.make_token(TokenKind::LessEqual, start)
                } else {
                    self.make_token(TokenKind::Less, start)
                }
            }
            '>' => {
                if self.cursor.eat('=') {
                    self.make_token(TokenKind::GreaterEqual, start)
                } else {
                    self.make_token(TokenKind::Greater, start)
                }
            }
            '&' => {
                if self.cursor.eat('&') {
                    self.make_token(TokenKind::AmpAmp, start)
                } else {
                    self.illegal_character(ch, start)
                }
            }
            '|' => {
                if self.cursor.eat('|') {
                    self.make_token(TokenKind::PipePipe, start)
                } else {
                    self.illegal_character(ch, start)
                }
            }

            '"' => self.scan_string(start),

            '.' if self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_fraction_and_exponent(start)
            }
            c if c.is_ascii_digit() => self.scan_number(start),

            c if is_ident_start(c) => self.scan_identifier(start),

            _ => self.illegal_character(ch, start),
        }
    }

    fn illegal_character(&mut self, ch: char, start: Position) -> Token {
        let span = self.cursor.span_from(start);
        self.diagnostics
            .error(format!("{}: illegal character", ch), span.clone());
        Token::new(TokenKind::Error, ch.to_string(), span)
    }

    // ---------------------------------------------------------------
    // Whitespace & comments
    // ---------------------------------------------------------------

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.cursor.eat_while(|c| c.is_ascii_whitespace());

            if self.cursor.peek() == Some('/') {
                match self.cursor.peek_second() {
                    Some('/') => {
                        self.cursor.eat_while(|c| c != '\n');
                        continue;
                    }
                    Some('*') => {
                        self.skip_block_comment();
                        continue;
                    }
                    _ => {}
                }
            }

            break;
        }
    }

    /// Skip a `/* ... */` comment. Comments do not nest.
    fn skip_block_comment(&mut self) {
        let start = self.cursor.position();
        self.cursor.advance();
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                Some('*') if self.cursor.peek() == Some('/') => {
                    self.cursor.advance();
                    return;
                }
                Some(_) => {}
                None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics.error("unterminated comment", span);
                    return;
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // String scanning
    // ---------------------------------------------------------------

    /// Scan a string literal after the opening `"`. A newline or end of
    /// file before the closing quote ends the literal with an error.
    fn scan_string(&mut self, start: Position) -> Token {
        let mut value = String::new();

        loop {
            match self.cursor.peek() {
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\n') | None => {
                    let span = self.cursor.span_from(start);
                    self.diagnostics
                        .error(format!("{}: unterminated string", value), span);
                    break;
                }
                Some('\\') => {
                    let escape_start = self.cursor.position();
                    self.cursor.advance();
                    match self.cursor.peek() {
                        Some(c) if c != '\n' => {
                            self.cursor.advance();
                            match unescape(c) {
                                Some(resolved) => value.push(resolved),
                                None => {
                                    let span = self.cursor.span_from(escape_start);
                                    self.diagnostics.error(
                                        format!("\\{}: illegal escape character", c),
                                        span,
                                    );
                                    value.push('\\');
                                    value.push(c);
                                }
                            }
                        }
                        _ => value.push('\\'),
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    value.push(c);
                }
            }
        }

        let span = self.cursor.span_from(start);
        Token::new(TokenKind::StringLiteral, value, span)
    }

    // ---------------------------------------------------------------
    // Number scanning
    // ---------------------------------------------------------------

    /// Scan an integer or a float that starts with a digit.
    fn scan_number(&mut self, start: Position) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.') {
            self.cursor.advance();
            return self.scan_fraction_and_exponent(start);
        }
        if self.eat_exponent() {
            return self.make_token(TokenKind::FloatLiteral, start);
        }
        self.make_token(TokenKind::IntLiteral, start)
    }

    /// Continue a float after its decimal point has been consumed.
    fn scan_fraction_and_exponent(&mut self, start: Position) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        self.eat_exponent();
        self.make_token(TokenKind::FloatLiteral, start)
    }

    /// Consume `[eE][+-]?digits` only when the digits are actually there.
    fn eat_exponent(&mut self) -> bool {
        if !matches!(self.cursor.peek(), Some('e' | 'E')) {
            return false;
        }
        let has_digits = match self.cursor.peek_second() {
            Some(c) if c.is_ascii_digit() => true,
            Some('+' | '-') => self.cursor.peek_third().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        if !has_digits {
            return false;
        }
        self.cursor.advance();
        if matches!(self.cursor.peek(), Some('+' | '-')) {
            self.cursor.advance();
        }
        self.cursor.eat_while(|c| c.is_ascii_digit());
        true
    }

    // ---------------------------------------------------------------
    // Identifier / keyword scanning
    // ---------------------------------------------------------------

    fn scan_identifier(&mut self, start: Position) -> Token {
        self.cursor.eat_while(is_ident_continue);
        let lexeme = self.cursor.slice_from(start.offset);
        let span = self.cursor.span_from(start);

        let kind = match lexeme {
            "true" | "false" => TokenKind::BoolLiteral,
            other => TokenKind::keyword_from_str(other).unwrap_or(TokenKind::Identifier),
        };

        Token::new(kind, lexeme, span)
    }

    fn make_token(&self, kind: TokenKind, start: Position) -> Token {
        let lexeme = self.cursor.slice_from(start.offset);
        let span = self.cursor.span_from(start);
        Token::new(kind, lexeme, span)
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '\'' => Some('\''),
        '"' => Some('"'),
        '\\' => Some('\\'),
        _ => None,
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
