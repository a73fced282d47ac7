use serde::Serialize;
use std::fmt;
use vc_common::Span;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source spelling; for string literals, the unescaped value.
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self {
            kind: TokenKind::Eof,
            lexeme: "$".to_string(),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}({}) at {}",
            self.kind, self.lexeme, self.span.start
        )
    }
}

/// All token kinds in the VC language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // === Literals ===
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    BoolLiteral,

    Identifier,

    // === Keywords ===
    Boolean,
    Break,
    Continue,
    Else,
    Float,
    For,
    If,
    Int,
    Return,
    Void,
    While,

    // === Operators ===
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,

    // === Separators ===
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,

    /// An illegal character; the lexer has already reported it.
    Error,
    Eof,
}

impl TokenKind {
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "boolean" => Some(TokenKind::Boolean),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "else" => Some(TokenKind::Else),
            "float" => Some(TokenKind::Float),
            "for" => Some(TokenKind::For),
            "if" => Some(TokenKind::If),
            "int" => Some(TokenKind::Int),
            "return" => Some(TokenKind::Return),
            "void" => Some(TokenKind::Void),
            "while" => Some(TokenKind::While),
            _ => None,
        }
    }

    /// True for the keywords that start a type (and so a declaration).
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Void | TokenKind::Boolean | TokenKind::Int | TokenKind::Float
        )
    }

    /// Human-readable name used in "expected X" messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::BoolLiteral => "boolean literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Boolean => "'boolean'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Else => "'else'",
            TokenKind::Float => "'float'",
            TokenKind::For => "'for'",
            TokenKind::If => "'if'",
            TokenKind::Int => "'int'",
            TokenKind::Return => "'return'",
            TokenKind::Void => "'void'",
            TokenKind::While => "'while'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Bang => "'!'",
            TokenKind::BangEqual => "'!='",
            TokenKind::Equal => "'='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Error => "illegal character",
            TokenKind::Eof => "end of file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognised() {
        assert_eq!(TokenKind::keyword_from_str("while"), Some(TokenKind::While));
        assert_eq!(TokenKind::keyword_from_str("boolean"), Some(TokenKind::Boolean));
        assert_eq!(TokenKind::keyword_from_str("string"), None);
        assert_eq!(TokenKind::keyword_from_str("true"), None);
    }

    #[test]
    fn type_keywords() {
        assert!(TokenKind::Void.is_type());
        assert!(TokenKind::Float.is_type());
        assert!(!TokenKind::Return.is_type());
    }
}
