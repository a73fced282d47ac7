use vc_common::{Position, Span};

/// Width of a tab stop when computing columns.
pub const TAB_WIDTH: u32 = 8;

/// Character stream over a VC source file that keeps line and column in
/// step, expanding tabs to the next stop.
pub struct Cursor<'src> {
    source: &'src str,
    file: String,
    chars: std::str::Chars<'src>,
    /// Byte offset of the unread remainder.
    offset: u32,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str, file: impl Into<String>) -> Self {
        Self {
            source,
            file: file.into(),
            chars: source.chars(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_second(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    pub fn peek_third(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next();
        iter.next()
    }

    /// Take one character, moving the line/column counters past it.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.offset += ch.len_utf8() as u32;
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => {
                self.column += TAB_WIDTH - (self.column - 1) % TAB_WIDTH;
            }
            _ => self.column += 1,
        }
        Some(ch)
    }

    /// Take `expected` if it is next; report whether it was.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Source text read since byte offset `start`.
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }

    /// Build a Span from `start` to the current position.
    pub fn span_from(&self, start: Position) -> Span {
        Span::new(self.file.clone(), start, self.position())
    }

    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if predicate(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_advance_to_next_stop() {
        let mut cursor = Cursor::new("\tab\tc", "t.vc");
        cursor.advance();
        assert_eq!(cursor.position().column, 9);
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.position().column, 11);
        cursor.advance();
        assert_eq!(cursor.position().column, 17);
    }

    #[test]
    fn newline_resets_column() {
        let mut cursor = Cursor::new("ab\ncd", "t.vc");
        cursor.eat_while(|c| c != '\n');
        assert_eq!(cursor.position().column, 3);
        assert!(cursor.eat('\n'));
        let pos = cursor.position();
        assert_eq!((pos.line, pos.column, pos.offset), (2, 1, 3));
        assert_eq!(cursor.slice_from(0), "ab\n");
    }
}
