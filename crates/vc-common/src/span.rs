use serde::Serialize;

/// Source position within a file (1-based line/column, 0-based byte offset).
///
/// Columns follow the VC convention: a tab advances to the next 8-column stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// 0-based byte offset from start of file.
    pub offset: u32,
}

/// A range in source code, from `start` to `end` in a given file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Source file path.
    #[serde(skip)]
    pub file: String,
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Span {
    pub fn new(file: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }

    /// Span for compiler-synthesized nodes with no source text.
    pub fn dummy() -> Self {
        Self {
            file: String::new(),
            start: Position::default(),
            end: Position::default(),
        }
    }

    /// Smallest span covering both `self` and `other` (same file assumed).
    pub fn merge(&self, other: &Span) -> Span {
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };
        Span {
            file: self.file.clone(),
            start,
            end,
        }
    }

    /// Byte range, for renderers that index into the source text.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start.offset as usize..self.end.offset as usize
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}({})..{}({})",
            self.file, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
