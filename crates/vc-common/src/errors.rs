use crate::span::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A compiler diagnostic.
///
/// Semantic errors carry a numeric `code` (the `*N` in their message); lexical
/// and syntax errors leave it empty.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<u16>,
    pub message: String,
    pub span: Option<Span>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            span: None,
            suggestion: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: None,
            message: message.into(),
            span: None,
            suggestion: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        match self.span {
            Some(ref span) => write!(f, "{}: {}: {}", prefix, span, self.message),
            None => write!(f, "{}: {}", prefix, self.message),
        }
    }
}

/// Accumulates diagnostics across a compilation phase.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::error(message).with_span(span));
    }

    pub fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::warning(message).with_span(span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    fn span() -> Span {
        Span::new(
            "t.vc",
            Position {
                line: 1,
                column: 1,
                offset: 0,
            },
            Position {
                line: 1,
                column: 4,
                offset: 3,
            },
        )
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut bag = DiagnosticBag::new();
        bag.warning("unused", span());
        assert!(!bag.has_errors());
        bag.error("bad", span());
        assert!(bag.has_errors());
        assert_eq!(bag.error_count(), 1);
        assert_eq!(bag.diagnostics().len(), 2);
    }

    #[test]
    fn display_includes_position_and_message() {
        let d = Diagnostic::error("*5: identifier undeclared: x")
            .with_code(5)
            .with_span(span());
        assert_eq!(d.code, Some(5));
        assert_eq!(
            d.to_string(),
            "ERROR: t.vc:1(1)..1(4): *5: identifier undeclared: x"
        );
    }
}
