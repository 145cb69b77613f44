//! Diagnostics and error reporting.
//!
//! Producers push [`Diagnostic`]s into a [`DiagnosticBag`]; the driver renders
//! them with an [`Emitter`].

use crate::span::Span;
use std::fmt;
use std::fmt::Write as _;

/// Default error limit before a producer should stop.
pub const DEFAULT_MAX_ERRORS: usize = 64;

/// A diagnostic message (error, warning, note, or help).
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Diagnostic level
    pub level: DiagnosticLevel,
    /// Stable error code, e.g. "type mismatch"
    pub code: Option<String>,
    /// Primary message
    pub message: String,
    /// Source span
    pub span: Span,
    /// Suggested fixes
    pub suggestions: Vec<Suggestion>,
    /// Related notes
    pub notes: Vec<DiagnosticNote>,
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// Error: the program is rejected
    Error,
    /// Warning: suspicious code
    Warning,
    /// Note: additional information
    Note,
    /// Help: suggestion for fixing the issue
    Help,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Note => write!(f, "note"),
            Self::Help => write!(f, "help"),
        }
    }
}

impl DiagnosticLevel {
    /// Returns the ANSI color code for this level.
    #[must_use]
    pub const fn color_code(&self) -> &'static str {
        match self {
            Self::Error => "\x1b[31m",
            Self::Warning => "\x1b[33m",
            Self::Note => "\x1b[36m",
            Self::Help => "\x1b[32m",
        }
    }

    /// Returns the reset ANSI code.
    #[must_use]
    pub const fn reset_code() -> &'static str {
        "\x1b[0m"
    }

    /// Formats this level with colors if enabled.
    #[must_use]
    pub fn format_colored(&self, use_colors: bool) -> String {
        if use_colors {
            format!("{}{}{}", self.color_code(), self, Self::reset_code())
        } else {
            format!("{self}")
        }
    }
}

/// A note attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticNote {
    /// Note message
    pub message: String,
    /// Source span
    pub span: Span,
}

/// A proposed fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// What the fix does
    pub message: String,
    /// Replacement text, when the fix is mechanical
    pub replacement: Option<String>,
    /// Region the replacement applies to
    pub span: Span,
}

/// Builder for creating diagnostics.
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    /// Creates a new diagnostic builder.
    #[must_use]
    pub fn new(level: DiagnosticLevel, message: impl Into<String>, span: Span) -> Self {
        Self {
            diagnostic: Diagnostic {
                level,
                code: None,
                message: message.into(),
                span,
                suggestions: Vec::new(),
                notes: Vec::new(),
            },
        }
    }

    /// Shorthand for an error builder.
    #[must_use]
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticLevel::Error, message, span)
    }

    /// Adds an error code to the diagnostic.
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.diagnostic.code = Some(code.into());
        self
    }

    /// Adds a suggestion to the diagnostic.
    #[must_use]
    pub fn suggest(
        mut self,
        message: impl Into<String>,
        replacement: Option<String>,
        span: Span,
    ) -> Self {
        self.diagnostic.suggestions.push(Suggestion {
            message: message.into(),
            replacement,
            span,
        });
        self
    }

    /// Adds a note to the diagnostic.
    #[must_use]
    pub fn note(mut self, message: impl Into<String>, span: Span) -> Self {
        self.diagnostic.notes.push(DiagnosticNote {
            message: message.into(),
            span,
        });
        self
    }

    /// Builds the diagnostic.
    #[must_use]
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

/// Ordered collection of diagnostics with an error limit.
#[derive(Debug, Clone)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    max_errors: usize,
}

impl Default for DiagnosticBag {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticBag {
    /// Creates an empty bag with [`DEFAULT_MAX_ERRORS`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_errors(DEFAULT_MAX_ERRORS)
    }

    /// Creates an empty bag with a custom error limit.
    #[must_use]
    pub fn with_max_errors(max_errors: usize) -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            max_errors,
        }
    }

    /// Changes the error limit.
    pub fn set_max_errors(&mut self, max_errors: usize) {
        self.max_errors = max_errors;
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.level == DiagnosticLevel::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Appends an error with a code.
    pub fn error(&mut self, code: &str, message: impl Into<String>, span: Span) {
        self.push(DiagnosticBuilder::error(message, span).code(code).build());
    }

    /// Attaches a note to the most recent diagnostic. Ignored when empty.
    pub fn add_note(&mut self, message: impl Into<String>, span: Span) {
        if let Some(last) = self.diagnostics.last_mut() {
            last.notes.push(DiagnosticNote {
                message: message.into(),
                span,
            });
        }
    }

    /// Attaches a suggestion to the most recent diagnostic. Ignored when empty.
    pub fn add_suggestion(
        &mut self,
        message: impl Into<String>,
        replacement: Option<String>,
        span: Span,
    ) {
        if let Some(last) = self.diagnostics.last_mut() {
            last.suggestions.push(Suggestion {
                message: message.into(),
                replacement,
                span,
            });
        }
    }

    /// Number of error-level diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Whether any error was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// True once the error limit has been exceeded.
    #[must_use]
    pub fn should_abort(&self) -> bool {
        self.error_count > self.max_errors
    }

    /// All diagnostics in report order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of diagnostics of any level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterates over diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Removes and returns all diagnostics.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

/// Renders diagnostics as text, optionally with source highlighting.
pub struct Emitter {
    use_colors: bool,
}

impl Emitter {
    /// Creates a new diagnostic emitter.
    #[must_use]
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Renders one diagnostic. `source` is the text of the diagnostic's file,
    /// when the driver has it.
    #[must_use]
    pub fn render(&self, diagnostic: &Diagnostic, source: Option<&str>) -> String {
        let mut out = String::new();
        let span = diagnostic.span;
        let level_str = diagnostic.level.format_colored(self.use_colors);

        let _ = writeln!(
            out,
            "{}:{}: {}: {}",
            span.line, span.column, level_str, diagnostic.message
        );
        if let Some(code) = &diagnostic.code {
            let _ = writeln!(out, "   [{code}]");
        }
        if let Some(source) = source {
            self.render_highlight(&mut out, diagnostic.level, span, source);
        }
        for suggestion in &diagnostic.suggestions {
            let help_prefix = DiagnosticLevel::Help.format_colored(self.use_colors);
            match &suggestion.replacement {
                Some(replacement) => {
                    let _ = writeln!(
                        out,
                        "   {help_prefix}: {}: `{replacement}`",
                        suggestion.message
                    );
                }
                None => {
                    let _ = writeln!(out, "   {help_prefix}: {}", suggestion.message);
                }
            }
        }
        for note in &diagnostic.notes {
            let note_prefix = DiagnosticLevel::Note.format_colored(self.use_colors);
            let _ = writeln!(out, "   {note_prefix} at {}: {}", note.span, note.message);
        }
        out
    }

    /// Renders every diagnostic in a bag to stderr.
    pub fn emit_all(&self, bag: &DiagnosticBag, source: Option<&str>) {
        for diagnostic in bag.iter() {
            eprint!("{}", self.render(diagnostic, source));
        }
    }

    fn render_highlight(&self, out: &mut String, level: DiagnosticLevel, span: Span, source: &str) {
        if span.is_dummy() {
            return;
        }
        let Some(line) = source.lines().nth(span.line.saturating_sub(1) as usize) else {
            return;
        };
        let _ = writeln!(out, "{:4} | {line}", span.line);

        let indent = span.column.saturating_sub(1) as usize;
        let width = (span.len as usize).max(1);
        let marks = "^".repeat(width);
        if self.use_colors {
            let _ = writeln!(
                out,
                "     | {}{}{marks}{}",
                " ".repeat(indent),
                level.color_code(),
                DiagnosticLevel::reset_code()
            );
        } else {
            let _ = writeln!(out, "     | {}{marks}", " ".repeat(indent));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileId;

    fn span(line: u32, column: u32, len: u32) -> Span {
        Span::new(FileId(0), line, column, len)
    }

    #[test]
    fn test_diagnostic_level_display() {
        assert_eq!(format!("{}", DiagnosticLevel::Error), "error");
        assert_eq!(format!("{}", DiagnosticLevel::Warning), "warning");
        assert_eq!(format!("{}", DiagnosticLevel::Note), "note");
        assert_eq!(format!("{}", DiagnosticLevel::Help), "help");
    }

    #[test]
    fn test_diagnostic_level_colors() {
        assert_eq!(DiagnosticLevel::Error.format_colored(false), "error");
        let error_colored = DiagnosticLevel::Error.format_colored(true);
        assert!(error_colored.contains("\x1b[31m"));
        assert!(error_colored.contains("error"));
    }

    #[test]
    fn test_diagnostic_builder() {
        let diagnostic = DiagnosticBuilder::error("test error", span(1, 1, 4))
            .code("type mismatch")
            .suggest("try this instead", None, span(1, 1, 4))
            .build();

        assert_eq!(diagnostic.level, DiagnosticLevel::Error);
        assert_eq!(diagnostic.code.as_deref(), Some("type mismatch"));
        assert_eq!(diagnostic.suggestions.len(), 1);
    }

    #[test]
    fn test_bag_counts_only_errors() {
        let mut bag = DiagnosticBag::new();
        bag.push(DiagnosticBuilder::new(DiagnosticLevel::Warning, "w", span(1, 1, 1)).build());
        bag.error("undefined variable", "e", span(2, 1, 1));
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.error_count(), 1);
        assert!(bag.has_errors());
    }

    #[test]
    fn test_notes_attach_to_last() {
        let mut bag = DiagnosticBag::new();
        bag.add_note("dropped", span(1, 1, 1));
        assert!(bag.is_empty());

        bag.error("type mismatch", "first", span(1, 1, 1));
        bag.error("type mismatch", "second", span(2, 1, 1));
        bag.add_note("declared here", span(3, 1, 1));
        bag.add_suggestion("annotate", Some(": i32".to_string()), span(3, 2, 0));

        assert!(bag.diagnostics()[0].notes.is_empty());
        assert_eq!(bag.diagnostics()[1].notes.len(), 1);
        assert_eq!(bag.diagnostics()[1].suggestions.len(), 1);
    }

    #[test]
    fn test_should_abort_past_limit() {
        let mut bag = DiagnosticBag::with_max_errors(2);
        bag.error("e", "1", span(1, 1, 1));
        bag.error("e", "2", span(1, 1, 1));
        assert!(!bag.should_abort());
        bag.error("e", "3", span(1, 1, 1));
        assert!(bag.should_abort());
    }

    #[test]
    fn test_render_with_source() {
        let emitter = Emitter::new(false);
        let diagnostic = DiagnosticBuilder::error("unexpected identifier", span(1, 5, 1))
            .code("undefined variable")
            .note("declared here", span(1, 1, 3))
            .build();

        let text = emitter.render(&diagnostic, Some("let x = 42;"));
        assert!(text.starts_with("1:5: error: unexpected identifier"));
        assert!(text.contains("[undefined variable]"));
        assert!(text.contains("   1 | let x = 42;"));
        assert!(text.contains("    ^"));
        assert!(text.contains("note at 1:1: declared here"));
    }
}
