//! The narrow interface the checker reports through.
//!
//! The checker never builds [`Diagnostic`](tessera_syntax::Diagnostic)s
//! itself; it talks to a [`DiagnosticSink`], which [`DiagnosticBag`]
//! implements. Drivers with their own reporting can implement the trait
//! directly.

use crate::error::{ErrorCode, TypeError};
use tessera_syntax::{DiagnosticBag, Span};

/// Receiver of type errors.
pub trait DiagnosticSink {
    /// Reports an error with a stable code.
    fn report_error(&mut self, span: Span, code: ErrorCode, message: String);

    /// Reports a type mismatch between two rendered types.
    fn report_type_mismatch(&mut self, span: Span, expected: &str, found: &str) {
        self.report_error(
            span,
            ErrorCode::TypeMismatch,
            format!("type mismatch: expected {expected}, found {found}"),
        );
    }

    /// Attaches a note to the last reported error.
    fn add_note(&mut self, span: Span, message: String);

    /// Attaches a suggestion to the last reported error.
    fn add_suggestion(&mut self, span: Span, message: String, replacement: Option<&str>);

    /// Number of errors reported so far.
    fn error_count(&self) -> usize;

    /// True once the error limit has been exceeded.
    fn should_abort(&self) -> bool;

    /// Sets the error limit used by [`DiagnosticSink::should_abort`].
    fn set_error_limit(&mut self, _limit: usize) {}

    /// Reports a [`TypeError`]; [`TypeError::Reported`] is dropped.
    fn report(&mut self, error: &TypeError) {
        if let TypeError::Mismatch {
            expected,
            found,
            span,
        } = error
        {
            self.report_type_mismatch(*span, expected, found);
        } else if let Some(code) = error.code() {
            self.report_error(error.span(), code, error.to_string());
        }
    }
}

impl DiagnosticSink for DiagnosticBag {
    fn report_error(&mut self, span: Span, code: ErrorCode, message: String) {
        self.error(code.as_str(), message, span);
    }

    fn add_note(&mut self, span: Span, message: String) {
        DiagnosticBag::add_note(self, message, span);
    }

    fn add_suggestion(&mut self, span: Span, message: String, replacement: Option<&str>) {
        DiagnosticBag::add_suggestion(self, message, replacement.map(str::to_owned), span);
    }

    fn error_count(&self) -> usize {
        DiagnosticBag::error_count(self)
    }

    fn should_abort(&self) -> bool {
        DiagnosticBag::should_abort(self)
    }

    fn set_error_limit(&mut self, limit: usize) {
        self.set_max_errors(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_receives_codes() {
        let mut bag = DiagnosticBag::new();
        let sink: &mut dyn DiagnosticSink = &mut bag;
        sink.report_type_mismatch(Span::dummy(), "i32", "bool");
        sink.add_note(Span::dummy(), "declared here".to_string());
        sink.add_suggestion(Span::dummy(), "convert it".to_string(), Some("x as i32"));
        assert_eq!(sink.error_count(), 1);

        let diag = &bag.diagnostics()[0];
        assert_eq!(diag.code.as_deref(), Some("type mismatch"));
        assert_eq!(diag.message, "type mismatch: expected i32, found bool");
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.suggestions[0].replacement.as_deref(), Some("x as i32"));
    }

    #[test]
    fn test_reported_is_silent() {
        let mut bag = DiagnosticBag::new();
        bag.report(&TypeError::Reported { span: Span::dummy() });
        bag.report(&TypeError::ReturnOutsideFunction { span: Span::dummy() });
        assert_eq!(bag.error_count(), 1);
        assert_eq!(bag.diagnostics()[0].code.as_deref(), Some("return outside function"));
    }

    #[test]
    fn test_mismatch_goes_through_mismatch_hook() {
        struct Counting {
            mismatches: usize,
            errors: usize,
        }
        impl DiagnosticSink for Counting {
            fn report_error(&mut self, _: Span, _: ErrorCode, _: String) {
                self.errors += 1;
            }
            fn report_type_mismatch(&mut self, _: Span, expected: &str, found: &str) {
                assert_eq!((expected, found), ("i32", "bool"));
                self.mismatches += 1;
            }
            fn add_note(&mut self, _: Span, _: String) {}
            fn add_suggestion(&mut self, _: Span, _: String, _: Option<&str>) {}
            fn error_count(&self) -> usize {
                self.errors + self.mismatches
            }
            fn should_abort(&self) -> bool {
                false
            }
        }

        let mut sink = Counting {
            mismatches: 0,
            errors: 0,
        };
        sink.report(&TypeError::Mismatch {
            expected: "i32".into(),
            found: "bool".into(),
            span: Span::dummy(),
        });
        sink.report(&TypeError::ReturnOutsideFunction { span: Span::dummy() });
        assert_eq!((sink.mismatches, sink.errors), (1, 1));
    }

    #[test]
    fn test_error_limit() {
        let mut bag = DiagnosticBag::new();
        bag.set_error_limit(1);
        bag.report_error(Span::dummy(), ErrorCode::UndefinedVariable, "a".into());
        assert!(!DiagnosticSink::should_abort(&bag));
        bag.report_error(Span::dummy(), ErrorCode::UndefinedVariable, "b".into());
        assert!(DiagnosticSink::should_abort(&bag));
    }
}
