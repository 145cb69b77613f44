//! `tessera` syntax surface: the inputs and outputs the type checker shares
//! with the rest of the compiler.
//!
//! The parser that produces these trees lives elsewhere; this crate only
//! defines what it hands over.
//!
//! # Modules
//!
//! - [`span`] - Source locations (file, line, column, length)
//! - [`ast`] - Declarations, statements, expressions and type annotations
//! - [`diagnostic`] - Diagnostics, the collecting bag and the text emitter
//!
//! # Example
//!
//! ```
//! use tessera_syntax::ast::{AstBuilder, BinaryOp};
//!
//! let mut b = AstBuilder::new();
//! let one = b.int(1);
//! let two = b.int(2);
//! let sum = b.binary(BinaryOp::Add, one, two);
//! assert_eq!(sum.span.line, 3);
//! ```

#![warn(missing_docs)]

pub mod ast;
pub mod diagnostic;
pub mod span;

pub use diagnostic::{
    Diagnostic, DiagnosticBag, DiagnosticBuilder, DiagnosticLevel, DiagnosticNote, Emitter,
    Suggestion,
};
pub use span::{FileId, Span, Spanned};
