//! `tessera` Type System: Representation, Inference and Checking
//!
//! This crate provides the static type system of `tessera`, including:
//! - Interned type representation with per-type safety properties
//! - Transactional unification with occurs and constraint checks
//! - Variance-aware subtyping
//! - Traits, super-traits and implementation queries
//! - A multi-pass type checker over the syntax tree
//! - Lifetime and region tracking for borrows
//!
//! # Modules
//!
//! - [`types`] - `TyKind`, `TypeId` and display
//! - [`context`] - [`TypeContext`], type variables, traits and the symbol table
//! - [`infer`] - Unification, subtyping and trait queries
//! - [`region`] - Lifetimes, regions and borrow bookkeeping
//! - [`check`] - The [`Checker`]
//! - [`error`] - [`TypeError`] and stable [`ErrorCode`]s
//! - [`diagnostics`] - The [`DiagnosticSink`] the checker reports through
//! - [`config`] - [`CheckerConfig`]
//!
//! # Example
//!
//! ```
//! use tessera_syntax::ast::{AstBuilder, BinaryOp};
//! use tessera_syntax::DiagnosticBag;
//! use tessera_typeck::{Checker, CheckerConfig};
//!
//! let mut b = AstBuilder::new();
//! let one = b.int(1);
//! let half = b.float(0.5);
//! let sum = b.binary(BinaryOp::Add, one, half);
//! let interner = b.finish();
//!
//! let mut bag = DiagnosticBag::new();
//! let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
//! let ty = checker.check_expr(&sum).unwrap();
//! assert_eq!(checker.ctx().display(ty, &interner).to_string(), "f64");
//! ```

#![warn(missing_docs)]

pub mod check;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod infer;
pub mod region;
pub mod types;

pub use check::{Checker, TypedModule};
pub use config::CheckerConfig;
pub use context::{TraitId, TypeContext, VarId};
pub use diagnostics::DiagnosticSink;
pub use error::{ErrorCode, Result, TypeError};
pub use infer::{UnifyError, Variance};
pub use region::{BorrowError, LifetimeId, RegionId};
pub use types::{Mutability, TyKind, TypeId};
