//! Inference engines over a [`TypeContext`](crate::context::TypeContext).
//!
//! - [`unify`]: transactional unification with occurs check and constraint checks
//! - [`subtype`]: variance-aware subtyping
//! - [`traits`]: trait implementation queries
//!
//! All three are `impl TypeContext` blocks; the types they share live in the
//! context.

pub mod subtype;
pub mod traits;
pub mod unify;

pub use subtype::Variance;
pub use unify::UnifyError;
