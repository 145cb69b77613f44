//! Memory primitives shared by the `tessera` crates.
//!
//! - **Symbols**: 32-bit ids for interned names ([`Symbol`], [`StringInterner`])
//! - **Typed arenas**: append-only, index-addressed storage ([`Arena`], [`Idx`])
//!
//! Everything a type-checking session allocates lives in arenas owned by that
//! session, so teardown is a plain drop of the owner.

pub mod arena;
pub mod interner;
pub mod symbol;

pub use arena::{Arena, ArenaAllocError, Idx};
pub use interner::{BUILTIN_NAMES, StringInterner, kw};
pub use symbol::Symbol;
