//! Interned name identifiers.
//!
//! ```
//! use tessera_mem::Symbol;
//!
//! let a = Symbol::new(7);
//! assert_eq!(a, Symbol::from(7));
//! assert_eq!(a.as_usize(), 7);
//! ```

use std::fmt;

/// A 32-bit handle to a string held by a [`StringInterner`](crate::StringInterner).
///
/// Equality is id equality, so comparing two names never touches string data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Raw id as an index.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Placeholder symbol (`u32::MAX`) for synthesized nodes without a name.
    #[must_use]
    pub const fn invalid() -> Self {
        Self(u32::MAX)
    }

    /// Whether this is the placeholder symbol.
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for Symbol {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
