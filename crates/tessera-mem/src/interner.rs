//! String interning with id-based references.
//!
//! The interner keeps two structures:
//! - `strings`: `Symbol` id -> owned string (resolution)
//! - `symbols`: string -> `Symbol` (interning)
//!
//! Builtin type names are interned first, in a fixed order, so their ids are
//! stable across interners and the checker can recognise `i32` or `bool`
//! without a string comparison.
//!
//! ```
//! use tessera_mem::StringInterner;
//!
//! let mut interner = StringInterner::new();
//! let point = interner.intern("Point");
//! assert_eq!(interner.intern("Point"), point);
//! assert_eq!(interner.resolve(point), Some("Point"));
//!
//! let i32_sym = interner.intern("i32");
//! assert!(interner.is_builtin(i32_sym));
//! ```

use crate::symbol::Symbol;

#[cfg(feature = "symbols")]
use hashbrown::HashMap;

#[cfg(not(feature = "symbols"))]
use std::collections::HashMap;

/// Builtin names, pre-interned in this order (ids `0..BUILTIN_NAMES.len()`).
pub const BUILTIN_NAMES: &[&str] = &[
    "void", "unit", "bool", "char", "string", "i8", "i16", "i32", "i64", "i128", "u8", "u16",
    "u32", "u64", "u128", "f32", "f64", "any", "never", "self", "Self",
];

const BUILTIN_COUNT: u32 = BUILTIN_NAMES.len() as u32;

/// Symbols of builtin names whose ids the type checker relies on.
pub mod kw {
    use crate::symbol::Symbol;

    /// `self`
    pub const SELF_VALUE: Symbol = Symbol::new(19);
    /// `Self`
    pub const SELF_TYPE: Symbol = Symbol::new(20);
}

/// Bidirectional string <-> [`Symbol`] table.
#[derive(Debug, Clone)]
pub struct StringInterner {
    strings: Vec<Box<str>>,
    symbols: HashMap<Box<str>, Symbol>,
}

impl StringInterner {
    /// Creates an interner holding only the builtin names.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self {
            strings: Vec::with_capacity(64),
            symbols: HashMap::with_capacity(64),
        };
        for name in BUILTIN_NAMES {
            interner.intern(name);
        }
        interner
    }

    /// Interns `s`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.symbols.get(s) {
            return sym;
        }

        let sym = Symbol::new(self.strings.len() as u32);
        let owned: Box<str> = s.into();
        self.strings.push(owned.clone());
        self.symbols.insert(owned, sym);
        sym
    }

    /// Looks up a symbol without interning. `None` if `s` was never interned.
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.symbols.get(s).copied()
    }

    /// Resolves a symbol back to its string. `None` for foreign or invalid symbols.
    #[must_use]
    pub fn resolve(&self, sym: Symbol) -> Option<&str> {
        self.strings.get(sym.as_usize()).map(|s| &**s)
    }

    /// Resolves a symbol, falling back to `"?"` for unknown ids.
    ///
    /// Convenient in diagnostics, where a missing name must not abort reporting.
    #[must_use]
    pub fn name(&self, sym: Symbol) -> &str {
        self.resolve(sym).unwrap_or("?")
    }

    /// Whether `sym` is one of [`BUILTIN_NAMES`].
    #[must_use]
    pub const fn is_builtin(&self, sym: Symbol) -> bool {
        sym.as_u32() < BUILTIN_COUNT
    }

    /// Number of interned strings, builtins included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always false after construction; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_have_stable_ids() {
        let interner = StringInterner::new();
        assert_eq!(interner.len(), BUILTIN_NAMES.len());
        for (i, name) in BUILTIN_NAMES.iter().enumerate() {
            let sym = interner.get(name).unwrap();
            assert_eq!(sym.as_usize(), i);
            assert!(interner.is_builtin(sym));
        }
    }

    #[test]
    fn test_keyword_symbols() {
        let interner = StringInterner::new();
        assert_eq!(interner.resolve(kw::SELF_VALUE), Some("self"));
        assert_eq!(interner.resolve(kw::SELF_TYPE), Some("Self"));
    }

    #[test]
    fn test_intern_deduplicates() {
        let mut interner = StringInterner::new();
        let a = interner.intern("Channel");
        let b = interner.intern("Channel");
        let c = interner.intern("Region");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!interner.is_builtin(a));
        assert_eq!(interner.len(), BUILTIN_NAMES.len() + 2);
    }

    #[test]
    fn test_resolve_unknown_symbol() {
        let interner = StringInterner::new();
        assert_eq!(interner.resolve(Symbol::new(9999)), None);
        assert_eq!(interner.resolve(Symbol::invalid()), None);
        assert_eq!(interner.name(Symbol::invalid()), "?");
    }

    #[test]
    fn test_get_does_not_intern() {
        let interner = StringInterner::new();
        assert!(interner.get("notYetSeen").is_none());
        assert_eq!(interner.len(), BUILTIN_NAMES.len());
    }

    #[test]
    fn test_many_names() {
        let mut interner = StringInterner::new();
        let syms: Vec<_> = (0..500).map(|i| interner.intern(&format!("v{i}"))).collect();
        for (i, sym) in syms.iter().enumerate() {
            assert_eq!(interner.resolve(*sym), Some(format!("v{i}").as_str()));
        }
    }

    #[test]
    fn test_unicode_and_empty() {
        let mut interner = StringInterner::new();
        let empty = interner.intern("");
        let uni = interner.intern("通道");
        assert_eq!(interner.resolve(empty), Some(""));
        assert_eq!(interner.resolve(uni), Some("通道"));
    }
}
