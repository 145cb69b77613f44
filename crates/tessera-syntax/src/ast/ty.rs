//! Type annotations as written in source.
//!
//! These are unresolved: a [`TypeExprKind::Named`] may denote a builtin, a
//! struct, an enum or a generic parameter. The checker resolves them.

use crate::span::{Span, Spanned};
use tessera_mem::Symbol;

/// A type annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    /// Location of the annotation.
    pub span: Span,
    /// Shape of the annotation.
    pub kind: TypeExprKind,
}

/// Shape of a type annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExprKind {
    /// A name: `i32`, `bool`, `Point`, `T`.
    Named(Symbol),
    /// `()`
    Unit,
    /// `[T; N]`, or `[T; dyn]` when `size` is `None`.
    Array {
        /// Element type.
        elem: Box<TypeExpr>,
        /// Fixed length, `None` for a growable array.
        size: Option<u64>,
    },
    /// `[T]`
    Slice(Box<TypeExpr>),
    /// `(A, B, C)`
    Tuple(Vec<TypeExpr>),
    /// `unsafe kernel fn(A, B) -> R`
    Function {
        /// Parameter types.
        params: Vec<TypeExpr>,
        /// Return type.
        ret: Box<TypeExpr>,
        /// `unsafe` qualifier.
        is_unsafe: bool,
        /// `kernel` (privileged) qualifier.
        is_kernel: bool,
    },
    /// `&'a T` or `&mut T`
    Reference {
        /// Referenced type.
        inner: Box<TypeExpr>,
        /// `mut` qualifier.
        mutable: bool,
        /// Named lifetime, without the leading quote.
        lifetime: Option<Symbol>,
    },
    /// `chan<T, N>`, or `dchan<T, N>` when distributed.
    Channel {
        /// Element type.
        elem: Box<TypeExpr>,
        /// Buffer capacity, 0 for unbuffered.
        capacity: u32,
        /// Whether the channel may cross node boundaries.
        distributed: bool,
    },
    /// `dyn Trait + 'a`
    TraitObject {
        /// Trait name.
        trait_name: Symbol,
        /// Optional lifetime bound.
        lifetime: Option<Symbol>,
    },
    /// `Self` inside an impl.
    SelfType,
    /// `_`: let the checker infer it.
    Infer,
}

impl Spanned for TypeExpr {
    fn span(&self) -> Span {
        self.span
    }
}
