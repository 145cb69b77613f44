//! Type representation.
//!
//! - [`ty`] - `Type`, `TyKind` and the per-type safety properties
//! - [`display`] - Pretty-printing through a context and an interner

pub mod display;
pub mod ty;

pub use display::DisplayTy;
pub use ty::{
    ArraySize, EnumDef, FieldDef, FloatPrecision, FnSig, IntWidth, Mutability, NominalKey,
    Signedness, StructDef, TyKind, Type, TypeId, TypeImpl, TypeProps, VariantDef,
};
