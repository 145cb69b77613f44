//! Core type representation.
//!
//! A [`Type`] is a [`TyKind`] plus the [`TypeProps`] derived from it when the
//! type was built. Types are owned by the
//! [`TypeContext`](crate::context::TypeContext) and referred to by
//! [`TypeId`]; nested types are ids, never boxes.
//!
//! # Design
//!
//! - **Type variables** (`Var`) are placeholders resolved by unification
//! - **Nominal types** (`Struct`, `Enum`) compare by [`NominalKey`], not by shape
//! - **Sentinels** (`Error`, `Never`, `Unknown`, `Any`) drive recovery and the
//!   ends of the subtype lattice

use crate::context::{TraitId, VarId};
use crate::region::LifetimeId;
use tessera_mem::{Idx, Symbol};
use tessera_syntax::Span;

/// Handle to a type owned by a `TypeContext`.
pub type TypeId = Idx<Type>;

/// A type together with its derived safety properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    /// Constructor and children
    pub kind: TyKind,
    /// Properties computed from `kind` at construction
    pub props: TypeProps,
}

/// Safety metadata carried by every type.
///
/// For composite types each flag is the AND of the children's flags, except
/// `capability`, which is the OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeProps {
    /// Carries an access-control obligation
    pub capability: bool,
    /// Can be duplicated bitwise
    pub copyable: bool,
    /// Has a statically known size
    pub sized: bool,
    /// Can be shared across threads
    pub thread_safe: bool,
}

impl TypeProps {
    /// Copyable, sized, thread-safe, no capability.
    pub const PLAIN: TypeProps = TypeProps {
        capability: false,
        copyable: true,
        sized: true,
        thread_safe: true,
    };

    /// None of the flags set.
    pub const NONE: TypeProps = TypeProps {
        capability: false,
        copyable: false,
        sized: false,
        thread_safe: false,
    };

    /// Combines a child's properties into an accumulator.
    #[must_use]
    pub const fn join(self, child: TypeProps) -> TypeProps {
        TypeProps {
            capability: self.capability || child.capability,
            copyable: self.copyable && child.copyable,
            sized: self.sized && child.sized,
            thread_safe: self.thread_safe && child.thread_safe,
        }
    }
}

impl Default for TypeProps {
    fn default() -> Self {
        Self::PLAIN
    }
}

/// Integer widths, ordered narrow to wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    /// 8 bits
    W8,
    /// 16 bits
    W16,
    /// 32 bits
    W32,
    /// 64 bits
    W64,
    /// 128 bits
    W128,
}

impl IntWidth {
    /// All widths, narrow to wide.
    pub const ALL: [IntWidth; 5] = [
        IntWidth::W8,
        IntWidth::W16,
        IntWidth::W32,
        IntWidth::W64,
        IntWidth::W128,
    ];

    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
            IntWidth::W128 => 128,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Integer signedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signedness {
    /// Two's complement
    Signed,
    /// Non-negative
    Unsigned,
}

impl Signedness {
    /// `Signed` if either side is signed.
    #[must_use]
    pub const fn or(self, other: Signedness) -> Signedness {
        match (self, other) {
            (Signedness::Unsigned, Signedness::Unsigned) => Signedness::Unsigned,
            _ => Signedness::Signed,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Signedness::Signed => 0,
            Signedness::Unsigned => 1,
        }
    }
}

/// Floating-point precision, ordered narrow to wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatPrecision {
    /// IEEE single
    F32,
    /// IEEE double
    F64,
}

/// Length of an array type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArraySize {
    /// `[T; N]`
    Fixed(u64),
    /// `[T; dyn]`
    Dynamic,
}

/// Reference and borrow mutability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// `&T`
    Immutable,
    /// `&mut T`
    Mutable,
}

impl Mutability {
    /// Whether this is `Mutable`.
    #[must_use]
    pub const fn is_mut(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

/// Identity of a nominal type: its name and where it was declared.
///
/// Two declarations sharing a name are different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NominalKey {
    /// Declared name
    pub name: Symbol,
    /// Declaration site
    pub site: Span,
}

/// A struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name
    pub name: Symbol,
    /// Field type
    pub ty: TypeId,
}

/// An enum variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDef {
    /// Variant name
    pub name: Symbol,
    /// Payload type, if the variant carries one
    pub payload: Option<TypeId>,
}

/// A trait implementation attached to a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeImpl {
    /// Implemented trait
    pub trait_id: TraitId,
    /// Arguments of a generic trait
    pub type_args: Vec<TypeId>,
    /// Methods defined by the impl block
    pub methods: Vec<Symbol>,
}

/// Struct metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    /// Nominal identity
    pub key: NominalKey,
    /// Fields in declaration order
    pub fields: Vec<FieldDef>,
    /// Trait implementations
    pub impls: Vec<TypeImpl>,
    /// Method table filled from impl blocks: name to function type
    pub methods: Vec<(Symbol, TypeId)>,
    /// Declared as `capability struct`
    pub is_capability: bool,
}

impl StructDef {
    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: Symbol) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: Symbol) -> Option<TypeId> {
        self.methods
            .iter()
            .find(|(m, _)| *m == name)
            .map(|(_, ty)| *ty)
    }
}

/// Enum metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// Nominal identity
    pub key: NominalKey,
    /// Variants in declaration order
    pub variants: Vec<VariantDef>,
}

impl EnumDef {
    /// Looks up a variant by name.
    #[must_use]
    pub fn variant(&self, name: Symbol) -> Option<&VariantDef> {
        self.variants.iter().find(|v| v.name == name)
    }
}

/// Function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnSig {
    /// Parameter types in order
    pub params: Vec<TypeId>,
    /// Return type
    pub ret: TypeId,
    /// `unsafe fn`
    pub is_unsafe: bool,
    /// `kernel fn`
    pub is_kernel: bool,
}

/// Closed set of type constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum TyKind {
    /// `void`: no value
    Void,
    /// `()`
    Unit,
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `string`
    String,
    /// `i8` .. `u128`
    Int {
        /// Bit width
        width: IntWidth,
        /// Signedness
        sign: Signedness,
    },
    /// `f32` / `f64`
    Float(FloatPrecision),
    /// `[T; N]` or `[T; dyn]`
    Array {
        /// Element type
        elem: TypeId,
        /// Length
        size: ArraySize,
    },
    /// `[T]`
    Slice(TypeId),
    /// `(A, B, ..)`
    Tuple(Vec<TypeId>),
    /// Nominal product type
    Struct(StructDef),
    /// Nominal sum type
    Enum(EnumDef),
    /// `fn(A) -> R`
    Function(FnSig),
    /// `&T`, `&mut T`, `&'a T`
    Reference {
        /// Referenced type
        inner: TypeId,
        /// Lifetime, when known
        lifetime: Option<LifetimeId>,
        /// Mutability
        mutability: Mutability,
    },
    /// `chan<T, N>` / `dchan<T, N>`
    Channel {
        /// Element type
        elem: TypeId,
        /// Buffer capacity
        capacity: u32,
        /// May cross node boundaries
        distributed: bool,
    },
    /// Inference variable
    Var(VarId),
    /// Generic parameter `T: Bounds`
    Param {
        /// Parameter name
        name: Symbol,
        /// Trait bounds
        bounds: Vec<TraitId>,
    },
    /// `dyn Trait`
    TraitObject {
        /// The trait
        trait_id: TraitId,
        /// Lifetime bound
        lifetime: Option<LifetimeId>,
    },
    /// Result of a failed check; compatible with everything
    Error,
    /// Bottom: subtype of everything
    Never,
    /// Not yet known
    Unknown,
    /// Top: supertype of everything
    Any,
}

impl TyKind {
    /// Properties of constructors without children.
    ///
    /// Returns `None` for composite constructors.
    #[must_use]
    pub fn leaf_props(&self) -> Option<TypeProps> {
        let props = match self {
            TyKind::Void => TypeProps {
                sized: false,
                ..TypeProps::PLAIN
            },
            TyKind::String => TypeProps {
                copyable: false,
                ..TypeProps::PLAIN
            },
            TyKind::TraitObject { .. } => TypeProps::NONE,
            TyKind::Unit
            | TyKind::Bool
            | TyKind::Char
            | TyKind::Int { .. }
            | TyKind::Float(_)
            | TyKind::Var(_)
            | TyKind::Param { .. }
            | TyKind::Error
            | TyKind::Never
            | TyKind::Unknown
            | TyKind::Any => TypeProps::PLAIN,
            TyKind::Array { .. }
            | TyKind::Slice(_)
            | TyKind::Tuple(_)
            | TyKind::Struct(_)
            | TyKind::Enum(_)
            | TyKind::Function(_)
            | TyKind::Reference { .. }
            | TyKind::Channel { .. } => return None,
        };
        Some(props)
    }

    /// Immediate child types, in order.
    #[must_use]
    pub fn children(&self) -> Vec<TypeId> {
        match self {
            TyKind::Array { elem, .. }
            | TyKind::Slice(elem)
            | TyKind::Channel { elem, .. }
            | TyKind::Reference { inner: elem, .. } => vec![*elem],
            TyKind::Tuple(elems) => elems.clone(),
            TyKind::Struct(def) => def.fields.iter().map(|f| f.ty).collect(),
            TyKind::Enum(def) => def.variants.iter().filter_map(|v| v.payload).collect(),
            TyKind::Function(sig) => {
                let mut out = sig.params.clone();
                out.push(sig.ret);
                out
            }
            _ => Vec::new(),
        }
    }

    /// Whether rebuilding with new children makes sense: composite and not nominal.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            TyKind::Array { .. }
                | TyKind::Slice(_)
                | TyKind::Tuple(_)
                | TyKind::Function(_)
                | TyKind::Reference { .. }
                | TyKind::Channel { .. }
        )
    }

    /// Copy of a structural constructor with its children replaced, in the
    /// order [`TyKind::children`] returns them. Other constructors are
    /// returned unchanged.
    #[must_use]
    pub fn with_children(&self, children: &[TypeId]) -> TyKind {
        let first = |fallback: TypeId| children.first().copied().unwrap_or(fallback);
        match self {
            TyKind::Array { elem, size } => TyKind::Array {
                elem: first(*elem),
                size: *size,
            },
            TyKind::Slice(elem) => TyKind::Slice(first(*elem)),
            TyKind::Tuple(_) => TyKind::Tuple(children.to_vec()),
            TyKind::Function(sig) => {
                let (ret, params) = children
                    .split_last()
                    .map_or((sig.ret, &[][..]), |(r, p)| (*r, p));
                TyKind::Function(FnSig {
                    params: params.to_vec(),
                    ret,
                    is_unsafe: sig.is_unsafe,
                    is_kernel: sig.is_kernel,
                })
            }
            TyKind::Reference {
                inner,
                lifetime,
                mutability,
            } => TyKind::Reference {
                inner: first(*inner),
                lifetime: *lifetime,
                mutability: *mutability,
            },
            TyKind::Channel {
                elem,
                capacity,
                distributed,
            } => TyKind::Channel {
                elem: first(*elem),
                capacity: *capacity,
                distributed: *distributed,
            },
            other => other.clone(),
        }
    }

    /// Whether the constructor is an integer or float.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, TyKind::Int { .. } | TyKind::Float(_))
    }

    /// Whether the constructor is an integer.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, TyKind::Int { .. })
    }

    /// Whether this is the error sentinel.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, TyKind::Error)
    }

    /// Short constructor name used in traces.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            TyKind::Void => "void",
            TyKind::Unit => "unit",
            TyKind::Bool => "bool",
            TyKind::Char => "char",
            TyKind::String => "string",
            TyKind::Int { .. } => "int",
            TyKind::Float(_) => "float",
            TyKind::Array { .. } => "array",
            TyKind::Slice(_) => "slice",
            TyKind::Tuple(_) => "tuple",
            TyKind::Struct(_) => "struct",
            TyKind::Enum(_) => "enum",
            TyKind::Function(_) => "function",
            TyKind::Reference { .. } => "reference",
            TyKind::Channel { .. } => "channel",
            TyKind::Var(_) => "var",
            TyKind::Param { .. } => "param",
            TyKind::TraitObject { .. } => "trait object",
            TyKind::Error => "error",
            TyKind::Never => "never",
            TyKind::Unknown => "unknown",
            TyKind::Any => "any",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join() {
        let string = TypeProps {
            copyable: false,
            ..TypeProps::PLAIN
        };
        let cap = TypeProps {
            capability: true,
            ..TypeProps::PLAIN
        };
        let joined = TypeProps::PLAIN.join(string).join(cap);
        assert!(!joined.copyable);
        assert!(joined.capability);
        assert!(joined.sized);
    }

    #[test]
    fn test_leaf_props() {
        let void = TyKind::Void.leaf_props().expect("leaf");
        assert!(void.copyable && void.thread_safe && !void.sized);

        let string = TyKind::String.leaf_props().expect("leaf");
        assert!(!string.copyable && string.sized);

        assert!(TyKind::Tuple(vec![]).leaf_props().is_none());
    }

    #[test]
    fn test_signedness_or() {
        use Signedness::*;
        assert_eq!(Unsigned.or(Unsigned), Unsigned);
        assert_eq!(Unsigned.or(Signed), Signed);
        assert_eq!(Signed.or(Unsigned), Signed);
    }

    #[test]
    fn test_width_order() {
        assert!(IntWidth::W8 < IntWidth::W64);
        assert_eq!(IntWidth::W128.bits(), 128);
        assert!(FloatPrecision::F32 < FloatPrecision::F64);
    }
}
