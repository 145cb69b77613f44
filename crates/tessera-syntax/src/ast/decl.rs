//! Module-level declarations.

use crate::ast::expr::Expr;
use crate::ast::stmt::Block;
use crate::ast::ty::TypeExpr;
use crate::ast::NodeId;
use crate::span::{Span, Spanned};
use tessera_mem::Symbol;

/// One compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module name.
    pub name: Symbol,
    /// Declarations in source order.
    pub decls: Vec<Decl>,
}

/// A module-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    /// Node identity.
    pub id: NodeId,
    /// Source location.
    pub span: Span,
    /// Node-specific payload.
    pub kind: DeclKind,
}

/// Closed set of declaration forms.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// `fn name(..) -> R { .. }`
    Function(FnDecl),
    /// Module-level `let`.
    Variable(VarDecl),
    /// `struct Name { .. }`
    Struct(StructDecl),
    /// `enum Name { .. }`
    Enum(EnumDecl),
    /// `trait Name: Super { .. }`
    Trait(TraitDecl),
    /// `impl [Trait for] Type { .. }`
    Impl(ImplDecl),
}

/// A variable binding, global or local.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    /// Bound name.
    pub name: Symbol,
    /// `mut` binding.
    pub mutable: bool,
    /// Annotation, if written.
    pub ty: Option<TypeExpr>,
    /// Initializer, if written.
    pub init: Option<Expr>,
}

/// `T: Bound + Other`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    /// Parameter name.
    pub name: Symbol,
    /// Trait bounds by name.
    pub bounds: Vec<Symbol>,
    /// Source location.
    pub span: Span,
}

/// A function parameter. A missing annotation is a checker error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: Symbol,
    /// Annotation.
    pub ty: Option<TypeExpr>,
    /// `mut` binding.
    pub mutable: bool,
    /// Source location.
    pub span: Span,
}

/// Function signature and optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    /// Function name.
    pub name: Symbol,
    /// Generic type parameters.
    pub generics: Vec<GenericParam>,
    /// Declared lifetime names (without quotes).
    pub lifetimes: Vec<Symbol>,
    /// Whether the function takes `self` (methods only).
    pub has_self: bool,
    /// Parameters, receiver excluded.
    pub params: Vec<Param>,
    /// Return annotation; `None` means unit.
    pub ret: Option<TypeExpr>,
    /// Body; `None` for external declarations.
    pub body: Option<Block>,
    /// `unsafe fn`
    pub is_unsafe: bool,
    /// `kernel fn`: privileged code.
    pub is_kernel: bool,
}

/// `name: T` inside a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name.
    pub name: Symbol,
    /// Field type.
    pub ty: TypeExpr,
    /// Source location.
    pub span: Span,
}

/// `[capability] struct Name { fields }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    /// Type name.
    pub name: Symbol,
    /// Fields in order.
    pub fields: Vec<FieldDecl>,
    /// Declared as carrying an access-control obligation.
    pub is_capability: bool,
}

/// `Name` or `Name(T)` inside an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDecl {
    /// Variant name.
    pub name: Symbol,
    /// Payload type.
    pub payload: Option<TypeExpr>,
    /// Source location.
    pub span: Span,
}

/// `enum Name { variants }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    /// Type name.
    pub name: Symbol,
    /// Variants in order.
    pub variants: Vec<VariantDecl>,
}

/// A required method inside a trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitMethodDecl {
    /// Method name.
    pub name: Symbol,
    /// Parameter types, receiver excluded.
    pub params: Vec<TypeExpr>,
    /// Return type; `None` means unit.
    pub ret: Option<TypeExpr>,
    /// Source location.
    pub span: Span,
}

/// `trait Name<P>: Super { methods }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitDecl {
    /// Trait name.
    pub name: Symbol,
    /// Type parameters of a generic trait.
    pub type_params: Vec<Symbol>,
    /// Extended traits by name.
    pub super_traits: Vec<Symbol>,
    /// Required methods.
    pub methods: Vec<TraitMethodDecl>,
}

/// A method inside an impl block.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Node identity.
    pub id: NodeId,
    /// Source location.
    pub span: Span,
    /// The function.
    pub func: FnDecl,
}

/// `impl Trait<Args> for Target { methods }` or an inherent `impl Target { .. }`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImplDecl {
    /// Implemented trait, `None` for inherent impls.
    pub trait_name: Option<Symbol>,
    /// Arguments of a generic trait.
    pub trait_args: Vec<TypeExpr>,
    /// Implementing type.
    pub target: TypeExpr,
    /// Method definitions.
    pub methods: Vec<Method>,
}

impl Decl {
    /// Name introduced by the declaration; impls introduce none.
    pub fn name(&self) -> Option<Symbol> {
        match &self.kind {
            DeclKind::Function(f) => Some(f.name),
            DeclKind::Variable(v) => Some(v.name),
            DeclKind::Struct(s) => Some(s.name),
            DeclKind::Enum(e) => Some(e.name),
            DeclKind::Trait(t) => Some(t.name),
            DeclKind::Impl(_) => None,
        }
    }
}

impl Spanned for Decl {
    fn span(&self) -> Span {
        self.span
    }
}
