//! Abstract syntax tree consumed by the type checker.
//!
//! Every statement, expression, declaration and block carries a [`NodeId`]
//! and a [`Span`](crate::span::Span). The checker reports diagnostics against
//! spans and attaches resolved types to node ids.
//!
//! # Modules
//!
//! - [`expr`] - Expressions and operators
//! - [`stmt`] - Statements and blocks
//! - [`decl`] - Module-level declarations
//! - [`ty`] - Type annotations
//! - [`build`] - [`AstBuilder`] for tools and tests

pub mod build;
pub mod decl;
pub mod expr;
pub mod stmt;
pub mod ty;

pub use build::AstBuilder;
pub use decl::{
    Decl, DeclKind, EnumDecl, FieldDecl, FnDecl, GenericParam, ImplDecl, Method, Module, Param,
    StructDecl, TraitDecl, TraitMethodDecl, VarDecl, VariantDecl,
};
pub use expr::{BinaryOp, Expr, ExprKind, FieldInit, Literal, OpClass, UnaryOp};
pub use stmt::{Block, Stmt, StmtKind};
pub use ty::{TypeExpr, TypeExprKind};

use std::fmt;

/// Identity of an AST node, unique within one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
