//! Statement nodes and blocks.

use crate::ast::decl::VarDecl;
use crate::ast::expr::Expr;
use crate::ast::NodeId;
use crate::span::{Span, Spanned};
use tessera_mem::Symbol;

/// `{ stmt* }`: a lexical scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Node identity.
    pub id: NodeId,
    /// Source location.
    pub span: Span,
    /// Statements in order.
    pub stmts: Vec<Stmt>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// Node identity.
    pub id: NodeId,
    /// Source location.
    pub span: Span,
    /// Node-specific payload.
    pub kind: StmtKind,
}

/// Closed set of statement forms.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let [mut] name[: T] [= init];`
    Let(VarDecl),
    /// `expr;`
    Expr(Expr),
    /// A nested block.
    Block(Block),
    /// `if cond { .. } else ..`
    If {
        /// Condition, must be `bool`.
        cond: Expr,
        /// Taken branch.
        then_branch: Block,
        /// `else` block or chained `if`.
        else_branch: Option<Box<Stmt>>,
    },
    /// `while cond { .. }`
    While {
        /// Condition, must be `bool`.
        cond: Expr,
        /// Loop body.
        body: Block,
    },
    /// `for binding in iterable { .. }`
    For {
        /// Loop variable.
        binding: Symbol,
        /// Array, slice or channel.
        iterable: Expr,
        /// Loop body.
        body: Block,
    },
    /// `return [value];`
    Return(Option<Expr>),
    /// `break;`
    Break,
    /// `continue;`
    Continue,
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        self.span
    }
}

impl Spanned for Block {
    fn span(&self) -> Span {
        self.span
    }
}
