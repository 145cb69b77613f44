//! Expression nodes.
//!
//! Nested expressions are boxed and owned by their parent; the tree is
//! handed to the checker by shared reference.

use crate::ast::NodeId;
use crate::span::{Span, Spanned};
use std::fmt;
use tessera_mem::Symbol;

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Node identity.
    pub id: NodeId,
    /// Source location.
    pub span: Span,
    /// Node-specific payload.
    pub kind: ExprKind,
}

/// Closed set of expression forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `42`, `1.5`, `true`, `'c'`, `"s"`, `()`
    Literal(Literal),
    /// A name resolved through the symbol table.
    Ident(Symbol),
    /// `self` inside a method body.
    SelfValue,
    /// `lhs op rhs`
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `op operand`
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// `callee(args)`
    Call {
        /// Called expression.
        callee: Box<Expr>,
        /// Arguments in order.
        args: Vec<Expr>,
    },
    /// `receiver.method(args)`
    MethodCall {
        /// Receiver.
        receiver: Box<Expr>,
        /// Method name.
        method: Symbol,
        /// Arguments, receiver excluded.
        args: Vec<Expr>,
    },
    /// `channel <- value`
    Send {
        /// Channel operand.
        channel: Box<Expr>,
        /// Sent value.
        value: Box<Expr>,
    },
    /// `<- channel`
    Recv {
        /// Channel operand.
        channel: Box<Expr>,
    },
    /// `target = value`
    Assign {
        /// Place being written.
        target: Box<Expr>,
        /// New value.
        value: Box<Expr>,
    },
    /// `base.field`
    Field {
        /// Struct value.
        base: Box<Expr>,
        /// Field name.
        field: Symbol,
    },
    /// `base.0`
    TupleIndex {
        /// Tuple value.
        base: Box<Expr>,
        /// Element position.
        index: u32,
    },
    /// `base[index]`
    Index {
        /// Array or slice.
        base: Box<Expr>,
        /// Integer index.
        index: Box<Expr>,
    },
    /// `(a, b)`
    Tuple(Vec<Expr>),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `Point { x: 1, y: 2 }`
    StructLit {
        /// Struct name.
        name: Symbol,
        /// Field initializers.
        fields: Vec<FieldInit>,
    },
    /// `Shape::Circle(r)`
    Variant {
        /// Enum name.
        enum_name: Symbol,
        /// Variant name.
        variant: Symbol,
        /// Payload, when the variant carries one.
        payload: Option<Box<Expr>>,
    },
}

/// `name: value` inside a struct literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    /// Field name.
    pub name: Symbol,
    /// Initializer.
    pub value: Expr,
    /// Location of the initializer.
    pub span: Span,
}

/// Literal values. String literals are interned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// Integer literal (sign is a separate unary op).
    Int(u128),
    /// Floating-point literal.
    Float(f64),
    /// `true` / `false`
    Bool(bool),
    /// Character literal.
    Char(char),
    /// String literal.
    Str(Symbol),
    /// `()`
    Unit,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}

/// Operator families; each family has one typing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpClass {
    /// `+ - * / %`
    Arithmetic,
    /// `< <= > >=`
    Comparison,
    /// `== !=`
    Equality,
    /// `&& ||`
    Logical,
    /// `& | ^ << >>`
    Bitwise,
}

impl BinaryOp {
    /// Source spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    /// Operator family.
    pub const fn class(self) -> OpClass {
        match self {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                OpClass::Arithmetic
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => OpClass::Comparison,
            BinaryOp::Eq | BinaryOp::Ne => OpClass::Equality,
            BinaryOp::And | BinaryOp::Or => OpClass::Logical,
            BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::Shl
            | BinaryOp::Shr => OpClass::Bitwise,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
    /// `&x`
    AddrOf,
    /// `&mut x`
    AddrOfMut,
    /// `*x`
    Deref,
}

impl UnaryOp {
    /// Source spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::AddrOf => "&",
            UnaryOp::AddrOfMut => "&mut ",
            UnaryOp::Deref => "*",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Expr {
    /// Whether the expression denotes a place that can be borrowed or assigned.
    pub fn is_place(&self) -> bool {
        match &self.kind {
            ExprKind::Ident(_) | ExprKind::SelfValue => true,
            ExprKind::Field { base, .. }
            | ExprKind::TupleIndex { base, .. }
            | ExprKind::Index { base, .. } => base.is_place(),
            ExprKind::Unary {
                op: UnaryOp::Deref, ..
            } => true,
            _ => false,
        }
    }

    /// The variable a place expression is rooted at, if it is rooted at one
    /// without going through a dereference.
    pub fn place_root(&self) -> Option<Symbol> {
        match &self.kind {
            ExprKind::Ident(name) => Some(*name),
            ExprKind::Field { base, .. }
            | ExprKind::TupleIndex { base, .. }
            | ExprKind::Index { base, .. } => base.place_root(),
            _ => None,
        }
    }
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        self.span
    }
}
