//! Programmatic AST construction.
//!
//! [`AstBuilder`] hands out fresh [`NodeId`]s and places every node it
//! creates on its own line, so diagnostics produced against a built tree
//! point at distinct locations.

use crate::ast::decl::{
    Decl, DeclKind, EnumDecl, FieldDecl, FnDecl, GenericParam, ImplDecl, Method, Module, Param,
    StructDecl, TraitDecl, TraitMethodDecl, VarDecl, VariantDecl,
};
use crate::ast::expr::{BinaryOp, Expr, ExprKind, FieldInit, Literal, UnaryOp};
use crate::ast::stmt::{Block, Stmt, StmtKind};
use crate::ast::ty::{TypeExpr, TypeExprKind};
use crate::ast::NodeId;
use crate::span::{FileId, Span};
use tessera_mem::{StringInterner, Symbol};

/// Builds trees with fresh ids and distinct spans.
#[derive(Debug)]
pub struct AstBuilder {
    interner: StringInterner,
    file: FileId,
    next_id: u32,
    next_line: u32,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    /// Creates a builder with a fresh interner.
    #[must_use]
    pub fn new() -> Self {
        Self::with_interner(StringInterner::new())
    }

    /// Creates a builder over an existing interner.
    #[must_use]
    pub fn with_interner(interner: StringInterner) -> Self {
        Self {
            interner,
            file: FileId(0),
            next_id: 0,
            next_line: 1,
        }
    }

    /// Interns a name.
    pub fn sym(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// The interner names were interned into.
    #[must_use]
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    /// Consumes the builder, returning its interner.
    #[must_use]
    pub fn finish(self) -> StringInterner {
        self.interner
    }

    fn node(&mut self) -> (NodeId, Span) {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let span = Span::new(self.file, self.next_line, 1, 1);
        self.next_line += 1;
        (id, span)
    }

    fn span(&mut self) -> Span {
        self.node().1
    }

    // ---- type annotations ----

    fn ty_expr(&mut self, kind: TypeExprKind) -> TypeExpr {
        TypeExpr {
            span: self.span(),
            kind,
        }
    }

    /// `name`
    pub fn ty(&mut self, name: &str) -> TypeExpr {
        let sym = self.sym(name);
        self.ty_expr(TypeExprKind::Named(sym))
    }

    /// `()`
    pub fn ty_unit(&mut self) -> TypeExpr {
        self.ty_expr(TypeExprKind::Unit)
    }

    /// `&T`, `&mut T` or `&'a T`.
    pub fn ty_ref(&mut self, inner: TypeExpr, mutable: bool, lifetime: Option<&str>) -> TypeExpr {
        let lifetime = lifetime.map(|l| self.sym(l));
        self.ty_expr(TypeExprKind::Reference {
            inner: Box::new(inner),
            mutable,
            lifetime,
        })
    }

    /// `[T; N]` or `[T; dyn]`.
    pub fn ty_array(&mut self, elem: TypeExpr, size: Option<u64>) -> TypeExpr {
        self.ty_expr(TypeExprKind::Array {
            elem: Box::new(elem),
            size,
        })
    }

    /// `[T]`
    pub fn ty_slice(&mut self, elem: TypeExpr) -> TypeExpr {
        self.ty_expr(TypeExprKind::Slice(Box::new(elem)))
    }

    /// `(A, B)`
    pub fn ty_tuple(&mut self, elems: Vec<TypeExpr>) -> TypeExpr {
        self.ty_expr(TypeExprKind::Tuple(elems))
    }

    /// `fn(A, B) -> R`
    pub fn ty_fn(&mut self, params: Vec<TypeExpr>, ret: TypeExpr) -> TypeExpr {
        self.ty_expr(TypeExprKind::Function {
            params,
            ret: Box::new(ret),
            is_unsafe: false,
            is_kernel: false,
        })
    }

    /// `chan<T, N>` or `dchan<T, N>`.
    pub fn ty_chan(&mut self, elem: TypeExpr, capacity: u32, distributed: bool) -> TypeExpr {
        self.ty_expr(TypeExprKind::Channel {
            elem: Box::new(elem),
            capacity,
            distributed,
        })
    }

    /// `dyn Trait`
    pub fn ty_dyn(&mut self, trait_name: &str) -> TypeExpr {
        let trait_name = self.sym(trait_name);
        self.ty_expr(TypeExprKind::TraitObject {
            trait_name,
            lifetime: None,
        })
    }

    /// `Self`
    pub fn ty_self(&mut self) -> TypeExpr {
        self.ty_expr(TypeExprKind::SelfType)
    }

    /// `_`
    pub fn ty_infer(&mut self) -> TypeExpr {
        self.ty_expr(TypeExprKind::Infer)
    }

    // ---- expressions ----

    /// Wraps an arbitrary expression payload.
    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        let (id, span) = self.node();
        Expr { id, span, kind }
    }

    /// Integer literal.
    pub fn int(&mut self, value: u128) -> Expr {
        self.expr(ExprKind::Literal(Literal::Int(value)))
    }

    /// Float literal.
    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Float(value)))
    }

    /// Boolean literal.
    pub fn bool(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Literal(Literal::Bool(value)))
    }

    /// Character literal.
    pub fn char(&mut self, value: char) -> Expr {
        self.expr(ExprKind::Literal(Literal::Char(value)))
    }

    /// String literal.
    pub fn str(&mut self, value: &str) -> Expr {
        let sym = self.sym(value);
        self.expr(ExprKind::Literal(Literal::Str(sym)))
    }

    /// `()`
    pub fn unit(&mut self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Unit))
    }

    /// Variable reference.
    pub fn ident(&mut self, name: &str) -> Expr {
        let sym = self.sym(name);
        self.expr(ExprKind::Ident(sym))
    }

    /// `self`
    pub fn self_value(&mut self) -> Expr {
        self.expr(ExprKind::SelfValue)
    }

    /// `lhs op rhs`
    pub fn binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// `op operand`
    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `callee(args)`
    pub fn call(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    /// `name(args)`
    pub fn call_named(&mut self, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    /// `receiver.method(args)`
    pub fn method_call(&mut self, receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
        let method = self.sym(method);
        self.expr(ExprKind::MethodCall {
            receiver: Box::new(receiver),
            method,
            args,
        })
    }

    /// `channel <- value`
    pub fn send(&mut self, channel: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Send {
            channel: Box::new(channel),
            value: Box::new(value),
        })
    }

    /// `<- channel`
    pub fn recv(&mut self, channel: Expr) -> Expr {
        self.expr(ExprKind::Recv {
            channel: Box::new(channel),
        })
    }

    /// `target = value`
    pub fn assign(&mut self, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// `base.field`
    pub fn field(&mut self, base: Expr, field: &str) -> Expr {
        let field = self.sym(field);
        self.expr(ExprKind::Field {
            base: Box::new(base),
            field,
        })
    }

    /// `base.N`
    pub fn tuple_index(&mut self, base: Expr, index: u32) -> Expr {
        self.expr(ExprKind::TupleIndex {
            base: Box::new(base),
            index,
        })
    }

    /// `base[index]`
    pub fn index(&mut self, base: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index {
            base: Box::new(base),
            index: Box::new(index),
        })
    }

    /// `(a, b)`
    pub fn tuple(&mut self, elems: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Tuple(elems))
    }

    /// `[a, b]`
    pub fn array(&mut self, elems: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Array(elems))
    }

    /// `Name { field: value, .. }`
    pub fn struct_lit(&mut self, name: &str, fields: Vec<(&str, Expr)>) -> Expr {
        let name = self.sym(name);
        let fields = fields
            .into_iter()
            .map(|(field, value)| FieldInit {
                name: self.sym(field),
                span: value.span,
                value,
            })
            .collect();
        self.expr(ExprKind::StructLit { name, fields })
    }

    /// `Enum::Variant` or `Enum::Variant(payload)`.
    pub fn variant(&mut self, enum_name: &str, variant: &str, payload: Option<Expr>) -> Expr {
        let enum_name = self.sym(enum_name);
        let variant = self.sym(variant);
        self.expr(ExprKind::Variant {
            enum_name,
            variant,
            payload: payload.map(Box::new),
        })
    }

    // ---- statements ----

    /// Wraps an arbitrary statement payload.
    pub fn stmt(&mut self, kind: StmtKind) -> Stmt {
        let (id, span) = self.node();
        Stmt { id, span, kind }
    }

    /// `let name[: ty] [= init];`
    pub fn let_(&mut self, name: &str, ty: Option<TypeExpr>, init: Option<Expr>) -> Stmt {
        self.binding(name, false, ty, init)
    }

    /// `let mut name[: ty] [= init];`
    pub fn let_mut(&mut self, name: &str, ty: Option<TypeExpr>, init: Option<Expr>) -> Stmt {
        self.binding(name, true, ty, init)
    }

    fn binding(
        &mut self,
        name: &str,
        mutable: bool,
        ty: Option<TypeExpr>,
        init: Option<Expr>,
    ) -> Stmt {
        let name = self.sym(name);
        self.stmt(StmtKind::Let(VarDecl {
            name,
            mutable,
            ty,
            init,
        }))
    }

    /// `expr;`
    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    /// `{ stmts }`
    pub fn block(&mut self, stmts: Vec<Stmt>) -> Block {
        let (id, span) = self.node();
        Block { id, span, stmts }
    }

    /// A block used as a statement.
    pub fn block_stmt(&mut self, stmts: Vec<Stmt>) -> Stmt {
        let block = self.block(stmts);
        self.stmt(StmtKind::Block(block))
    }

    /// `if cond { then } [else ..]`
    pub fn if_(&mut self, cond: Expr, then_branch: Block, else_branch: Option<Stmt>) -> Stmt {
        self.stmt(StmtKind::If {
            cond,
            then_branch,
            else_branch: else_branch.map(Box::new),
        })
    }

    /// `while cond { body }`
    pub fn while_(&mut self, cond: Expr, body: Block) -> Stmt {
        self.stmt(StmtKind::While { cond, body })
    }

    /// `for binding in iterable { body }`
    pub fn for_(&mut self, binding: &str, iterable: Expr, body: Block) -> Stmt {
        let binding = self.sym(binding);
        self.stmt(StmtKind::For {
            binding,
            iterable,
            body,
        })
    }

    /// `return [value];`
    pub fn ret(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    /// `break;`
    pub fn brk(&mut self) -> Stmt {
        self.stmt(StmtKind::Break)
    }

    /// `continue;`
    pub fn cont(&mut self) -> Stmt {
        self.stmt(StmtKind::Continue)
    }

    // ---- declarations ----

    /// Wraps an arbitrary declaration payload.
    pub fn decl(&mut self, kind: DeclKind) -> Decl {
        let (id, span) = self.node();
        Decl { id, span, kind }
    }

    /// `name: ty`
    pub fn param(&mut self, name: &str, ty: TypeExpr) -> Param {
        let name = self.sym(name);
        Param {
            name,
            ty: Some(ty),
            mutable: false,
            span: self.span(),
        }
    }

    /// A parameter without annotation.
    pub fn param_untyped(&mut self, name: &str) -> Param {
        let name = self.sym(name);
        Param {
            name,
            ty: None,
            mutable: false,
            span: self.span(),
        }
    }

    /// `T: Bound + ..`
    pub fn generic(&mut self, name: &str, bounds: &[&str]) -> GenericParam {
        let name = self.sym(name);
        let bounds = bounds.iter().map(|b| self.sym(b)).collect();
        GenericParam {
            name,
            bounds,
            span: self.span(),
        }
    }

    /// A plain function signature with a body.
    pub fn fn_decl(
        &mut self,
        name: &str,
        params: Vec<Param>,
        ret: Option<TypeExpr>,
        body: Block,
    ) -> FnDecl {
        FnDecl {
            name: self.sym(name),
            generics: Vec::new(),
            lifetimes: Vec::new(),
            has_self: false,
            params,
            ret,
            body: Some(body),
            is_unsafe: false,
            is_kernel: false,
        }
    }

    /// `fn name(params) -> ret { body }` as a declaration.
    pub fn func(
        &mut self,
        name: &str,
        params: Vec<Param>,
        ret: Option<TypeExpr>,
        body: Vec<Stmt>,
    ) -> Decl {
        let body = self.block(body);
        let func = self.fn_decl(name, params, ret, body);
        self.decl(DeclKind::Function(func))
    }

    /// Module-level `let`.
    pub fn global(
        &mut self,
        name: &str,
        mutable: bool,
        ty: Option<TypeExpr>,
        init: Option<Expr>,
    ) -> Decl {
        let name = self.sym(name);
        self.decl(DeclKind::Variable(VarDecl {
            name,
            mutable,
            ty,
            init,
        }))
    }

    /// `struct Name { fields }`
    pub fn struct_decl(&mut self, name: &str, fields: Vec<(&str, TypeExpr)>) -> Decl {
        let name = self.sym(name);
        let fields = fields
            .into_iter()
            .map(|(field, ty)| FieldDecl {
                name: self.sym(field),
                span: ty.span,
                ty,
            })
            .collect();
        self.decl(DeclKind::Struct(StructDecl {
            name,
            fields,
            is_capability: false,
        }))
    }

    /// `capability struct Name { fields }`
    pub fn capability_struct(&mut self, name: &str, fields: Vec<(&str, TypeExpr)>) -> Decl {
        let mut decl = self.struct_decl(name, fields);
        if let DeclKind::Struct(s) = &mut decl.kind {
            s.is_capability = true;
        }
        decl
    }

    /// `enum Name { variants }`
    pub fn enum_decl(&mut self, name: &str, variants: Vec<(&str, Option<TypeExpr>)>) -> Decl {
        let name = self.sym(name);
        let variants = variants
            .into_iter()
            .map(|(variant, payload)| VariantDecl {
                name: self.sym(variant),
                payload,
                span: self.span(),
            })
            .collect();
        self.decl(DeclKind::Enum(EnumDecl { name, variants }))
    }

    /// A required trait method.
    pub fn trait_method(
        &mut self,
        name: &str,
        params: Vec<TypeExpr>,
        ret: Option<TypeExpr>,
    ) -> TraitMethodDecl {
        TraitMethodDecl {
            name: self.sym(name),
            params,
            ret,
            span: self.span(),
        }
    }

    /// `trait Name: supers { methods }`
    pub fn trait_decl(
        &mut self,
        name: &str,
        super_traits: &[&str],
        methods: Vec<TraitMethodDecl>,
    ) -> Decl {
        let name = self.sym(name);
        let super_traits = super_traits.iter().map(|s| self.sym(s)).collect();
        self.decl(DeclKind::Trait(TraitDecl {
            name,
            type_params: Vec::new(),
            super_traits,
            methods,
        }))
    }

    /// A method for an impl block. `has_self` adds the receiver.
    pub fn method(
        &mut self,
        name: &str,
        has_self: bool,
        params: Vec<Param>,
        ret: Option<TypeExpr>,
        body: Vec<Stmt>,
    ) -> Method {
        let body = self.block(body);
        let mut func = self.fn_decl(name, params, ret, body);
        func.has_self = has_self;
        let (id, span) = self.node();
        Method { id, span, func }
    }

    /// `impl [trait for] target { methods }`
    pub fn impl_decl(
        &mut self,
        trait_name: Option<&str>,
        target: TypeExpr,
        methods: Vec<Method>,
    ) -> Decl {
        let trait_name = trait_name.map(|t| self.sym(t));
        self.decl(DeclKind::Impl(ImplDecl {
            trait_name,
            trait_args: Vec::new(),
            target,
            methods,
        }))
    }

    /// A module named `name`.
    pub fn module(&mut self, name: &str, decls: Vec<Decl>) -> Module {
        Module {
            name: self.sym(name),
            decls,
        }
    }
}
