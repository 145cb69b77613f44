//! Statement type checking.

use super::Checker;
use crate::context::Binding;
use crate::error::TypeError;
use crate::types::{TyKind, TypeId};
use tessera_mem::Symbol;
use tessera_syntax::Span;
use tessera_syntax::ast::{Block, Expr, ExprKind, Stmt, StmtKind, VarDecl};

impl Checker<'_> {
    /// Checks one statement. Errors are reported, never returned.
    pub(super) fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let(var) => {
                let ty = self.let_binding(var, stmt.span);
                self.record(stmt.id, ty);
            }

            // Borrows in a bare expression are temporaries; an assignment may
            // store one, so it keeps the enclosing scope's frame.
            StmtKind::Expr(expr) if matches!(expr.kind, ExprKind::Assign { .. }) => {
                self.expr(expr);
            }
            StmtKind::Expr(expr) => {
                self.ctx.enter_borrow_frame();
                self.expr(expr);
                self.ctx.exit_borrow_frame();
            }

            StmtKind::Block(block) => self.block(block),

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.condition(cond);
                self.block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch);
                }
            }

            StmtKind::While { cond, body } => {
                self.condition(cond);
                self.loop_body(|this| this.block(body));
            }

            StmtKind::For {
                binding,
                iterable,
                body,
            } => {
                let iter_ty = self.expr(iterable);
                let elem = self.element_type(iter_ty, iterable.span);
                self.enter_scope();
                self.bind_local(*binding, elem, false, stmt.span);
                self.loop_body(|this| this.block(body));
                self.exit_scope();
            }

            StmtKind::Return(value) => {
                let found = match value {
                    Some(value) => self.expr(value),
                    None => self.ctx.unit(),
                };
                let Some(fn_ctx) = self.fn_ctx else {
                    self.report(&TypeError::ReturnOutsideFunction { span: stmt.span });
                    return;
                };
                if !self.is_error(found) && !self.coerce(found, fn_ctx.ret) {
                    self.report(&TypeError::ReturnMismatch {
                        expected: self.show(fn_ctx.ret),
                        found: self.show(found),
                        span: stmt.span,
                    });
                }
            }

            StmtKind::Break => self.loop_control("break", stmt.span),
            StmtKind::Continue => self.loop_control("continue", stmt.span),
        }
    }

    /// Checks a block in its own scope.
    pub(super) fn block(&mut self, block: &Block) {
        self.enter_scope();
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.exit_scope();
        self.record(block.id, self.ctx.unit());
    }

    /// Binds a local, giving it a lifetime and a region when borrow
    /// tracking is on.
    pub(super) fn bind_local(&mut self, name: Symbol, ty: TypeId, mutable: bool, span: Span) {
        let mut binding = Binding::local(ty, mutable, span);
        if self.config.borrow_tracking {
            let lifetime = self.ctx.create_lifetime(None, false);
            binding.region = Some(self.ctx.create_region(name, lifetime, mutable));
        }
        self.env.bind(name, binding);
    }

    fn let_binding(&mut self, var: &VarDecl, span: Span) -> TypeId {
        let declared = var.ty.as_ref().map(|ann| self.lower_ty_or_error(ann));
        let init = var.init.as_ref().map(|init| (self.expr(init), init.span));

        let ty = match (declared, init) {
            (Some(declared), Some((found, at))) => {
                if !self.is_error(found)
                    && !self.is_error(declared)
                    && !self.coerce(found, declared)
                {
                    self.report(&TypeError::Mismatch {
                        expected: self.show(declared),
                        found: self.show(found),
                        span: at,
                    });
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some((found, _))) => found,
            (None, None) => self.ctx.fresh_var(),
        };
        self.bind_local(var.name, ty, var.mutable, span);
        ty
    }

    fn condition(&mut self, cond: &Expr) {
        let found = self.expr(cond);
        let bool_ty = self.ctx.bool_ty();
        if !self.is_error(found) && !self.ctx.unify(found, bool_ty) {
            self.report(&TypeError::NonBooleanCondition {
                found: self.show(found),
                span: cond.span,
            });
        }
    }

    /// Element type of an array, slice or channel; reports anything else.
    fn element_type(&mut self, iter_ty: TypeId, span: Span) -> TypeId {
        match self.ctx.resolved_kind(iter_ty) {
            TyKind::Array { elem, .. } | TyKind::Slice(elem) | TyKind::Channel { elem, .. } => {
                *elem
            }
            TyKind::Error => iter_ty,
            _ => {
                self.report(&TypeError::NotIterable {
                    ty: self.show(iter_ty),
                    span,
                });
                self.ctx.error()
            }
        }
    }

    fn loop_body(&mut self, check: impl FnOnce(&mut Self)) {
        if let Some(fn_ctx) = &mut self.fn_ctx {
            fn_ctx.loop_depth += 1;
        }
        check(self);
        if let Some(fn_ctx) = &mut self.fn_ctx {
            fn_ctx.loop_depth -= 1;
        }
    }

    fn loop_control(&mut self, keyword: &'static str, span: Span) {
        let in_loop = self.fn_ctx.is_some_and(|fn_ctx| fn_ctx.loop_depth > 0);
        if !in_loop {
            self.report(&TypeError::BreakOutsideLoop { keyword, span });
        }
    }
}
