//! Expression type checking.
//!
//! `synth` infers the type of one expression. Sub-expressions go
//! through `expr`, which reports failures and records `error`, so
//! each problem is reported exactly once however deep it sits.

use super::Checker;
use crate::error::{Result, TypeError};
use crate::infer::UnifyError;
use crate::region::BorrowError;
use crate::types::{
    ArraySize, FloatPrecision, FnSig, IntWidth, Mutability, Signedness, TyKind, TypeId,
};
use tessera_mem::{Symbol, kw};
use tessera_syntax::Span;
use tessera_syntax::ast::{BinaryOp, Expr, ExprKind, FieldInit, Literal, OpClass, UnaryOp};

/// Numeric view of an operand type.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(IntWidth, Signedness),
    Float(FloatPrecision),
    /// Unresolved variable
    Unknown,
    Other,
}

impl Checker<'_> {
    /// Types `expr`, reporting any failure, and records the result.
    pub(super) fn expr(&mut self, expr: &Expr) -> TypeId {
        let ty = match self.synth(expr) {
            Ok(ty) => ty,
            Err(err) => {
                self.report(&err);
                self.ctx.error()
            }
        };
        self.record(expr.id, ty);
        ty
    }

    /// Types an operand whose failure stops the enclosing expression.
    fn operand(&mut self, expr: &Expr) -> Result<TypeId> {
        let ty = self.expr(expr);
        if self.is_error(ty) {
            Err(TypeError::Reported { span: expr.span })
        } else {
            Ok(ty)
        }
    }

    fn synth(&mut self, expr: &Expr) -> Result<TypeId> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(self.literal(lit)),

            ExprKind::Ident(name) => self.ident(*name, span),

            ExprKind::SelfValue => self
                .env
                .lookup(kw::SELF_VALUE)
                .map(|binding| binding.ty)
                .ok_or(TypeError::SelfOutsideImpl { span }),

            ExprKind::Binary { op, lhs, rhs } => {
                // Both sides are checked even if the first fails
                let lhs = self.operand(lhs);
                let rhs = self.operand(rhs);
                self.binary(*op, lhs?, rhs?, span)
            }

            ExprKind::Unary { op, operand } => self.unary(*op, operand, span),

            ExprKind::Call { callee, args } => {
                let callee_ty = self.operand(callee);
                let args = self.args(args);
                let callee_ty = callee_ty?;
                let sig = self.fn_sig(callee_ty, callee.span)?;
                self.check_call_flags(&sig, callee_ty, span);
                self.apply_args(&sig, &args, span)
            }

            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let recv = self.operand(receiver);
                let args = self.args(args);
                let recv = self.auto_deref(recv?);
                let method_ty =
                    self.lookup_method(recv, *method)
                        .ok_or_else(|| TypeError::UnknownMethod {
                            ty: self.show(recv),
                            method: self.name(*method),
                            span,
                        })?;
                let sig = self.fn_sig(method_ty, span)?;
                self.check_call_flags(&sig, method_ty, span);
                self.apply_args(&sig, &args, span)
            }

            ExprKind::Send { channel, value } => {
                let chan = self.operand(channel);
                let found = self.expr(value);
                let elem = self.channel_elem(chan?, channel.span)?;
                if !self.is_error(found) && !self.coerce(found, elem) {
                    self.report(&TypeError::Mismatch {
                        expected: self.show(elem),
                        found: self.show(found),
                        span: value.span,
                    });
                }
                Ok(self.ctx.unit())
            }

            ExprKind::Recv { channel } => {
                let chan = self.operand(channel)?;
                self.channel_elem(chan, channel.span)
            }

            ExprKind::Assign { target, value } => self.assign(target, value),

            ExprKind::Field { base, field } => {
                let base_ty = self.operand(base)?;
                let base_ty = self.auto_deref(base_ty);
                let Some(def) = self.ctx.struct_def(base_ty) else {
                    return Err(TypeError::FieldAccessOnNonStruct {
                        ty: self.show(base_ty),
                        field: self.name(*field),
                        span,
                    });
                };
                def.field(*field)
                    .map(|f| f.ty)
                    .ok_or_else(|| TypeError::UnknownField {
                        ty: self.show(base_ty),
                        field: self.name(*field),
                        span,
                    })
            }

            ExprKind::TupleIndex { base, index } => {
                let base_ty = self.operand(base)?;
                let base_ty = self.auto_deref(base_ty);
                match self.ctx.resolved_kind(base_ty) {
                    TyKind::Tuple(elems) => elems.get(*index as usize).copied().ok_or_else(|| {
                        TypeError::UnknownField {
                            ty: self.show(base_ty),
                            field: index.to_string(),
                            span,
                        }
                    }),
                    _ => Err(TypeError::FieldAccessOnNonStruct {
                        ty: self.show(base_ty),
                        field: index.to_string(),
                        span,
                    }),
                }
            }

            ExprKind::Index { base, index } => {
                let base_ty = self.operand(base);
                let index_ty = self.operand(index);
                let (base_ty, index_ty) = (self.auto_deref(base_ty?), index_ty?);
                let elem = match self.ctx.resolved_kind(base_ty) {
                    TyKind::Array { elem, .. } | TyKind::Slice(elem) => *elem,
                    _ => {
                        return Err(TypeError::NotIndexable {
                            ty: self.show(base_ty),
                            span,
                        });
                    }
                };
                match self.num(index_ty) {
                    Num::Int(..) | Num::Unknown => Ok(elem),
                    _ => Err(TypeError::InvalidOperands {
                        op: "[]",
                        lhs: self.show(base_ty),
                        rhs: Some(self.show(index_ty)),
                        span,
                    }),
                }
            }

            ExprKind::Tuple(elems) => {
                if elems.is_empty() {
                    return Ok(self.ctx.unit());
                }
                let tys: Vec<TypeId> = elems.iter().map(|e| self.expr(e)).collect();
                if tys.iter().any(|ty| self.is_error(*ty)) {
                    return Err(TypeError::Reported { span });
                }
                Ok(self.ctx.tuple(tys))
            }

            ExprKind::Array(elems) => {
                let Some((first, rest)) = elems.split_first() else {
                    let elem = self.ctx.fresh_var();
                    return Ok(self.ctx.array(elem, ArraySize::Fixed(0)));
                };
                let elem = self.operand(first)?;
                for item in rest {
                    let found = self.expr(item);
                    if !self.is_error(found) && !self.coerce(found, elem) {
                        self.report(&TypeError::Mismatch {
                            expected: self.show(elem),
                            found: self.show(found),
                            span: item.span,
                        });
                    }
                }
                Ok(self.ctx.array(elem, ArraySize::Fixed(elems.len() as u64)))
            }

            ExprKind::StructLit { name, fields } => self.struct_lit(*name, fields, span),

            ExprKind::Variant {
                enum_name,
                variant,
                payload,
            } => self.variant(*enum_name, *variant, payload.as_deref(), span),
        }
    }

    /// Integers take the narrowest of `i32`, `i64`, `u64`, `u128` that holds
    /// them; floats are `f64`.
    fn literal(&self, lit: &Literal) -> TypeId {
        match lit {
            Literal::Int(value) => {
                let (width, sign) = if *value <= i32::MAX as u128 {
                    (IntWidth::W32, Signedness::Signed)
                } else if *value <= i64::MAX as u128 {
                    (IntWidth::W64, Signedness::Signed)
                } else if *value <= u64::MAX as u128 {
                    (IntWidth::W64, Signedness::Unsigned)
                } else {
                    (IntWidth::W128, Signedness::Unsigned)
                };
                self.ctx.int(width, sign)
            }
            Literal::Float(_) => self.ctx.float(FloatPrecision::F64),
            Literal::Bool(_) => self.ctx.bool_ty(),
            Literal::Char(_) => self.ctx.char_ty(),
            Literal::Str(_) => self.ctx.string(),
            Literal::Unit => self.ctx.unit(),
        }
    }

    /// Generic functions get fresh variables at every use.
    fn ident(&mut self, name: Symbol, span: Span) -> Result<TypeId> {
        let Some(binding) = self.env.lookup(name).copied() else {
            return Err(TypeError::UndefinedVar {
                name: self.name(name),
                span,
            });
        };
        if binding.generic {
            Ok(self.ctx.instantiate(binding.ty))
        } else {
            Ok(binding.ty)
        }
    }

    fn num(&self, ty: TypeId) -> Num {
        match self.ctx.resolved_kind(ty) {
            TyKind::Int { width, sign } => Num::Int(*width, *sign),
            TyKind::Float(precision) => Num::Float(*precision),
            TyKind::Var(_) => Num::Unknown,
            _ => Num::Other,
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: TypeId, rhs: TypeId, span: Span) -> Result<TypeId> {
        let class = op.class();
        if matches!(
            class,
            OpClass::Arithmetic | OpClass::Comparison | OpClass::Bitwise
        ) {
            self.unify_unresolved(lhs, rhs);
        }

        match class {
            OpClass::Arithmetic => self
                .numeric_result(lhs, rhs)
                .ok_or_else(|| self.invalid_operands(op, lhs, rhs, span)),

            OpClass::Bitwise => {
                for side in [lhs, rhs] {
                    if matches!(self.num(side), Num::Float(_)) {
                        return Err(TypeError::UnsupportedOperator {
                            op: op.as_str(),
                            ty: self.show(side),
                            span,
                        });
                    }
                }
                match (self.num(lhs), self.num(rhs)) {
                    (Num::Int(..) | Num::Unknown, Num::Int(..) | Num::Unknown) => self
                        .numeric_result(lhs, rhs)
                        .ok_or_else(|| self.invalid_operands(op, lhs, rhs, span)),
                    _ => Err(self.invalid_operands(op, lhs, rhs, span)),
                }
            }

            OpClass::Comparison => {
                let numeric = |n: Num| matches!(n, Num::Int(..) | Num::Float(_) | Num::Unknown);
                if numeric(self.num(lhs)) && numeric(self.num(rhs)) {
                    Ok(self.ctx.bool_ty())
                } else {
                    Err(self.invalid_operands(op, lhs, rhs, span))
                }
            }

            OpClass::Equality => {
                if self.ctx.unify(lhs, rhs) {
                    Ok(self.ctx.bool_ty())
                } else {
                    Err(self.invalid_operands(op, lhs, rhs, span))
                }
            }

            OpClass::Logical => {
                let bool_ty = self.ctx.bool_ty();
                if self.ctx.unify(lhs, bool_ty) && self.ctx.unify(rhs, bool_ty) {
                    Ok(bool_ty)
                } else {
                    Err(self.invalid_operands(op, lhs, rhs, span))
                }
            }
        }
    }

    /// An unresolved operand takes the other operand's type.
    fn unify_unresolved(&mut self, lhs: TypeId, rhs: TypeId) {
        let unresolved = |ty| matches!(self.num(ty), Num::Unknown);
        if unresolved(lhs) || unresolved(rhs) {
            self.ctx.unify(lhs, rhs);
        }
    }

    /// Float if either side is, otherwise the wider integer, signed if
    /// either side is.
    fn numeric_result(&self, lhs: TypeId, rhs: TypeId) -> Option<TypeId> {
        match (self.num(lhs), self.num(rhs)) {
            (Num::Float(a), Num::Float(b)) => Some(self.ctx.float(a.max(b))),
            (Num::Float(p), Num::Int(..)) | (Num::Int(..), Num::Float(p)) => {
                Some(self.ctx.float(p))
            }
            (Num::Int(w1, s1), Num::Int(w2, s2)) => Some(self.ctx.int(w1.max(w2), s1.or(s2))),
            (Num::Unknown, Num::Unknown) => Some(lhs),
            _ => None,
        }
    }

    fn invalid_operands(&self, op: BinaryOp, lhs: TypeId, rhs: TypeId, span: Span) -> TypeError {
        TypeError::InvalidOperands {
            op: op.as_str(),
            lhs: self.show(lhs),
            rhs: Some(self.show(rhs)),
            span,
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Result<TypeId> {
        match op {
            UnaryOp::AddrOf => self.address_of(operand, Mutability::Immutable, span),
            UnaryOp::AddrOfMut => self.address_of(operand, Mutability::Mutable, span),

            UnaryOp::Deref => {
                let ty = self.operand(operand)?;
                match self.ctx.resolved_kind(ty) {
                    TyKind::Reference { inner, .. } => Ok(*inner),
                    _ => Err(TypeError::NonReferenceDeref {
                        ty: self.show(ty),
                        span,
                    }),
                }
            }

            UnaryOp::Neg => {
                let ty = self.operand(operand)?;
                match self.num(ty) {
                    Num::Int(..) | Num::Float(_) | Num::Unknown => Ok(ty),
                    Num::Other => Err(self.invalid_operand(op, ty, span)),
                }
            }

            UnaryOp::Not => {
                let ty = self.operand(operand)?;
                let bool_ty = self.ctx.bool_ty();
                if self.ctx.unify(ty, bool_ty) {
                    Ok(bool_ty)
                } else {
                    Err(self.invalid_operand(op, ty, span))
                }
            }

            UnaryOp::BitNot => {
                let ty = self.operand(operand)?;
                match self.num(ty) {
                    Num::Int(..) | Num::Unknown => Ok(ty),
                    Num::Float(_) => Err(TypeError::UnsupportedOperator {
                        op: op.as_str(),
                        ty: self.show(ty),
                        span,
                    }),
                    Num::Other => Err(self.invalid_operand(op, ty, span)),
                }
            }
        }
    }

    fn invalid_operand(&self, op: UnaryOp, ty: TypeId, span: Span) -> TypeError {
        TypeError::InvalidOperands {
            op: op.as_str(),
            lhs: self.show(ty),
            rhs: None,
            span,
        }
    }

    /// `&place` / `&mut place`. With borrow tracking the borrow is registered
    /// against the root binding's region and the reference takes its lifetime.
    fn address_of(&mut self, operand: &Expr, mutability: Mutability, span: Span) -> Result<TypeId> {
        let inner = self.operand(operand)?;
        if !operand.is_place() {
            return Err(TypeError::NonLvalueAddrOf { span });
        }

        let root = operand
            .place_root()
            .and_then(|name| Some((name, *self.env.lookup(name)?)));
        let mut lifetime = None;
        if let Some((name, binding)) = root {
            if mutability.is_mut() && !binding.mutable {
                return Err(TypeError::MutBorrowOfImmutable {
                    name: self.name(name),
                    span,
                });
            }
            if let Some(region) = binding.region.filter(|_| self.config.borrow_tracking) {
                match self.ctx.check_borrow(region, mutability) {
                    Ok(()) => {}
                    Err(BorrowError::ImmutableRegion { .. }) => {
                        return Err(TypeError::MutBorrowOfImmutable {
                            name: self.name(name),
                            span,
                        });
                    }
                    Err(err) => {
                        return Err(TypeError::ConflictingBorrow {
                            name: self.name(name),
                            reason: err.to_string(),
                            span,
                        });
                    }
                }
                lifetime = Some(self.ctx.region(region).lifetime);
            }
        }
        Ok(self.ctx.reference(inner, lifetime, mutability))
    }

    fn args(&mut self, args: &[Expr]) -> Vec<(TypeId, Span)> {
        args.iter().map(|arg| (self.expr(arg), arg.span)).collect()
    }

    fn fn_sig(&self, ty: TypeId, span: Span) -> Result<FnSig> {
        match self.ctx.resolved_kind(ty) {
            TyKind::Function(sig) => Ok(sig.clone()),
            _ => Err(TypeError::NotAFunction {
                ty: self.show(ty),
                span,
            }),
        }
    }

    /// Unsafe callees need an unsafe caller, kernel callees a kernel caller.
    fn check_call_flags(&mut self, sig: &FnSig, callee: TypeId, span: Span) {
        if !self.config.unsafe_checks {
            return;
        }
        let (in_unsafe, in_kernel) = self
            .fn_ctx
            .map_or((false, false), |f| (f.is_unsafe, f.is_kernel));
        if sig.is_unsafe && !in_unsafe {
            self.report(&TypeError::UnsafeCall {
                callee: self.show(callee),
                span,
            });
        }
        if sig.is_kernel && !in_kernel {
            self.report(&TypeError::KernelCall {
                callee: self.show(callee),
                span,
            });
        }
    }

    /// A wrong argument count fails the call; a bad argument is reported on
    /// its own and the call keeps its return type.
    fn apply_args(&mut self, sig: &FnSig, args: &[(TypeId, Span)], span: Span) -> Result<TypeId> {
        if args.len() != sig.params.len() {
            return Err(TypeError::WrongArgCount {
                expected: sig.params.len(),
                found: args.len(),
                span,
            });
        }
        for (index, (&(found, at), &expected)) in args.iter().zip(&sig.params).enumerate() {
            if self.is_error(found) {
                continue;
            }
            if let Some(err) = self.coerce_arg(index, found, expected, at) {
                self.report(&err);
            }
        }
        Ok(sig.ret)
    }

    fn coerce_arg(
        &mut self,
        index: usize,
        found: TypeId,
        expected: TypeId,
        span: Span,
    ) -> Option<TypeError> {
        let err = self.ctx.try_unify(found, expected).err()?;
        if self.ctx.is_subtype(found, expected) {
            return None;
        }
        Some(match err {
            UnifyError::TraitConstraint { ty, trait_id } => TypeError::TraitConstraint {
                ty: self.show(ty),
                trait_name: self.name(self.ctx.trait_def(trait_id).name),
                span,
            },
            UnifyError::Occurs { ty, .. } => TypeError::InfiniteType {
                ty: self.show(ty),
                span,
            },
            _ => TypeError::ArgMismatch {
                index,
                expected: self.show(expected),
                found: self.show(found),
                span,
            },
        })
    }

    fn auto_deref(&self, mut ty: TypeId) -> TypeId {
        while let TyKind::Reference { inner, .. } = self.ctx.resolved_kind(ty) {
            ty = *inner;
        }
        ty
    }

    /// Struct methods come from the struct's table; generic parameters and
    /// trait objects search their traits and those traits' direct
    /// super-traits.
    fn lookup_method(&mut self, recv: TypeId, name: Symbol) -> Option<TypeId> {
        let bounds = match self.ctx.resolved_kind(recv) {
            TyKind::Struct(def) => {
                let method = def.method(name)?;
                return Some(self.ctx.instantiate(method));
            }
            TyKind::Param { bounds, .. } => bounds.clone(),
            TyKind::TraitObject { trait_id, .. } => vec![*trait_id],
            _ => return None,
        };
        for bound in bounds {
            let mut candidates = vec![bound];
            candidates.extend(self.ctx.trait_def(bound).super_traits.iter().copied());
            for candidate in candidates {
                if self.ctx.trait_def(candidate).method(name).is_some() {
                    return self
                        .ctx
                        .instantiate_trait_methods(candidate, recv, &[])
                        .into_iter()
                        .find(|m| m.name == name)
                        .map(|m| m.signature);
                }
            }
        }
        None
    }

    fn channel_elem(&self, ty: TypeId, span: Span) -> Result<TypeId> {
        match self.ctx.resolved_kind(ty) {
            TyKind::Channel { elem, .. } => Ok(*elem),
            _ => Err(TypeError::NotAChannel {
                ty: self.show(ty),
                span,
            }),
        }
    }

    fn assign(&mut self, target: &Expr, value: &Expr) -> Result<TypeId> {
        let target_ty = self.expr(target);
        let found = self.expr(value);
        if !target.is_place() {
            return Err(TypeError::InvalidAssignmentTarget { span: target.span });
        }
        self.check_assignable(target)?;
        if !self.is_error(target_ty) && !self.is_error(found) && !self.coerce(found, target_ty) {
            return Err(TypeError::Mismatch {
                expected: self.show(target_ty),
                found: self.show(found),
                span: value.span,
            });
        }
        Ok(self.ctx.unit())
    }

    /// The root binding must be mutable; a place behind `*r` needs `r: &mut T`.
    fn check_assignable(&self, target: &Expr) -> Result<()> {
        if let Some(root) = target.place_root() {
            return match self.env.lookup(root) {
                Some(binding) if !binding.mutable => Err(TypeError::AssignToImmutable {
                    name: self.name(root),
                    span: target.span,
                }),
                _ => Ok(()),
            };
        }
        let Some(reference) = deref_operand(target) else {
            return Ok(());
        };
        let behind_shared = self.node_type(reference.id).is_some_and(|ty| {
            matches!(
                self.ctx.resolved_kind(ty),
                TyKind::Reference {
                    mutability: Mutability::Immutable,
                    ..
                }
            )
        });
        if behind_shared {
            let name = reference
                .place_root()
                .map_or_else(|| "*reference".to_string(), |root| format!("*{}", self.name(root)));
            return Err(TypeError::AssignToImmutable {
                name,
                span: target.span,
            });
        }
        Ok(())
    }

    /// Every field must be given exactly once.
    fn struct_lit(&mut self, name: Symbol, fields: &[FieldInit], span: Span) -> Result<TypeId> {
        let values: Vec<TypeId> = fields.iter().map(|f| self.expr(&f.value)).collect();
        let ty = self
            .types
            .get(&name)
            .copied()
            .filter(|ty| self.ctx.struct_def(*ty).is_some())
            .ok_or_else(|| TypeError::UndefinedType {
                name: self.name(name),
                span,
            })?;
        let declared = self
            .ctx
            .struct_def(ty)
            .map(|def| def.fields.clone())
            .unwrap_or_default();

        let mut seen: Vec<Symbol> = Vec::with_capacity(fields.len());
        for (init, found) in fields.iter().zip(values) {
            let Some(field) = declared.iter().find(|f| f.name == init.name) else {
                self.report(&TypeError::UnknownField {
                    ty: self.show(ty),
                    field: self.name(init.name),
                    span: init.span,
                });
                continue;
            };
            if seen.contains(&init.name) {
                self.report(&TypeError::DuplicateDefinition {
                    name: self.name(init.name),
                    span: init.span,
                });
                continue;
            }
            seen.push(init.name);
            if !self.is_error(found) && !self.coerce(found, field.ty) {
                self.report(&TypeError::Mismatch {
                    expected: self.show(field.ty),
                    found: self.show(found),
                    span: init.value.span,
                });
            }
        }
        for field in &declared {
            if !seen.contains(&field.name) {
                self.report(&TypeError::MissingField {
                    ty: self.show(ty),
                    field: self.name(field.name),
                    span,
                });
            }
        }
        Ok(ty)
    }

    fn variant(
        &mut self,
        enum_name: Symbol,
        variant: Symbol,
        payload: Option<&Expr>,
        span: Span,
    ) -> Result<TypeId> {
        let found = payload.map(|p| (self.expr(p), p.span));
        let ty = self
            .types
            .get(&enum_name)
            .copied()
            .filter(|ty| self.ctx.enum_def(*ty).is_some())
            .ok_or_else(|| TypeError::UndefinedType {
                name: self.name(enum_name),
                span,
            })?;
        let def = self
            .ctx
            .enum_def(ty)
            .and_then(|def| def.variant(variant).copied())
            .ok_or_else(|| TypeError::UnknownVariant {
                ty: self.show(ty),
                variant: self.name(variant),
                span,
            })?;

        match (def.payload, found) {
            (Some(expected), Some((found, at))) => {
                if !self.is_error(found) && !self.coerce(found, expected) {
                    self.report(&TypeError::Mismatch {
                        expected: self.show(expected),
                        found: self.show(found),
                        span: at,
                    });
                }
            }
            (None, None) => {}
            (expected, found) => {
                self.report(&TypeError::WrongArgCount {
                    expected: usize::from(expected.is_some()),
                    found: usize::from(found.is_some()),
                    span,
                });
            }
        }
        Ok(ty)
    }
}

/// The reference operand of the first `*` under a place's projections.
fn deref_operand(place: &Expr) -> Option<&Expr> {
    match &place.kind {
        ExprKind::Field { base, .. }
        | ExprKind::TupleIndex { base, .. }
        | ExprKind::Index { base, .. } => deref_operand(base),
        ExprKind::Unary {
            op: UnaryOp::Deref,
            operand,
        } => Some(operand),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::check::Checker;
    use crate::config::CheckerConfig;
    use tessera_syntax::DiagnosticBag;
    use tessera_syntax::ast::{AstBuilder, BinaryOp, Decl, DeclKind, Expr, Stmt, UnaryOp};

    struct Outcome {
        ty: Option<String>,
        codes: Vec<String>,
    }

    fn run_with(
        config: CheckerConfig,
        mut b: AstBuilder,
        decls: Vec<Decl>,
        stmts: Vec<Stmt>,
        subject: Expr,
    ) -> Outcome {
        let module = b.module("test", decls);
        let interner = b.finish();
        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, config, &mut bag);
        checker.check_module(&module);
        for stmt in &stmts {
            checker.check_stmt(stmt);
        }
        let ty = checker.check_expr(&subject).map(|ty| checker.show(ty));
        drop(checker);
        Outcome {
            ty,
            codes: bag.iter().filter_map(|d| d.code.clone()).collect(),
        }
    }

    fn run(b: AstBuilder, decls: Vec<Decl>, stmts: Vec<Stmt>, subject: Expr) -> Outcome {
        run_with(CheckerConfig::default(), b, decls, stmts, subject)
    }

    #[test]
    fn test_int_literal_widths() {
        for (value, expected) in [
            (1, "i32"),
            (i32::MAX as u128 + 1, "i64"),
            (u64::MAX as u128, "u64"),
            (u128::MAX, "u128"),
        ] {
            let mut b = AstBuilder::new();
            let subject = b.int(value);
            let out = run(b, vec![], vec![], subject);
            assert_eq!(out.ty.as_deref(), Some(expected), "literal {value}");
        }
    }

    #[test]
    fn test_arithmetic_promotion() {
        let mut b = AstBuilder::new();
        let i = b.int(1);
        let f = b.float(2.5);
        let subject = b.binary(BinaryOp::Add, i, f);
        assert_eq!(run(b, vec![], vec![], subject).ty.as_deref(), Some("f64"));

        let mut b = AstBuilder::new();
        let ann = b.ty("u64");
        let wide = b.let_("wide", Some(ann), None);
        let small = b.int(1);
        let w = b.ident("wide");
        let subject = b.binary(BinaryOp::Mul, small, w);
        // i32 * u64 widens to 64 bits and stays signed
        assert_eq!(run(b, vec![], vec![wide], subject).ty.as_deref(), Some("i64"));
    }

    #[test]
    fn test_bitwise_rejects_floats() {
        let mut b = AstBuilder::new();
        let f = b.float(1.0);
        let i = b.int(2);
        let subject = b.binary(BinaryOp::BitAnd, f, i);
        let out = run(b, vec![], vec![], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["unsupported operator"]);
    }

    #[test]
    fn test_comparison_and_logic() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let two = b.float(2.0);
        let lt = b.binary(BinaryOp::Lt, one, two);
        let t = b.bool(true);
        let subject = b.binary(BinaryOp::And, lt, t);
        let out = run(b, vec![], vec![], subject);
        assert_eq!(out.ty.as_deref(), Some("bool"));

        let mut b = AstBuilder::new();
        let s = b.str("a");
        let t = b.bool(true);
        let subject = b.binary(BinaryOp::Or, s, t);
        assert_eq!(run(b, vec![], vec![], subject).codes, vec!["invalid operands"]);
    }

    #[test]
    fn test_addition_rejects_bools() {
        let mut b = AstBuilder::new();
        let t = b.bool(true);
        let f = b.bool(false);
        let subject = b.binary(BinaryOp::Add, t, f);
        let out = run(b, vec![], vec![], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["invalid operands"]);
    }

    #[test]
    fn test_equality_requires_unification() {
        let mut b = AstBuilder::new();
        let ann = b.ty("i8");
        let narrow = b.let_("narrow", Some(ann), None);
        let ann = b.ty("i64");
        let wide = b.let_("wide", Some(ann), None);
        let lhs = b.ident("narrow");
        let rhs = b.ident("wide");
        let subject = b.binary(BinaryOp::Eq, lhs, rhs);
        let out = run(b, vec![], vec![narrow, wide], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["invalid operands"]);

        let mut b = AstBuilder::new();
        let ann = b.ty("i64");
        let wide = b.let_("wide", Some(ann), None);
        let lhs = b.ident("wide");
        let rhs = b.ident("wide");
        let subject = b.binary(BinaryOp::Ne, lhs, rhs);
        assert_eq!(
            run(b, vec![], vec![wide], subject).ty.as_deref(),
            Some("bool")
        );
    }

    #[test]
    fn test_failed_operand_reported_once() {
        let mut b = AstBuilder::new();
        let missing = b.ident("missing");
        let one = b.int(1);
        let inner = b.binary(BinaryOp::Add, missing, one);
        let two = b.int(2);
        let subject = b.binary(BinaryOp::Mul, inner, two);
        let out = run(b, vec![], vec![], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["undefined variable"]);
    }

    fn pair_fn(b: &mut AstBuilder) -> Decl {
        let i1 = b.ty("i32");
        let i2 = b.ty("i32");
        let bool_ty = b.ty("bool");
        let p1 = b.param("a", i1);
        let p2 = b.param("b", i2);
        let t = b.bool(true);
        let ret = b.ret(Some(t));
        b.func("pair", vec![p1, p2], Some(bool_ty), vec![ret])
    }

    #[test]
    fn test_wrong_arity_is_null() {
        let mut b = AstBuilder::new();
        let f = pair_fn(&mut b);
        let one = b.int(1);
        let subject = b.call_named("pair", vec![one]);
        let out = run(b, vec![f], vec![], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["wrong argument count"]);
    }

    #[test]
    fn test_bad_argument_keeps_return_type() {
        let mut b = AstBuilder::new();
        let f = pair_fn(&mut b);
        let one = b.int(1);
        let s = b.str("two");
        let subject = b.call_named("pair", vec![one, s]);
        let out = run(b, vec![f], vec![], subject);
        assert_eq!(out.ty.as_deref(), Some("bool"));
        assert_eq!(out.codes, vec!["argument type mismatch"]);
    }

    #[test]
    fn test_calling_a_non_function() {
        let mut b = AstBuilder::new();
        let callee = b.int(3);
        let subject = b.call(callee, vec![]);
        assert_eq!(run(b, vec![], vec![], subject).codes, vec!["not a function"]);
    }

    fn unsafe_fn(b: &mut AstBuilder) -> Decl {
        let body = b.block(vec![]);
        let mut f = b.fn_decl("poke", vec![], None, body);
        f.is_unsafe = true;
        b.decl(DeclKind::Function(f))
    }

    #[test]
    fn test_unsafe_call_needs_unsafe_caller() {
        let mut b = AstBuilder::new();
        let f = unsafe_fn(&mut b);
        let subject = b.call_named("poke", vec![]);
        let out = run(b, vec![f], vec![], subject);
        assert_eq!(out.ty.as_deref(), Some("()"));
        assert_eq!(out.codes, vec!["unsafe call"]);

        let mut b = AstBuilder::new();
        let f = unsafe_fn(&mut b);
        let subject = b.call_named("poke", vec![]);
        let config = CheckerConfig::default().with_unsafe_checks(false);
        assert!(run_with(config, b, vec![f], vec![], subject).codes.is_empty());
    }

    fn identity_fn(b: &mut AstBuilder, bounds: &[&str]) -> Decl {
        let generic = b.generic("T", bounds);
        let t1 = b.ty("T");
        let t2 = b.ty("T");
        let p = b.param("x", t1);
        let x = b.ident("x");
        let ret = b.ret(Some(x));
        let body = b.block(vec![ret]);
        let mut f = b.fn_decl("id", vec![p], Some(t2), body);
        f.generics = vec![generic];
        b.decl(DeclKind::Function(f))
    }

    #[test]
    fn test_generic_instantiated_per_use() {
        let mut b = AstBuilder::new();
        let f = identity_fn(&mut b, &[]);
        let one = b.int(1);
        let first = b.call_named("id", vec![one]);
        let first = b.expr_stmt(first);
        let t = b.bool(true);
        let subject = b.call_named("id", vec![t]);
        let out = run(b, vec![f], vec![first], subject);
        assert_eq!(out.ty.as_deref(), Some("bool"));
        assert!(out.codes.is_empty(), "{:?}", out.codes);
    }

    #[test]
    fn test_generic_bound_checked() {
        let mut b = AstBuilder::new();
        let show = b.trait_decl("Show", &[], vec![]);
        let f = identity_fn(&mut b, &["Show"]);
        let one = b.int(1);
        let subject = b.call_named("id", vec![one]);
        let out = run(b, vec![show, f], vec![], subject);
        assert_eq!(out.codes, vec!["trait constraint not satisfied"]);
    }

    fn counter(b: &mut AstBuilder) -> Vec<Decl> {
        let i32_ty = b.ty("i32");
        let strukt = b.struct_decl("Counter", vec![("n", i32_ty)]);
        let target = b.ty("Counter");
        let this = b.self_value();
        let n = b.field(this, "n");
        let ret = b.ret(Some(n));
        let ret_ty = b.ty("i32");
        let get = b.method("get", true, vec![], Some(ret_ty), vec![ret]);
        let imp = b.impl_decl(None, target, vec![get]);
        vec![strukt, imp]
    }

    #[test]
    fn test_method_call_on_struct_and_reference() {
        let mut b = AstBuilder::new();
        let decls = counter(&mut b);
        let one = b.int(1);
        let lit = b.struct_lit("Counter", vec![("n", one)]);
        let c = b.let_("c", None, Some(lit));
        let c_ref = b.ident("c");
        let r = b.unary(UnaryOp::AddrOf, c_ref);
        let subject = b.method_call(r, "get", vec![]);
        let out = run(b, decls, vec![c], subject);
        assert_eq!(out.ty.as_deref(), Some("i32"));
        assert!(out.codes.is_empty(), "{:?}", out.codes);
    }

    #[test]
    fn test_unknown_method_and_field() {
        let mut b = AstBuilder::new();
        let decls = counter(&mut b);
        let one = b.int(1);
        let lit = b.struct_lit("Counter", vec![("n", one)]);
        let c = b.let_("c", None, Some(lit));
        let recv = b.ident("c");
        let call = b.method_call(recv, "reset", vec![]);
        let call = b.expr_stmt(call);
        let base = b.ident("c");
        let subject = b.field(base, "m");
        let out = run(b, decls, vec![c, call], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["unknown method", "unknown field"]);
    }

    #[test]
    fn test_trait_method_on_generic_param() {
        let mut b = AstBuilder::new();
        let string = b.ty("string");
        let m = b.trait_method("show", vec![], Some(string));
        let show = b.trait_decl("Show", &[], vec![m]);

        let generic = b.generic("T", &["Show"]);
        let t = b.ty("T");
        let p = b.param("x", t);
        let x = b.ident("x");
        let call = b.method_call(x, "show", vec![]);
        let ret = b.ret(Some(call));
        let ret_ty = b.ty("string");
        let body = b.block(vec![ret]);
        let mut f = b.fn_decl("render", vec![p], Some(ret_ty), body);
        f.generics = vec![generic];
        let f = b.decl(DeclKind::Function(f));

        let subject = b.unit();
        let out = run(b, vec![show, f], vec![], subject);
        assert!(out.codes.is_empty(), "{:?}", out.codes);
    }

    #[test]
    fn test_channels() {
        let mut b = AstBuilder::new();
        let i32_ty = b.ty("i32");
        let ann = b.ty_chan(i32_ty, 4, false);
        let ch = b.let_("ch", Some(ann), None);
        let target = b.ident("ch");
        let t = b.bool(true);
        let send = b.send(target, t);
        let send = b.expr_stmt(send);
        let source = b.ident("ch");
        let subject = b.recv(source);
        let out = run(b, vec![], vec![ch, send], subject);
        assert_eq!(out.ty.as_deref(), Some("i32"));
        assert_eq!(out.codes, vec!["type mismatch"]);

        let mut b = AstBuilder::new();
        let one = b.int(1);
        let subject = b.recv(one);
        assert_eq!(run(b, vec![], vec![], subject).codes, vec!["not a channel"]);
    }

    #[test]
    fn test_assignment_rules() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let fixed = b.let_("fixed", None, Some(one));
        let two = b.int(2);
        let free = b.let_mut("free", None, Some(two));
        let target = b.ident("fixed");
        let three = b.int(3);
        let bad = b.assign(target, three);
        let bad = b.expr_stmt(bad);
        let lhs = b.int(1);
        let rhs = b.int(2);
        let not_place = b.assign(lhs, rhs);
        let not_place = b.expr_stmt(not_place);
        let target = b.ident("free");
        let four = b.int(4);
        let subject = b.assign(target, four);
        let out = run(b, vec![], vec![fixed, free, bad, not_place], subject);
        assert_eq!(out.ty.as_deref(), Some("()"));
        assert_eq!(
            out.codes,
            vec!["assignment to immutable", "invalid assignment target"]
        );
    }

    #[test]
    fn test_assignment_through_shared_reference() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let x = b.let_mut("x", None, Some(one));
        let xi = b.ident("x");
        let r = b.unary(UnaryOp::AddrOf, xi);
        let r = b.let_("r", None, Some(r));
        let ri = b.ident("r");
        let target = b.unary(UnaryOp::Deref, ri);
        let two = b.int(2);
        let subject = b.assign(target, two);
        let out = run(b, vec![], vec![x, r], subject);
        assert_eq!(out.codes, vec!["assignment to immutable"]);
    }

    #[test]
    fn test_struct_literal_fields() {
        let mut b = AstBuilder::new();
        let x_ty = b.ty("i32");
        let y_ty = b.ty("i32");
        let point = b.struct_decl("Point", vec![("x", x_ty), ("y", y_ty)]);
        let one = b.int(1);
        let two = b.int(2);
        let subject = b.struct_lit("Point", vec![("x", one), ("z", two)]);
        let out = run(b, vec![point], vec![], subject);
        assert_eq!(out.ty.as_deref(), Some("Point"));
        assert_eq!(out.codes, vec!["unknown field", "missing field"]);
    }

    #[test]
    fn test_address_of_and_deref() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let x = b.let_("x", None, Some(one));
        let xi = b.ident("x");
        let r = b.unary(UnaryOp::AddrOf, xi);
        let subject = b.unary(UnaryOp::Deref, r);
        assert_eq!(run(b, vec![], vec![x], subject).ty.as_deref(), Some("i32"));

        let mut b = AstBuilder::new();
        let one = b.int(1);
        let subject = b.unary(UnaryOp::AddrOf, one);
        assert_eq!(run(b, vec![], vec![], subject).codes, vec!["non-lvalue address-of"]);

        let mut b = AstBuilder::new();
        let one = b.int(1);
        let subject = b.unary(UnaryOp::Deref, one);
        assert_eq!(
            run(b, vec![], vec![], subject).codes,
            vec!["non-reference dereference"]
        );
    }

    #[test]
    fn test_mut_borrow_of_immutable() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let x = b.let_("x", None, Some(one));
        let xi = b.ident("x");
        let subject = b.unary(UnaryOp::AddrOfMut, xi);
        assert_eq!(
            run(b, vec![], vec![x], subject).codes,
            vec!["mutable borrow of immutable binding"]
        );
    }

    #[test]
    fn test_immutable_binding_suggests_mut() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let x = b.let_("x", None, Some(one));
        let x_span = x.span;
        let xi = b.ident("x");
        let borrow = b.unary(UnaryOp::AddrOfMut, xi);
        let borrow = b.expr_stmt(borrow);
        let xi = b.ident("x");
        let two = b.int(2);
        let write = b.assign(xi, two);
        let write = b.expr_stmt(write);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        for stmt in [&x, &borrow, &write] {
            checker.check_stmt(stmt);
        }
        drop(checker);

        let codes: Vec<_> = bag.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(
            codes,
            vec!["mutable borrow of immutable binding", "assignment to immutable"]
        );
        for diag in bag.iter() {
            assert_eq!(diag.suggestions.len(), 1, "{}", diag.message);
            assert_eq!(diag.suggestions[0].span, x_span);
            assert_eq!(diag.suggestions[0].replacement.as_deref(), Some("mut x"));
        }
    }

    #[test]
    fn test_statement_borrows_end_with_the_statement() {
        let mut b = AstBuilder::new();
        let zero = b.int(0);
        let n = b.let_mut("n", None, Some(zero));
        let mut stmts = vec![n];
        for _ in 0..2 {
            let ni = b.ident("n");
            let borrow = b.unary(UnaryOp::AddrOfMut, ni);
            stmts.push(b.expr_stmt(borrow));
        }
        let ni = b.ident("n");
        let subject = b.unary(UnaryOp::AddrOfMut, ni);
        let config = CheckerConfig::default().with_borrow_tracking(true);
        let out = run_with(config, b, vec![], stmts, subject);
        assert_eq!(out.ty.as_deref(), Some("&mut i32"));
        assert!(out.codes.is_empty(), "{:?}", out.codes);
    }

    #[test]
    fn test_borrow_tracking() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let x = b.let_mut("x", None, Some(one));
        // a mutable borrow inside a block ends with the block
        let xi = b.ident("x");
        let scoped = b.unary(UnaryOp::AddrOfMut, xi);
        let scoped = b.let_("scoped", None, Some(scoped));
        let block = b.block_stmt(vec![scoped]);
        let xi = b.ident("x");
        let shared = b.unary(UnaryOp::AddrOf, xi);
        let shared = b.let_("shared", None, Some(shared));
        let xi = b.ident("x");
        let subject = b.unary(UnaryOp::AddrOfMut, xi);
        let config = CheckerConfig::default().with_borrow_tracking(true);
        let out = run_with(config, b, vec![], vec![x, block, shared], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["conflicting borrow"]);
    }

    #[test]
    fn test_indexing() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let arr = b.array(vec![one, two]);
        let zero = b.int(0);
        let subject = b.index(arr, zero);
        assert_eq!(run(b, vec![], vec![], subject).ty.as_deref(), Some("i32"));

        let mut b = AstBuilder::new();
        let five = b.int(5);
        let zero = b.int(0);
        let subject = b.index(five, zero);
        assert_eq!(run(b, vec![], vec![], subject).codes, vec!["not indexable"]);
    }

    #[test]
    fn test_arrays_and_tuples() {
        let mut b = AstBuilder::new();
        let one = b.int(1);
        let t = b.bool(true);
        let subject = b.array(vec![one, t]);
        let out = run(b, vec![], vec![], subject);
        assert_eq!(out.ty.as_deref(), Some("[i32; 2]"));
        assert_eq!(out.codes, vec!["type mismatch"]);

        let mut b = AstBuilder::new();
        let one = b.int(1);
        let t = b.bool(true);
        let tuple = b.tuple(vec![one, t]);
        let subject = b.tuple_index(tuple, 1);
        assert_eq!(run(b, vec![], vec![], subject).ty.as_deref(), Some("bool"));
    }

    #[test]
    fn test_enum_variants() {
        let mut b = AstBuilder::new();
        let f64_ty = b.ty("f64");
        let shape = b.enum_decl("Shape", vec![("Circle", Some(f64_ty)), ("Empty", None)]);
        let r = b.float(1.0);
        let ok = b.variant("Shape", "Circle", Some(r));
        let ok = b.expr_stmt(ok);
        let bare = b.variant("Shape", "Circle", None);
        let bare = b.expr_stmt(bare);
        let subject = b.variant("Shape", "Square", None);
        let out = run(b, vec![shape], vec![ok, bare], subject);
        assert_eq!(out.ty, None);
        assert_eq!(out.codes, vec!["wrong argument count", "unknown variant"]);
    }

    #[test]
    fn test_self_outside_impl() {
        let mut b = AstBuilder::new();
        let subject = b.self_value();
        assert_eq!(run(b, vec![], vec![], subject).codes, vec!["self outside impl"]);
    }
}
