//! Lowering type annotations to context types.

use super::{Checker, FnScope};
use crate::error::{Result, TypeError};
use crate::region::LifetimeId;
use crate::types::{ArraySize, FloatPrecision, IntWidth, Mutability, Signedness, TypeId};
use fxhash::FxHashMap;
use tessera_mem::Symbol;
use tessera_syntax::Span;
use tessera_syntax::ast::{FnDecl, GenericParam, NodeId, TypeExpr, TypeExprKind};

impl Checker<'_> {
    /// Converts an annotation to a type.
    pub(super) fn lower_ty(&mut self, ty: &TypeExpr) -> Result<TypeId> {
        match &ty.kind {
            TypeExprKind::Named(name) => self.lower_named(*name, ty.span),

            TypeExprKind::Unit => Ok(self.ctx.unit()),

            TypeExprKind::Array { elem, size } => {
                let elem = self.lower_ty(elem)?;
                let size = size.map_or(ArraySize::Dynamic, ArraySize::Fixed);
                Ok(self.ctx.array(elem, size))
            }

            TypeExprKind::Slice(elem) => {
                let elem = self.lower_ty(elem)?;
                Ok(self.ctx.slice(elem))
            }

            TypeExprKind::Tuple(elems) => {
                let elems = elems
                    .iter()
                    .map(|e| self.lower_ty(e))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.ctx.tuple(elems))
            }

            TypeExprKind::Function {
                params,
                ret,
                is_unsafe,
                is_kernel,
            } => {
                let params = params
                    .iter()
                    .map(|p| self.lower_ty(p))
                    .collect::<Result<Vec<_>>>()?;
                let ret = self.lower_ty(ret)?;
                Ok(self.ctx.function(params, ret, *is_unsafe, *is_kernel))
            }

            TypeExprKind::Reference {
                inner,
                mutable,
                lifetime,
            } => {
                let inner = self.lower_ty(inner)?;
                let lifetime = lifetime.map(|name| self.lower_lifetime(name));
                let mutability = if *mutable {
                    Mutability::Mutable
                } else {
                    Mutability::Immutable
                };
                Ok(self.ctx.reference(inner, lifetime, mutability))
            }

            TypeExprKind::Channel {
                elem,
                capacity,
                distributed,
            } => {
                let elem = self.lower_ty(elem)?;
                Ok(self.ctx.channel(elem, *capacity, *distributed))
            }

            TypeExprKind::TraitObject {
                trait_name,
                lifetime,
            } => {
                let trait_id = self.traits.get(trait_name).copied().ok_or_else(|| {
                    TypeError::UndefinedTrait {
                        name: self.name(*trait_name),
                        span: ty.span,
                    }
                })?;
                let lifetime = lifetime.map(|name| self.lower_lifetime(name));
                Ok(self.ctx.trait_object(trait_id, lifetime))
            }

            TypeExprKind::SelfType => self
                .ctx
                .self_type()
                .ok_or(TypeError::SelfOutsideImpl { span: ty.span }),

            TypeExprKind::Infer => Ok(self.ctx.fresh_var()),
        }
    }

    /// Like [`Checker::lower_ty`], but reports the failure and yields `error`.
    pub(super) fn lower_ty_or_error(&mut self, ty: &TypeExpr) -> TypeId {
        match self.lower_ty(ty) {
            Ok(ty) => ty,
            Err(err) => {
                self.report(&err);
                self.ctx.error()
            }
        }
    }

    fn lower_named(&mut self, name: Symbol, span: Span) -> Result<TypeId> {
        if let Some(ty) = self.builtin(name) {
            return Ok(ty);
        }
        if let Some(ty) = self.generics.iter().rev().find_map(|scope| scope.get(&name)) {
            return Ok(*ty);
        }
        self.types
            .get(&name)
            .copied()
            .ok_or_else(|| TypeError::UndefinedType {
                name: self.name(name),
                span,
            })
    }

    fn builtin(&self, name: Symbol) -> Option<TypeId> {
        use IntWidth::*;
        use Signedness::*;

        let ctx = &self.ctx;
        let ty = match self.interner.resolve(name)? {
            "void" => ctx.void(),
            "unit" => ctx.unit(),
            "bool" => ctx.bool_ty(),
            "char" => ctx.char_ty(),
            "string" => ctx.string(),
            "i8" => ctx.int(W8, Signed),
            "i16" => ctx.int(W16, Signed),
            "i32" => ctx.int(W32, Signed),
            "i64" => ctx.int(W64, Signed),
            "i128" => ctx.int(W128, Signed),
            "u8" => ctx.int(W8, Unsigned),
            "u16" => ctx.int(W16, Unsigned),
            "u32" => ctx.int(W32, Unsigned),
            "u64" => ctx.int(W64, Unsigned),
            "u128" => ctx.int(W128, Unsigned),
            "f32" => ctx.float(FloatPrecision::F32),
            "f64" => ctx.float(FloatPrecision::F64),
            "any" => ctx.any(),
            "never" => ctx.never(),
            _ => return None,
        };
        Some(ty)
    }

    /// `'static` is shared; other names are created on first use within the
    /// current function.
    fn lower_lifetime(&mut self, name: Symbol) -> LifetimeId {
        if self.interner.resolve(name) == Some("static") {
            return self.ctx.static_lifetime();
        }
        if let Some(lt) = self.lifetimes.get(&name) {
            return *lt;
        }
        let lt = self.ctx.create_lifetime(Some(name), false);
        self.lifetimes.insert(name, lt);
        lt
    }

    /// Brings a function's generic parameters and named lifetimes into scope.
    ///
    /// They are created the first time `owner` is entered and reused after,
    /// so the signature and the body agree and bound errors are reported once.
    pub(super) fn enter_fn_scope(&mut self, owner: NodeId, func: &FnDecl) {
        let scope = match self.fn_scopes.get(&owner).cloned() {
            Some(scope) => scope,
            None => {
                let generics = self.generic_scope(&func.generics);
                let lifetimes = func
                    .lifetimes
                    .iter()
                    .map(|name| (*name, self.ctx.create_lifetime(Some(*name), false)))
                    .collect();
                FnScope {
                    generics,
                    lifetimes,
                }
            }
        };
        self.generics.push(scope.generics);
        self.lifetimes = scope.lifetimes;
    }

    /// Leaves the scope opened by [`Checker::enter_fn_scope`], keeping any
    /// lifetimes first named along the way.
    pub(super) fn exit_fn_scope(&mut self, owner: NodeId) {
        let generics = self.generics.pop().unwrap_or_default();
        let lifetimes = std::mem::take(&mut self.lifetimes);
        self.fn_scopes.insert(
            owner,
            FnScope {
                generics,
                lifetimes,
            },
        );
    }

    /// Creates parameter types for `generics`. Unknown bounds are reported
    /// and dropped.
    fn generic_scope(&mut self, generics: &[GenericParam]) -> FxHashMap<Symbol, TypeId> {
        let mut scope = FxHashMap::default();
        for generic in generics {
            let mut bounds = Vec::with_capacity(generic.bounds.len());
            for bound in &generic.bounds {
                match self.traits.get(bound).copied() {
                    Some(id) => bounds.push(id),
                    None => self.report(&TypeError::UndefinedTrait {
                        name: self.name(*bound),
                        span: generic.span,
                    }),
                }
            }
            let param = self.ctx.param(generic.name, bounds);
            if scope.insert(generic.name, param).is_some() {
                self.report(&TypeError::DuplicateDefinition {
                    name: self.name(generic.name),
                    span: generic.span,
                });
            }
        }
        scope
    }
}
