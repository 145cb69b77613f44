//! Unification algorithm with occurs check.
//!
//! Unification binds type variables so that two types become equal. Every
//! binding made under [`TypeContext::try_unify`] is recorded on the context's
//! trail; a failure anywhere undoes all of them, so a failed unification
//! leaves no trace.
//!
//! Binding order is fixed: when both sides are unresolved variables, the
//! first argument's variable is bound to the second, and its constraints move
//! with it.

use crate::context::{TraitId, TypeConstraint, TypeContext, VarId};
use crate::region::LifetimeId;
use crate::types::{TyKind, TypeId};
use std::fmt;
use tessera_log::trace;

/// Why two types failed to unify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnifyError {
    /// Constructors or their fixed parts differ.
    Mismatch {
        /// Left side at the point of failure
        expected: TypeId,
        /// Right side at the point of failure
        found: TypeId,
    },
    /// Binding would create an infinite type.
    Occurs {
        /// The variable being bound
        var: VarId,
        /// The type containing it
        ty: TypeId,
    },
    /// The candidate does not implement a required trait.
    TraitConstraint {
        /// Candidate resolution
        ty: TypeId,
        /// Required trait
        trait_id: TraitId,
    },
    /// The candidate is not a subtype of a required bound.
    SubtypeConstraint {
        /// Candidate resolution
        ty: TypeId,
        /// Required supertype
        bound: TypeId,
    },
    /// The candidate is not structurally equal to a required type.
    EqualsConstraint {
        /// Candidate resolution
        ty: TypeId,
        /// Required type
        expected: TypeId,
    },
    /// The candidate reference does not live long enough.
    RegionConstraint {
        /// Candidate resolution
        ty: TypeId,
        /// Lifetime it must outlive
        lifetime: LifetimeId,
    },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifyError::Mismatch { expected, found } => write!(
                f,
                "type #{} does not unify with type #{}",
                expected.into_raw(),
                found.into_raw()
            ),
            UnifyError::Occurs { var, ty } => write!(
                f,
                "variable ?{} occurs in type #{}",
                var.into_raw(),
                ty.into_raw()
            ),
            UnifyError::TraitConstraint { ty, trait_id } => write!(
                f,
                "type #{} does not implement trait #{}",
                ty.into_raw(),
                trait_id.into_raw()
            ),
            UnifyError::SubtypeConstraint { ty, bound } => write!(
                f,
                "type #{} is not a subtype of #{}",
                ty.into_raw(),
                bound.into_raw()
            ),
            UnifyError::EqualsConstraint { ty, expected } => write!(
                f,
                "type #{} is not equal to #{}",
                ty.into_raw(),
                expected.into_raw()
            ),
            UnifyError::RegionConstraint { ty, lifetime } => write!(
                f,
                "type #{} does not outlive lifetime {}",
                ty.into_raw(),
                lifetime.into_raw()
            ),
        }
    }
}

impl std::error::Error for UnifyError {}

impl TypeContext {
    /// Unifies `a` with `b`, returning whether it succeeded.
    ///
    /// On failure no variable is left bound.
    pub fn unify(&mut self, a: TypeId, b: TypeId) -> bool {
        self.try_unify(a, b).is_ok()
    }

    /// Unifies `a` with `b` inside a transaction.
    ///
    /// # Errors
    ///
    /// The first failure found; every binding made before it is undone.
    pub fn try_unify(&mut self, a: TypeId, b: TypeId) -> Result<(), UnifyError> {
        let snapshot = self.snapshot();
        match self.unify_inner(a, b) {
            Ok(()) => {
                self.commit(snapshot);
                Ok(())
            }
            Err(err) => {
                trace!("unify #{} ~ #{} failed: {}", a.into_raw(), b.into_raw(), err);
                self.rollback_to(snapshot);
                Err(err)
            }
        }
    }

    fn unify_inner(&mut self, a: TypeId, b: TypeId) -> Result<(), UnifyError> {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a == b {
            return Ok(());
        }
        trace!(
            "unify {} #{} ~ {} #{}",
            self.kind(a).tag(),
            a.into_raw(),
            self.kind(b).tag(),
            b.into_raw()
        );

        let absorbs = |kind: &TyKind| matches!(kind, TyKind::Error | TyKind::Never);
        if absorbs(self.kind(a)) || absorbs(self.kind(b)) {
            // a variable still takes the absorbing type, unchecked
            match (self.as_var(a), self.as_var(b)) {
                (Some(va), None) => self.set_resolution(va, b),
                (None, Some(vb)) => self.set_resolution(vb, a),
                _ => {}
            }
            return Ok(());
        }

        match (self.as_var(a), self.as_var(b)) {
            (Some(va), Some(vb)) => {
                self.transfer_constraints(va, vb);
                self.set_resolution(va, b);
                Ok(())
            }
            (Some(va), None) => self.bind_var(va, b),
            (None, Some(vb)) => self.bind_var(vb, a),
            (None, None) => {
                let pairs = self
                    .structural_pairs(a, b)
                    .ok_or(UnifyError::Mismatch { expected: a, found: b })?;
                for (x, y) in pairs {
                    self.unify_inner(x, y)?;
                }
                Ok(())
            }
        }
    }

    /// Checks `var`'s constraints against `ty`, then binds it.
    fn bind_var(&mut self, var: VarId, ty: TypeId) -> Result<(), UnifyError> {
        if self.occurs(var, ty) {
            return Err(UnifyError::Occurs { var, ty });
        }
        let constraints = self.var(var).constraints.clone();
        for constraint in constraints {
            self.check_constraint(constraint, ty)?;
        }
        self.set_resolution(var, ty);
        Ok(())
    }

    /// Whether `ty` satisfies one constraint.
    ///
    /// # Errors
    ///
    /// The matching constraint failure.
    pub fn check_constraint(
        &self,
        constraint: TypeConstraint,
        ty: TypeId,
    ) -> Result<(), UnifyError> {
        match constraint {
            TypeConstraint::SubtypeOf(bound) => {
                if !self.is_subtype(ty, bound) {
                    return Err(UnifyError::SubtypeConstraint { ty, bound });
                }
            }
            TypeConstraint::Implements(trait_id) => {
                if !self.implements(ty, trait_id) {
                    return Err(UnifyError::TraitConstraint { ty, trait_id });
                }
            }
            TypeConstraint::Equals(expected) => {
                if !self.types_equal(ty, expected) {
                    return Err(UnifyError::EqualsConstraint { ty, expected });
                }
            }
            TypeConstraint::InRegion(region) => {
                let lifetime = self.region(region).lifetime;
                self.check_outlives(ty, lifetime)?;
            }
            TypeConstraint::Outlives(lifetime) => self.check_outlives(ty, lifetime)?,
        }
        Ok(())
    }

    /// Non-references and references without a lifetime pass trivially.
    fn check_outlives(&self, ty: TypeId, lifetime: LifetimeId) -> Result<(), UnifyError> {
        if let TyKind::Reference {
            lifetime: Some(own), ..
        } = self.resolved_kind(ty)
        {
            if !self.lifetime_outlives(*own, lifetime) {
                return Err(UnifyError::RegionConstraint { ty, lifetime });
            }
        }
        Ok(())
    }

    /// Child pairs to unify when `a` and `b` share a constructor, or `None`
    /// when they cannot unify.
    fn structural_pairs(&self, a: TypeId, b: TypeId) -> Option<Vec<(TypeId, TypeId)>> {
        let pairs = match (self.kind(a), self.kind(b)) {
            (TyKind::Void, TyKind::Void)
            | (TyKind::Unit, TyKind::Unit)
            | (TyKind::Bool, TyKind::Bool)
            | (TyKind::Char, TyKind::Char)
            | (TyKind::String, TyKind::String)
            | (TyKind::Unknown, TyKind::Unknown)
            | (TyKind::Any, TyKind::Any) => Vec::new(),

            (TyKind::Int { width: w1, sign: s1 }, TyKind::Int { width: w2, sign: s2 })
                if w1 == w2 && s1 == s2 =>
            {
                Vec::new()
            }
            (TyKind::Float(p1), TyKind::Float(p2)) if p1 == p2 => Vec::new(),

            (TyKind::Array { elem: e1, size: s1 }, TyKind::Array { elem: e2, size: s2 })
                if s1 == s2 =>
            {
                vec![(*e1, *e2)]
            }
            (TyKind::Slice(e1), TyKind::Slice(e2)) => vec![(*e1, *e2)],
            (TyKind::Tuple(x), TyKind::Tuple(y)) if x.len() == y.len() => {
                x.iter().copied().zip(y.iter().copied()).collect()
            }

            (TyKind::Struct(d1), TyKind::Struct(d2)) if d1.key == d2.key => Vec::new(),
            (TyKind::Enum(d1), TyKind::Enum(d2)) if d1.key == d2.key => Vec::new(),

            (TyKind::Function(f1), TyKind::Function(f2)) if f1.params.len() == f2.params.len() => {
                let mut pairs: Vec<_> = f1
                    .params
                    .iter()
                    .copied()
                    .zip(f2.params.iter().copied())
                    .collect();
                pairs.push((f1.ret, f2.ret));
                pairs
            }

            (
                TyKind::Reference {
                    inner: i1,
                    mutability: m1,
                    ..
                },
                TyKind::Reference {
                    inner: i2,
                    mutability: m2,
                    ..
                },
            ) if m1 == m2 => vec![(*i1, *i2)],
            (TyKind::Channel { elem: e1, .. }, TyKind::Channel { elem: e2, .. }) => {
                vec![(*e1, *e2)]
            }

            (TyKind::Param { name: n1, .. }, TyKind::Param { name: n2, .. }) if n1 == n2 => {
                Vec::new()
            }
            (TyKind::TraitObject { trait_id: t1, .. }, TyKind::TraitObject { trait_id: t2, .. })
                if t1 == t2 =>
            {
                Vec::new()
            }

            _ => return None,
        };
        Some(pairs)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{TypeConstraint, TypeContext};
    use crate::infer::UnifyError;
    use crate::types::{ArraySize, IntWidth, Mutability, NominalKey, Signedness};
    use tessera_mem::Symbol;
    use tessera_syntax::{FileId, Span};

    #[test]
    fn test_unify_var_with_concrete() {
        let mut ctx = TypeContext::new();
        let var = ctx.fresh_var();
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        assert!(ctx.unify(var, i32_ty));
        assert_eq!(ctx.resolve(var), i32_ty);
    }

    #[test]
    fn test_var_var_binds_first_to_second() {
        let mut ctx = TypeContext::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        assert!(ctx.unify(a, b));
        assert_eq!(ctx.resolve(a), b);
        let vb = ctx.as_var(b).expect("var");
        assert!(!ctx.var(vb).is_resolved());
    }

    #[test]
    fn test_var_var_transfers_constraints() {
        let mut ctx = TypeContext::new();
        let tr = ctx.declare_trait(Symbol::new(40));
        let a = ctx.fresh_var_with(vec![TypeConstraint::Implements(tr)]);
        let b = ctx.fresh_var();
        assert!(ctx.unify(a, b));

        // `b` now carries the bound, so a non-implementing type is rejected.
        let bool_ty = ctx.bool_ty();
        assert!(!ctx.unify(b, bool_ty));
        assert_eq!(ctx.resolve(b), b);
    }

    #[test]
    fn test_constraint_violation_leaves_var_unresolved() {
        let mut ctx = TypeContext::new();
        let i16_ty = ctx.int(IntWidth::W16, Signedness::Signed);
        let var = ctx.fresh_var_with(vec![TypeConstraint::SubtypeOf(i16_ty)]);
        let i64_ty = ctx.int(IntWidth::W64, Signedness::Signed);
        assert_eq!(
            ctx.try_unify(var, i64_ty),
            Err(UnifyError::SubtypeConstraint {
                ty: i64_ty,
                bound: i16_ty
            })
        );
        assert_eq!(ctx.resolve(var), var);

        let i8_ty = ctx.int(IntWidth::W8, Signedness::Signed);
        assert!(ctx.unify(var, i8_ty));
    }

    #[test]
    fn test_failed_tuple_rolls_back_earlier_bindings() {
        let mut ctx = TypeContext::new();
        let v = ctx.fresh_var();
        let bool_ty = ctx.bool_ty();
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        let string = ctx.string();
        let left = ctx.tuple(vec![v, bool_ty]);
        let right = ctx.tuple(vec![i32_ty, string]);

        assert!(!ctx.unify(left, right));
        assert_eq!(ctx.resolve(v), v);
    }

    #[test]
    fn test_occurs_check() {
        let mut ctx = TypeContext::new();
        let v = ctx.fresh_var();
        let slice = ctx.slice(v);
        assert!(matches!(ctx.try_unify(v, slice), Err(UnifyError::Occurs { .. })));
        assert_eq!(ctx.resolve(v), v);
    }

    #[test]
    fn test_ints_need_same_width_and_sign() {
        let mut ctx = TypeContext::new();
        let a = ctx.int(IntWidth::W32, Signedness::Signed);
        let b = ctx.int(IntWidth::W64, Signedness::Signed);
        let c = ctx.int(IntWidth::W32, Signedness::Unsigned);
        assert!(!ctx.unify(a, b));
        assert!(!ctx.unify(a, c));
        assert!(ctx.unify(a, a));
    }

    #[test]
    fn test_arrays_compare_size() {
        let mut ctx = TypeContext::new();
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        let a = ctx.array(i32_ty, ArraySize::Fixed(3));
        let b = ctx.array(i32_ty, ArraySize::Fixed(4));
        let c = ctx.array(i32_ty, ArraySize::Fixed(3));
        assert!(!ctx.unify(a, b));
        assert!(ctx.unify(a, c));
    }

    #[test]
    fn test_reference_mutability_must_match() {
        let mut ctx = TypeContext::new();
        let v = ctx.fresh_var();
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        let r = ctx.reference(v, None, Mutability::Immutable);
        let rm = ctx.reference(i32_ty, None, Mutability::Mutable);
        let ri = ctx.reference(i32_ty, None, Mutability::Immutable);
        assert!(!ctx.unify(r, rm));
        assert!(ctx.unify(r, ri));
        assert_eq!(ctx.resolve(v), i32_ty);
    }

    #[test]
    fn test_function_unify_binds_params_and_return() {
        let mut ctx = TypeContext::new();
        let p = ctx.fresh_var();
        let r = ctx.fresh_var();
        let bool_ty = ctx.bool_ty();
        let char_ty = ctx.char_ty();
        let f1 = ctx.function(vec![p], r, false, false);
        let f2 = ctx.function(vec![bool_ty], char_ty, true, false);
        assert!(ctx.unify(f1, f2));
        assert_eq!(ctx.resolve(p), bool_ty);
        assert_eq!(ctx.resolve(r), char_ty);

        let f3 = ctx.function(vec![], char_ty, false, false);
        assert!(!ctx.unify(f2, f3));
    }

    #[test]
    fn test_nominal_unify_by_key() {
        let mut ctx = TypeContext::new();
        let name = Symbol::new(40);
        let a = ctx.struct_type(
            NominalKey {
                name,
                site: Span::new(FileId(0), 1, 1, 1),
            },
            false,
        );
        let b = ctx.struct_type(
            NominalKey {
                name,
                site: Span::new(FileId(0), 5, 1, 1),
            },
            false,
        );
        assert!(!ctx.unify(a, b));
        assert!(ctx.unify(a, a));
    }

    #[test]
    fn test_error_and_never_unify_with_anything() {
        let mut ctx = TypeContext::new();
        let bool_ty = ctx.bool_ty();
        let string = ctx.string();
        let tuple = ctx.tuple(vec![bool_ty, string]);
        let error = ctx.error();
        let never = ctx.never();
        assert!(ctx.unify(error, tuple));
        assert!(ctx.unify(tuple, never));

        let v = ctx.fresh_var();
        assert!(ctx.unify(v, error));
        assert_eq!(ctx.resolve(v), error);

        // constraints do not apply to the bottom type
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        let w = ctx.fresh_var_with(vec![TypeConstraint::Equals(i32_ty)]);
        assert!(ctx.unify(never, w));
        assert_eq!(ctx.resolve(w), never);
    }

    #[test]
    fn test_equals_constraint() {
        let mut ctx = TypeContext::new();
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        let i64_ty = ctx.int(IntWidth::W64, Signedness::Signed);
        let slice = ctx.slice(i32_ty);
        let same_slice = ctx.slice(i32_ty);

        let v = ctx.fresh_var_with(vec![TypeConstraint::Equals(slice)]);
        let wider = ctx.slice(i64_ty);
        assert_eq!(
            ctx.try_unify(v, wider),
            Err(UnifyError::EqualsConstraint {
                ty: wider,
                expected: slice
            })
        );
        assert_eq!(ctx.resolve(v), v);
        assert!(ctx.unify(v, same_slice));
        assert_eq!(ctx.resolve(v), same_slice);
    }

    #[test]
    fn test_in_region_constraint() {
        let mut ctx = TypeContext::new();
        ctx.enter_scope();
        let outer = ctx.create_lifetime(None, false);
        let owner = ctx.create_region(Symbol::new(60), outer, false);
        ctx.enter_scope();
        let inner = ctx.create_lifetime(None, false);

        let bool_ty = ctx.bool_ty();
        let short_ref = ctx.reference(bool_ty, Some(inner), Mutability::Immutable);
        let long_ref = ctx.reference(bool_ty, Some(outer), Mutability::Immutable);
        let static_lt = ctx.static_lifetime();
        let static_ref = ctx.reference(bool_ty, Some(static_lt), Mutability::Immutable);

        let v = ctx.fresh_var_with(vec![TypeConstraint::InRegion(owner)]);
        assert_eq!(
            ctx.try_unify(v, short_ref),
            Err(UnifyError::RegionConstraint {
                ty: short_ref,
                lifetime: outer
            })
        );
        assert!(ctx.unify(v, long_ref));

        let w = ctx.fresh_var_with(vec![TypeConstraint::InRegion(owner)]);
        assert!(ctx.unify(w, static_ref));
    }

    #[test]
    fn test_outlives_constraint() {
        let mut ctx = TypeContext::new();
        ctx.enter_scope();
        let outer = ctx.create_lifetime(None, false);
        ctx.enter_scope();
        let inner = ctx.create_lifetime(None, false);

        let bool_ty = ctx.bool_ty();
        let short_ref = ctx.reference(bool_ty, Some(inner), Mutability::Immutable);
        let long_ref = ctx.reference(bool_ty, Some(outer), Mutability::Immutable);

        let v = ctx.fresh_var_with(vec![TypeConstraint::Outlives(outer)]);
        assert!(matches!(
            ctx.try_unify(v, short_ref),
            Err(UnifyError::RegionConstraint { .. })
        ));
        assert!(ctx.unify(v, long_ref));

        let w = ctx.fresh_var_with(vec![TypeConstraint::Outlives(outer)]);
        assert!(ctx.unify(w, bool_ty));
    }

    #[test]
    fn test_unify_is_idempotent_after_success() {
        let mut ctx = TypeContext::new();
        let v = ctx.fresh_var();
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        let bool_ty = ctx.bool_ty();
        assert!(ctx.unify(v, i32_ty));
        assert!(ctx.unify(v, i32_ty));
        assert!(!ctx.unify(v, bool_ty));
        assert_eq!(ctx.resolve(v), i32_ty);
    }
}
