//! Variance-aware subtyping.
//!
//! `is_subtype` is a pure query: it never binds variables. Each constructor
//! relates its children with a fixed [`Variance`]:
//!
//! | constructor      | child        | variance      |
//! |------------------|--------------|---------------|
//! | `[T; N]`         | `T`          | invariant     |
//! | `[T]`            | `T`          | covariant     |
//! | `&T`             | `T`          | covariant     |
//! | `&mut T`         | `T`          | invariant     |
//! | `fn(P) -> R`     | `P`          | contravariant |
//! | `fn(P) -> R`     | `R`          | covariant     |
//!
//! Integers widen within one signedness, floats widen `f32` to `f64`. `any`
//! is the top, `never` the bottom, and a `dyn Trait` supertype accepts every
//! implementor.

use crate::context::TypeContext;
use crate::types::{TyKind, TypeId};

/// How a constructor relates one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    /// `C<A> <: C<B>` if `A <: B`
    Covariant,
    /// `C<A> <: C<B>` if `B <: A`
    Contravariant,
    /// `C<A> <: C<B>` if `A = B`
    Invariant,
}

impl Variance {
    /// Variance seen through a contravariant position.
    #[must_use]
    pub const fn flip(self) -> Variance {
        match self {
            Variance::Covariant => Variance::Contravariant,
            Variance::Contravariant => Variance::Covariant,
            Variance::Invariant => Variance::Invariant,
        }
    }
}

impl TypeContext {
    /// Whether a value of `sub` may be used where `sup` is expected.
    #[must_use]
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        let sub = self.resolve(sub);
        let sup = self.resolve(sup);
        if self.types_equal(sub, sup) {
            return true;
        }

        match (self.kind(sub), self.kind(sup)) {
            (_, TyKind::Any) | (TyKind::Never, _) => true,

            (
                TyKind::TraitObject { trait_id: t1, .. },
                TyKind::TraitObject { trait_id: t2, .. },
            ) => {
                self.trait_is_or_extends(*t1, *t2)
            }
            (_, TyKind::TraitObject { trait_id, .. }) => self.implements(sub, *trait_id),

            (TyKind::Int { width: w1, sign: s1 }, TyKind::Int { width: w2, sign: s2 }) => {
                s1 == s2 && w1 <= w2
            }
            (TyKind::Float(p1), TyKind::Float(p2)) => p1 <= p2,

            (TyKind::Array { elem: e1, size: s1 }, TyKind::Array { elem: e2, size: s2 }) => {
                s1 == s2 && self.relate(*e1, *e2, Variance::Invariant)
            }
            (TyKind::Slice(e1), TyKind::Slice(e2)) => self.relate(*e1, *e2, Variance::Covariant),

            (
                TyKind::Reference {
                    inner: i1,
                    lifetime: l1,
                    mutability: m1,
                },
                TyKind::Reference {
                    inner: i2,
                    lifetime: l2,
                    mutability: m2,
                },
            ) => {
                if m1 != m2 {
                    return false;
                }
                if let (Some(l1), Some(l2)) = (l1, l2) {
                    if !self.lifetime_outlives(*l1, *l2) {
                        return false;
                    }
                }
                let variance = if m1.is_mut() {
                    Variance::Invariant
                } else {
                    Variance::Covariant
                };
                self.relate(*i1, *i2, variance)
            }

            (TyKind::Function(f1), TyKind::Function(f2)) => {
                f1.params.len() == f2.params.len()
                    && (!f1.is_unsafe || f2.is_unsafe)
                    && (!f1.is_kernel || f2.is_kernel)
                    && f1
                        .params
                        .iter()
                        .zip(&f2.params)
                        .all(|(p1, p2)| self.relate(*p1, *p2, Variance::Contravariant))
                    && self.relate(f1.ret, f2.ret, Variance::Covariant)
            }

            _ => false,
        }
    }

    /// Relates `sub` to `sup` under `variance`.
    #[must_use]
    pub fn relate(&self, sub: TypeId, sup: TypeId, variance: Variance) -> bool {
        match variance {
            Variance::Covariant => self.is_subtype(sub, sup),
            Variance::Contravariant => self.is_subtype(sup, sub),
            Variance::Invariant => self.types_equal(sub, sup),
        }
    }
}
