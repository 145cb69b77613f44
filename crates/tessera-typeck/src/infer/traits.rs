//! Trait implementation queries.
//!
//! Only a type's own implementation list and the first level of super-traits
//! are searched; there is no transitive closure and no blanket impls.

use crate::context::{TraitId, TypeConstraint, TypeContext};
use crate::types::{TyKind, TypeId};

impl TypeContext {
    /// Whether `ty` implements `trait_id`, with the implementation's type
    /// arguments when it does.
    ///
    /// - Unresolved variable: an `Implements(trait_id)` constraint is attached
    /// - Struct: an impl of `trait_id`, or of a trait that directly extends it
    /// - Generic parameter: a bound that is or directly extends `trait_id`
    /// - Trait object: its trait is or directly extends `trait_id`
    /// - `error` and `never` implement everything
    #[must_use]
    pub fn type_implements_trait(&self, ty: TypeId, trait_id: TraitId) -> Option<Vec<TypeId>> {
        let ty = self.resolve(ty);
        match self.kind(ty) {
            TyKind::Var(var) => self
                .var(*var)
                .constraints
                .contains(&TypeConstraint::Implements(trait_id))
                .then(Vec::new),
            TyKind::Struct(def) => def
                .impls
                .iter()
                .find(|imp| imp.trait_id == trait_id)
                .or_else(|| {
                    def.impls
                        .iter()
                        .find(|imp| self.trait_is_or_extends(imp.trait_id, trait_id))
                })
                .map(|imp| imp.type_args.clone()),
            TyKind::Param { bounds, .. } => bounds
                .iter()
                .any(|bound| self.trait_is_or_extends(*bound, trait_id))
                .then(Vec::new),
            TyKind::TraitObject { trait_id: own, .. } => {
                self.trait_is_or_extends(*own, trait_id).then(Vec::new)
            }
            TyKind::Error | TyKind::Never => Some(Vec::new()),
            _ => None,
        }
    }

    /// Boolean form of [`TypeContext::type_implements_trait`].
    #[must_use]
    pub fn implements(&self, ty: TypeId, trait_id: TraitId) -> bool {
        self.type_implements_trait(ty, trait_id).is_some()
    }

    /// Whether struct `ty` already has an impl of exactly `trait_id`.
    #[must_use]
    pub fn has_direct_impl(&self, ty: TypeId, trait_id: TraitId) -> bool {
        self.struct_def(ty)
            .is_some_and(|def| def.impls.iter().any(|imp| imp.trait_id == trait_id))
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{TypeConstraint, TypeContext};
    use crate::types::{NominalKey, TypeId};
    use tessera_mem::Symbol;
    use tessera_syntax::{FileId, Span};

    fn structure(ctx: &mut TypeContext, raw: u32) -> TypeId {
        ctx.struct_type(
            NominalKey {
                name: Symbol::new(raw),
                site: Span::new(FileId(0), raw, 1, 1),
            },
            false,
        )
    }

    #[test]
    fn test_struct_with_impl() {
        let mut ctx = TypeContext::new();
        let show = ctx.declare_trait(Symbol::new(40));
        let point = structure(&mut ctx, 41);
        let other = structure(&mut ctx, 42);
        ctx.add_impl(point, show, vec![], vec![]);

        assert!(ctx.implements(point, show));
        assert!(!ctx.implements(other, show));
        assert!(ctx.has_direct_impl(point, show));
    }

    #[test]
    fn test_super_trait_impl_satisfies_base() {
        let mut ctx = TypeContext::new();
        let base = ctx.declare_trait(Symbol::new(40));
        let derived = ctx.declare_trait(Symbol::new(41));
        ctx.add_super_trait(derived, base);
        let point = structure(&mut ctx, 42);
        ctx.add_impl(point, derived, vec![], vec![]);

        assert!(ctx.implements(point, base));
        assert!(ctx.implements(point, derived));
        assert!(!ctx.has_direct_impl(point, base));
    }

    #[test]
    fn test_only_first_level_super_traits() {
        let mut ctx = TypeContext::new();
        let a = ctx.declare_trait(Symbol::new(40));
        let b = ctx.declare_trait(Symbol::new(41));
        let c = ctx.declare_trait(Symbol::new(42));
        ctx.add_super_trait(b, a);
        ctx.add_super_trait(c, b);
        let point = structure(&mut ctx, 43);
        ctx.add_impl(point, c, vec![], vec![]);

        assert!(ctx.implements(point, b));
        assert!(!ctx.implements(point, a));
    }

    #[test]
    fn test_impl_type_args_returned() {
        let mut ctx = TypeContext::new();
        let from = ctx.declare_trait(Symbol::new(40));
        ctx.add_trait_type_param(from, Symbol::new(41));
        let point = structure(&mut ctx, 42);
        let string = ctx.string();
        ctx.add_impl(point, from, vec![string], vec![]);

        assert_eq!(ctx.type_implements_trait(point, from), Some(vec![string]));
    }

    #[test]
    fn test_variables_use_constraints() {
        let mut ctx = TypeContext::new();
        let show = ctx.declare_trait(Symbol::new(40));
        let bounded = ctx.fresh_var_with(vec![TypeConstraint::Implements(show)]);
        let free = ctx.fresh_var();
        assert!(ctx.implements(bounded, show));
        assert!(!ctx.implements(free, show));

        let point = structure(&mut ctx, 41);
        ctx.add_impl(point, show, vec![], vec![]);
        let other = ctx.declare_trait(Symbol::new(42));
        assert!(ctx.unify(free, point));
        assert!(ctx.implements(free, show));
        assert!(!ctx.implements(free, other));
    }

    #[test]
    fn test_primitives_implement_nothing() {
        let mut ctx = TypeContext::new();
        let show = ctx.declare_trait(Symbol::new(40));
        assert!(!ctx.implements(ctx.bool_ty(), show));
        assert!(ctx.implements(ctx.error(), show));
    }
}
