//! Trait definitions and implementation registration.
//!
//! Traits live in the context's trait arena. Implementations are recorded on
//! the implementing struct's [`StructDef::impls`](crate::types::StructDef) so
//! that resolution can walk them from the type side.

use crate::context::TypeContext;
use crate::types::{TyKind, TypeId, TypeImpl};
use fxhash::FxHashMap;
use tessera_log::debug;
use tessera_mem::{Idx, Symbol, kw};

/// Handle to a trait.
pub type TraitId = Idx<Trait>;

/// A method required by a trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitMethod {
    /// Method name
    pub name: Symbol,
    /// Function type; parameters exclude the receiver, `Self` appears as a
    /// generic parameter named `Self`
    pub signature: TypeId,
}

/// A named trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trait {
    /// Trait name
    pub name: Symbol,
    /// Generic parameters of the trait itself
    pub type_params: Vec<Symbol>,
    /// Required methods
    pub methods: Vec<TraitMethod>,
    /// Directly inherited traits
    pub super_traits: Vec<TraitId>,
}

impl Trait {
    /// Looks up a required method.
    #[must_use]
    pub fn method(&self, name: Symbol) -> Option<&TraitMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl TypeContext {
    /// Declares an empty trait.
    pub fn declare_trait(&mut self, name: Symbol) -> TraitId {
        self.traits.alloc(Trait {
            name,
            type_params: Vec::new(),
            methods: Vec::new(),
            super_traits: Vec::new(),
        })
    }

    /// Trait data.
    #[must_use]
    pub fn trait_def(&self, id: TraitId) -> &Trait {
        &self.traits[id]
    }

    /// Number of declared traits.
    #[must_use]
    pub fn trait_count(&self) -> usize {
        self.traits.len()
    }

    /// Adds a required method.
    pub fn add_trait_method(&mut self, id: TraitId, name: Symbol, signature: TypeId) {
        self.traits[id].methods.push(TraitMethod { name, signature });
    }

    /// Adds a direct super-trait. Self-inheritance is ignored.
    pub fn add_super_trait(&mut self, id: TraitId, super_trait: TraitId) {
        if id == super_trait || self.traits[id].super_traits.contains(&super_trait) {
            return;
        }
        self.traits[id].super_traits.push(super_trait);
    }

    /// Adds a generic parameter to the trait.
    pub fn add_trait_type_param(&mut self, id: TraitId, param: Symbol) {
        self.traits[id].type_params.push(param);
    }

    /// Whether `sub` is `sup` or lists it as a direct super-trait.
    #[must_use]
    pub fn trait_is_or_extends(&self, sub: TraitId, sup: TraitId) -> bool {
        sub == sup || self.traits[sub].super_traits.contains(&sup)
    }

    /// Records that struct `ty` implements `trait_id`.
    ///
    /// Returns `false` if `ty` does not resolve to a struct.
    pub fn add_impl(
        &mut self,
        ty: TypeId,
        trait_id: TraitId,
        type_args: Vec<TypeId>,
        methods: Vec<Symbol>,
    ) -> bool {
        let ty = self.resolve(ty);
        let TyKind::Struct(def) = &mut self.types[ty].kind else {
            return false;
        };
        debug!(
            "impl trait {} for struct {} ({} methods)",
            trait_id.into_raw(),
            def.key.name.as_u32(),
            methods.len()
        );
        def.impls.push(TypeImpl {
            trait_id,
            type_args,
            methods,
        });
        true
    }

    /// The trait's methods with `Self` replaced by `self_ty` and the trait's
    /// own type parameters replaced by `args`, positionally.
    ///
    /// Parameters without a matching argument are left as is.
    pub fn instantiate_trait_methods(
        &mut self,
        id: TraitId,
        self_ty: TypeId,
        args: &[TypeId],
    ) -> Vec<TraitMethod> {
        let def = &self.traits[id];
        let mut map = FxHashMap::default();
        map.insert(kw::SELF_TYPE, self_ty);
        for (param, arg) in def.type_params.iter().zip(args) {
            map.insert(*param, *arg);
        }
        let methods = def.methods.clone();
        methods
            .into_iter()
            .map(|m| TraitMethod {
                name: m.name,
                signature: self.substitute(m.signature, &map),
            })
            .collect()
    }
}
