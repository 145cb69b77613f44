//! Type context and environment management.
//!
//! - [`TypeContext`]: owns every type, type variable, trait, lifetime and
//!   region of one compilation unit, plus the lexical scope depth
//! - [`var`]: type variables, constraints and the undo trail
//! - [`traits`]: trait definitions and implementation registration
//! - [`env`]: scoped symbol table
//!
//! Everything a context allocates is dropped with it; ids from one context
//! are meaningless in another.

pub mod env;
pub mod traits;
pub mod var;

pub use env::{Binding, BindingKind, SymbolTable};
pub use traits::{Trait, TraitId, TraitMethod};
pub use var::{Snapshot, TypeConstraint, TypeVariable, VarId};

use crate::region::{BorrowError, Lifetime, LifetimeId, Region, RegionId, RegionTracker};
use crate::types::{
    ArraySize, DisplayTy, EnumDef, FieldDef, FloatPrecision, FnSig, IntWidth, Mutability,
    NominalKey, Signedness, StructDef, TyKind, Type, TypeId, TypeProps, VariantDef,
};
use fxhash::FxHashMap;
use tessera_log::trace;
use tessera_mem::{Arena, StringInterner, Symbol};
use var::{Trail, UndoEntry};

/// Pre-allocated primitive and sentinel types.
#[derive(Debug, Clone, Copy)]
struct CommonTypes {
    void: TypeId,
    unit: TypeId,
    bool: TypeId,
    char: TypeId,
    string: TypeId,
    ints: [[TypeId; 5]; 2],
    f32: TypeId,
    f64: TypeId,
    error: TypeId,
    never: TypeId,
    unknown: TypeId,
    any: TypeId,
}

/// Owner of all types, variables, traits, lifetimes and regions for one
/// checking session.
#[derive(Debug)]
pub struct TypeContext {
    pub(crate) types: Arena<Type>,
    pub(crate) vars: Arena<TypeVariable>,
    pub(crate) traits: Arena<Trait>,
    pub(crate) regions: RegionTracker,
    pub(crate) trail: Trail,
    common: CommonTypes,
    scope_depth: u32,
    self_type: Option<TypeId>,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    /// Creates a context with the primitive types pre-allocated.
    #[must_use]
    pub fn new() -> Self {
        let mut types = Arena::with_capacity(64);
        let mut leaf = |kind: TyKind| {
            let props = kind.leaf_props().unwrap_or(TypeProps::PLAIN);
            types.alloc(Type { kind, props })
        };

        let void = leaf(TyKind::Void);
        let unit = leaf(TyKind::Unit);
        let bool = leaf(TyKind::Bool);
        let char = leaf(TyKind::Char);
        let string = leaf(TyKind::String);
        let mut ints = [[void; 5]; 2];
        for sign in [Signedness::Signed, Signedness::Unsigned] {
            for width in IntWidth::ALL {
                ints[sign.index()][width.index()] = leaf(TyKind::Int { width, sign });
            }
        }
        let f32 = leaf(TyKind::Float(FloatPrecision::F32));
        let f64 = leaf(TyKind::Float(FloatPrecision::F64));
        let error = leaf(TyKind::Error);
        let never = leaf(TyKind::Never);
        let unknown = leaf(TyKind::Unknown);
        let any = leaf(TyKind::Any);

        Self {
            types,
            vars: Arena::new(),
            traits: Arena::new(),
            regions: RegionTracker::new(),
            trail: Trail::new(),
            common: CommonTypes {
                void,
                unit,
                bool,
                char,
                string,
                ints,
                f32,
                f64,
                error,
                never,
                unknown,
                any,
            },
            scope_depth: 0,
            self_type: None,
        }
    }

    // ---- access ----

    /// The type behind an id.
    #[must_use]
    pub fn get(&self, ty: TypeId) -> &Type {
        &self.types[ty]
    }

    /// The constructor of a type, without following variables.
    #[must_use]
    pub fn kind(&self, ty: TypeId) -> &TyKind {
        &self.types[ty].kind
    }

    /// Derived properties of a type.
    #[must_use]
    pub fn props(&self, ty: TypeId) -> TypeProps {
        self.types[ty].props
    }

    /// Number of types allocated so far.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Pretty-printer for a type.
    #[must_use]
    pub fn display<'a>(&'a self, ty: TypeId, interner: &'a StringInterner) -> DisplayTy<'a> {
        DisplayTy::new(self, ty, interner)
    }

    // ---- primitives and sentinels ----

    /// `void`
    #[must_use]
    pub fn void(&self) -> TypeId {
        self.common.void
    }

    /// `()`
    #[must_use]
    pub fn unit(&self) -> TypeId {
        self.common.unit
    }

    /// `bool`
    #[must_use]
    pub fn bool_ty(&self) -> TypeId {
        self.common.bool
    }

    /// `char`
    #[must_use]
    pub fn char_ty(&self) -> TypeId {
        self.common.char
    }

    /// `string`
    #[must_use]
    pub fn string(&self) -> TypeId {
        self.common.string
    }

    /// `iN` / `uN`
    #[must_use]
    pub fn int(&self, width: IntWidth, sign: Signedness) -> TypeId {
        self.common.ints[sign.index()][width.index()]
    }

    /// `f32` / `f64`
    #[must_use]
    pub fn float(&self, precision: FloatPrecision) -> TypeId {
        match precision {
            FloatPrecision::F32 => self.common.f32,
            FloatPrecision::F64 => self.common.f64,
        }
    }

    /// Error sentinel.
    #[must_use]
    pub fn error(&self) -> TypeId {
        self.common.error
    }

    /// Bottom sentinel.
    #[must_use]
    pub fn never(&self) -> TypeId {
        self.common.never
    }

    /// Unknown sentinel.
    #[must_use]
    pub fn unknown(&self) -> TypeId {
        self.common.unknown
    }

    /// Top sentinel.
    #[must_use]
    pub fn any(&self) -> TypeId {
        self.common.any
    }

    // ---- constructors ----

    /// Allocates a type, computing its properties from its children.
    pub(crate) fn alloc(&mut self, kind: TyKind) -> TypeId {
        let props = self.compute_props(&kind);
        self.types.alloc(Type { kind, props })
    }

    fn compute_props(&self, kind: &TyKind) -> TypeProps {
        if let Some(props) = kind.leaf_props() {
            return props;
        }
        let intrinsic = match kind {
            TyKind::Struct(def) => def.is_capability,
            TyKind::Function(sig) => sig.is_kernel,
            _ => false,
        };
        let base = TypeProps {
            capability: intrinsic,
            ..TypeProps::PLAIN
        };
        kind.children()
            .into_iter()
            .fold(base, |acc, child| acc.join(self.types[child].props))
    }

    /// `[elem; size]`
    pub fn array(&mut self, elem: TypeId, size: ArraySize) -> TypeId {
        self.alloc(TyKind::Array { elem, size })
    }

    /// `[elem]`
    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.alloc(TyKind::Slice(elem))
    }

    /// `(elems..)`
    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.alloc(TyKind::Tuple(elems))
    }

    /// Declares a struct with no fields yet; see [`TypeContext::define_struct_fields`].
    pub fn struct_type(&mut self, key: NominalKey, is_capability: bool) -> TypeId {
        self.alloc(TyKind::Struct(StructDef {
            key,
            fields: Vec::new(),
            impls: Vec::new(),
            methods: Vec::new(),
            is_capability,
        }))
    }

    /// Sets a struct's fields and recomputes its properties.
    ///
    /// Fields may refer to the struct itself. Does nothing for non-structs.
    pub fn define_struct_fields(&mut self, ty: TypeId, fields: Vec<FieldDef>) {
        if let TyKind::Struct(def) = &mut self.types[ty].kind {
            def.fields = fields;
        } else {
            return;
        }
        let props = self.compute_props(&self.types[ty].kind);
        self.types[ty].props = props;
    }

    /// Declares an enum with no variants yet; see [`TypeContext::define_enum_variants`].
    pub fn enum_type(&mut self, key: NominalKey) -> TypeId {
        self.alloc(TyKind::Enum(EnumDef {
            key,
            variants: Vec::new(),
        }))
    }

    /// Sets an enum's variants and recomputes its properties.
    pub fn define_enum_variants(&mut self, ty: TypeId, variants: Vec<VariantDef>) {
        if let TyKind::Enum(def) = &mut self.types[ty].kind {
            def.variants = variants;
        } else {
            return;
        }
        let props = self.compute_props(&self.types[ty].kind);
        self.types[ty].props = props;
    }

    /// Adds a method to a struct's method table. Returns `false` for non-structs.
    pub fn add_struct_method(&mut self, ty: TypeId, name: Symbol, method: TypeId) -> bool {
        match &mut self.types[ty].kind {
            TyKind::Struct(def) => {
                def.methods.push((name, method));
                true
            }
            _ => false,
        }
    }

    /// Struct metadata, if `ty` resolves to a struct.
    #[must_use]
    pub fn struct_def(&self, ty: TypeId) -> Option<&StructDef> {
        match self.kind(self.resolve(ty)) {
            TyKind::Struct(def) => Some(def),
            _ => None,
        }
    }

    /// Enum metadata, if `ty` resolves to an enum.
    #[must_use]
    pub fn enum_def(&self, ty: TypeId) -> Option<&EnumDef> {
        match self.kind(self.resolve(ty)) {
            TyKind::Enum(def) => Some(def),
            _ => None,
        }
    }

    /// `fn(params) -> ret`
    pub fn function(
        &mut self,
        params: Vec<TypeId>,
        ret: TypeId,
        is_unsafe: bool,
        is_kernel: bool,
    ) -> TypeId {
        self.alloc(TyKind::Function(FnSig {
            params,
            ret,
            is_unsafe,
            is_kernel,
        }))
    }

    /// `&inner`, `&mut inner`, `&'a inner`
    pub fn reference(
        &mut self,
        inner: TypeId,
        lifetime: Option<LifetimeId>,
        mutability: Mutability,
    ) -> TypeId {
        self.alloc(TyKind::Reference {
            inner,
            lifetime,
            mutability,
        })
    }

    /// `chan<elem, capacity>` or `dchan<..>`
    pub fn channel(&mut self, elem: TypeId, capacity: u32, distributed: bool) -> TypeId {
        self.alloc(TyKind::Channel {
            elem,
            capacity,
            distributed,
        })
    }

    /// Generic parameter `name: bounds`.
    pub fn param(&mut self, name: Symbol, bounds: Vec<TraitId>) -> TypeId {
        self.alloc(TyKind::Param { name, bounds })
    }

    /// `dyn Trait`
    pub fn trait_object(&mut self, trait_id: TraitId, lifetime: Option<LifetimeId>) -> TypeId {
        self.alloc(TyKind::TraitObject { trait_id, lifetime })
    }

    // ---- type variables ----

    /// A fresh unconstrained type variable.
    pub fn fresh_var(&mut self) -> TypeId {
        self.fresh_var_with(Vec::new())
    }

    /// A fresh type variable carrying `constraints`.
    pub fn fresh_var_with(&mut self, constraints: Vec<TypeConstraint>) -> TypeId {
        let var = self.vars.next_idx();
        let ty = self.alloc(TyKind::Var(var));
        self.vars.alloc(TypeVariable {
            ty,
            resolution: None,
            constraints,
        });
        ty
    }

    /// The variable behind a `Var` type.
    #[must_use]
    pub fn as_var(&self, ty: TypeId) -> Option<VarId> {
        match self.kind(ty) {
            TyKind::Var(v) => Some(*v),
            _ => None,
        }
    }

    /// Variable data.
    #[must_use]
    pub fn var(&self, var: VarId) -> &TypeVariable {
        &self.vars[var]
    }

    /// Attaches a constraint to an unresolved variable.
    ///
    /// Returns `false` if `ty` is not a variable or is already resolved.
    pub fn add_constraint(&mut self, ty: TypeId, constraint: TypeConstraint) -> bool {
        let Some(var) = self.as_var(ty) else {
            return false;
        };
        if self.vars[var].is_resolved() {
            return false;
        }
        let len = self.vars[var].constraints.len();
        self.trail.record(UndoEntry::Constrain { var, len });
        self.vars[var].constraints.push(constraint);
        true
    }

    /// Records a variable's resolution. Callers guarantee it was unresolved.
    pub(crate) fn set_resolution(&mut self, var: VarId, ty: TypeId) {
        debug_assert!(self.vars[var].resolution.is_none());
        self.trail.record(UndoEntry::Resolve(var));
        self.vars[var].resolution = Some(ty);
    }

    /// Appends `from`'s constraints to `to`.
    pub(crate) fn transfer_constraints(&mut self, from: VarId, to: VarId) {
        if from == to || self.vars[from].constraints.is_empty() {
            return;
        }
        let moved = self.vars[from].constraints.clone();
        let len = self.vars[to].constraints.len();
        self.trail.record(UndoEntry::Constrain { var: to, len });
        self.vars[to].constraints.extend(moved);
    }

    // ---- transactions ----

    /// Opens a transaction over variable resolutions and constraints.
    pub fn snapshot(&mut self) -> Snapshot {
        self.trail.open()
    }

    /// Keeps everything done since `snapshot`.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.trail.commit(snapshot);
    }

    /// Undoes every resolution and constraint change since `snapshot`.
    pub fn rollback_to(&mut self, snapshot: Snapshot) {
        let undone = self.trail.rollback(snapshot);
        if !undone.is_empty() {
            trace!("rolling back {} variable changes", undone.len());
        }
        for entry in undone {
            match entry {
                UndoEntry::Resolve(var) => self.vars[var].resolution = None,
                UndoEntry::Constrain { var, len } => self.vars[var].constraints.truncate(len),
            }
        }
    }

    // ---- resolution ----

    /// Follows variable resolutions until reaching an unresolved variable or
    /// a non-variable type.
    #[must_use]
    pub fn resolve(&self, mut ty: TypeId) -> TypeId {
        while let TyKind::Var(var) = self.types[ty].kind {
            match self.vars[var].resolution {
                Some(next) => ty = next,
                None => break,
            }
        }
        ty
    }

    /// The resolved constructor of a type.
    #[must_use]
    pub fn resolved_kind(&self, ty: TypeId) -> &TyKind {
        self.kind(self.resolve(ty))
    }

    /// Rebuilds `ty` with every resolved variable replaced by its resolution.
    ///
    /// Unresolved variables and nominal types are kept as is.
    pub fn zonk(&mut self, ty: TypeId) -> TypeId {
        let ty = self.resolve(ty);
        self.map_children(ty, &mut |ctx, child| ctx.zonk(child))
    }

    /// Replaces generic parameters by name.
    pub fn substitute(&mut self, ty: TypeId, map: &FxHashMap<Symbol, TypeId>) -> TypeId {
        if map.is_empty() {
            return ty;
        }
        let ty = self.resolve(ty);
        if let TyKind::Param { name, .. } = self.kind(ty) {
            return map.get(name).copied().unwrap_or(ty);
        }
        self.map_children(ty, &mut |ctx, child| ctx.substitute(child, map))
    }

    /// Applies `f` to the children of a structural type, allocating a new
    /// type only when some child changed.
    fn map_children(
        &mut self,
        ty: TypeId,
        f: &mut dyn FnMut(&mut TypeContext, TypeId) -> TypeId,
    ) -> TypeId {
        if !self.kind(ty).is_structural() {
            return ty;
        }
        let children = self.kind(ty).children();
        let mut mapped = Vec::with_capacity(children.len());
        for &child in &children {
            mapped.push(f(self, child));
        }
        if mapped == children {
            return ty;
        }
        let kind = self.kind(ty).with_children(&mapped);
        self.alloc(kind)
    }

    /// Generic parameters occurring in `ty`, in first-occurrence order.
    #[must_use]
    pub fn collect_params(&self, ty: TypeId) -> Vec<(Symbol, Vec<TraitId>)> {
        let mut out: Vec<(Symbol, Vec<TraitId>)> = Vec::new();
        self.collect_params_into(ty, &mut out);
        out
    }

    fn collect_params_into(&self, ty: TypeId, out: &mut Vec<(Symbol, Vec<TraitId>)>) {
        let ty = self.resolve(ty);
        match self.kind(ty) {
            TyKind::Param { name, bounds } => {
                if !out.iter().any(|(n, _)| n == name) {
                    out.push((*name, bounds.clone()));
                }
            }
            kind if kind.is_structural() => {
                for child in kind.children() {
                    self.collect_params_into(child, out);
                }
            }
            _ => {}
        }
    }

    /// Replaces every generic parameter in `ty` with a fresh variable that
    /// must implement the parameter's bounds.
    pub fn instantiate(&mut self, ty: TypeId) -> TypeId {
        let params = self.collect_params(ty);
        if params.is_empty() {
            return ty;
        }
        let mut map = FxHashMap::default();
        for (name, bounds) in params {
            let constraints = bounds.into_iter().map(TypeConstraint::Implements).collect();
            let var = self.fresh_var_with(constraints);
            map.insert(name, var);
        }
        self.substitute(ty, &map)
    }

    /// Whether unresolved variable `var` occurs in `ty`.
    #[must_use]
    pub fn occurs(&self, var: VarId, ty: TypeId) -> bool {
        let ty = self.resolve(ty);
        match self.kind(ty) {
            TyKind::Var(v) => *v == var,
            kind if kind.is_structural() => {
                kind.children().into_iter().any(|c| self.occurs(var, c))
            }
            _ => false,
        }
    }

    /// Deep structural equality after resolution.
    ///
    /// Nominal types compare by key, unresolved variables by identity, and
    /// the error sentinel equals everything. Lifetimes are not compared.
    #[must_use]
    pub fn types_equal(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a == b {
            return true;
        }
        match (self.kind(a), self.kind(b)) {
            (TyKind::Error, _) | (_, TyKind::Error) => true,
            (TyKind::Void, TyKind::Void)
            | (TyKind::Unit, TyKind::Unit)
            | (TyKind::Bool, TyKind::Bool)
            | (TyKind::Char, TyKind::Char)
            | (TyKind::String, TyKind::String)
            | (TyKind::Never, TyKind::Never)
            | (TyKind::Unknown, TyKind::Unknown)
            | (TyKind::Any, TyKind::Any) => true,
            (TyKind::Int { width: w1, sign: s1 }, TyKind::Int { width: w2, sign: s2 }) => {
                w1 == w2 && s1 == s2
            }
            (TyKind::Float(p1), TyKind::Float(p2)) => p1 == p2,
            (TyKind::Array { elem: e1, size: s1 }, TyKind::Array { elem: e2, size: s2 }) => {
                s1 == s2 && self.types_equal(*e1, *e2)
            }
            (TyKind::Slice(e1), TyKind::Slice(e2)) => self.types_equal(*e1, *e2),
            (TyKind::Tuple(x), TyKind::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(p, q)| self.types_equal(*p, *q))
            }
            (TyKind::Struct(d1), TyKind::Struct(d2)) => d1.key == d2.key,
            (TyKind::Enum(d1), TyKind::Enum(d2)) => d1.key == d2.key,
            (TyKind::Function(f1), TyKind::Function(f2)) => {
                f1.is_unsafe == f2.is_unsafe
                    && f1.is_kernel == f2.is_kernel
                    && f1.params.len() == f2.params.len()
                    && f1.params.iter().zip(&f2.params).all(|(p, q)| self.types_equal(*p, *q))
                    && self.types_equal(f1.ret, f2.ret)
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
            ) => m1 == m2 && self.types_equal(*i1, *i2),
            (
                TyKind::Channel {
                    elem: e1,
                    capacity: c1,
                    distributed: d1,
                },
                TyKind::Channel {
                    elem: e2,
                    capacity: c2,
                    distributed: d2,
                },
            ) => c1 == c2 && d1 == d2 && self.types_equal(*e1, *e2),
            (TyKind::Param { name: n1, .. }, TyKind::Param { name: n2, .. }) => n1 == n2,
            (
                TyKind::TraitObject { trait_id: t1, .. },
                TyKind::TraitObject { trait_id: t2, .. },
            ) => t1 == t2,
            _ => false,
        }
    }

    // ---- scopes ----

    /// Current lexical scope depth; 0 at module level.
    #[must_use]
    pub fn scope_depth(&self) -> u32 {
        self.scope_depth
    }

    /// Enters a lexical scope.
    pub fn enter_scope(&mut self) {
        self.scope_depth += 1;
        self.regions.enter_scope();
    }

    /// Leaves the innermost scope, releasing the borrows it made.
    pub fn exit_scope(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        self.regions.exit_scope();
        self.scope_depth -= 1;
    }

    /// Opens a borrow frame without a new lexical scope, for borrows that
    /// end with the current statement.
    pub fn enter_borrow_frame(&mut self) {
        self.regions.enter_scope();
    }

    /// Releases the borrows made since the matching
    /// [`enter_borrow_frame`](Self::enter_borrow_frame).
    pub fn exit_borrow_frame(&mut self) {
        self.regions.exit_scope();
    }

    /// The type `self`/`Self` refers to, inside an impl.
    #[must_use]
    pub fn self_type(&self) -> Option<TypeId> {
        self.self_type
    }

    /// Sets or clears the `Self` type, returning the previous one.
    pub fn set_self_type(&mut self, ty: Option<TypeId>) -> Option<TypeId> {
        std::mem::replace(&mut self.self_type, ty)
    }

    // ---- lifetimes and regions ----

    /// Creates a lifetime at the current scope depth.
    pub fn create_lifetime(&mut self, name: Option<Symbol>, is_static: bool) -> LifetimeId {
        let depth = self.scope_depth;
        self.regions.create_lifetime(name, is_static, depth)
    }

    /// The shared `'static` lifetime.
    #[must_use]
    pub fn static_lifetime(&self) -> LifetimeId {
        self.regions.static_lifetime()
    }

    /// Creates a region owned by `lifetime`.
    pub fn create_region(
        &mut self,
        name: Symbol,
        lifetime: LifetimeId,
        is_mutable: bool,
    ) -> RegionId {
        self.regions.create_region(name, lifetime, is_mutable)
    }

    /// Lifetime data.
    #[must_use]
    pub fn lifetime(&self, id: LifetimeId) -> &Lifetime {
        self.regions.lifetime(id)
    }

    /// Region data.
    #[must_use]
    pub fn region(&self, id: RegionId) -> &Region {
        self.regions.region(id)
    }

    /// Whether `a` lives at least as long as `b`.
    #[must_use]
    pub fn lifetime_outlives(&self, a: LifetimeId, b: LifetimeId) -> bool {
        self.regions.lifetime_outlives(a, b)
    }

    /// Registers a borrow in the current scope.
    ///
    /// # Errors
    ///
    /// See [`RegionTracker::check_borrow`].
    pub fn check_borrow(
        &mut self,
        region: RegionId,
        mutability: Mutability,
    ) -> Result<(), BorrowError> {
        self.regions.check_borrow(region, mutability)
    }

    /// Ends a borrow early.
    ///
    /// # Errors
    ///
    /// See [`RegionTracker::release_borrow`].
    pub fn release_borrow(
        &mut self,
        region: RegionId,
        mutability: Mutability,
    ) -> Result<(), BorrowError> {
        self.regions.release_borrow(region, mutability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_syntax::{FileId, Span};

    fn key(raw: u32, line: u32) -> NominalKey {
        NominalKey {
            name: Symbol::new(raw),
            site: Span::new(FileId(0), line, 1, 1),
        }
    }

    #[test]
    fn test_primitives_are_shared() {
        let ctx = TypeContext::new();
        assert_eq!(
            ctx.int(IntWidth::W32, Signedness::Signed),
            ctx.int(IntWidth::W32, Signedness::Signed)
        );
        assert_ne!(
            ctx.int(IntWidth::W32, Signedness::Signed),
            ctx.int(IntWidth::W32, Signedness::Unsigned)
        );
    }

    #[test]
    fn test_composite_props_and() {
        let mut ctx = TypeContext::new();
        let i32_ty = ctx.int(IntWidth::W32, Signedness::Signed);
        let string = ctx.string();
        let tuple = ctx.tuple(vec![i32_ty, string]);
        let props = ctx.props(tuple);
        assert!(!props.copyable);
        assert!(props.sized);
        assert!(props.thread_safe);

        let void = ctx.void();
        let arr = ctx.array(void, ArraySize::Fixed(2));
        assert!(!ctx.props(arr).sized);
    }

    #[test]
    fn test_capability_propagates_or() {
        let mut ctx = TypeContext::new();
        let token = ctx.struct_type(key(40, 1), true);
        assert!(ctx.props(token).capability);

        let bool_ty = ctx.bool_ty();
        let pair = ctx.tuple(vec![bool_ty, token]);
        assert!(ctx.props(pair).capability);

        let kernel = ctx.function(vec![], bool_ty, false, true);
        assert!(ctx.props(kernel).capability);
        let plain = ctx.function(vec![], bool_ty, false, false);
        assert!(!ctx.props(plain).capability);
    }

    #[test]
    fn test_trait_object_props() {
        let mut ctx = TypeContext::new();
        let tr = ctx.declare_trait(Symbol::new(40));
        let obj = ctx.trait_object(tr, None);
        assert_eq!(ctx.props(obj), TypeProps::NONE);
    }

    #[test]
    fn test_struct_fields_defined_later() {
        let mut ctx = TypeContext::new();
        let node = ctx.struct_type(key(40, 1), false);
        assert!(ctx.props(node).copyable);

        let string = ctx.string();
        let next = ctx.reference(node, None, Mutability::Immutable);
        ctx.define_struct_fields(
            node,
            vec![
                FieldDef {
                    name: Symbol::new(41),
                    ty: string,
                },
                FieldDef {
                    name: Symbol::new(42),
                    ty: next,
                },
            ],
        );
        assert!(!ctx.props(node).copyable);
        assert_eq!(ctx.struct_def(node).map(|d| d.fields.len()), Some(2));
    }

    #[test]
    fn test_nominal_key_distinguishes_sites() {
        let mut ctx = TypeContext::new();
        let a = ctx.struct_type(key(40, 1), false);
        let b = ctx.struct_type(key(40, 9), false);
        assert!(!ctx.types_equal(a, b));
        assert!(ctx.types_equal(a, a));
    }

    #[test]
    fn test_scope_depth_restores() {
        let mut ctx = TypeContext::new();
        for _ in 0..5 {
            ctx.enter_scope();
        }
        assert_eq!(ctx.scope_depth(), 5);
        for _ in 0..5 {
            ctx.exit_scope();
        }
        assert_eq!(ctx.scope_depth(), 0);
        ctx.exit_scope();
        assert_eq!(ctx.scope_depth(), 0);
    }

    #[test]
    fn test_lifetime_uses_scope_depth() {
        let mut ctx = TypeContext::new();
        ctx.enter_scope();
        let outer = ctx.create_lifetime(None, false);
        ctx.enter_scope();
        let inner = ctx.create_lifetime(None, false);
        assert!(ctx.lifetime_outlives(outer, inner));
        assert!(!ctx.lifetime_outlives(inner, outer));
        assert_eq!(ctx.lifetime(inner).scope_depth, 2);
    }

    #[test]
    fn test_zonk_substitutes_resolved_vars() {
        let mut ctx = TypeContext::new();
        let var = ctx.fresh_var();
        let arr = ctx.slice(var);
        let i64_ty = ctx.int(IntWidth::W64, Signedness::Signed);
        assert!(ctx.unify(var, i64_ty));

        let zonked = ctx.zonk(arr);
        assert_ne!(zonked, arr);
        assert_eq!(ctx.kind(zonked), &TyKind::Slice(i64_ty));
    }

    #[test]
    fn test_instantiate_generic() {
        let mut ctx = TypeContext::new();
        let tr = ctx.declare_trait(Symbol::new(50));
        let t = ctx.param(Symbol::new(51), vec![tr]);
        let f = ctx.function(vec![t, t], t, false, false);

        let inst = ctx.instantiate(f);
        let TyKind::Function(sig) = ctx.kind(inst).clone() else {
            panic!("expected function");
        };
        assert_eq!(sig.params[0], sig.params[1]);
        assert_eq!(sig.params[0], sig.ret);
        let var = ctx.as_var(sig.ret).expect("fresh var");
        assert_eq!(ctx.var(var).constraints, vec![TypeConstraint::Implements(tr)]);
    }

    #[test]
    fn test_occurs() {
        let mut ctx = TypeContext::new();
        let var_ty = ctx.fresh_var();
        let var = ctx.as_var(var_ty).expect("var");
        let wrapped = ctx.slice(var_ty);
        assert!(ctx.occurs(var, wrapped));
        let bool_ty = ctx.bool_ty();
        assert!(!ctx.occurs(var, bool_ty));
    }
}
