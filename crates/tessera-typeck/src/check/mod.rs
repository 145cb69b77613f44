//! The type checker.
//!
//! [`Checker`] walks a module in passes so that declaration order does not
//! matter:
//!
//! 1. declare structs, enums and traits by name
//! 2. define fields, variants, trait methods and function signatures
//! 3. register impl methods, then validate trait impls
//! 4. check global initializers and function bodies
//!
//! Expressions are typed by `synth`, which returns `Err` for a failure. The
//! error is reported once by the caller and the node gets the `error` type,
//! which every later check accepts silently.
//!
//! # Modules
//!
//! - `decl` - The passes over declarations
//! - `stmt` - Statements and blocks
//! - `expr` - Expressions
//! - `ty` - Lowering type annotations

mod decl;
mod expr;
mod stmt;
mod ty;

use crate::config::CheckerConfig;
use crate::context::{SymbolTable, TraitId, TypeContext};
use crate::diagnostics::DiagnosticSink;
use crate::error::TypeError;
use crate::region::LifetimeId;
use crate::types::TypeId;
use fxhash::FxHashMap;
use tessera_log::warn;
use tessera_mem::{StringInterner, Symbol};
use tessera_syntax::Span;
use tessera_syntax::ast::{Decl, Expr, Module, NodeId, Stmt};

/// The function whose body is being checked.
#[derive(Debug, Clone, Copy)]
struct FnCtx {
    ret: TypeId,
    is_unsafe: bool,
    is_kernel: bool,
    loop_depth: u32,
}

/// Checks modules, declarations, statements and expressions against one
/// [`TypeContext`].
pub struct Checker<'a> {
    interner: &'a StringInterner,
    config: CheckerConfig,
    sink: &'a mut dyn DiagnosticSink,
    ctx: TypeContext,
    env: SymbolTable,
    /// Struct and enum names
    types: FxHashMap<Symbol, TypeId>,
    traits: FxHashMap<Symbol, TraitId>,
    node_types: FxHashMap<NodeId, TypeId>,
    fn_ctx: Option<FnCtx>,
    /// Generic parameters in scope, innermost last
    generics: Vec<FxHashMap<Symbol, TypeId>>,
    /// Named lifetimes of the function being lowered or checked
    lifetimes: FxHashMap<Symbol, LifetimeId>,
    /// Generic and lifetime parameters per function or method node
    fn_scopes: FxHashMap<NodeId, FnScope>,
    /// Trait declarations that won their name
    trait_decls: FxHashMap<NodeId, TraitId>,
}

/// Parameters a function brings into scope.
#[derive(Debug, Clone, Default)]
struct FnScope {
    generics: FxHashMap<Symbol, TypeId>,
    lifetimes: FxHashMap<Symbol, LifetimeId>,
}

/// The result of checking: the type context and the type of every checked node.
#[derive(Debug)]
pub struct TypedModule {
    /// Owner of every type referenced by `node_types`
    pub ctx: TypeContext,
    /// Fully resolved types per node
    pub node_types: FxHashMap<NodeId, TypeId>,
}

impl TypedModule {
    /// The resolved type of a node, if it was checked.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> Option<TypeId> {
        self.node_types.get(&id).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Declare,
    Define,
    ImplMethods,
    ImplTraits,
    Bodies,
}

impl Pass {
    const ALL: [Pass; 5] = [
        Pass::Declare,
        Pass::Define,
        Pass::ImplMethods,
        Pass::ImplTraits,
        Pass::Bodies,
    ];
}

impl<'a> Checker<'a> {
    /// Creates a checker reporting into `sink`, which receives the configured
    /// error limit.
    pub fn new(
        interner: &'a StringInterner,
        config: CheckerConfig,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        sink.set_error_limit(config.max_errors);
        Self {
            interner,
            config,
            sink,
            ctx: TypeContext::new(),
            env: SymbolTable::new(),
            types: FxHashMap::default(),
            traits: FxHashMap::default(),
            node_types: FxHashMap::default(),
            fn_ctx: None,
            generics: Vec::new(),
            lifetimes: FxHashMap::default(),
            fn_scopes: FxHashMap::default(),
            trait_decls: FxHashMap::default(),
        }
    }

    /// Checks every declaration of `module`.
    ///
    /// Stops early once the sink's error limit is exceeded.
    pub fn check_module(&mut self, module: &Module) {
        tessera_log::debug!(
            "checking module {} ({} declarations)",
            self.interner.name(module.name),
            module.decls.len()
        );
        for pass in Pass::ALL {
            for decl in &module.decls {
                if self.sink.should_abort() {
                    warn!(
                        "stopping after {} errors in module {}",
                        self.sink.error_count(),
                        self.interner.name(module.name)
                    );
                    return;
                }
                self.run_pass(pass, decl);
            }
        }
    }

    /// Checks a single declaration through every pass.
    ///
    /// Returns the declared type (function signature, variable type, struct
    /// or enum type) or `None` if the declaration produced errors.
    pub fn check_decl(&mut self, decl: &Decl) -> Option<TypeId> {
        let before = self.sink.error_count();
        for pass in Pass::ALL {
            self.run_pass(pass, decl);
        }
        if self.sink.error_count() > before {
            return None;
        }
        self.node_types.get(&decl.id).copied()
    }

    /// Checks a statement in the current scope.
    ///
    /// Returns `unit` or `None` if the statement produced errors.
    pub fn check_stmt(&mut self, stmt: &Stmt) -> Option<TypeId> {
        let before = self.sink.error_count();
        self.stmt(stmt);
        (self.sink.error_count() == before).then(|| self.ctx.unit())
    }

    /// Types an expression in the current scope.
    ///
    /// Returns `None` if the expression failed to type.
    pub fn check_expr(&mut self, expr: &Expr) -> Option<TypeId> {
        let ty = self.expr(expr);
        (!self.ctx.resolved_kind(ty).is_error()).then_some(ty)
    }

    /// The type recorded for a node so far.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> Option<TypeId> {
        self.node_types.get(&id).copied()
    }

    /// The struct or enum declared under `name`.
    #[must_use]
    pub fn lookup_type(&self, name: Symbol) -> Option<TypeId> {
        self.types.get(&name).copied()
    }

    /// The trait declared under `name`.
    #[must_use]
    pub fn lookup_trait(&self, name: Symbol) -> Option<TraitId> {
        self.traits.get(&name).copied()
    }

    /// The type context.
    #[must_use]
    pub fn ctx(&self) -> &TypeContext {
        &self.ctx
    }

    /// The type context, mutably.
    pub fn ctx_mut(&mut self) -> &mut TypeContext {
        &mut self.ctx
    }

    /// The symbol table, for drivers that predeclare names.
    pub fn env_mut(&mut self) -> &mut SymbolTable {
        &mut self.env
    }

    /// Finishes checking, resolving every recorded type as far as possible.
    #[must_use]
    pub fn finish(mut self) -> TypedModule {
        let mut node_types = std::mem::take(&mut self.node_types);
        for ty in node_types.values_mut() {
            *ty = self.ctx.zonk(*ty);
        }
        TypedModule {
            ctx: self.ctx,
            node_types,
        }
    }

    fn run_pass(&mut self, pass: Pass, decl: &Decl) {
        match pass {
            Pass::Declare => self.declare_item(decl),
            Pass::Define => self.define_item(decl),
            Pass::ImplMethods => self.register_impl_methods(decl),
            Pass::ImplTraits => self.validate_impl(decl),
            Pass::Bodies => self.check_item(decl),
        }
    }

    fn report(&mut self, error: &TypeError) {
        self.sink.report(error);
        match error {
            TypeError::MutBorrowOfImmutable { name, .. }
            | TypeError::AssignToImmutable { name, .. } => {
                // `*r` has no binding to change
                let declared = self
                    .interner
                    .get(name)
                    .and_then(|sym| self.env.lookup(sym))
                    .map(|binding| binding.span);
                if let Some(at) = declared {
                    self.sink.add_suggestion(
                        at,
                        format!("declare `{name}` as mutable"),
                        Some(&format!("mut {name}")),
                    );
                }
            }
            _ => {}
        }
    }

    /// Reports a second definition of `name`, pointing back at the first.
    fn report_duplicate(&mut self, name: Symbol, span: Span, previous: Option<Span>) {
        self.report(&TypeError::DuplicateDefinition {
            name: self.name(name),
            span,
        });
        if let Some(previous) = previous {
            let note = format!("`{}` first defined here", self.name(name));
            self.sink.add_note(previous, note);
        }
    }

    fn show(&self, ty: TypeId) -> String {
        self.ctx.display(ty, self.interner).to_string()
    }

    fn name(&self, sym: Symbol) -> String {
        self.interner.name(sym).to_string()
    }

    fn record(&mut self, id: NodeId, ty: TypeId) {
        self.node_types.insert(id, ty);
    }

    /// Whether a value of `found` may be used where `expected` is required:
    /// unification first, subtyping as the fallback.
    fn coerce(&mut self, found: TypeId, expected: TypeId) -> bool {
        self.ctx.unify(found, expected) || self.ctx.is_subtype(found, expected)
    }

    fn is_error(&self, ty: TypeId) -> bool {
        self.ctx.resolved_kind(ty).is_error()
    }

    /// Opens a lexical scope in both the symbol table and the context.
    fn enter_scope(&mut self) {
        self.ctx.enter_scope();
        self.env.push_scope();
    }

    fn exit_scope(&mut self) {
        self.env.pop_scope();
        self.ctx.exit_scope();
    }
}

impl std::fmt::Debug for Checker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checker")
            .field("config", &self.config)
            .field("types", &self.types.len())
            .field("traits", &self.traits.len())
            .field("node_types", &self.node_types.len())
            .finish_non_exhaustive()
    }
}
