//! Lexically scoped symbol table.

use crate::region::RegionId;
use crate::types::TypeId;
use fxhash::FxHashMap;
use tessera_mem::Symbol;
use tessera_syntax::Span;

/// What a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `let` binding or parameter
    Variable,
    /// Top-level function
    Function,
    /// Top-level variable
    Global,
}

/// A name in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Declared or inferred type
    pub ty: TypeId,
    /// Whether assignment is allowed
    pub mutable: bool,
    /// Variable, function or global
    pub kind: BindingKind,
    /// Function type with generic parameters, instantiated at each use
    pub generic: bool,
    /// Borrowable region, when borrow tracking is on
    pub region: Option<RegionId>,
    /// Declaration site
    pub span: Span,
}

impl Binding {
    /// A plain local.
    #[must_use]
    pub fn local(ty: TypeId, mutable: bool, span: Span) -> Self {
        Self {
            ty,
            mutable,
            kind: BindingKind::Variable,
            generic: false,
            region: None,
            span,
        }
    }
}

/// Stack of scopes; the bottom one holds module-level names and is never popped.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<FxHashMap<Symbol, Binding>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table with only the module scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Opens a nested scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Closes the innermost scope. The module scope stays.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of open scopes, module scope included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in the innermost scope, returning the binding it replaced
    /// in that same scope.
    pub fn bind(&mut self, name: Symbol, binding: Binding) -> Option<Binding> {
        self.scopes.last_mut().and_then(|scope| scope.insert(name, binding))
    }

    /// Innermost binding of `name`.
    #[must_use]
    pub fn lookup(&self, name: Symbol) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    /// Binding of `name` in the innermost scope only.
    #[must_use]
    pub fn lookup_current(&self, name: Symbol) -> Option<&Binding> {
        self.scopes.last().and_then(|scope| scope.get(&name))
    }

    /// Mutable access to the innermost binding of `name`.
    pub fn lookup_mut(&mut self, name: Symbol) -> Option<&mut Binding> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(&name))
    }

    /// Whether `name` is bound and mutable.
    #[must_use]
    pub fn is_mutable(&self, name: Symbol) -> bool {
        self.lookup(name).is_some_and(|b| b.mutable)
    }
}
