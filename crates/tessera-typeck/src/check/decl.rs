//! The passes over module-level declarations.

use super::{Checker, FnCtx};
use crate::context::{Binding, BindingKind, TraitId};
use crate::error::TypeError;
use crate::types::{FieldDef, NominalKey, TyKind, TypeId, VariantDef};
use fxhash::FxHashMap;
use tessera_log::debug;
use tessera_mem::{Symbol, kw};
use tessera_syntax::Span;
use tessera_syntax::ast::{Decl, DeclKind, FnDecl, ImplDecl, NodeId, TraitDecl, VarDecl};

impl Checker<'_> {
    /// Pass 1: introduce struct, enum and trait names.
    pub(super) fn declare_item(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Struct(s) => {
                if self.type_name_taken(s.name, decl.span) {
                    return;
                }
                let key = NominalKey {
                    name: s.name,
                    site: decl.span,
                };
                let ty = self.ctx.struct_type(key, s.is_capability);
                self.types.insert(s.name, ty);
                self.record(decl.id, ty);
                debug!("declared struct {}", self.interner.name(s.name));
            }
            DeclKind::Enum(e) => {
                if self.type_name_taken(e.name, decl.span) {
                    return;
                }
                let key = NominalKey {
                    name: e.name,
                    site: decl.span,
                };
                let ty = self.ctx.enum_type(key);
                self.types.insert(e.name, ty);
                self.record(decl.id, ty);
                debug!("declared enum {}", self.interner.name(e.name));
            }
            DeclKind::Trait(t) => {
                if self.traits.contains_key(&t.name) {
                    self.report(&TypeError::DuplicateDefinition {
                        name: self.name(t.name),
                        span: decl.span,
                    });
                    return;
                }
                let id = self.ctx.declare_trait(t.name);
                self.traits.insert(t.name, id);
                self.trait_decls.insert(decl.id, id);
                debug!("declared trait {}", self.interner.name(t.name));
            }
            _ => {}
        }
    }

    /// Pass 2: fill in shapes and signatures, and bind functions and globals.
    pub(super) fn define_item(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Struct(s) => {
                let Some(ty) = self.node_type(decl.id) else {
                    return;
                };
                let mut fields: Vec<FieldDef> = Vec::with_capacity(s.fields.len());
                for field in &s.fields {
                    let field_ty = self.lower_ty_or_error(&field.ty);
                    if fields.iter().any(|f| f.name == field.name) {
                        let first = s.fields.iter().find(|f| f.name == field.name);
                        self.report_duplicate(field.name, field.span, first.map(|f| f.span));
                        continue;
                    }
                    fields.push(FieldDef {
                        name: field.name,
                        ty: field_ty,
                    });
                }
                self.ctx.define_struct_fields(ty, fields);
            }
            DeclKind::Enum(e) => {
                let Some(ty) = self.node_type(decl.id) else {
                    return;
                };
                let mut variants: Vec<VariantDef> = Vec::with_capacity(e.variants.len());
                for variant in &e.variants {
                    let payload = variant.payload.as_ref().map(|p| self.lower_ty_or_error(p));
                    if variants.iter().any(|v| v.name == variant.name) {
                        let first = e.variants.iter().find(|v| v.name == variant.name);
                        self.report_duplicate(variant.name, variant.span, first.map(|v| v.span));
                        continue;
                    }
                    variants.push(VariantDef {
                        name: variant.name,
                        payload,
                    });
                }
                self.ctx.define_enum_variants(ty, variants);
            }
            DeclKind::Trait(t) => {
                if let Some(id) = self.trait_decls.get(&decl.id).copied() {
                    self.define_trait(id, t, decl.span);
                }
            }
            DeclKind::Function(f) => {
                let fn_ty = self.fn_signature(decl.id, f);
                self.record(decl.id, fn_ty);
                self.bind_item(
                    f.name,
                    Binding {
                        ty: fn_ty,
                        mutable: false,
                        kind: BindingKind::Function,
                        generic: !f.generics.is_empty(),
                        region: None,
                        span: decl.span,
                    },
                );
            }
            DeclKind::Variable(v) => {
                let ty = match &v.ty {
                    Some(ann) => self.lower_ty_or_error(ann),
                    None => self.ctx.fresh_var(),
                };
                self.record(decl.id, ty);
                self.bind_item(
                    v.name,
                    Binding {
                        ty,
                        mutable: v.mutable,
                        kind: BindingKind::Global,
                        generic: false,
                        region: None,
                        span: decl.span,
                    },
                );
            }
            DeclKind::Impl(_) => {}
        }
    }

    /// Pass 3a: resolve impl targets and add their methods to the struct.
    pub(super) fn register_impl_methods(&mut self, decl: &Decl) {
        let DeclKind::Impl(imp) = &decl.kind else {
            return;
        };
        let target = self.lower_ty_or_error(&imp.target);
        if self.is_error(target) {
            self.record(decl.id, target);
            return;
        }
        if self.ctx.struct_def(target).is_none() {
            self.report(&TypeError::ImplOnNonStruct {
                ty: self.show(target),
                span: imp.target.span,
            });
            self.record(decl.id, self.ctx.error());
            return;
        }
        self.record(decl.id, target);

        let outer = self.ctx.set_self_type(Some(target));
        for method in &imp.methods {
            let ty = self.fn_signature(method.id, &method.func);
            self.record(method.id, ty);
            let taken = self
                .ctx
                .struct_def(target)
                .is_some_and(|def| def.method(method.func.name).is_some());
            if taken {
                self.report(&TypeError::DuplicateDefinition {
                    name: self.name(method.func.name),
                    span: method.span,
                });
                continue;
            }
            self.ctx.add_struct_method(target, method.func.name, ty);
        }
        self.ctx.set_self_type(outer);
    }

    /// Pass 3b: check trait impls against their traits and record them.
    pub(super) fn validate_impl(&mut self, decl: &Decl) {
        let DeclKind::Impl(imp) = &decl.kind else {
            return;
        };
        let Some(trait_name) = imp.trait_name else {
            return;
        };
        let Some(target) = self.node_type(decl.id) else {
            return;
        };
        if self.is_error(target) {
            return;
        }
        let Some(trait_id) = self.traits.get(&trait_name).copied() else {
            self.report(&TypeError::UndefinedTrait {
                name: self.name(trait_name),
                span: decl.span,
            });
            return;
        };
        if self.ctx.has_direct_impl(target, trait_id) {
            self.report(&TypeError::DuplicateImpl {
                ty: self.show(target),
                trait_name: self.name(trait_name),
                span: decl.span,
            });
            return;
        }

        let outer = self.ctx.set_self_type(Some(target));
        let args: Vec<TypeId> = imp
            .trait_args
            .iter()
            .map(|arg| self.lower_ty_or_error(arg))
            .collect();
        self.ctx.set_self_type(outer);

        self.check_trait_methods(imp, decl.span, target, trait_id, &args);

        let names = imp.methods.iter().map(|m| m.func.name).collect();
        self.ctx.add_impl(target, trait_id, args, names);
    }

    /// Every method of the trait must be in the impl block; methods of its
    /// direct super-traits may also come from another impl of the struct.
    fn check_trait_methods(
        &mut self,
        imp: &ImplDecl,
        span: Span,
        target: TypeId,
        trait_id: TraitId,
        args: &[TypeId],
    ) {
        let mut required: Vec<(TraitId, bool, _)> = self
            .ctx
            .instantiate_trait_methods(trait_id, target, args)
            .into_iter()
            .map(|m| (trait_id, true, m))
            .collect();
        let supers = self.ctx.trait_def(trait_id).super_traits.clone();
        for sup in supers {
            let methods = self.ctx.instantiate_trait_methods(sup, target, &[]);
            required.extend(methods.into_iter().map(|m| (sup, false, m)));
        }

        for (owner, in_block, req) in required {
            let local = imp
                .methods
                .iter()
                .find(|m| m.func.name == req.name)
                .and_then(|m| Some((self.node_type(m.id)?, m.span)));
            let found = match local {
                Some(found) => Some(found),
                None if !in_block => self
                    .ctx
                    .struct_def(target)
                    .and_then(|def| def.method(req.name))
                    .map(|ty| (ty, span)),
                None => None,
            };
            let Some((found, at)) = found else {
                self.report(&TypeError::MissingTraitMethod {
                    ty: self.show(target),
                    trait_name: self.name(self.ctx.trait_def(owner).name),
                    method: self.name(req.name),
                    span,
                });
                continue;
            };
            if !self.ctx.unify(found, req.signature) {
                self.report(&TypeError::MethodSignatureMismatch {
                    method: self.name(req.name),
                    expected: self.show(req.signature),
                    found: self.show(found),
                    span: at,
                });
            }
        }
    }

    /// Pass 4: global initializers and bodies.
    pub(super) fn check_item(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Function(f) => {
                if let Some(fn_ty) = self.node_type(decl.id) {
                    self.check_fn_body(decl.id, f, fn_ty);
                }
            }
            DeclKind::Variable(v) => self.check_global(decl.id, v),
            DeclKind::Impl(imp) => {
                let Some(target) = self.node_type(decl.id) else {
                    return;
                };
                if self.is_error(target) {
                    return;
                }
                let outer = self.ctx.set_self_type(Some(target));
                for method in &imp.methods {
                    if let Some(fn_ty) = self.node_type(method.id) {
                        self.check_fn_body(method.id, &method.func, fn_ty);
                    }
                }
                self.ctx.set_self_type(outer);
            }
            _ => {}
        }
    }

    fn define_trait(&mut self, id: TraitId, t: &TraitDecl, span: Span) {
        for param in &t.type_params {
            self.ctx.add_trait_type_param(id, *param);
        }
        for sup in &t.super_traits {
            match self.traits.get(sup).copied() {
                Some(sup) => self.ctx.add_super_trait(id, sup),
                None => self.report(&TypeError::UndefinedTrait {
                    name: self.name(*sup),
                    span,
                }),
            }
        }

        // Inside a trait, `Self` and the trait's parameters are generic.
        let self_param = self.ctx.param(kw::SELF_TYPE, vec![id]);
        let outer = self.ctx.set_self_type(Some(self_param));
        let mut scope = FxHashMap::default();
        for param in &t.type_params {
            scope.insert(*param, self.ctx.param(*param, Vec::new()));
        }
        self.generics.push(scope);

        for method in &t.methods {
            let params = method
                .params
                .iter()
                .map(|p| self.lower_ty_or_error(p))
                .collect();
            let ret = match &method.ret {
                Some(ret) => self.lower_ty_or_error(ret),
                None => self.ctx.unit(),
            };
            let sig = self.ctx.function(params, ret, false, false);
            if self.ctx.trait_def(id).method(method.name).is_some() {
                self.report(&TypeError::DuplicateDefinition {
                    name: self.name(method.name),
                    span: method.span,
                });
                continue;
            }
            self.ctx.add_trait_method(id, method.name, sig);
        }

        self.generics.pop();
        self.ctx.set_self_type(outer);
    }

    /// The function type of `func`; missing parameter annotations are
    /// reported and typed `error`.
    fn fn_signature(&mut self, owner: NodeId, func: &FnDecl) -> TypeId {
        self.enter_fn_scope(owner, func);
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = match &param.ty {
                Some(ann) => self.lower_ty_or_error(ann),
                None => {
                    self.report(&TypeError::MissingParamType {
                        name: self.name(param.name),
                        span: param.span,
                    });
                    self.ctx.error()
                }
            };
            params.push(ty);
        }
        let ret = match &func.ret {
            Some(ret) => self.lower_ty_or_error(ret),
            None => self.ctx.unit(),
        };
        self.exit_fn_scope(owner);
        self.ctx.function(params, ret, func.is_unsafe, func.is_kernel)
    }

    fn check_fn_body(&mut self, owner: NodeId, func: &FnDecl, fn_ty: TypeId) {
        let Some(body) = &func.body else {
            return;
        };
        let TyKind::Function(sig) = self.ctx.kind(fn_ty) else {
            return;
        };
        let sig = sig.clone();
        debug!("checking body of {}", self.interner.name(func.name));

        self.enter_fn_scope(owner, func);
        let outer = self.fn_ctx.replace(FnCtx {
            ret: sig.ret,
            is_unsafe: func.is_unsafe,
            is_kernel: func.is_kernel,
            loop_depth: 0,
        });
        self.enter_scope();

        if func.has_self {
            match self.ctx.self_type() {
                Some(self_ty) => self.bind_local(kw::SELF_VALUE, self_ty, true, body.span),
                None => self.report(&TypeError::SelfOutsideImpl { span: body.span }),
            }
        }
        for (param, ty) in func.params.iter().zip(&sig.params) {
            if let Some(first) = self.env.lookup_current(param.name).map(|b| b.span) {
                self.report_duplicate(param.name, param.span, Some(first));
            }
            self.bind_local(param.name, *ty, param.mutable, param.span);
        }
        for stmt in &body.stmts {
            self.stmt(stmt);
        }
        self.record(body.id, sig.ret);

        self.exit_scope();
        self.fn_ctx = outer;
        self.exit_fn_scope(owner);
    }

    fn check_global(&mut self, id: NodeId, var: &VarDecl) {
        let (Some(declared), Some(init)) = (self.node_type(id), &var.init) else {
            return;
        };
        let found = self.expr(init);
        if !self.is_error(found) && !self.is_error(declared) && !self.coerce(found, declared) {
            self.report(&TypeError::Mismatch {
                expected: self.show(declared),
                found: self.show(found),
                span: init.span,
            });
        }
    }

    fn type_name_taken(&mut self, name: Symbol, span: Span) -> bool {
        let Some(&existing) = self.types.get(&name) else {
            return false;
        };
        let first = match (self.ctx.struct_def(existing), self.ctx.enum_def(existing)) {
            (Some(def), _) => Some(def.key.site),
            (_, Some(def)) => Some(def.key.site),
            _ => None,
        };
        self.report_duplicate(name, span, first);
        true
    }

    /// Binds a module-level name unless the module already has it.
    fn bind_item(&mut self, name: Symbol, binding: Binding) {
        if let Some(first) = self.env.lookup_current(name).map(|b| b.span) {
            self.report_duplicate(name, binding.span, Some(first));
            return;
        }
        self.env.bind(name, binding);
    }
}

#[cfg(test)]
mod tests {
    use crate::check::Checker;
    use crate::config::CheckerConfig;
    use crate::types::TyKind;
    use tessera_syntax::DiagnosticBag;
    use tessera_syntax::ast::AstBuilder;

    fn codes(bag: &DiagnosticBag) -> Vec<&str> {
        bag.iter().filter_map(|d| d.code.as_deref()).collect()
    }

    #[test]
    fn test_declaration_order_is_irrelevant() {
        let mut b = AstBuilder::new();
        let arg = b.ident("p");
        let call = b.call_named("take", vec![arg]);
        let call_stmt = b.expr_stmt(call);
        let pt = b.ty("Point");
        let p = b.param("p", pt);
        let main = b.func("main", vec![p], None, vec![call_stmt]);
        let pt = b.ty("Point");
        let p = b.param("p", pt);
        let take = b.func("take", vec![p], None, vec![]);
        let i32_ty = b.ty("i32");
        let point = b.struct_decl("Point", vec![("x", i32_ty)]);
        let module = b.module("m", vec![main, take, point]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        drop(checker);
        assert!(!bag.has_errors(), "{:?}", codes(&bag));
    }

    #[test]
    fn test_duplicate_struct() {
        let mut b = AstBuilder::new();
        let first = b.struct_decl("Point", vec![]);
        let second = b.struct_decl("Point", vec![]);
        let first_span = first.span;
        let module = b.module("m", vec![first, second]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        drop(checker);
        assert_eq!(codes(&bag), vec!["duplicate definition"]);
        let notes = &bag.diagnostics()[0].notes;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].span, first_span);
        assert_eq!(notes[0].message, "`Point` first defined here");
    }

    #[test]
    fn test_duplicate_function_points_at_first() {
        let mut b = AstBuilder::new();
        let first = b.func("run", vec![], None, vec![]);
        let second = b.func("run", vec![], None, vec![]);
        let first_span = first.span;
        let module = b.module("m", vec![first, second]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        drop(checker);
        assert_eq!(codes(&bag), vec!["duplicate definition"]);
        assert_eq!(bag.diagnostics()[0].notes[0].span, first_span);
    }

    #[test]
    fn test_missing_param_type() {
        let mut b = AstBuilder::new();
        let p = b.param_untyped("x");
        let f = b.func("f", vec![p], None, vec![]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        assert_eq!(checker.check_decl(&f), None);
        drop(checker);
        assert_eq!(codes(&bag), vec!["missing parameter type"]);
    }

    #[test]
    fn test_function_signature() {
        let mut b = AstBuilder::new();
        let i32_ty = b.ty("i32");
        let bool_ty = b.ty("bool");
        let p = b.param("x", i32_ty);
        let t = b.bool(true);
        let ret = b.ret(Some(t));
        let f = b.func("f", vec![p], Some(bool_ty), vec![ret]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        let ty = checker.check_decl(&f).expect("signature");
        assert_eq!(checker.show(ty), "fn(i32) -> bool");
    }

    #[test]
    fn test_impl_on_enum() {
        let mut b = AstBuilder::new();
        let color = b.enum_decl("Color", vec![("Red", None)]);
        let target = b.ty("Color");
        let imp = b.impl_decl(None, target, vec![]);
        let module = b.module("m", vec![color, imp]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        drop(checker);
        assert_eq!(codes(&bag), vec!["impl on non-struct type"]);
    }

    #[test]
    fn test_trait_impl_validation() {
        let mut b = AstBuilder::new();
        let string = b.ty("string");
        let show_m = b.trait_method("show", vec![], Some(string));
        let show = b.trait_decl("Show", &[], vec![show_m]);
        let point = b.struct_decl("Point", vec![]);

        // `show` returns the wrong type
        let target = b.ty("Point");
        let i32_ty = b.ty("i32");
        let one = b.int(1);
        let ret = b.ret(Some(one));
        let bad = b.method("show", true, vec![], Some(i32_ty), vec![ret]);
        let imp = b.impl_decl(Some("Show"), target, vec![bad]);
        let module = b.module("m", vec![show, point, imp]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        let point_ty = checker.lookup_type(interner.get("Point").expect("interned"));
        let show_id = checker.lookup_trait(interner.get("Show").expect("interned"));
        let (Some(point_ty), Some(show_id)) = (point_ty, show_id) else {
            panic!("declarations missing");
        };
        assert!(checker.ctx().implements(point_ty, show_id));
        drop(checker);
        assert_eq!(codes(&bag), vec!["method signature mismatch"]);
    }

    #[test]
    fn test_missing_trait_method() {
        let mut b = AstBuilder::new();
        let m = b.trait_method("area", vec![], None);
        let shape = b.trait_decl("Shape", &[], vec![m]);
        let square = b.struct_decl("Square", vec![]);
        let target = b.ty("Square");
        let imp = b.impl_decl(Some("Shape"), target, vec![]);
        let module = b.module("m", vec![shape, square, imp]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        drop(checker);
        assert_eq!(codes(&bag), vec!["missing trait method"]);
    }

    #[test]
    fn test_duplicate_impl() {
        let mut b = AstBuilder::new();
        let marker = b.trait_decl("Marker", &[], vec![]);
        let unit = b.struct_decl("Unit", vec![]);
        let t1 = b.ty("Unit");
        let first = b.impl_decl(Some("Marker"), t1, vec![]);
        let t2 = b.ty("Unit");
        let second = b.impl_decl(Some("Marker"), t2, vec![]);
        let module = b.module("m", vec![marker, unit, first, second]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        drop(checker);
        assert_eq!(codes(&bag), vec!["duplicate impl"]);
    }

    #[test]
    fn test_super_trait_method_from_other_impl() {
        let mut b = AstBuilder::new();
        let name_m = b.trait_method("name", vec![], None);
        let named = b.trait_decl("Named", &[], vec![name_m]);
        let greet_m = b.trait_method("greet", vec![], None);
        let greeter = b.trait_decl("Greeter", &["Named"], vec![greet_m]);
        let person = b.struct_decl("Person", vec![]);

        let t1 = b.ty("Person");
        let name = b.method("name", true, vec![], None, vec![]);
        let named_impl = b.impl_decl(Some("Named"), t1, vec![name]);
        let t2 = b.ty("Person");
        let greet = b.method("greet", true, vec![], None, vec![]);
        let greeter_impl = b.impl_decl(Some("Greeter"), t2, vec![greet]);
        let module = b.module("m", vec![named, greeter, person, named_impl, greeter_impl]);
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        checker.check_module(&module);
        drop(checker);
        assert!(!bag.has_errors(), "{:?}", codes(&bag));
    }

    #[test]
    fn test_global_inferred_from_initializer() {
        let mut b = AstBuilder::new();
        let init = b.bool(false);
        let global = b.global("FLAG", false, None, Some(init));
        let interner = b.finish();

        let mut bag = DiagnosticBag::new();
        let mut checker = Checker::new(&interner, CheckerConfig::default(), &mut bag);
        assert!(checker.check_decl(&global).is_some());
        let typed = checker.finish();
        let zonked = typed.node_type(global.id).expect("recorded");
        assert!(matches!(typed.ctx.kind(zonked), TyKind::Bool));
    }
}
