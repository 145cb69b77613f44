//! Type pretty-printing for error messages.
//!
//! Types are ids into a context and names are interned symbols, so printing
//! needs both; [`DisplayTy`] bundles them behind `fmt::Display`.

use crate::context::TypeContext;
use crate::region::LifetimeId;
use crate::types::{ArraySize, FloatPrecision, Signedness, TyKind, TypeId};
use std::fmt;
use tessera_mem::StringInterner;

/// A wrapper type for displaying types.
pub struct DisplayTy<'a> {
    ctx: &'a TypeContext,
    ty: TypeId,
    interner: &'a StringInterner,
}

impl<'a> DisplayTy<'a> {
    /// Create a new display wrapper for a type.
    pub fn new(ctx: &'a TypeContext, ty: TypeId, interner: &'a StringInterner) -> Self {
        Self { ctx, ty, interner }
    }
}

impl fmt::Display for DisplayTy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.format_type(self.ty, f)
    }
}

impl DisplayTy<'_> {
    fn format_type(&self, ty: TypeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ctx.kind(ty) {
            TyKind::Void => write!(f, "void"),
            TyKind::Unit => write!(f, "()"),
            TyKind::Bool => write!(f, "bool"),
            TyKind::Char => write!(f, "char"),
            TyKind::String => write!(f, "string"),
            TyKind::Int { width, sign } => {
                let prefix = match sign {
                    Signedness::Signed => 'i',
                    Signedness::Unsigned => 'u',
                };
                write!(f, "{prefix}{}", width.bits())
            }
            TyKind::Float(FloatPrecision::F32) => write!(f, "f32"),
            TyKind::Float(FloatPrecision::F64) => write!(f, "f64"),

            TyKind::Array { elem, size } => {
                write!(f, "[")?;
                self.format_type(*elem, f)?;
                match size {
                    ArraySize::Fixed(n) => write!(f, "; {n}]"),
                    ArraySize::Dynamic => write!(f, "; dyn]"),
                }
            }
            TyKind::Slice(elem) => {
                write!(f, "[")?;
                self.format_type(*elem, f)?;
                write!(f, "]")
            }
            TyKind::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.format_type(*elem, f)?;
                }
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }

            TyKind::Struct(def) => write!(f, "{}", self.interner.name(def.key.name)),
            TyKind::Enum(def) => write!(f, "{}", self.interner.name(def.key.name)),

            TyKind::Function(sig) => {
                if sig.is_unsafe {
                    write!(f, "unsafe ")?;
                }
                if sig.is_kernel {
                    write!(f, "kernel ")?;
                }
                write!(f, "fn(")?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.format_type(*param, f)?;
                }
                write!(f, ") -> ")?;
                self.format_type(sig.ret, f)
            }

            TyKind::Reference {
                inner,
                lifetime,
                mutability,
            } => {
                write!(f, "&")?;
                if let Some(lt) = lifetime {
                    if self.format_lifetime(*lt, f)? {
                        write!(f, " ")?;
                    }
                }
                if mutability.is_mut() {
                    write!(f, "mut ")?;
                }
                self.format_type(*inner, f)
            }

            TyKind::Channel {
                elem,
                capacity,
                distributed,
            } => {
                write!(f, "{}<", if *distributed { "dchan" } else { "chan" })?;
                self.format_type(*elem, f)?;
                write!(f, ", {capacity}>")
            }

            TyKind::Var(var) => match self.ctx.var(*var).resolution {
                Some(resolved) => self.format_type(resolved, f),
                None => write!(f, "?{}", var.into_raw()),
            },
            TyKind::Param { name, .. } => write!(f, "{}", self.interner.name(*name)),
            TyKind::TraitObject { trait_id, lifetime } => {
                let name = self.ctx.trait_def(*trait_id).name;
                write!(f, "dyn {}", self.interner.name(name))?;
                if let Some(lt) = lifetime {
                    let lifetime = self.ctx.lifetime(*lt);
                    if lifetime.is_static || lifetime.name.is_some() {
                        write!(f, " + ")?;
                        self.format_lifetime(*lt, f)?;
                    }
                }
                Ok(())
            }

            TyKind::Error => write!(f, "<error>"),
            TyKind::Never => write!(f, "!"),
            TyKind::Unknown => write!(f, "<unknown>"),
            TyKind::Any => write!(f, "any"),
        }
    }

    /// Writes `'name` or `'static`; anonymous lifetimes print nothing.
    /// Returns whether anything was written.
    fn format_lifetime(
        &self,
        lt: LifetimeId,
        f: &mut fmt::Formatter<'_>,
    ) -> Result<bool, fmt::Error> {
        let lifetime = self.ctx.lifetime(lt);
        if lifetime.is_static {
            write!(f, "'static")?;
            return Ok(true);
        }
        match lifetime.name {
            Some(name) => {
                write!(f, "'{}", self.interner.name(name))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
