//! Type checking errors.
//!
//! Every diagnostic the checker can produce is a [`TypeError`] variant with a
//! stable [`ErrorCode`]. Types inside errors are already rendered to strings
//! so an error can outlive the context that produced it.

use std::fmt;
use tessera_syntax::Span;

/// Short stable error codes attached to diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ErrorCode {
    TypeMismatch,
    UndefinedVariable,
    UndefinedType,
    UndefinedTrait,
    DuplicateDefinition,
    MissingParamType,
    InvalidOperands,
    UnsupportedOperator,
    NonLvalueAddrOf,
    NonReferenceDeref,
    NonBooleanCondition,
    NotAFunction,
    WrongArgCount,
    ArgMismatch,
    TraitConstraint,
    SubtypeConstraint,
    NotAChannel,
    NotIterable,
    ReturnMismatch,
    ReturnOutsideFunction,
    BreakOutsideLoop,
    InvalidAssignmentTarget,
    AssignToImmutable,
    UnknownField,
    MissingField,
    FieldAccessOnNonStruct,
    UnknownMethod,
    UnknownVariant,
    MissingTraitMethod,
    MethodSignatureMismatch,
    ImplOnNonStruct,
    DuplicateImpl,
    NotIndexable,
    InfiniteType,
    UnsafeCall,
    KernelCall,
    ConflictingBorrow,
    MutBorrowOfImmutable,
    SelfOutsideImpl,
}

impl ErrorCode {
    /// The code as it appears in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::TypeMismatch => "type mismatch",
            ErrorCode::UndefinedVariable => "undefined variable",
            ErrorCode::UndefinedType => "undefined type",
            ErrorCode::UndefinedTrait => "undefined trait",
            ErrorCode::DuplicateDefinition => "duplicate definition",
            ErrorCode::MissingParamType => "missing parameter type",
            ErrorCode::InvalidOperands => "invalid operands",
            ErrorCode::UnsupportedOperator => "unsupported operator",
            ErrorCode::NonLvalueAddrOf => "non-lvalue address-of",
            ErrorCode::NonReferenceDeref => "non-reference dereference",
            ErrorCode::NonBooleanCondition => "non-boolean condition",
            ErrorCode::NotAFunction => "not a function",
            ErrorCode::WrongArgCount => "wrong argument count",
            ErrorCode::ArgMismatch => "argument type mismatch",
            ErrorCode::TraitConstraint => "trait constraint not satisfied",
            ErrorCode::SubtypeConstraint => "subtype constraint not satisfied",
            ErrorCode::NotAChannel => "not a channel",
            ErrorCode::NotIterable => "not iterable",
            ErrorCode::ReturnMismatch => "return type mismatch",
            ErrorCode::ReturnOutsideFunction => "return outside function",
            ErrorCode::BreakOutsideLoop => "break outside loop",
            ErrorCode::InvalidAssignmentTarget => "invalid assignment target",
            ErrorCode::AssignToImmutable => "assignment to immutable",
            ErrorCode::UnknownField => "unknown field",
            ErrorCode::MissingField => "missing field",
            ErrorCode::FieldAccessOnNonStruct => "field access on non-struct",
            ErrorCode::UnknownMethod => "unknown method",
            ErrorCode::UnknownVariant => "unknown variant",
            ErrorCode::MissingTraitMethod => "missing trait method",
            ErrorCode::MethodSignatureMismatch => "method signature mismatch",
            ErrorCode::ImplOnNonStruct => "impl on non-struct type",
            ErrorCode::DuplicateImpl => "duplicate impl",
            ErrorCode::NotIndexable => "not indexable",
            ErrorCode::InfiniteType => "infinite type",
            ErrorCode::UnsafeCall => "unsafe call",
            ErrorCode::KernelCall => "kernel call",
            ErrorCode::ConflictingBorrow => "conflicting borrow",
            ErrorCode::MutBorrowOfImmutable => "mutable borrow of immutable binding",
            ErrorCode::SelfOutsideImpl => "self outside impl",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type checking errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Type mismatch between expected and found types.
    Mismatch {
        /// The expected type
        expected: String,
        /// The actual type found
        found: String,
        /// Source location of the error
        span: Span,
    },

    /// Undefined variable.
    UndefinedVar {
        /// Name of the undefined variable
        name: String,
        /// Source location
        span: Span,
    },

    /// Undefined type.
    UndefinedType {
        /// Name of the undefined type
        name: String,
        /// Source location
        span: Span,
    },

    /// Undefined trait.
    UndefinedTrait {
        /// Name of the undefined trait
        name: String,
        /// Source location
        span: Span,
    },

    /// Name declared twice in one scope.
    DuplicateDefinition {
        /// The duplicated name
        name: String,
        /// Source location of the second declaration
        span: Span,
    },

    /// Parameter without a type annotation.
    MissingParamType {
        /// Parameter name
        name: String,
        /// Source location
        span: Span,
    },

    /// Operand types not accepted by an operator.
    InvalidOperands {
        /// The operator
        op: &'static str,
        /// Left operand type (the only operand for unary operators)
        lhs: String,
        /// Right operand type, for binary operators
        rhs: Option<String>,
        /// Source location
        span: Span,
    },

    /// Operator not defined for the operand kind.
    UnsupportedOperator {
        /// The operator
        op: &'static str,
        /// Operand type
        ty: String,
        /// Source location
        span: Span,
    },

    /// `&` or `&mut` of something that is not a place.
    NonLvalueAddrOf {
        /// Source location
        span: Span,
    },

    /// `*` of a non-reference.
    NonReferenceDeref {
        /// The dereferenced type
        ty: String,
        /// Source location
        span: Span,
    },

    /// Non-boolean condition.
    NonBooleanCondition {
        /// The actual type of the condition
        found: String,
        /// Source location
        span: Span,
    },

    /// Call of a non-function value.
    NotAFunction {
        /// The callee type
        ty: String,
        /// Source location
        span: Span,
    },

    /// Wrong number of call arguments.
    WrongArgCount {
        /// Parameter count
        expected: usize,
        /// Argument count
        found: usize,
        /// Source location
        span: Span,
    },

    /// One call argument does not fit its parameter.
    ArgMismatch {
        /// Zero-based argument position
        index: usize,
        /// Parameter type
        expected: String,
        /// Argument type
        found: String,
        /// Source location of the argument
        span: Span,
    },

    /// Trait bound not satisfied.
    TraitConstraint {
        /// The type that doesn't satisfy the constraint
        ty: String,
        /// The required trait
        trait_name: String,
        /// Source location
        span: Span,
    },

    /// Subtype constraint not satisfied.
    SubtypeConstraint {
        /// The offending type
        ty: String,
        /// The required supertype
        bound: String,
        /// Source location
        span: Span,
    },

    /// Send or receive on a non-channel.
    NotAChannel {
        /// The operand type
        ty: String,
        /// Source location
        span: Span,
    },

    /// `for` over a non-iterable value.
    NotIterable {
        /// The iterated type
        ty: String,
        /// Source location
        span: Span,
    },

    /// Returned value does not fit the function's return type.
    ReturnMismatch {
        /// Declared return type
        expected: String,
        /// Returned type
        found: String,
        /// Source location
        span: Span,
    },

    /// Return outside function.
    ReturnOutsideFunction {
        /// Source location
        span: Span,
    },

    /// Break/continue outside loop.
    BreakOutsideLoop {
        /// `break` or `continue`
        keyword: &'static str,
        /// Source location
        span: Span,
    },

    /// Invalid assignment target.
    InvalidAssignmentTarget {
        /// Source location
        span: Span,
    },

    /// Assignment to immutable binding.
    AssignToImmutable {
        /// Name of the immutable binding
        name: String,
        /// Source location
        span: Span,
    },

    /// Unknown field.
    UnknownField {
        /// The type being accessed
        ty: String,
        /// The unknown field name
        field: String,
        /// Source location
        span: Span,
    },

    /// Struct literal without a required field.
    MissingField {
        /// The struct type
        ty: String,
        /// The missing field name
        field: String,
        /// Source location
        span: Span,
    },

    /// Field access on non-struct type.
    FieldAccessOnNonStruct {
        /// The type being accessed
        ty: String,
        /// The field name
        field: String,
        /// Source location
        span: Span,
    },

    /// Method not found on the receiver type.
    UnknownMethod {
        /// Receiver type
        ty: String,
        /// Method name
        method: String,
        /// Source location
        span: Span,
    },

    /// Unknown enum variant.
    UnknownVariant {
        /// The enum type
        ty: String,
        /// The unknown variant name
        variant: String,
        /// Source location
        span: Span,
    },

    /// Impl block without a method its trait requires.
    MissingTraitMethod {
        /// The implementing type
        ty: String,
        /// The trait requiring the method
        trait_name: String,
        /// The missing method name
        method: String,
        /// Source location
        span: Span,
    },

    /// Impl method whose type differs from the trait's.
    MethodSignatureMismatch {
        /// Method name
        method: String,
        /// Signature required by the trait
        expected: String,
        /// Signature found in the impl
        found: String,
        /// Source location
        span: Span,
    },

    /// `impl` targeting something other than a struct.
    ImplOnNonStruct {
        /// The target type
        ty: String,
        /// Source location
        span: Span,
    },

    /// Second impl of the same trait for one struct.
    DuplicateImpl {
        /// The implementing type
        ty: String,
        /// The trait
        trait_name: String,
        /// Source location
        span: Span,
    },

    /// Indexing a non-array.
    NotIndexable {
        /// The indexed type
        ty: String,
        /// Source location
        span: Span,
    },

    /// Infinite type (occurs check failure).
    InfiniteType {
        /// The type that would contain itself
        ty: String,
        /// Source location
        span: Span,
    },

    /// Call of an `unsafe fn` outside an unsafe function.
    UnsafeCall {
        /// Callee type
        callee: String,
        /// Source location
        span: Span,
    },

    /// Call of a `kernel fn` outside a kernel function.
    KernelCall {
        /// Callee type
        callee: String,
        /// Source location
        span: Span,
    },

    /// Borrow overlapping a live borrow.
    ConflictingBorrow {
        /// Borrowed binding
        name: String,
        /// Tracker message
        reason: String,
        /// Source location
        span: Span,
    },

    /// `&mut` of an immutable binding.
    MutBorrowOfImmutable {
        /// Borrowed binding
        name: String,
        /// Source location
        span: Span,
    },

    /// `self` or `Self` outside an impl.
    SelfOutsideImpl {
        /// Source location
        span: Span,
    },

    /// A sub-expression already reported its failure.
    Reported {
        /// Source location
        span: Span,
    },
}

/// Result alias for checker internals.
pub type Result<T> = std::result::Result<T, TypeError>;

impl TypeError {
    /// Get the span of this error.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            TypeError::Mismatch { span, .. }
            | TypeError::UndefinedVar { span, .. }
            | TypeError::UndefinedType { span, .. }
            | TypeError::UndefinedTrait { span, .. }
            | TypeError::DuplicateDefinition { span, .. }
            | TypeError::MissingParamType { span, .. }
            | TypeError::InvalidOperands { span, .. }
            | TypeError::UnsupportedOperator { span, .. }
            | TypeError::NonLvalueAddrOf { span }
            | TypeError::NonReferenceDeref { span, .. }
            | TypeError::NonBooleanCondition { span, .. }
            | TypeError::NotAFunction { span, .. }
            | TypeError::WrongArgCount { span, .. }
            | TypeError::ArgMismatch { span, .. }
            | TypeError::TraitConstraint { span, .. }
            | TypeError::SubtypeConstraint { span, .. }
            | TypeError::NotAChannel { span, .. }
            | TypeError::NotIterable { span, .. }
            | TypeError::ReturnMismatch { span, .. }
            | TypeError::ReturnOutsideFunction { span }
            | TypeError::BreakOutsideLoop { span, .. }
            | TypeError::InvalidAssignmentTarget { span }
            | TypeError::AssignToImmutable { span, .. }
            | TypeError::UnknownField { span, .. }
            | TypeError::MissingField { span, .. }
            | TypeError::FieldAccessOnNonStruct { span, .. }
            | TypeError::UnknownMethod { span, .. }
            | TypeError::UnknownVariant { span, .. }
            | TypeError::MissingTraitMethod { span, .. }
            | TypeError::MethodSignatureMismatch { span, .. }
            | TypeError::ImplOnNonStruct { span, .. }
            | TypeError::DuplicateImpl { span, .. }
            | TypeError::NotIndexable { span, .. }
            | TypeError::InfiniteType { span, .. }
            | TypeError::UnsafeCall { span, .. }
            | TypeError::KernelCall { span, .. }
            | TypeError::ConflictingBorrow { span, .. }
            | TypeError::MutBorrowOfImmutable { span, .. }
            | TypeError::SelfOutsideImpl { span }
            | TypeError::Reported { span } => *span,
        }
    }

    /// Stable code; `None` for [`TypeError::Reported`].
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        let code = match self {
            TypeError::Mismatch { .. } => ErrorCode::TypeMismatch,
            TypeError::UndefinedVar { .. } => ErrorCode::UndefinedVariable,
            TypeError::UndefinedType { .. } => ErrorCode::UndefinedType,
            TypeError::UndefinedTrait { .. } => ErrorCode::UndefinedTrait,
            TypeError::DuplicateDefinition { .. } => ErrorCode::DuplicateDefinition,
            TypeError::MissingParamType { .. } => ErrorCode::MissingParamType,
            TypeError::InvalidOperands { .. } => ErrorCode::InvalidOperands,
            TypeError::UnsupportedOperator { .. } => ErrorCode::UnsupportedOperator,
            TypeError::NonLvalueAddrOf { .. } => ErrorCode::NonLvalueAddrOf,
            TypeError::NonReferenceDeref { .. } => ErrorCode::NonReferenceDeref,
            TypeError::NonBooleanCondition { .. } => ErrorCode::NonBooleanCondition,
            TypeError::NotAFunction { .. } => ErrorCode::NotAFunction,
            TypeError::WrongArgCount { .. } => ErrorCode::WrongArgCount,
            TypeError::ArgMismatch { .. } => ErrorCode::ArgMismatch,
            TypeError::TraitConstraint { .. } => ErrorCode::TraitConstraint,
            TypeError::SubtypeConstraint { .. } => ErrorCode::SubtypeConstraint,
            TypeError::NotAChannel { .. } => ErrorCode::NotAChannel,
            TypeError::NotIterable { .. } => ErrorCode::NotIterable,
            TypeError::ReturnMismatch { .. } => ErrorCode::ReturnMismatch,
            TypeError::ReturnOutsideFunction { .. } => ErrorCode::ReturnOutsideFunction,
            TypeError::BreakOutsideLoop { .. } => ErrorCode::BreakOutsideLoop,
            TypeError::InvalidAssignmentTarget { .. } => ErrorCode::InvalidAssignmentTarget,
            TypeError::AssignToImmutable { .. } => ErrorCode::AssignToImmutable,
            TypeError::UnknownField { .. } => ErrorCode::UnknownField,
            TypeError::MissingField { .. } => ErrorCode::MissingField,
            TypeError::FieldAccessOnNonStruct { .. } => ErrorCode::FieldAccessOnNonStruct,
            TypeError::UnknownMethod { .. } => ErrorCode::UnknownMethod,
            TypeError::UnknownVariant { .. } => ErrorCode::UnknownVariant,
            TypeError::MissingTraitMethod { .. } => ErrorCode::MissingTraitMethod,
            TypeError::MethodSignatureMismatch { .. } => ErrorCode::MethodSignatureMismatch,
            TypeError::ImplOnNonStruct { .. } => ErrorCode::ImplOnNonStruct,
            TypeError::DuplicateImpl { .. } => ErrorCode::DuplicateImpl,
            TypeError::NotIndexable { .. } => ErrorCode::NotIndexable,
            TypeError::InfiniteType { .. } => ErrorCode::InfiniteType,
            TypeError::UnsafeCall { .. } => ErrorCode::UnsafeCall,
            TypeError::KernelCall { .. } => ErrorCode::KernelCall,
            TypeError::ConflictingBorrow { .. } => ErrorCode::ConflictingBorrow,
            TypeError::MutBorrowOfImmutable { .. } => ErrorCode::MutBorrowOfImmutable,
            TypeError::SelfOutsideImpl { .. } => ErrorCode::SelfOutsideImpl,
            TypeError::Reported { .. } => return None,
        };
        Some(code)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Mismatch { expected, found, .. } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            TypeError::UndefinedVar { name, .. } => write!(f, "undefined variable: {name}"),
            TypeError::UndefinedType { name, .. } => write!(f, "undefined type: {name}"),
            TypeError::UndefinedTrait { name, .. } => write!(f, "undefined trait: {name}"),
            TypeError::DuplicateDefinition { name, .. } => {
                write!(f, "{name} is defined more than once")
            }
            TypeError::MissingParamType { name, .. } => {
                write!(f, "parameter {name} needs a type annotation")
            }
            TypeError::InvalidOperands { op, lhs, rhs, .. } => match rhs {
                Some(rhs) => write!(f, "cannot apply `{op}` to {lhs} and {rhs}"),
                None => write!(f, "cannot apply `{op}` to {lhs}"),
            },
            TypeError::UnsupportedOperator { op, ty, .. } => {
                write!(f, "operator `{op}` is not supported for {ty}")
            }
            TypeError::NonLvalueAddrOf { .. } => {
                write!(f, "cannot take the address of a temporary value")
            }
            TypeError::NonReferenceDeref { ty, .. } => {
                write!(f, "cannot dereference non-reference type {ty}")
            }
            TypeError::NonBooleanCondition { found, .. } => {
                write!(f, "condition must be bool, found {found}")
            }
            TypeError::NotAFunction { ty, .. } => write!(f, "{ty} is not a function"),
            TypeError::WrongArgCount { expected, found, .. } => {
                let plural = if *expected == 1 { "" } else { "s" };
                write!(f, "expected {expected} argument{plural}, found {found}")
            }
            TypeError::ArgMismatch {
                index,
                expected,
                found,
                ..
            } => write!(
                f,
                "argument {} has type {found}, expected {expected}",
                index + 1
            ),
            TypeError::TraitConstraint { ty, trait_name, .. } => {
                write!(f, "type {ty} does not implement trait {trait_name}")
            }
            TypeError::SubtypeConstraint { ty, bound, .. } => {
                write!(f, "type {ty} is not a subtype of {bound}")
            }
            TypeError::NotAChannel { ty, .. } => write!(f, "{ty} is not a channel"),
            TypeError::NotIterable { ty, .. } => write!(f, "cannot iterate over {ty}"),
            TypeError::ReturnMismatch { expected, found, .. } => {
                write!(f, "return type mismatch: expected {expected}, found {found}")
            }
            TypeError::ReturnOutsideFunction { .. } => write!(f, "return outside function"),
            TypeError::BreakOutsideLoop { keyword, .. } => write!(f, "{keyword} outside loop"),
            TypeError::InvalidAssignmentTarget { .. } => write!(f, "invalid assignment target"),
            TypeError::AssignToImmutable { name, .. } => {
                write!(f, "cannot assign twice to immutable variable {name}")
            }
            TypeError::UnknownField { ty, field, .. } => {
                write!(f, "type {ty} has no field {field}")
            }
            TypeError::MissingField { ty, field, .. } => {
                write!(f, "missing field {field} in initializer of {ty}")
            }
            TypeError::FieldAccessOnNonStruct { ty, field, .. } => {
                write!(f, "cannot access field {field} on non-struct type {ty}")
            }
            TypeError::UnknownMethod { ty, method, .. } => {
                write!(f, "no method named {method} found for {ty}")
            }
            TypeError::UnknownVariant { ty, variant, .. } => {
                write!(f, "enum {ty} has no variant {variant}")
            }
            TypeError::MissingTraitMethod {
                ty,
                trait_name,
                method,
                ..
            } => write!(
                f,
                "type {ty} is missing method {method} required by trait {trait_name}"
            ),
            TypeError::MethodSignatureMismatch {
                method,
                expected,
                found,
                ..
            } => write!(
                f,
                "method {method} has type {found}, but the trait requires {expected}"
            ),
            TypeError::ImplOnNonStruct { ty, .. } => {
                write!(f, "cannot implement a trait for non-struct type {ty}")
            }
            TypeError::DuplicateImpl { ty, trait_name, .. } => {
                write!(f, "trait {trait_name} is already implemented for {ty}")
            }
            TypeError::NotIndexable { ty, .. } => write!(f, "cannot index into {ty}"),
            TypeError::InfiniteType { ty, .. } => {
                write!(f, "infinite type: {ty} would contain itself")
            }
            TypeError::UnsafeCall { callee, .. } => {
                write!(f, "call to {callee} requires an unsafe function")
            }
            TypeError::KernelCall { callee, .. } => {
                write!(f, "call to {callee} requires a kernel function")
            }
            TypeError::ConflictingBorrow { name, reason, .. } => {
                write!(f, "cannot borrow {name}: {reason}")
            }
            TypeError::MutBorrowOfImmutable { name, .. } => {
                write!(f, "cannot borrow immutable variable {name} as mutable")
            }
            TypeError::SelfOutsideImpl { .. } => write!(f, "`self` is only valid inside an impl"),
            TypeError::Reported { .. } => write!(f, "error already reported"),
        }
    }
}

impl std::error::Error for TypeError {}
