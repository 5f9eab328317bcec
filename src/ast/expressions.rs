use std::sync::Arc;

use crate::ast::operators::{BinOp, SeqOp, TestMode, UnOp};
use crate::registry::{MethodDescriptor, RecordShape};
use crate::types::Ty;
use crate::value::Value;

/// A fully-typed expression node.
///
/// Every variant carries (or derives) its resolved static type: the binder
/// never constructs a node before its type is known. The one deliberately
/// untyped surface is `DynamicMember`, a deferred lookup over a string-keyed
/// bag whose result type is the opaque `Dynamic` marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal or substitution value.
    Literal { value: Value, ty: Ty },

    /// A declared parameter or sub-query iteration variable.
    ///
    /// `slot` is the index the binding occupies in the evaluation frame.
    Var { name: String, slot: usize, ty: Ty },

    /// A statically bound member access.
    ///
    /// # Examples
    /// ```text
    /// it.Name
    /// order.Customer.Age
    /// ```
    Property {
        base: Box<Expr>,
        name: String,
        ty: Ty,
    },

    /// A member access deferred to evaluation time.
    ///
    /// Produced when the base is a string-keyed bag or already dynamic. A
    /// missing entry yields null at evaluation, keeping chains total.
    DynamicMember { base: Box<Expr>, name: String },

    /// An indexer access.
    ///
    /// # Examples
    /// ```text
    /// items[0]
    /// bag["key"]
    /// ```
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        ty: Ty,
    },

    /// A call to a built-in instance method, with its resolved overload.
    Call {
        base: Box<Expr>,
        method: Arc<MethodDescriptor>,
        args: Vec<Expr>,
    },

    /// An implicit or explicit conversion inserted by the binder.
    Convert { expr: Box<Expr>, ty: Ty },

    /// A unary operation.
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        ty: Ty,
    },

    /// A binary operation over operands already converted to a common type.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: Ty,
    },

    /// The conditional operator (`?:` or `iif`).
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        ty: Ty,
    },

    /// `is` / `as` type tests against an allow-listed target type.
    TypeTest {
        expr: Box<Expr>,
        target: Ty,
        mode: TestMode,
    },

    /// An anonymous record projection.
    ///
    /// # Examples
    /// ```text
    /// new(it.Name, it.Price * 2 alias Doubled)
    /// ```
    New {
        shape: Arc<RecordShape>,
        fields: Vec<Expr>,
    },

    /// A sequence operation over a collection-typed source.
    ///
    /// Scope-opening operators carry the slot of their implicit iteration
    /// variable; `Contains`/`Take`/`Skip` leave it empty and their `body`
    /// is an argument evaluated in the enclosing scope.
    Subquery {
        op: SeqOp,
        source: Box<Expr>,
        var_slot: Option<usize>,
        body: Option<Box<Expr>>,
        ty: Ty,
    },
}

impl Expr {
    /// The resolved static type of this node.
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Literal { ty, .. } => ty.clone(),
            Expr::Var { ty, .. } => ty.clone(),
            Expr::Property { ty, .. } => ty.clone(),
            Expr::DynamicMember { .. } => Ty::Dynamic,
            Expr::Index { ty, .. } => ty.clone(),
            Expr::Call { method, .. } => method.ret.clone(),
            Expr::Convert { ty, .. } => ty.clone(),
            Expr::Unary { ty, .. } => ty.clone(),
            Expr::Binary { ty, .. } => ty.clone(),
            Expr::Conditional { ty, .. } => ty.clone(),
            Expr::TypeTest { target, mode, .. } => match mode {
                TestMode::Is => Ty::Bool,
                TestMode::As => target.clone(),
            },
            Expr::New { shape, .. } => Ty::Record(shape.clone()),
            Expr::Subquery { ty, .. } => ty.clone(),
        }
    }
}
