use crate::ast::Expr;
use crate::types::Ty;

/// A declared input variable: a name bound to a static type.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Ty,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Parameter {
            name: name.into(),
            ty,
        }
    }

    /// The implicit single parameter, reachable as `it`.
    pub fn it(ty: Ty) -> Self {
        Parameter::new("it", ty)
    }
}

/// A parsed expression packaged with its parameter list: a callable
/// signature ready to be evaluated or spliced into a larger pipeline.
///
/// `slot_count` is the total number of evaluation-frame slots the tree
/// uses: one per parameter plus one per sub-query iteration variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLambda {
    pub params: Vec<Parameter>,
    pub body: Expr,
    pub slot_count: usize,
}
