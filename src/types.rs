//! Static types for the expression language.
//!
//! Every AST node carries one of these types, resolved at bind time. The
//! numeric widening lattice here backs implicit conversions: each edge is a
//! lossless promotion, and the distance between two types is the cost the
//! overload resolver charges for converting along it.

use std::sync::Arc;

use crate::registry::{EnumDescriptor, RecordShape, TypeDescriptor};

/// Integer types, by signedness and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntTy {
    pub fn is_signed(self) -> bool {
        matches!(self, IntTy::I8 | IntTy::I16 | IntTy::I32 | IntTy::I64)
    }

    /// Width rank within a signedness family: 8-bit is 0, 64-bit is 3.
    fn rank(self) -> u32 {
        match self {
            IntTy::I8 | IntTy::U8 => 0,
            IntTy::I16 | IntTy::U16 => 1,
            IntTy::I32 | IntTy::U32 => 2,
            IntTy::I64 | IntTy::U64 => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntTy::I8 => "SByte",
            IntTy::I16 => "Int16",
            IntTy::I32 => "Int32",
            IntTy::I64 => "Int64",
            IntTy::U8 => "Byte",
            IntTy::U16 => "UInt16",
            IntTy::U32 => "UInt32",
            IntTy::U64 => "UInt64",
        }
    }
}

/// Floating-point types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatTy {
    F32,
    F64,
}

impl FloatTy {
    pub fn name(self) -> &'static str {
        match self {
            FloatTy::F32 => "Single",
            FloatTy::F64 => "Double",
        }
    }
}

/// A resolved static type.
///
/// `Dynamic` is the deliberate opaque marker: the type of deferred member
/// lookups over string-keyed bags and of values declared without a static
/// type. `Null` is the type of the `null` literal, convertible to any
/// reference type.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Bool,
    Char,
    Str,
    Int(IntTy),
    Float(FloatTy),
    Decimal,
    Enum(Arc<EnumDescriptor>),
    Object(Arc<TypeDescriptor>),
    Record(Arc<RecordShape>),
    List(Box<Ty>),
    Map,
    Dynamic,
    Null,
}

impl Ty {
    /// Canonical display name, also used as the shape-cache key component.
    pub fn name(&self) -> String {
        match self {
            Ty::Bool => "Boolean".to_string(),
            Ty::Char => "Char".to_string(),
            Ty::Str => "String".to_string(),
            Ty::Int(t) => t.name().to_string(),
            Ty::Float(t) => t.name().to_string(),
            Ty::Decimal => "Decimal".to_string(),
            Ty::Enum(e) => e.name.clone(),
            Ty::Object(d) => d.name.clone(),
            Ty::Record(s) => format!("record#{}", s.id),
            Ty::List(e) => format!("List<{}>", e.name()),
            Ty::Map => "Map".to_string(),
            Ty::Dynamic => "Object".to_string(),
            Ty::Null => "null".to_string(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int(_) | Ty::Float(_) | Ty::Decimal)
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Ty::Int(_))
    }

    /// Reference-typed values admit `null`.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Ty::Str
                | Ty::Object(_)
                | Ty::Record(_)
                | Ty::List(_)
                | Ty::Map
                | Ty::Dynamic
                | Ty::Null
        )
    }

    /// Types usable as ordering keys and with relational operators.
    pub fn is_orderable(&self) -> bool {
        self.is_numeric()
            || matches!(self, Ty::Str | Ty::Char | Ty::Bool | Ty::Enum(_) | Ty::Dynamic)
    }
}

/// Cost of an implicit numeric widening, or `None` if the conversion would
/// lose information or change sign interpretation.
///
/// Edges: signed to wider signed, unsigned to wider unsigned or strictly
/// wider signed, any integer to `Single`/`Double`/`Decimal`, and `Single` to
/// `Double`. Float and decimal do not interconvert implicitly, and nothing
/// narrows implicitly.
pub fn widening_cost(from: &Ty, to: &Ty) -> Option<u32> {
    match (from, to) {
        (Ty::Int(a), Ty::Int(b)) => {
            if a == b {
                return Some(0);
            }
            let wider = b.rank() > a.rank();
            match (a.is_signed(), b.is_signed()) {
                (true, true) | (false, false) if wider => Some(b.rank() - a.rank()),
                // Unsigned fits in any strictly wider signed type.
                (false, true) if wider => Some(b.rank() - a.rank()),
                _ => None,
            }
        }
        // Single and Double are equally distant targets from the integrals:
        // a signed/unsigned mix that can only meet at a float ties between
        // them and is reported as ambiguous rather than silently losing
        // precision. Decimal is farther.
        (Ty::Int(_), Ty::Float(_)) => Some(4),
        (Ty::Int(_), Ty::Decimal) => Some(6),
        (Ty::Float(FloatTy::F32), Ty::Float(FloatTy::F64)) => Some(1),
        (Ty::Float(a), Ty::Float(b)) if a == b => Some(0),
        (Ty::Decimal, Ty::Decimal) => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_prefers_nearer_integer() {
        let a = widening_cost(&Ty::Int(IntTy::I32), &Ty::Int(IntTy::I64)).unwrap();
        let b = widening_cost(&Ty::Int(IntTy::I32), &Ty::Float(FloatTy::F64)).unwrap();
        assert!(a < b);
    }

    #[test]
    fn unsigned_widens_to_strictly_wider_signed_only() {
        assert!(widening_cost(&Ty::Int(IntTy::U32), &Ty::Int(IntTy::I64)).is_some());
        assert!(widening_cost(&Ty::Int(IntTy::U32), &Ty::Int(IntTy::I32)).is_none());
        assert!(widening_cost(&Ty::Int(IntTy::I32), &Ty::Int(IntTy::U64)).is_none());
    }

    #[test]
    fn no_float_decimal_interconversion() {
        assert!(widening_cost(&Ty::Float(FloatTy::F64), &Ty::Decimal).is_none());
        assert!(widening_cost(&Ty::Decimal, &Ty::Float(FloatTy::F64)).is_none());
    }
}
