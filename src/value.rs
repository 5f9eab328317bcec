use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::registry::{EnumDescriptor, RecordShape, TypeDescriptor};
use crate::types::{FloatTy, IntTy, Ty};

/// A runtime value produced by evaluating an expression.
///
/// Signed integers of every width share the `Int` representation and
/// unsigned 64-bit values use `UInt`; the static type on the AST node that
/// produced a value is what fixes its width. `Null` doubles as the
/// absent/"no value" sentinel that failed `as` conversions, empty
/// first-match calls, and missing dynamic members produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    /// Signed integers, and unsigned ones narrow enough to fit.
    Int(i64),
    /// Unsigned 64-bit integers.
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    /// An enum member value with its descriptor.
    Enum { ty: Arc<EnumDescriptor>, value: i64 },
    List(Vec<Value>),
    /// A string-keyed dynamic property bag.
    Map(HashMap<String, Value>),
    /// An instance of a registered object type.
    Object {
        ty: Arc<TypeDescriptor>,
        fields: HashMap<String, Value>,
    },
    /// An anonymous record instance; `fields` is ordered per the shape.
    Record {
        shape: Arc<RecordShape>,
        fields: Vec<Value>,
    },
}

impl Value {
    /// The static type this value would be given as a substitution literal.
    pub fn ty(&self) -> Ty {
        match self {
            Value::Null => Ty::Null,
            Value::Bool(_) => Ty::Bool,
            Value::Char(_) => Ty::Char,
            Value::Int(_) => Ty::Int(IntTy::I64),
            Value::UInt(_) => Ty::Int(IntTy::U64),
            Value::Float(_) => Ty::Float(FloatTy::F64),
            Value::Decimal(_) => Ty::Decimal,
            Value::Str(_) => Ty::Str,
            Value::Enum { ty, .. } => Ty::Enum(ty.clone()),
            Value::List(items) => {
                let elem = items.first().map(Value::ty).unwrap_or(Ty::Dynamic);
                Ty::List(Box::new(elem))
            }
            Value::Map(_) => Ty::Map,
            Value::Object { ty, .. } => Ty::Object(ty.clone()),
            Value::Record { shape, .. } => Ty::Record(shape.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view as f64, when the value is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::UInt(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            Value::Enum { value, .. } => Some(*value as f64),
            _ => None,
        }
    }

    /// Numeric view as decimal, when the value is numeric.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(n) => Decimal::from_i64(*n),
            Value::UInt(n) => Decimal::from_u64(*n),
            Value::Float(n) => Decimal::from_f64(*n),
            Value::Decimal(d) => Some(*d),
            Value::Enum { value, .. } => Decimal::from_i64(*value),
            _ => None,
        }
    }

    fn is_numericish(&self) -> bool {
        matches!(
            self,
            Value::Int(_)
                | Value::UInt(_)
                | Value::Float(_)
                | Value::Decimal(_)
                | Value::Enum { .. }
        )
    }

    /// Equality that also relates numeric values across representations,
    /// used on dynamic operands and by `Contains`/`GroupBy`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self.is_numericish() && other.is_numericish() {
            if let (Some(x), Some(y)) = (self.as_decimal(), other.as_decimal()) {
                return x == y;
            }
            return self.as_f64() == other.as_f64();
        }
        self == other
    }

    /// Ordering between comparable values; `None` when the pair has no
    /// defined order.
    pub fn try_compare(&self, other: &Value) -> Option<CmpOrdering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Enum { value: a, .. }, Value::Enum { value: b, .. }) => Some(a.cmp(b)),
            (Value::Null, Value::Null) => Some(CmpOrdering::Equal),
            // Nulls sort first, keeping dynamic orderings total.
            (Value::Null, _) => Some(CmpOrdering::Less),
            (_, Value::Null) => Some(CmpOrdering::Greater),
            (a, b) => {
                // Mixed numeric representations from dynamic data.
                if let (Some(x), Some(y)) = (a.as_decimal(), b.as_decimal()) {
                    Some(x.cmp(&y))
                } else if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
                    x.partial_cmp(&y)
                } else {
                    None
                }
            }
        }
    }
}
