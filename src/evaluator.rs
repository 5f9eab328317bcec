use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::ast::operators::{BinOp, SeqOp, TestMode, UnOp};
use crate::ast::{Expr, ParsedLambda, ParsedOrdering};
use crate::registry::StrMethod;
use crate::types::{FloatTy, IntTy, Ty};
use crate::value::Value;

/// Errors that can occur while evaluating a parsed expression.
///
/// Missing dynamic members are deliberately not errors: a deferred lookup
/// that finds nothing yields [`Value::Null`] so chained access stays total.
#[derive(Debug, Clone)]
pub enum EvalError {
    /// A dynamic value had an unexpected runtime type, or an operation was
    /// applied to a value that does not support it.
    TypeError(String),

    /// Integer division or modulo by zero
    DivisionByZero,

    /// Integer arithmetic overflowed
    Overflow,

    /// `First`, `Min`, or `Max` over an empty source
    EmptySequence,
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::TypeError(msg) => write!(f, "Type error: {}", msg),
            EvalError::DivisionByZero => write!(f, "Division by zero"),
            EvalError::Overflow => write!(f, "Arithmetic overflow"),
            EvalError::EmptySequence => write!(f, "Sequence contains no elements"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Returns a human-readable type name for a Value
fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Char(_) => "char",
        Value::Int(_) => "integer",
        Value::UInt(_) => "unsigned integer",
        Value::Float(_) => "float",
        Value::Decimal(_) => "decimal",
        Value::Str(_) => "string",
        Value::Enum { .. } => "enum",
        Value::List(_) => "list",
        Value::Map(_) => "map",
        Value::Object { .. } => "object",
        Value::Record { .. } => "record",
    }
}

/// The tree-walking evaluator.
///
/// Parameters and sub-query iteration variables live in a slot-indexed
/// frame sized by the parsed lambda; nested scopes use distinct slots, so
/// correlated references to outer variables read their slots directly.
#[derive(Default)]
pub struct Evaluator {
    slots: Vec<Value>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates a parsed lambda against concrete argument values.
    ///
    /// # Examples
    ///
    /// ```
    /// use sieve_lang::{Evaluator, IntTy, Ty, TypeRegistry, Value};
    /// use sieve_lang::parser::parse_predicate;
    ///
    /// let registry = TypeRegistry::new();
    /// let lambda = parse_predicate("it > 2", &registry, Ty::Int(IntTy::I32)).unwrap();
    ///
    /// let mut evaluator = Evaluator::new();
    /// let result = evaluator.eval_lambda(&lambda, &[Value::Int(3)]).unwrap();
    /// assert_eq!(result, Value::Bool(true));
    /// ```
    pub fn eval_lambda(
        &mut self,
        lambda: &ParsedLambda,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        if args.len() != lambda.params.len() {
            return Err(EvalError::TypeError(format!(
                "expected {} arguments, got {}",
                lambda.params.len(),
                args.len()
            )));
        }
        self.slots = vec![Value::Null; lambda.slot_count];
        self.slots[..args.len()].clone_from_slice(args);
        self.eval_expr(&lambda.body)
    }

    /// Sorts items by a parsed ordering list: the first entry is the
    /// primary key, later entries break ties, and the sort is stable.
    pub fn sort(
        &mut self,
        ordering: &ParsedOrdering,
        items: Vec<Value>,
    ) -> Result<Vec<Value>, EvalError> {
        let mut keyed: Vec<(Vec<Value>, Value)> = Vec::with_capacity(items.len());
        for item in items {
            self.slots = vec![Value::Null; ordering.slot_count];
            self.slots[0] = item.clone();
            let mut keys = Vec::with_capacity(ordering.orderings.len());
            for entry in &ordering.orderings {
                keys.push(self.eval_expr(&entry.selector)?);
            }
            keyed.push((keys, item));
        }
        keyed.sort_by(|(a, _), (b, _)| {
            for (ordering_entry, (ka, kb)) in ordering.orderings.iter().zip(a.iter().zip(b)) {
                let cmp = ka
                    .try_compare(kb)
                    .unwrap_or(std::cmp::Ordering::Equal);
                let cmp = if ordering_entry.ascending {
                    cmp
                } else {
                    cmp.reverse()
                };
                if cmp != std::cmp::Ordering::Equal {
                    return cmp;
                }
            }
            std::cmp::Ordering::Equal
        });
        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Var { slot, .. } => Ok(self.slots[*slot].clone()),
            Expr::Property { base, name, .. } => {
                let base = self.eval_expr(base)?;
                Ok(self.read_member(&base, name))
            }
            Expr::DynamicMember { base, name } => {
                let base = self.eval_expr(base)?;
                Ok(self.read_member(&base, name))
            }
            Expr::Index { base, index, .. } => {
                let base = self.eval_expr(base)?;
                let index = self.eval_expr(index)?;
                self.read_index(&base, &index)
            }
            Expr::Call { base, method, args } => {
                let base = self.eval_expr(base)?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval_expr(arg)?);
                }
                self.call_string_method(&base, method.builtin, &evaluated)
            }
            Expr::Convert { expr, ty } => {
                let value = self.eval_expr(expr)?;
                convert_value(value, ty)
            }
            Expr::Unary { op, operand, .. } => {
                let value = self.eval_expr(operand)?;
                apply_unary(*op, value)
            }
            Expr::Binary {
                op, left, right, ..
            } => match op {
                // short-circuiting
                BinOp::And => {
                    if !self.eval_bool(left)? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.eval_bool(right)?))
                }
                BinOp::Or => {
                    if self.eval_bool(left)? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.eval_bool(right)?))
                }
                _ => {
                    let left = self.eval_expr(left)?;
                    let right = self.eval_expr(right)?;
                    apply_binop(*op, &left, &right)
                }
            },
            Expr::Conditional {
                test,
                then,
                otherwise,
                ..
            } => {
                if self.eval_bool(test)? {
                    self.eval_expr(then)
                } else {
                    self.eval_expr(otherwise)
                }
            }
            Expr::TypeTest { expr, target, mode } => {
                let value = self.eval_expr(expr)?;
                match mode {
                    TestMode::Is => Ok(Value::Bool(value_is(&value, target))),
                    TestMode::As => {
                        if value.is_null() {
                            return Ok(Value::Null);
                        }
                        if value_is(&value, target) {
                            convert_value(value, target)
                        } else {
                            Ok(Value::Null)
                        }
                    }
                }
            }
            Expr::New { shape, fields } => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    values.push(self.eval_expr(field)?);
                }
                Ok(Value::Record {
                    shape: shape.clone(),
                    fields: values,
                })
            }
            Expr::Subquery {
                op,
                source,
                var_slot,
                body,
                ty,
            } => {
                let source = self.eval_expr(source)?;
                self.eval_sequence_op(*op, source, *var_slot, body.as_deref(), ty)
            }
        }
    }

    fn eval_bool(&mut self, expr: &Expr) -> Result<bool, EvalError> {
        match self.eval_expr(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::TypeError(format!(
                "expected a boolean, found {}",
                type_name(&other)
            ))),
        }
    }

    /// Member lookup at runtime. Statically-bound members are guaranteed to
    /// exist for well-formed values; deferred lookups miss quietly, yielding
    /// null so chained dynamic access stays total.
    fn read_member(&self, base: &Value, name: &str) -> Value {
        match base {
            Value::Str(s) if name == "Length" => Value::Int(s.chars().count() as i64),
            Value::Map(map) => map.get(name).cloned().unwrap_or(Value::Null),
            Value::Object { fields, .. } => fields.get(name).cloned().unwrap_or(Value::Null),
            Value::Record { shape, fields } => match shape.field_index(name) {
                Some(index) => fields[index].clone(),
                None => Value::Null,
            },
            _ => Value::Null,
        }
    }

    fn read_index(&self, base: &Value, index: &Value) -> Result<Value, EvalError> {
        match (base, index) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::List(items), _) => {
                let i = index_as_usize(index)?;
                Ok(items.get(i).cloned().unwrap_or(Value::Null))
            }
            (Value::Str(s), _) => {
                let i = index_as_usize(index)?;
                Ok(s.chars().nth(i).map(Value::Char).unwrap_or(Value::Null))
            }
            (Value::Map(map), Value::Str(key)) => {
                Ok(map.get(key).cloned().unwrap_or(Value::Null))
            }
            (a, b) => Err(EvalError::TypeError(format!(
                "cannot index {} with {}",
                type_name(a),
                type_name(b)
            ))),
        }
    }

    fn call_string_method(
        &self,
        base: &Value,
        method: StrMethod,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        if base.is_null() {
            return Ok(Value::Null);
        }
        let Value::Str(s) = base else {
            return Err(EvalError::TypeError(format!(
                "expected a string receiver, found {}",
                type_name(base)
            )));
        };
        let str_arg = |i: usize| -> Result<&str, EvalError> {
            match &args[i] {
                Value::Str(s) => Ok(s.as_str()),
                Value::Null => Ok(""),
                other => Err(EvalError::TypeError(format!(
                    "expected a string argument, found {}",
                    type_name(other)
                ))),
            }
        };
        let int_arg = |i: usize| -> Result<usize, EvalError> { index_as_usize(&args[i]) };
        match method {
            StrMethod::Contains => Ok(Value::Bool(s.contains(str_arg(0)?))),
            StrMethod::StartsWith => Ok(Value::Bool(s.starts_with(str_arg(0)?))),
            StrMethod::EndsWith => Ok(Value::Bool(s.ends_with(str_arg(0)?))),
            StrMethod::ToUpper => Ok(Value::Str(s.to_uppercase())),
            StrMethod::ToLower => Ok(Value::Str(s.to_lowercase())),
            StrMethod::Trim => Ok(Value::Str(s.trim().to_string())),
            StrMethod::Substring1 => {
                let start = int_arg(0)?;
                Ok(Value::Str(s.chars().skip(start).collect()))
            }
            StrMethod::Substring2 => {
                let start = int_arg(0)?;
                let len = int_arg(1)?;
                Ok(Value::Str(s.chars().skip(start).take(len).collect()))
            }
            StrMethod::IndexOf => {
                let needle = str_arg(0)?;
                match s.find(needle) {
                    Some(byte_pos) => Ok(Value::Int(s[..byte_pos].chars().count() as i64)),
                    None => Ok(Value::Int(-1)),
                }
            }
            StrMethod::Replace => {
                Ok(Value::Str(s.replace(str_arg(0)?, str_arg(1)?)))
            }
            StrMethod::Matches => {
                let pattern = str_arg(0)?;
                let re = regex::Regex::new(pattern)
                    .map_err(|e| EvalError::TypeError(format!("invalid regex: {e}")))?;
                Ok(Value::Bool(re.is_match(s)))
            }
        }
    }

    fn eval_sequence_op(
        &mut self,
        op: SeqOp,
        source: Value,
        var_slot: Option<usize>,
        body: Option<&Expr>,
        ty: &Ty,
    ) -> Result<Value, EvalError> {
        // Plain-argument operators evaluate their argument once, in the
        // enclosing scope.
        match op {
            SeqOp::Contains => {
                let needle = self.eval_expr(body.expect("Contains has an argument"))?;
                let items = as_list(&source)?;
                return Ok(Value::Bool(items.iter().any(|v| v.loose_eq(&needle))));
            }
            SeqOp::Take | SeqOp::Skip => {
                let count = self.eval_expr(body.expect("Take/Skip has an argument"))?;
                let count = index_as_usize(&count)?;
                let items = as_list(&source)?;
                let result = if op == SeqOp::Take {
                    items.iter().take(count).cloned().collect()
                } else {
                    items.iter().skip(count).cloned().collect()
                };
                return Ok(Value::List(result));
            }
            _ => {}
        }

        let items = as_list(&source)?;

        // A null source behaves as empty.
        let matching = |this: &mut Self, item: &Value| -> Result<bool, EvalError> {
            match body {
                Some(predicate) => {
                    let slot = var_slot.expect("scoped operator has a slot");
                    this.slots[slot] = item.clone();
                    this.eval_bool(predicate)
                }
                None => Ok(true),
            }
        };

        match op {
            SeqOp::Where => {
                let mut kept = Vec::new();
                for item in &items {
                    if matching(self, item)? {
                        kept.push(item.clone());
                    }
                }
                Ok(Value::List(kept))
            }
            SeqOp::Any => {
                for item in &items {
                    if matching(self, item)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            SeqOp::All => {
                for item in &items {
                    if !matching(self, item)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            SeqOp::First | SeqOp::FirstOrDefault => {
                for item in &items {
                    if matching(self, item)? {
                        return Ok(item.clone());
                    }
                }
                if op == SeqOp::First {
                    Err(EvalError::EmptySequence)
                } else {
                    Ok(Value::Null)
                }
            }
            SeqOp::Count => {
                let mut count = 0i64;
                for item in &items {
                    if matching(self, item)? {
                        count += 1;
                    }
                }
                Ok(Value::Int(count))
            }
            SeqOp::Select => {
                let selector = body.expect("Select has a selector");
                let slot = var_slot.expect("Select has a slot");
                let mut mapped = Vec::with_capacity(items.len());
                for item in &items {
                    self.slots[slot] = item.clone();
                    mapped.push(self.eval_expr(selector)?);
                }
                Ok(Value::List(mapped))
            }
            SeqOp::OrderBy | SeqOp::OrderByDescending => {
                let selector = body.expect("OrderBy has a selector");
                let slot = var_slot.expect("OrderBy has a slot");
                let mut keyed = Vec::with_capacity(items.len());
                for item in &items {
                    self.slots[slot] = item.clone();
                    keyed.push((self.eval_expr(selector)?, item.clone()));
                }
                keyed.sort_by(|(a, _), (b, _)| {
                    let cmp = a.try_compare(b).unwrap_or(std::cmp::Ordering::Equal);
                    if op == SeqOp::OrderBy { cmp } else { cmp.reverse() }
                });
                Ok(Value::List(keyed.into_iter().map(|(_, v)| v).collect()))
            }
            SeqOp::GroupBy => {
                let selector = body.expect("GroupBy has a selector");
                let slot = var_slot.expect("GroupBy has a slot");
                let Ty::List(row_ty) = ty else {
                    return Err(EvalError::TypeError("malformed GroupBy type".to_string()));
                };
                let Ty::Record(shape) = row_ty.as_ref() else {
                    return Err(EvalError::TypeError("malformed GroupBy type".to_string()));
                };
                // First-seen key order, linear scan; keys are not hashable.
                let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
                for item in &items {
                    self.slots[slot] = item.clone();
                    let key = self.eval_expr(selector)?;
                    match groups.iter_mut().find(|(k, _)| k.loose_eq(&key)) {
                        Some((_, members)) => members.push(item.clone()),
                        None => groups.push((key, vec![item.clone()])),
                    }
                }
                Ok(Value::List(
                    groups
                        .into_iter()
                        .map(|(key, members)| Value::Record {
                            shape: shape.clone(),
                            fields: vec![key, Value::List(members)],
                        })
                        .collect(),
                ))
            }
            SeqOp::Sum | SeqOp::Min | SeqOp::Max | SeqOp::Average => {
                let mut values = Vec::with_capacity(items.len());
                for item in &items {
                    let value = match (body, var_slot) {
                        (Some(selector), Some(slot)) => {
                            self.slots[slot] = item.clone();
                            self.eval_expr(selector)?
                        }
                        _ => item.clone(),
                    };
                    values.push(value);
                }
                aggregate(op, values, ty)
            }
            SeqOp::Contains | SeqOp::Take | SeqOp::Skip => unreachable!(),
        }
    }
}

fn as_list(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(EvalError::TypeError(format!(
            "expected a list, found {}",
            type_name(other)
        ))),
    }
}

fn index_as_usize(value: &Value) -> Result<usize, EvalError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::UInt(n) => Ok(*n as usize),
        Value::Int(_) => Err(EvalError::TypeError("index must not be negative".to_string())),
        other => Err(EvalError::TypeError(format!(
            "expected an integer, found {}",
            type_name(other)
        ))),
    }
}

fn aggregate(op: SeqOp, values: Vec<Value>, ty: &Ty) -> Result<Value, EvalError> {
    match op {
        SeqOp::Sum => {
            if values.is_empty() {
                return Ok(zero_of(ty));
            }
            let mut acc = values[0].clone();
            for value in &values[1..] {
                acc = apply_binop(BinOp::Add, &acc, value)?;
            }
            Ok(acc)
        }
        SeqOp::Min | SeqOp::Max => {
            let mut iter = values.into_iter();
            let Some(mut best) = iter.next() else {
                return Err(EvalError::EmptySequence);
            };
            for value in iter {
                let cmp = value.try_compare(&best).ok_or_else(|| {
                    EvalError::TypeError("values have no common ordering".to_string())
                })?;
                let replace = if op == SeqOp::Min {
                    cmp == std::cmp::Ordering::Less
                } else {
                    cmp == std::cmp::Ordering::Greater
                };
                if replace {
                    best = value;
                }
            }
            Ok(best)
        }
        SeqOp::Average => {
            if values.is_empty() {
                return Err(EvalError::EmptySequence);
            }
            if matches!(ty, Ty::Decimal) {
                let mut sum = Decimal::ZERO;
                for value in &values {
                    sum += value.as_decimal().ok_or_else(|| {
                        EvalError::TypeError("cannot average a non-numeric value".to_string())
                    })?;
                }
                Ok(Value::Decimal(sum / Decimal::from(values.len() as i64)))
            } else {
                let mut sum = 0f64;
                for value in &values {
                    sum += value.as_f64().ok_or_else(|| {
                        EvalError::TypeError("cannot average a non-numeric value".to_string())
                    })?;
                }
                Ok(Value::Float(sum / values.len() as f64))
            }
        }
        _ => unreachable!(),
    }
}

fn zero_of(ty: &Ty) -> Value {
    match ty {
        Ty::Decimal => Value::Decimal(Decimal::ZERO),
        Ty::Float(_) => Value::Float(0.0),
        Ty::Int(IntTy::U64) => Value::UInt(0),
        _ => Value::Int(0),
    }
}

/// Runtime instance-of check. Numeric targets accept any numeric value that
/// converts without data loss.
fn value_is(value: &Value, target: &Ty) -> bool {
    match target {
        Ty::Dynamic => !value.is_null(),
        Ty::Bool => matches!(value, Value::Bool(_)),
        Ty::Char => matches!(value, Value::Char(_)),
        Ty::Str => matches!(value, Value::Str(_)),
        Ty::Map => matches!(value, Value::Map(_)),
        Ty::List(_) => matches!(value, Value::List(_)),
        Ty::Enum(target) => {
            matches!(value, Value::Enum { ty, .. } if ty.name == target.name)
        }
        Ty::Object(target) => {
            matches!(value, Value::Object { ty, .. } if ty.name == target.name)
        }
        Ty::Record(target) => {
            matches!(value, Value::Record { shape, .. } if shape.id == target.id)
        }
        Ty::Int(int_ty) => match value {
            Value::Int(n) => int_fits(*n, *int_ty),
            Value::UInt(n) => {
                *int_ty == IntTy::U64 || i64::try_from(*n).is_ok_and(|n| int_fits(n, *int_ty))
            }
            Value::Float(f) => f.fract() == 0.0 && int_fits(*f as i64, *int_ty),
            _ => false,
        },
        Ty::Float(_) => matches!(value, Value::Float(_) | Value::Int(_) | Value::UInt(_)),
        Ty::Decimal => matches!(value, Value::Decimal(_) | Value::Int(_) | Value::UInt(_)),
        Ty::Null => value.is_null(),
    }
}

fn int_fits(n: i64, ty: IntTy) -> bool {
    match ty {
        IntTy::I8 => i8::try_from(n).is_ok(),
        IntTy::I16 => i16::try_from(n).is_ok(),
        IntTy::I32 => i32::try_from(n).is_ok(),
        IntTy::I64 => true,
        IntTy::U8 => u8::try_from(n).is_ok(),
        IntTy::U16 => u16::try_from(n).is_ok(),
        IntTy::U32 => u32::try_from(n).is_ok(),
        IntTy::U64 => n >= 0,
    }
}

/// Converts a runtime value to the target static type. Null passes through
/// untouched so conversions stay total over absent data.
pub(crate) fn convert_value(value: Value, target: &Ty) -> Result<Value, EvalError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match target {
        Ty::Dynamic | Ty::Map | Ty::List(_) | Ty::Object(_) | Ty::Record(_) | Ty::Null => {
            Ok(value)
        }
        Ty::Bool => match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            other => Err(EvalError::TypeError(format!(
                "expected a boolean, found {}",
                type_name(&other)
            ))),
        },
        Ty::Str => match value {
            Value::Str(s) => Ok(Value::Str(s)),
            other => Err(EvalError::TypeError(format!(
                "expected a string, found {}",
                type_name(&other)
            ))),
        },
        Ty::Char => match value {
            Value::Char(c) => Ok(Value::Char(c)),
            Value::Int(n) => char::from_u32(n as u32)
                .map(Value::Char)
                .ok_or_else(|| EvalError::TypeError("invalid character value".to_string())),
            other => Err(EvalError::TypeError(format!(
                "expected a character, found {}",
                type_name(&other)
            ))),
        },
        Ty::Int(int_ty) => {
            let wide = match &value {
                Value::Int(n) => *n as i128,
                Value::UInt(n) => *n as i128,
                Value::Float(f) => *f as i128,
                Value::Decimal(d) => d.trunc().to_i128().ok_or(EvalError::Overflow)?,
                Value::Enum { value, .. } => *value as i128,
                Value::Char(c) => *c as u32 as i128,
                other => {
                    return Err(EvalError::TypeError(format!(
                        "cannot convert {} to an integer",
                        type_name(other)
                    )));
                }
            };
            // Unchecked-style wrapping, as explicit casts truncate.
            Ok(match int_ty {
                IntTy::I8 => Value::Int(wide as i8 as i64),
                IntTy::I16 => Value::Int(wide as i16 as i64),
                IntTy::I32 => Value::Int(wide as i32 as i64),
                IntTy::I64 => Value::Int(wide as i64),
                IntTy::U8 => Value::Int(wide as u8 as i64),
                IntTy::U16 => Value::Int(wide as u16 as i64),
                IntTy::U32 => Value::Int(wide as u32 as i64),
                IntTy::U64 => Value::UInt(wide as u64),
            })
        }
        Ty::Float(float_ty) => {
            let f = value.as_f64().ok_or_else(|| {
                EvalError::TypeError(format!(
                    "cannot convert {} to a float",
                    type_name(&value)
                ))
            })?;
            Ok(match float_ty {
                FloatTy::F32 => Value::Float(f as f32 as f64),
                FloatTy::F64 => Value::Float(f),
            })
        }
        Ty::Decimal => value
            .as_decimal()
            .map(Value::Decimal)
            .ok_or_else(|| {
                EvalError::TypeError(format!(
                    "cannot convert {} to a decimal",
                    type_name(&value)
                ))
            }),
        Ty::Enum(desc) => match value {
            Value::Enum { value, .. } => Ok(Value::Enum {
                ty: desc.clone(),
                value,
            }),
            Value::Int(n) => Ok(Value::Enum {
                ty: desc.clone(),
                value: n,
            }),
            Value::UInt(n) => Ok(Value::Enum {
                ty: desc.clone(),
                value: n as i64,
            }),
            other => Err(EvalError::TypeError(format!(
                "cannot convert {} to enum '{}'",
                type_name(&other),
                desc.name
            ))),
        },
    }
}

fn apply_unary(op: UnOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnOp::Not => match value {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(EvalError::TypeError(format!(
                "cannot negate {}",
                type_name(&other)
            ))),
        },
        UnOp::Negate => match value {
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Decimal(d) => Ok(Value::Decimal(-d)),
            other => Err(EvalError::TypeError(format!(
                "cannot negate {}",
                type_name(&other)
            ))),
        },
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Equal => Ok(Value::Bool(left.loose_eq(right))),
        BinOp::NotEqual => Ok(Value::Bool(!left.loose_eq(right))),
        BinOp::LessThan | BinOp::GreaterThan | BinOp::LessEqual | BinOp::GreaterEqual => {
            let cmp = left.try_compare(right).ok_or_else(|| {
                EvalError::TypeError(format!(
                    "cannot compare {} with {}",
                    type_name(left),
                    type_name(right)
                ))
            })?;
            let result = match op {
                BinOp::LessThan => cmp == std::cmp::Ordering::Less,
                BinOp::GreaterThan => cmp == std::cmp::Ordering::Greater,
                BinOp::LessEqual => cmp != std::cmp::Ordering::Greater,
                _ => cmp != std::cmp::Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
                BinOp::BitOr => a | b,
                BinOp::BitXor => a ^ b,
                _ => a & b,
            })),
            (Value::UInt(a), Value::UInt(b)) => Ok(Value::UInt(match op {
                BinOp::BitOr => a | b,
                BinOp::BitXor => a ^ b,
                _ => a & b,
            })),
            (a, b) => Err(EvalError::TypeError(format!(
                "bitwise operator requires integers, found {} and {}",
                type_name(a),
                type_name(b)
            ))),
        },
        BinOp::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            match (left, right) {
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
                (a, b) => Err(EvalError::TypeError(format!(
                    "cannot concatenate {} and {}",
                    type_name(a),
                    type_name(b)
                ))),
            }
        }
        BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => {
            numeric_binop(op, left, right)
        }
        BinOp::And | BinOp::Or => unreachable!("logical operators short-circuit"),
    }
}

fn numeric_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => {
            let result = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Subtract => a.checked_sub(*b),
                BinOp::Multiply => a.checked_mul(*b),
                BinOp::Divide => {
                    if *b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_div(*b)
                }
                _ => {
                    if *b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_rem(*b)
                }
            };
            result.map(Value::Int).ok_or(EvalError::Overflow)
        }
        (Value::UInt(a), Value::UInt(b)) => {
            let result = match op {
                BinOp::Add => a.checked_add(*b),
                BinOp::Subtract => a.checked_sub(*b),
                BinOp::Multiply => a.checked_mul(*b),
                BinOp::Divide => {
                    if *b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_div(*b)
                }
                _ => {
                    if *b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_rem(*b)
                }
            };
            result.map(Value::UInt).ok_or(EvalError::Overflow)
        }
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            let (a, b) = (
                left.as_decimal().ok_or_else(|| non_numeric(left))?,
                right.as_decimal().ok_or_else(|| non_numeric(right))?,
            );
            match op {
                BinOp::Add => Ok(Value::Decimal(a + b)),
                BinOp::Subtract => Ok(Value::Decimal(a - b)),
                BinOp::Multiply => Ok(Value::Decimal(a * b)),
                BinOp::Divide => {
                    if b.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(Value::Decimal(a / b))
                }
                _ => {
                    if b.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(Value::Decimal(a % b))
                }
            }
        }
        _ => {
            // Mixed representations reach here only on dynamic operands.
            let (a, b) = (
                left.as_f64().ok_or_else(|| non_numeric(left))?,
                right.as_f64().ok_or_else(|| non_numeric(right))?,
            );
            let result = match op {
                BinOp::Add => a + b,
                BinOp::Subtract => a - b,
                BinOp::Multiply => a * b,
                BinOp::Divide => a / b,
                _ => a % b,
            };
            Ok(Value::Float(result))
        }
    }
}

fn non_numeric(value: &Value) -> EvalError {
    EvalError::TypeError(format!("{} is not numeric", type_name(value)))
}
