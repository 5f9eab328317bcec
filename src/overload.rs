//! Overload and implicit-conversion resolution.
//!
//! Every operator application, method call, and conversion goes through the
//! same machinery: collect candidate signatures, score each argument against
//! each candidate parameter with a fixed rank table, and pick the unique
//! candidate with the lowest total. Ties are errors, never silent picks.
//!
//! Rank table, best to worst:
//! - exact type match (0)
//! - implicit numeric widening (10 + lattice distance, so nearer targets win)
//! - reference/boxing conversion (30)
//! - enum to underlying integral, widened as needed (40 + distance)
//! - underlying integral to enum, exact width only (42)
//!
//! The asymmetric enum costs make an enum operand collapse to its integral
//! representation rather than lifting the integral operand to the enum, so
//! comparing an enum member against any sufficiently wide integral has a
//! unique best candidate.

use crate::types::{widening_cost, Ty};

const RANK_WIDEN: u32 = 10;
const RANK_REFERENCE: u32 = 30;
const RANK_ENUM_TO_INT: u32 = 40;
const RANK_INT_TO_ENUM: u32 = 42;

/// Cost of implicitly converting `from` into `to`, or `None` when no
/// implicit conversion exists.
pub fn implicit_cost(from: &Ty, to: &Ty) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    if let Some(cost) = widening_cost(from, to) {
        return Some(RANK_WIDEN + cost);
    }
    match (from, to) {
        // Enum collapses to its underlying integral, then may widen.
        (Ty::Enum(e), to) if to.is_numeric() => {
            let underlying = Ty::Int(e.underlying);
            widening_cost(&underlying, to).map(|cost| RANK_ENUM_TO_INT + cost)
        }
        // Only the exact underlying type lifts to an enum.
        (Ty::Int(t), Ty::Enum(e)) if *t == e.underlying => Some(RANK_INT_TO_ENUM),
        // Null converts to any reference type; anything boxes to dynamic.
        (Ty::Null, to) if to.is_reference() => Some(RANK_REFERENCE),
        (_, Ty::Dynamic) => Some(RANK_REFERENCE),
        _ => None,
    }
}

/// Whether an explicit conversion (`TypeName(expr)` or `as`) is admissible.
///
/// Explicit conversions additionally permit numeric narrowing, enum and
/// integral interconversion at any width, and unboxing from dynamic; the
/// dynamic cases are checked at evaluation time.
pub fn explicit_allowed(from: &Ty, to: &Ty) -> bool {
    if implicit_cost(from, to).is_some() {
        return true;
    }
    match (from, to) {
        (a, b) if a.is_numeric() && b.is_numeric() => true,
        (Ty::Enum(_), b) if b.is_integral() => true,
        (a, Ty::Enum(_)) if a.is_integral() => true,
        (Ty::Char, b) if b.is_integral() => true,
        (a, Ty::Char) if a.is_integral() => true,
        (Ty::Dynamic, _) | (Ty::Map, _) => true,
        (Ty::Null, b) => b.is_reference(),
        _ => false,
    }
}

/// Why no candidate was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveFailure {
    /// No candidate accepts this argument count.
    ArityMismatch,
    /// Candidates exist at this arity, but no argument list converts.
    NoMatch,
    /// Two or more candidates tie at the lowest total cost.
    Ambiguous,
}

/// Selects the unique lowest-total-cost candidate for `args`.
///
/// Returns the index of the winning candidate.
pub fn resolve(candidates: &[&[Ty]], args: &[Ty]) -> Result<usize, ResolveFailure> {
    let mut best: Option<(usize, u32)> = None;
    let mut tied = false;
    let mut arity_matched = false;

    for (index, params) in candidates.iter().enumerate() {
        if params.len() != args.len() {
            continue;
        }
        arity_matched = true;

        let mut total = 0u32;
        let mut applicable = true;
        for (arg, param) in args.iter().zip(params.iter()) {
            match implicit_cost(arg, param) {
                Some(cost) => total += cost,
                None => {
                    applicable = false;
                    break;
                }
            }
        }
        if !applicable {
            continue;
        }

        match best {
            Some((_, best_total)) if total > best_total => {}
            Some((_, best_total)) if total == best_total => tied = true,
            _ => {
                best = Some((index, total));
                tied = false;
            }
        }
    }

    match best {
        Some((index, _)) if !tied => Ok(index),
        Some(_) => Err(ResolveFailure::Ambiguous),
        None if arity_matched => Err(ResolveFailure::NoMatch),
        None => Err(ResolveFailure::ArityMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EnumDescriptor;
    use crate::types::{FloatTy, IntTy};
    use std::sync::Arc;

    fn i32t() -> Ty {
        Ty::Int(IntTy::I32)
    }
    fn i64t() -> Ty {
        Ty::Int(IntTy::I64)
    }

    #[test]
    fn exact_beats_widening() {
        let a = [i32t(), i32t()];
        let b = [i64t(), i64t()];
        let candidates: Vec<&[Ty]> = vec![&a, &b];
        assert_eq!(resolve(&candidates, &[i32t(), i32t()]), Ok(0));
        assert_eq!(resolve(&candidates, &[i32t(), i64t()]), Ok(1));
    }

    #[test]
    fn equally_distant_widenings_are_ambiguous() {
        let a = [i64t()];
        let b = [Ty::Int(IntTy::U64)];
        let candidates: Vec<&[Ty]> = vec![&a, &b];
        assert_eq!(
            resolve(&candidates, &[Ty::Int(IntTy::U32)]),
            Err(ResolveFailure::Ambiguous)
        );
    }

    #[test]
    fn arity_mismatch_is_distinguished() {
        let a = [i32t()];
        let candidates: Vec<&[Ty]> = vec![&a];
        assert_eq!(
            resolve(&candidates, &[i32t(), i32t()]),
            Err(ResolveFailure::ArityMismatch)
        );
    }

    #[test]
    fn enum_collapses_rather_than_lifting() {
        let e = Arc::new(
            EnumDescriptor::new("Severity", IntTy::I32)
                .with_member("Low", 0)
                .with_member("High", 2),
        );
        let enum_ty = Ty::Enum(e);
        let ints = [i32t(), i32t()];
        let enums = [enum_ty.clone(), enum_ty.clone()];
        let candidates: Vec<&[Ty]> = vec![&ints, &enums];
        // An i32 operand against an enum operand picks the integral pair.
        assert_eq!(resolve(&candidates, &[i32t(), enum_ty.clone()]), Ok(0));
        // Two enum operands stay an enum comparison.
        assert_eq!(resolve(&candidates, &[enum_ty.clone(), enum_ty]), Ok(1));
    }

    #[test]
    fn float_targets_tie_for_integral_arguments() {
        let f32s = [Ty::Float(FloatTy::F32)];
        let f64s = [Ty::Float(FloatTy::F64)];
        let candidates: Vec<&[Ty]> = vec![&f32s, &f64s];
        assert_eq!(
            resolve(&candidates, &[i32t()]),
            Err(ResolveFailure::Ambiguous)
        );
        // but a float target still beats decimal
        let decs = [Ty::Decimal];
        let near_far: Vec<&[Ty]> = vec![&f32s, &decs];
        assert_eq!(resolve(&near_far, &[i32t()]), Ok(0));
    }
}
