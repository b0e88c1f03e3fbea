//! Type promotion and comparison.
//!
//! Mixed-kind comparisons promote both operands to the higher kind of the
//! lattice `logical < integer < float < string`. NULL never compares, and
//! object values only compare with each other, by identity.
//!
//! The comparator for a pair of kinds comes from a fixed table, so hot loops
//! such as sorts look it up once with [`compare_function_for_kinds`] and call
//! it per element.

use std::cmp::Ordering;

use crate::error::{raise, EidosError, RuntimeResult};
use crate::handle::Handle;
use crate::span::Span;
use crate::value::{Value, ValueKind};

/// Compares element `ia` of the first value with element `ib` of the second.
pub type CompareFn = fn(&Value, usize, &Value, usize, Option<Span>) -> RuntimeResult<Ordering>;

const CONTEXT: &str = "compare_values";

/// Total order on floats: NaN equals NaN and sorts after every number.
pub fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an integer with a float; no rounding of large integers.
pub fn compare_int_float(int: i64, float: f64) -> Ordering {
    // 2^63, the first float above every i64
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return Ordering::Less;
    }
    if float >= TWO_POW_63 {
        return Ordering::Less;
    }
    if float < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => {
            let fraction = float - whole;
            if fraction > 0.0 {
                Ordering::Less
            } else if fraction < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        unequal => unequal,
    }
}

/// The kind both operands are promoted to, or `None` when they cannot be ordered.
pub fn promoted_kind(k1: ValueKind, k2: ValueKind) -> Option<ValueKind> {
    match (k1, k2) {
        (ValueKind::Null, _) | (_, ValueKind::Null) => None,
        (ValueKind::Object, ValueKind::Object) => Some(ValueKind::Object),
        (ValueKind::Object, _) | (_, ValueKind::Object) => None,
        _ => Some(k1.max(k2)),
    }
}

fn element<T>(items: Option<&[T]>, index: usize, span: Option<Span>) -> RuntimeResult<&T> {
    let items = items.unwrap_or_default();
    match items.get(index) {
        Some(item) => Ok(item),
        None => raise(EidosError::index_out_of_range(CONTEXT, index, items.len()).with_span(span)),
    }
}

fn compare_null(a: &Value, _: usize, b: &Value, _: usize, span: Option<Span>) -> RuntimeResult<Ordering> {
    raise(
        EidosError::type_error(
            CONTEXT,
            format!("cannot compare {} with {}; NULL cannot be ordered", a.kind(), b.kind()),
        )
        .with_span(span),
    )
}

fn compare_object_mixed(
    a: &Value,
    _: usize,
    b: &Value,
    _: usize,
    span: Option<Span>,
) -> RuntimeResult<Ordering> {
    raise(
        EidosError::type_error(
            CONTEXT,
            format!("cannot compare {} with {}", a.element_type(), b.element_type()),
        )
        .with_span(span),
    )
}

fn compare_logical(a: &Value, ia: usize, b: &Value, ib: usize, span: Option<Span>) -> RuntimeResult<Ordering> {
    let x = element(a.logical_slice(), ia, span)?;
    let y = element(b.logical_slice(), ib, span)?;
    Ok(x.cmp(y))
}

fn compare_int(a: &Value, ia: usize, b: &Value, ib: usize, span: Option<Span>) -> RuntimeResult<Ordering> {
    let x = element(a.int_slice(), ia, span)?;
    let y = element(b.int_slice(), ib, span)?;
    Ok(x.cmp(y))
}

fn compare_float(a: &Value, ia: usize, b: &Value, ib: usize, span: Option<Span>) -> RuntimeResult<Ordering> {
    let x = element(a.float_slice(), ia, span)?;
    let y = element(b.float_slice(), ib, span)?;
    Ok(compare_floats(*x, *y))
}

fn compare_string(a: &Value, ia: usize, b: &Value, ib: usize, span: Option<Span>) -> RuntimeResult<Ordering> {
    let x = element(a.string_slice(), ia, span)?;
    let y = element(b.string_slice(), ib, span)?;
    Ok(x.as_bytes().cmp(y.as_bytes()))
}

/// Identity only: `Equal` for the same element, `Less` otherwise.
fn compare_object(a: &Value, ia: usize, b: &Value, ib: usize, span: Option<Span>) -> RuntimeResult<Ordering> {
    let x = element(a.object_elements(), ia, span)?;
    let y = element(b.object_elements(), ib, span)?;
    Ok(if Handle::ptr_eq(x, y) {
        Ordering::Equal
    } else {
        Ordering::Less
    })
}

/// Cross-kind path: promote both operands, then compare.
fn compare_promoted(a: &Value, ia: usize, b: &Value, ib: usize, span: Option<Span>) -> RuntimeResult<Ordering> {
    match promoted_kind(a.kind(), b.kind()) {
        Some(ValueKind::Logical) => Ok(a.logical_at(ia, span)?.cmp(&b.logical_at(ib, span)?)),
        Some(ValueKind::Int) => Ok(a.int_at(ia, span)?.cmp(&b.int_at(ib, span)?)),
        Some(ValueKind::Float) => match (a.kind(), b.kind()) {
            (ValueKind::Int, ValueKind::Float) => {
                Ok(compare_int_float(a.int_at(ia, span)?, b.float_at(ib, span)?))
            }
            (ValueKind::Float, ValueKind::Int) => {
                Ok(compare_int_float(b.int_at(ib, span)?, a.float_at(ia, span)?).reverse())
            }
            _ => Ok(compare_floats(a.float_at(ia, span)?, b.float_at(ib, span)?)),
        },
        Some(ValueKind::String) => {
            let x = a.string_at(ia, span)?;
            let y = b.string_at(ib, span)?;
            Ok(x.as_bytes().cmp(y.as_bytes()))
        }
        Some(ValueKind::Object) => compare_object(a, ia, b, ib, span),
        Some(ValueKind::Null) | None => compare_null(a, ia, b, ib, span),
    }
}

const N: CompareFn = compare_null;
const X: CompareFn = compare_object_mixed;
const P: CompareFn = compare_promoted;

/// Indexed by `[left kind][right kind]` in declaration order of [`ValueKind`].
static COMPARE_TABLE: [[CompareFn; 6]; 6] = [
    //        NULL logical          integer      float          string          object
    /* NULL */ [N, N, N, N, N, N],
    /* lgl  */ [N, compare_logical, P, P, P, X],
    /* int  */ [N, P, compare_int, P, P, X],
    /* flt  */ [N, P, P, compare_float, P, X],
    /* str  */ [N, P, P, P, compare_string, X],
    /* obj  */ [N, X, X, X, X, compare_object],
];

/// The comparator for operands of kinds `k1` and `k2`.
pub fn compare_function_for_kinds(k1: ValueKind, k2: ValueKind) -> CompareFn {
    COMPARE_TABLE[k1 as usize][k2 as usize]
}

/// Compares element `ia` of `a` with element `ib` of `b` after promotion.
pub fn compare_values(
    a: &Value,
    ia: usize,
    b: &Value,
    ib: usize,
    span: Option<Span>,
) -> RuntimeResult<Ordering> {
    compare_function_for_kinds(a.kind(), b.kind())(a, ia, b, ib, span)
}

pub fn values_equal(
    a: &Value,
    ia: usize,
    b: &Value,
    ib: usize,
    span: Option<Span>,
) -> RuntimeResult<bool> {
    Ok(compare_values(a, ia, b, ib, span)? == Ordering::Equal)
}
