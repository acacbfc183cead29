// crates/domain/src/compare.rs

//! Equality and ordering across heterogeneous values.
//!
//! Numbers of any width are normalized into `f64` before comparison so
//! `3i8`, `3u64` and `3.0` are all the same value. Sequences and maps are
//! compared structurally, element by element, with the same normalization.

use std::cmp::Ordering;

use tracing::trace;

use crate::value::Value;

/// True for an absent value or an explicit null.
pub fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Widen a numeric value into the shared `f64` domain. Does not parse strings.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Equality with numeric normalization and deep structural comparison.
///
/// Two nullish values are equal; a nullish value never equals a non-null one.
pub fn equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    let (a, b) = match (a, b) {
        _ if is_nullish(a) && is_nullish(b) => return true,
        (Some(a), Some(b)) if !a.is_null() && !b.is_null() => (a, b),
        _ => return false,
    };

    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::UInt(x), Value::UInt(y)) => x == y,
        (Value::Int(i), Value::UInt(u)) | (Value::UInt(u), Value::Int(i)) => {
            u64::try_from(*i).is_ok_and(|i| i == *u)
        }
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Time(x), Value::Time(y)) => x == y,
        (Value::Seq(x), Value::Seq(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| equal(Some(l), Some(r)))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, l)| y.get(k).is_some_and(|r| equal(Some(l), Some(r))))
        }
        _ => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Order two values.
///
/// Null (or absent) sorts before everything else. Same-kind integers,
/// strings and timestamps have fast paths; any other pair is compared in the
/// numeric domain. `None` means the values are not mutually orderable.
pub fn order(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    match (is_nullish(a), is_nullish(b)) {
        (true, true) => return Some(Ordering::Equal),
        (true, false) => return Some(Ordering::Less),
        (false, true) => return Some(Ordering::Greater),
        (false, false) => {}
    }
    let (a, b) = (a?, b?);

    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::UInt(x), Value::UInt(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Time(x), Value::Time(y)) => Some(x.cmp(y)),
        _ => {
            let ord = match (to_number(a), to_number(b)) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            };
            if ord.is_none() {
                trace!(
                    left = a.kind_name(),
                    right = b.kind_name(),
                    "values are not mutually orderable"
                );
            }
            ord
        }
    }
}
