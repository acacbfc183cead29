// crates/domain/src/eval.rs

use crate::compare::{equal, is_nullish};
use crate::query::{FieldMap, Query, WHOLE_VALUE};
use crate::record::Record;
use crate::value::Value;

/// Evaluate a query against a single, possibly absent, value.
pub fn eval(query: &Query, value: Option<&Value>) -> bool {
    match query {
        Query::Predicate(p) => p.test(value),
        Query::Fields(fields) => match value {
            Some(v) => eval_fields(fields, v),
            // Every field of an absent value is itself absent.
            None => fields.values().all(|sub| eval(sub, None)),
        },
        Query::Literal(Value::Null) => is_nullish(value),
        Query::Literal(expected) => equal(value, Some(expected)),
    }
}

/// Evaluate a query against a whole record.
///
/// Field maps resolve their fields through the [`Record`] capability; any
/// other query sees the record as one value.
pub fn eval_record<R: Record + ?Sized>(query: &Query, record: &R) -> bool {
    match query {
        Query::Fields(fields) => eval_fields(fields, record),
        _ => eval(query, Some(&*record.as_value())),
    }
}

fn eval_fields<R: Record + ?Sized>(fields: &FieldMap, record: &R) -> bool {
    fields.iter().all(|(name, sub)| {
        if name == WHOLE_VALUE {
            eval_record(sub, record)
        } else {
            eval(sub, record.resolve(name).as_deref())
        }
    })
}
