// crates/engine/src/fault.rs

//! Panic containment around query evaluation.
//!
//! Predicates are user code. Each evaluation runs under `catch_unwind` so a
//! panicking predicate turns into an [`Error::Evaluation`] instead of tearing
//! down the caller. This only works with `panic = "unwind"` (the default).

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use domain::{eval_record, Query, Record};

use crate::Error;

/// Evaluate `query` against `record`, converting a panic into an error
/// attributed to input position `index`.
pub(crate) fn guarded_eval<R: Record + ?Sized>(
    query: &Query,
    record: &R,
    index: usize,
) -> Result<bool, Error> {
    // Queries are never mutated by evaluation, so observing one after an
    // unwind is fine.
    catch_unwind(AssertUnwindSafe(|| eval_record(query, record))).map_err(|payload| {
        Error::Evaluation {
            index,
            message: panic_message(payload.as_ref()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
