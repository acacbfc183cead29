// crates/engine/src/bulk.rs

use domain::{Query, Record};
use tracing::{debug, warn};

use crate::fault::guarded_eval;
use crate::page::{Cursor, Page};
use crate::Error;

/// Outcome of a bulk filter pass.
///
/// A panicking predicate aborts the scan; `matched` then holds whatever had
/// been collected before the fault and `error` describes it.
#[derive(Debug)]
pub struct Filtered<T> {
    pub matched: Vec<T>,
    pub error: Option<Error>,
}

impl<T> Filtered<T> {
    fn complete(matched: Vec<T>) -> Self {
        Self {
            matched,
            error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Drop any partial result and keep only the error, if there was one.
    pub fn into_result(self) -> Result<Vec<T>, Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.matched),
        }
    }
}

/// Filter a finite sequence of records, in order.
///
/// With no query, this is pure pagination and nothing is evaluated.
/// Otherwise the first `page.skip` matches are dropped and at most
/// `page.limit` are kept; the scan stops as soon as the limit is reached.
#[tracing::instrument(skip_all, fields(skip = page.skip, limit = ?page.limit))]
pub fn filter<I>(records: I, query: Option<&Query>, page: Page) -> Filtered<I::Item>
where
    I: IntoIterator,
    I::Item: Record,
{
    let Some(query) = query else {
        let matched = records
            .into_iter()
            .skip(page.skip)
            .take(page.limit.unwrap_or(usize::MAX))
            .collect();
        return Filtered::complete(matched);
    };

    let mut cursor = Cursor::new(page);
    let mut matched = Vec::new();
    if cursor.is_done() {
        return Filtered::complete(matched);
    }

    for (index, record) in records.into_iter().enumerate() {
        match guarded_eval(query, &record, index) {
            Ok(true) => {
                if cursor.admit() {
                    matched.push(record);
                }
                if cursor.is_done() {
                    debug!(index, "limit reached; stopping scan");
                    break;
                }
            }
            Ok(false) => {}
            Err(err) => {
                warn!(%err, partial = matched.len(), "bulk filter aborted");
                return Filtered {
                    matched,
                    error: Some(err),
                };
            }
        }
    }

    debug!(matched = cursor.matched(), kept = matched.len(), "bulk filter finished");
    Filtered::complete(matched)
}
