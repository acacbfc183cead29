// crates/domain/src/query.rs

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::eval;
use crate::record::Record;
use crate::value::Value;

/// Field name that addresses the whole current value instead of a field.
pub const WHOLE_VALUE: &str = "";

/// Field-to-subquery mapping; every entry must match (implicit AND).
pub type FieldMap = BTreeMap<String, Query>;

type TestFn = dyn Fn(Option<&Value>) -> bool + Send + Sync;

/// An opaque boolean test over a (possibly absent) value.
///
/// Predicates may panic; the filter engine contains the unwind at the call
/// site and reports it as an evaluation error.
#[derive(Clone)]
pub struct Predicate {
    name: Cow<'static, str>,
    test: Arc<TestFn>,
}

impl Predicate {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self::named("fn", test)
    }

    pub fn named<F>(name: impl Into<Cow<'static, str>>, test: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            test: Arc::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn test(&self, value: Option<&Value>) -> bool {
        (self.test)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.name)
    }
}

/// A declarative filter expression.
///
/// Queries are immutable once built and are `Send + Sync`, so one tree can be
/// shared by any number of concurrent filter runs.
#[derive(Debug, Clone)]
pub enum Query {
    /// Match by equality; `Literal(Value::Null)` matches nullish values.
    Literal(Value),
    Predicate(Predicate),
    Fields(FieldMap),
}

impl Query {
    pub fn literal(value: impl Into<Value>) -> Self {
        Query::Literal(value.into())
    }

    /// The null literal: matches absent fields and explicit nulls.
    pub fn null() -> Self {
        Query::Literal(Value::Null)
    }

    pub fn predicate<F>(test: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Query::Predicate(Predicate::new(test))
    }

    /// Build a field map. Later entries for the same field replace earlier ones.
    pub fn fields<I, K, Q>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Q)>,
        K: Into<String>,
        Q: Into<Query>,
    {
        Query::Fields(
            entries
                .into_iter()
                .map(|(k, q)| (k.into(), q.into()))
                .collect(),
        )
    }

    /// Single-field shorthand for `Query::fields([(name, query)])`.
    pub fn field(name: impl Into<String>, query: impl Into<Query>) -> Self {
        let entry: (String, Query) = (name.into(), query.into());
        Query::fields([entry])
    }

    /// Does `record` satisfy this query?
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        eval::eval_record(self, record)
    }
}

impl From<Value> for Query {
    fn from(value: Value) -> Self {
        Query::Literal(value)
    }
}

impl From<Predicate> for Query {
    fn from(p: Predicate) -> Self {
        Query::Predicate(p)
    }
}

impl From<FieldMap> for Query {
    fn from(fields: FieldMap) -> Self {
        Query::Fields(fields)
    }
}

macro_rules! literal_query_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Query {
            fn from(v: $t) -> Self {
                Query::Literal(Value::from(v))
            }
        })*
    };
}

literal_query_from!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, &str, String,
    DateTime<Utc>
);
