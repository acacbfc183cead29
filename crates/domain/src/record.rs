// crates/domain/src/record.rs

//! Field access over arbitrary records.
//!
//! The evaluator only ever talks to [`Record`]. Keyed mappings resolve a
//! field by key lookup; named-field aggregates go through [`Structural`],
//! which views any `Serialize` type through its serde representation.

use serde::Serialize;
use serde_json::Value as Json;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::value::Value;

/// Capability to resolve named fields on a record.
///
/// `resolve` returns `None` when the field does not exist, which is distinct
/// from `Some(Value::Null)`. Resolution never fails.
pub trait Record {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>>;

    /// The whole record as a single value, handed to predicates that test
    /// the record itself rather than one of its fields.
    fn as_value(&self) -> Cow<'_, Value>;
}

impl Record for Value {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        match self {
            Value::Map(map) => map.get(name).map(Cow::Borrowed),
            _ => None,
        }
    }

    fn as_value(&self) -> Cow<'_, Value> {
        Cow::Borrowed(self)
    }
}

impl Record for BTreeMap<String, Value> {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(name).map(Cow::Borrowed)
    }

    fn as_value(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::Map(self.clone()))
    }
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.get(name).map(Cow::Borrowed)
    }

    fn as_value(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::Map(
            self.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        ))
    }
}

impl Record for Json {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.as_object()?
            .get(name)
            .map(|v| Cow::Owned(Value::from(v)))
    }

    fn as_value(&self) -> Cow<'_, Value> {
        Cow::Owned(Value::from(self))
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        (**self).resolve(name)
    }

    fn as_value(&self) -> Cow<'_, Value> {
        (**self).as_value()
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        (**self).resolve(name)
    }

    fn as_value(&self) -> Cow<'_, Value> {
        (**self).as_value()
    }
}

impl<R: Record + ?Sized> Record for Arc<R> {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        (**self).resolve(name)
    }

    fn as_value(&self) -> Cow<'_, Value> {
        (**self).as_value()
    }
}

/// Structural adapter for named-field aggregates.
///
/// The serde view is built on first access and cached, so a record is
/// serialized at most once no matter how many fields a query touches.
#[derive(Debug, Clone)]
pub struct Structural<T> {
    inner: T,
    view: OnceLock<Value>,
}

impl<T: Serialize> Structural<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            view: OnceLock::new(),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    fn view(&self) -> &Value {
        self.view.get_or_init(|| match serde_json::to_value(&self.inner) {
            Ok(json) => Value::from(json),
            Err(err) => {
                warn!(%err, "record could not be serialized; all of its fields are absent");
                Value::Null
            }
        })
    }
}

impl<T: Serialize> Record for Structural<T> {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.view().resolve(name)
    }

    fn as_value(&self) -> Cow<'_, Value> {
        Cow::Borrowed(self.view())
    }
}
