// crates/domain/src/ops.rs

//! Operator library.
//!
//! Every builder returns a [`Predicate`] closed over its arguments. The
//! logical combinators accept any [`Query`], so literals, field maps and
//! other predicates nest freely.

use std::cmp::Ordering;
use std::fmt;

use regex::Regex;

use crate::compare::{equal, order, to_number};
use crate::eval::eval;
use crate::query::{Predicate, Query};
use crate::value::Value;

/// Mean Earth radius used by [`geo_within`], in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn ordered(name: &'static str, threshold: Value, accept: fn(Ordering) -> bool) -> Predicate {
    Predicate::named(name, move |v| {
        order(v, Some(&threshold)).is_some_and(accept)
    })
}

fn any_equal(items: &[Value], value: &Value) -> bool {
    items.iter().any(|item| equal(Some(item), Some(value)))
}

fn collect_values<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}

pub fn eq(expected: impl Into<Value>) -> Predicate {
    let expected = expected.into();
    Predicate::named("eq", move |v| equal(v, Some(&expected)))
}

pub fn ne(expected: impl Into<Value>) -> Predicate {
    let expected = expected.into();
    Predicate::named("ne", move |v| !equal(v, Some(&expected)))
}

pub fn gt(threshold: impl Into<Value>) -> Predicate {
    ordered("gt", threshold.into(), Ordering::is_gt)
}

pub fn gte(threshold: impl Into<Value>) -> Predicate {
    ordered("gte", threshold.into(), Ordering::is_ge)
}

pub fn lt(threshold: impl Into<Value>) -> Predicate {
    ordered("lt", threshold.into(), Ordering::is_lt)
}

pub fn lte(threshold: impl Into<Value>) -> Predicate {
    ordered("lte", threshold.into(), Ordering::is_le)
}

/// Value equals any of `candidates`.
pub fn is_in<I, V>(candidates: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let candidates = collect_values(candidates);
    Predicate::named("in", move |v| {
        candidates.iter().any(|c| equal(v, Some(c)))
    })
}

/// Value equals none of `candidates`.
pub fn not_in<I, V>(candidates: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let candidates = collect_values(candidates);
    Predicate::named("nin", move |v| {
        !candidates.iter().any(|c| equal(v, Some(c)))
    })
}

/// Case-sensitive substring test on string values.
pub fn contains(needle: impl Into<String>) -> Predicate {
    let needle = needle.into();
    Predicate::named("contains", move |v| {
        v.and_then(Value::as_str).is_some_and(|s| s.contains(&needle))
    })
}

/// Pattern accepted by [`matches`].
#[derive(Clone)]
pub enum Pattern {
    /// Case-insensitive substring containment (stored lowercased).
    Text(String),
    Regex(Regex),
}

impl Pattern {
    pub fn is_match(&self, haystack: &str) -> bool {
        match self {
            Pattern::Text(needle) => haystack.to_lowercase().contains(needle.as_str()),
            Pattern::Regex(re) => re.is_match(haystack),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Text(t) => write!(f, "Text({t:?})"),
            Pattern::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
        }
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::Text(text.to_lowercase())
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Self {
        Pattern::Text(text.to_lowercase())
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

/// Text match on string values: plain text is a case-insensitive substring
/// test, a compiled regex is matched as-is.
pub fn matches(pattern: impl Into<Pattern>) -> Predicate {
    let pattern = pattern.into();
    Predicate::named("match", move |v| {
        v.and_then(Value::as_str).is_some_and(|s| pattern.is_match(s))
    })
}

/// Sequence holds an element equal to `item`.
pub fn has_item(item: impl Into<Value>) -> Predicate {
    let item = item.into();
    Predicate::named("hasitem", move |v| {
        v.and_then(Value::as_seq)
            .is_some_and(|seq| any_equal(seq, &item))
    })
}

/// Sequence holds every one of `items`.
pub fn contains_all<I, V>(items: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let items = collect_values(items);
    Predicate::named("containsall", move |v| {
        v.and_then(Value::as_seq)
            .is_some_and(|seq| items.iter().all(|item| any_equal(seq, item)))
    })
}

/// Sequence holds at least one of `items`.
pub fn contains_any<I, V>(items: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let items = collect_values(items);
    Predicate::named("containsany", move |v| {
        v.and_then(Value::as_seq)
            .is_some_and(|seq| items.iter().any(|item| any_equal(seq, item)))
    })
}

/// Field presence test. A field holding null is present.
pub fn exists(present: bool) -> Predicate {
    Predicate::named("exists", move |v| v.is_some() == present)
}

/// Length of a sequence, map, or string (in characters) equals `len`.
pub fn size(len: usize) -> Predicate {
    Predicate::named("size", move |v| match v {
        Some(Value::Seq(items)) => items.len() == len,
        Some(Value::Map(map)) => map.len() == len,
        Some(Value::Str(s)) => s.chars().count() == len,
        _ => false,
    })
}

/// Great-circle distance between two points, in kilometres (haversine).
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Value is a `[lat, lng, ..]` sequence within `radius_km` of the centre.
pub fn geo_within(lat: f64, lng: f64, radius_km: f64) -> Predicate {
    Predicate::named("geowithin", move |v| {
        let Some([p_lat, p_lng, ..]) = v.and_then(Value::as_seq) else {
            return false;
        };
        match (to_number(p_lat), to_number(p_lng)) {
            (Some(p_lat), Some(p_lng)) => haversine_km(lat, lng, p_lat, p_lng) <= radius_km,
            _ => false,
        }
    })
}

/// Every sub-query matches; stops at the first failure.
pub fn and<I>(queries: I) -> Predicate
where
    I: IntoIterator<Item = Query>,
{
    let queries: Vec<Query> = queries.into_iter().collect();
    Predicate::named("and", move |v| queries.iter().all(|q| eval(q, v)))
}

/// Some sub-query matches; stops at the first success.
pub fn or<I>(queries: I) -> Predicate
where
    I: IntoIterator<Item = Query>,
{
    let queries: Vec<Query> = queries.into_iter().collect();
    Predicate::named("or", move |v| queries.iter().any(|q| eval(q, v)))
}

pub fn not(query: impl Into<Query>) -> Predicate {
    let query = query.into();
    Predicate::named("not", move |v| !eval(&query, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    fn val(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    fn test(p: &Predicate, j: serde_json::Value) -> bool {
        p.test(Some(&val(j)))
    }

    fn counting(result: bool, calls: &Arc<AtomicUsize>) -> Query {
        let calls = Arc::clone(calls);
        Query::predicate(move |_| {
            calls.fetch_add(1, AtomicOrdering::SeqCst);
            result
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Comparisons
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn eq_and_ne() {
        assert!(test(&eq(3), json!(3.0)));
        assert!(!test(&eq(3), json!("3")));
        assert!(test(&ne(3), json!(4)));
        assert!(ne(3).test(None));
    }

    #[test]
    fn ordering_operators() {
        assert!(test(&gt(80), json!(90)));
        assert!(!test(&gt(80), json!(80)));
        assert!(test(&gte(80), json!(80.0)));
        assert!(test(&lt(80), json!(79.5)));
        assert!(test(&lte(80), json!(80)));
        assert!(test(&gt("apple"), json!("banana")));
    }

    #[test]
    fn incomparable_values_fail_both_directions() {
        for p in [gt(5), gte(5), lt(5), lte(5)] {
            assert!(!test(&p, json!("10")), "{p:?}");
            assert!(!test(&p, json!([1])), "{p:?}");
        }
    }

    #[test]
    fn absent_sorts_below_everything() {
        assert!(lt(0).test(None));
        assert!(!gt(0).test(None));
    }

    #[test]
    fn timestamps_order_chronologically() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let later = Value::from(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
        assert!(gt(cutoff).test(Some(&later)));
        assert!(!lt(cutoff).test(Some(&later)));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Membership & text
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn membership() {
        assert!(test(&is_in([1, 2, 3]), json!(2.0)));
        assert!(!test(&is_in(["a", "b"]), json!("c")));
        assert!(test(&not_in(["a", "b"]), json!("c")));
        assert!(is_in([Value::Null]).test(None));
    }

    #[test]
    fn contains_is_case_sensitive_and_string_only() {
        assert!(test(&contains("Angeles"), json!("Los Angeles")));
        assert!(!test(&contains("angeles"), json!("Los Angeles")));
        assert!(!test(&contains("1"), json!(123)));
    }

    #[test]
    fn match_text_ignores_case() {
        assert!(test(&matches("LAMP"), json!("Desk lamp")));
        assert!(!test(&matches("chair"), json!("Desk lamp")));
        assert!(!test(&matches("1"), json!(1)));
    }

    #[test]
    fn match_regex_is_applied_verbatim() {
        let re = Regex::new(r"^SKU-\d{3}$").unwrap();
        assert!(test(&matches(re.clone()), json!("SKU-042")));
        assert!(!test(&matches(re), json!("sku-042")));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sequences
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn has_item_uses_deep_equality() {
        assert!(test(&has_item("urgent"), json!(["a", "urgent"])));
        assert!(!test(&has_item("urgent"), json!(["a"])));
        assert!(test(&has_item(1.0), json!([1, 2])));
        assert!(test(&has_item(vec![1, 2]), json!([[1, 2], [3]])));
        assert!(!test(&has_item("urgent"), json!("urgent")));
    }

    #[test]
    fn contains_all_and_any() {
        let tags = json!(["rust", "cms", "web"]);
        assert!(test(&contains_all(["rust", "web"]), tags.clone()));
        assert!(!test(&contains_all(["rust", "go"]), tags.clone()));
        assert!(test(&contains_any(["go", "web"]), tags.clone()));
        assert!(!test(&contains_any(["go", "c"]), tags));
        assert!(!contains_any(["go"]).test(None));
    }

    #[test]
    fn exists_and_size() {
        assert!(exists(true).test(Some(&Value::Null)));
        assert!(!exists(true).test(None));
        assert!(exists(false).test(None));
        assert!(test(&size(2), json!([1, 2])));
        assert!(test(&size(3), json!("héy")));
        assert!(test(&size(1), json!({ "a": 1 })));
        assert!(!test(&size(1), json!(1)));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Geo
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn geo_within_uses_great_circle_distance() {
        let near = geo_within(40.0, -74.0, 10.0);
        // ~2 km and ~50 km due north of the centre.
        assert!(test(&near, json!([40.018, -74.0])));
        assert!(!test(&near, json!([40.4497, -74.0])));
        // Extra components beyond lat/lng are ignored.
        assert!(test(&near, json!([40.0, -74.0, 12.5])));
    }

    #[test]
    fn geo_within_rejects_bad_shapes() {
        let p = geo_within(0.0, 0.0, 100.0);
        assert!(!test(&p, json!([0.0])));
        assert!(!test(&p, json!(["0", "0"])));
        assert!(!test(&p, json!({ "lat": 0, "lng": 0 })));
        assert!(!p.test(None));
    }

    #[test]
    fn haversine_known_distance() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere.
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "{d}");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Combinators
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn and_short_circuits_on_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let p = and([counting(false, &calls), counting(true, &calls)]);
        assert!(!p.test(None));
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn or_short_circuits_on_first_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let p = or([counting(true, &calls), counting(false, &calls)]);
        assert!(p.test(None));
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn double_negation_is_identity() {
        let queries = [
            Query::from(gt(3)),
            Query::from(5),
            Query::null(),
            Query::field("a", 1),
        ];
        let values = [json!(5), json!(2), json!(null), json!({ "a": 1 })];
        for q in &queries {
            let twice = not(not(q.clone()));
            for v in &values {
                let v = val(v.clone());
                assert_eq!(twice.test(Some(&v)), eval(q, Some(&v)), "{q:?} on {v:?}");
            }
            assert_eq!(twice.test(None), eval(q, None));
        }
    }

    #[test]
    fn combinators_accept_literals_and_nesting() {
        let p = and([
            Query::from(or([Query::from(3), Query::from(4)])),
            Query::from(is_in([4, 3])),
            Query::from(not(5)),
            Query::from(and([
                Query::from(not(is_in([1, 2]))),
                Query::from(not(is_in([5, 6]))),
            ])),
        ]);
        let hits: Vec<i64> = (1..=6).filter(|n| p.test(Some(&Value::from(*n)))).collect();
        assert_eq!(hits, vec![3, 4]);
    }
}
