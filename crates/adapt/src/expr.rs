// crates/adapt/src/expr.rs

//! Textual filter expressions: `field:operator:value`.

use std::fmt;
use std::str::FromStr;

use domain::{ops, FieldMap, Predicate, Query, Value};
use regex::Regex;
use tracing::{debug, warn};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Match,
    Contains,
    HasItem,
    ContainsAll,
    ContainsAny,
    In,
    NotIn,
    Exists,
    Size,
    GeoWithin,
    Not,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Exactly(usize),
    AtLeastOne,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 19] = [
        OperatorKind::Eq,
        OperatorKind::Ne,
        OperatorKind::Gt,
        OperatorKind::Gte,
        OperatorKind::Lt,
        OperatorKind::Lte,
        OperatorKind::Match,
        OperatorKind::Contains,
        OperatorKind::HasItem,
        OperatorKind::ContainsAll,
        OperatorKind::ContainsAny,
        OperatorKind::In,
        OperatorKind::NotIn,
        OperatorKind::Exists,
        OperatorKind::Size,
        OperatorKind::GeoWithin,
        OperatorKind::Not,
        OperatorKind::And,
        OperatorKind::Or,
    ];

    pub fn as_str(self) -> &'static str {
        use OperatorKind::*;
        match self {
            Eq => "eq",
            Ne => "ne",
            Gt => "gt",
            Gte => "gte",
            Lt => "lt",
            Lte => "lte",
            Match => "match",
            Contains => "contains",
            HasItem => "hasitem",
            ContainsAll => "containsall",
            ContainsAny => "containsany",
            In => "in",
            NotIn => "nin",
            Exists => "exists",
            Size => "size",
            GeoWithin => "geowithin",
            Not => "not",
            And => "and",
            Or => "or",
        }
    }

    fn arity(self) -> Arity {
        use OperatorKind::*;
        match self {
            ContainsAll | ContainsAny | In | NotIn | And | Or => Arity::AtLeastOne,
            GeoWithin => Arity::Exactly(3),
            _ => Arity::Exactly(1),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperatorKind::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnknownOperator(s.to_string()))
    }
}

/// One comma-separated argument of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub text: String,
    /// Written in double quotes; always taken as a string.
    pub quoted: bool,
}

impl Arg {
    /// Interpret the argument as a literal value.
    pub fn scalar(&self) -> Value {
        if self.quoted {
            return Value::Str(self.text.clone());
        }
        match self.text.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" => Value::Null,
            text => text
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Str(text.to_string())),
        }
    }

    /// The argument as a `/pattern/` regex source, if written that way.
    fn regex_source(&self) -> Option<&str> {
        if self.quoted || self.text.len() < 2 {
            return None;
        }
        self.text.strip_prefix('/')?.strip_suffix('/')
    }
}

/// Split a value on commas that sit outside double quotes.
///
/// Each piece is trimmed; a piece wrapped in quotes loses them and is marked
/// as quoted. A trailing empty piece is dropped, so `""` yields nothing.
pub fn split_args(value: &str) -> Vec<Arg> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in value.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => pieces.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
        .into_iter()
        .map(|piece| {
            let trimmed = piece.trim();
            match trimmed
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
            {
                Some(inner) => Arg {
                    text: inner.to_string(),
                    quoted: true,
                },
                None => Arg {
                    text: trimmed.to_string(),
                    quoted: false,
                },
            }
        })
        .collect()
}

/// A parsed `field:operator:value` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
    /// Empty for the whole record.
    pub field: String,
    pub operator: OperatorKind,
    pub args: Vec<Arg>,
}

/// Parse one expression. Only the first two colons separate parts, so the
/// value may itself contain colons.
pub fn parse_filter(raw: &str) -> Result<FilterExpr, Error> {
    let mut parts = raw.splitn(3, ':');
    let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidFilter(raw.to_string()));
    };

    let expr = FilterExpr {
        field: field.to_string(),
        operator: operator.parse()?,
        args: split_args(value),
    };
    expr.check_arity()?;
    Ok(expr)
}

impl FilterExpr {
    /// Build the predicate this expression describes.
    pub fn predicate(&self) -> Result<Predicate, Error> {
        use OperatorKind::*;

        self.check_arity()?;
        let first = || self.arg(0);
        let scalars = || self.args.iter().map(Arg::scalar);
        let literals = || self.args.iter().map(|a| Query::Literal(a.scalar()));

        let predicate = match self.operator {
            Eq => ops::eq(first()?.scalar()),
            Ne => ops::ne(first()?.scalar()),
            Gt => ops::gt(first()?.scalar()),
            Gte => ops::gte(first()?.scalar()),
            Lt => ops::lt(first()?.scalar()),
            Lte => ops::lte(first()?.scalar()),
            Match => match first()?.regex_source() {
                Some(source) => ops::matches(Regex::new(source)?),
                None => ops::matches(first()?.text.as_str()),
            },
            Contains => ops::contains(first()?.text.as_str()),
            HasItem => ops::has_item(first()?.scalar()),
            ContainsAll => ops::contains_all(scalars()),
            ContainsAny => ops::contains_any(scalars()),
            In => ops::is_in(scalars()),
            NotIn => ops::not_in(scalars()),
            Exists => ops::exists(self.parse_arg(0, "boolean")?),
            Size => ops::size(self.parse_arg(0, "non-negative integer")?),
            GeoWithin => ops::geo_within(
                self.parse_arg(0, "number")?,
                self.parse_arg(1, "number")?,
                self.parse_arg(2, "number")?,
            ),
            Not => ops::not(Query::Literal(first()?.scalar())),
            And => ops::and(literals()),
            Or => ops::or(literals()),
        };
        Ok(predicate)
    }

    fn check_arity(&self) -> Result<(), Error> {
        let got = self.args.len();
        let expected = match self.operator.arity() {
            Arity::Exactly(n) if got != n => n.to_string(),
            Arity::AtLeastOne if got == 0 => "at least 1".to_string(),
            _ => return Ok(()),
        };
        Err(Error::Arity {
            operator: self.operator.as_str(),
            expected,
            got,
        })
    }

    fn arg(&self, index: usize) -> Result<&Arg, Error> {
        self.args.get(index).ok_or_else(|| Error::Arity {
            operator: self.operator.as_str(),
            expected: (index + 1).to_string(),
            got: self.args.len(),
        })
    }

    fn parse_arg<T: FromStr>(&self, index: usize, expected: &str) -> Result<T, Error> {
        let text = &self.arg(index)?.text;
        text.parse().map_err(|_| Error::InvalidArgument {
            operator: self.operator.as_str(),
            position: index + 1,
            reason: format!("expected {expected}, got: {text}"),
        })
    }
}

/// Combine expressions into one field-map query (implicit AND).
///
/// Returns `Ok(None)` when there are no expressions. A field named twice
/// keeps its last expression.
pub fn parse_filters<I, S>(filters: I) -> Result<Option<Query>, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fields = FieldMap::new();
    let mut seen = 0usize;

    for raw in filters {
        let raw = raw.as_ref();
        let expr = parse_filter(raw)?;
        let predicate = expr.predicate()?;
        debug!(filter = raw, "parsed filter");
        seen += 1;

        if fields
            .insert(expr.field.clone(), Query::Predicate(predicate))
            .is_some()
        {
            warn!(field = %expr.field, "field filtered more than once; keeping the last expression");
        }
    }

    Ok((seen > 0).then_some(Query::Fields(fields)))
}
