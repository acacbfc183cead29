//! Schema-less query model: values, records, comparison, queries, and the
//! evaluator plus operator library built on them.

pub mod compare;
pub mod eval;
pub mod ops;
pub mod query;
pub mod record;
pub mod setting;
pub mod value;

pub use compare::{equal, is_nullish, order, to_number};
pub use eval::{eval, eval_record};
pub use query::{FieldMap, Predicate, Query, WHOLE_VALUE};
pub use record::{Record, Structural};
pub use value::Value;
