//! Adapters between the outside world and the query domain: the NDJSON
//! record source, `field:operator:value` filter expressions, and settings
//! files.

pub mod config;
pub mod expr;
pub mod ndjson;

mod error;

pub use error::Error;
