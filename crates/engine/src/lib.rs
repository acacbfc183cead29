//! Filter engine: bulk and streaming evaluation of domain queries with
//! skip/limit pagination and panic isolation.

mod bulk;
mod error;
mod fault;
mod page;
mod stream;

pub use bulk::{filter, Filtered};
pub use error::Error;
pub use page::Page;
pub use stream::filter_stream;
