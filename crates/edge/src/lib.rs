pub mod cli;

mod error;

pub use error::Error;
