use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A predicate panicked while evaluating the record at `index`
    /// (zero-based position in the input).
    #[error("panic during filter evaluation of record {index}: {message}")]
    Evaluation { index: usize, message: String },
}

impl Error {
    /// Input position of the record that caused the error.
    pub fn index(&self) -> usize {
        match self {
            Error::Evaluation { index, .. } => *index,
        }
    }
}
