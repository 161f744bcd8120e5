use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Non-positive id, or an unknown codec name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Insertion or compression attempted on an already compressed index.
    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("no such term: {0:?}")]
    TermNotFound(String),

    /// A loaded store breaks an index invariant.
    #[error("corrupt index store: {0}")]
    CorruptStore(String),

    /// Bit string was not produced by the matching encoder.
    #[error("malformed code at bit {offset}: {reason}")]
    MalformedCode { offset: usize, reason: &'static str },
}

impl IndexError {
    pub(crate) fn malformed(offset: usize, reason: &'static str) -> Self {
        IndexError::MalformedCode { offset, reason }
    }
}
