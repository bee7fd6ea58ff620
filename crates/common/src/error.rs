use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A platform identifier was not a positive 64-bit integer.
    #[error("invalid {kind} id: {value:?}")]
    InvalidId { kind: &'static str, value: String },
}

impl Error {
    #[must_use]
    pub fn invalid_id(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidId {
            kind,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
