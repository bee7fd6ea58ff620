use std::error::Error as StdError;

/// Crate-wide result type for room lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A platform call (create, delete, move, message, lookup) failed.
    #[error("{context}: {source}")]
    Platform {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The platform could not answer, e.g. the guild is not cached yet.
    #[error("platform unavailable: {message}")]
    Unavailable { message: String },

    /// Reading or persisting settings failed.
    #[error(transparent)]
    Settings(#[from] tempvoice_config::Error),
}

impl Error {
    #[must_use]
    pub fn platform(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Platform {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }
}
