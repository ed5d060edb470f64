use thiserror::Error;

#[derive(Error, Debug)]
pub enum CowriteError {
    /// The storage medium could not be read or written (missing directory,
    /// quota, permissions). Surfaced to the editor as a failed save.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Editor session has stopped")]
    SessionClosed,

    #[error("Config error: {0}")]
    Config(String),
}

impl CowriteError {
    /// True for errors that mean the durable copy was not updated.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
CowriteError::PersistenceUnavailable(_) | CowriteError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CowriteError>;
