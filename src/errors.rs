use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Enumerates high-level errors returned by the repositories.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Represents a lookup by ID that found nothing.
    #[error("{kind} {id} not found")]
    NotFound { kind: Kind, id: String },

    /// Represents client-supplied data that failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Represents a storage operation that could not complete.
    #[error("storage unavailable")]
    StorageUnavailable {
        #[from]
        source: StorageError,
    },

    /// Represents a game that was deleted while its reviews could not
    /// be removed.
    #[error("game {game_id} was deleted but its reviews could not be removed")]
    ReviewCascadeFailed { game_id: String, source: StorageError },
}

impl LibraryError {
    pub fn not_found(kind: Kind, id: impl Into<String>) -> Self {
        LibraryError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        LibraryError::InvalidInput(message.into())
    }

    /// Converts a storage error, reporting duplicate IDs as a client
    /// error.
    pub fn from_write(error: StorageError) -> Self {
        match error {
            StorageError::DuplicateId { id } => {
                LibraryError::InvalidInput(format!("a record with ID {} already exists", id))
            }
            source => LibraryError::StorageUnavailable { source },
        }
    }
}

/// The kind of entity an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Game,
    Review,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Game => write!(f, "game"),
            Kind::Review => write!(f, "review"),
        }
    }
}

/// Enumerates errors returned by the store subsystem.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Represents a failure to read or write a collection file.
    #[error("I/O error on {path}")]
    Io { path: PathBuf, source: io::Error },

    /// Represents a record that could not be converted to or from JSON.
    #[error("JSON encoding error")]
    Json { source: serde_json::Error },

    /// Represents a record that could not be converted to BSON.
    #[cfg(feature = "mongo")]
    #[error("BSON encoding error")]
    BsonEncoding {
        source: mongodb::bson::ser::Error,
    },

    /// Represents a document that could not be converted from BSON.
    #[cfg(feature = "mongo")]
    #[error("BSON decoding error")]
    BsonDecoding {
        source: mongodb::bson::de::Error,
    },

    /// Represents an error returned by the MongoDB driver.
    #[cfg(feature = "mongo")]
    #[error("MongoDB error")]
    Mongo { source: mongodb::error::Error },

    /// Represents an insertion whose ID is already taken.
    #[error("ID {id} already exists")]
    DuplicateId { id: String },

    /// Represents a blocking task that panicked or was cancelled.
    #[error("background task failed")]
    Task { source: tokio::task::JoinError },
}

/// Enumerates errors found while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Represents an environment variable with an unusable value.
    #[error("invalid value {value:?} for {name}")]
    InvalidVariable { name: &'static str, value: String },
}
