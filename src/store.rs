use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::{error, info, warn, Logger};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::compat::{self, Aliases};
use crate::config::Config;
use crate::errors::StorageError;
use crate::game::Game;
use crate::review::Review;

pub mod file;
#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "mongo")]
pub mod mongo;

/// A persisted entity.
pub trait Record: Clone + DeserializeOwned + Serialize + Send + Sync + 'static {
    /// The name of the collection (and of the file) holding these records.
    const COLLECTION: &'static str;

    /// The serialized fields holding timestamps.
    const TIMESTAMP_FIELDS: &'static [&'static str];

    fn id(&self) -> &str;
}

/// One collection of records. All results are ordered most recent
/// first.
pub trait Store<R: Record>: Send + Sync {
    /// Retrieves every record.
    fn find_all(&self) -> BoxFuture<Result<Vec<R>, StorageError>>;

    /// Retrieves the record with the given ID, if any.
    fn find_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>>;

    /// Retrieves the records matching the given filter.
    fn find_by_field(&self, filter: &FieldFilter) -> BoxFuture<Result<Vec<R>, StorageError>>;

    /// Saves a new record. Fails if its ID is already taken.
    fn insert(&self, record: R) -> BoxFuture<Result<R, StorageError>>;

    /// Replaces the record with the given ID, returning the new version
    /// if there was one to replace.
    fn update_by_id(&self, id: &str, record: R) -> BoxFuture<Result<Option<R>, StorageError>>;

    /// Removes the record with the given ID, returning it.
    fn delete_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>>;

    /// Removes every record matching the given filter, returning how
    /// many were removed.
    fn delete_where(&self, filter: &FieldFilter) -> BoxFuture<Result<u64, StorageError>>;
}

/// Matches records where any of several equivalent fields holds a
/// given string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldFilter {
    fields: Aliases,
    value: String,
}

impl FieldFilter {
    pub fn new(fields: Aliases, value: impl Into<String>) -> Self {
        FieldFilter {
            fields,
            value: value.into(),
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::new(compat::ID, id)
    }

    pub fn fields(&self) -> Aliases {
        self.fields
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Checks a serialized record.
    pub fn matches(&self, record: &Value) -> bool {
        self.fields
            .iter()
            .any(|field| record.get(*field).and_then(Value::as_str) == Some(self.value.as_str()))
    }
}

/// Which storage strategy is serving this process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Document,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Document => write!(f, "document"),
        }
    }
}

/// The storage chosen at startup: one store per collection.
#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub games: Arc<dyn Store<Game>>,
    pub reviews: Arc<dyn Store<Review>>,
}

impl Backend {
    /// Stores both collections as JSON files under `data_dir`.
    pub fn file(data_dir: &Path, logger: Arc<Logger>) -> Self {
        use self::file::FileStore;

        Backend {
            kind: BackendKind::File,
            games: Arc::new(FileStore::<Game>::new(data_dir, logger.clone())),
            reviews: Arc::new(FileStore::<Review>::new(data_dir, logger)),
        }
    }

    /// Connects to MongoDB and prepares both collections.
    #[cfg(feature = "mongo")]
    pub async fn document(
        settings: &crate::config::MongoConfig,
        logger: Arc<Logger>,
    ) -> Result<Self, StorageError> {
        use self::mongo::{connect, MongoStore};

        let database = connect(&settings.uri, settings.database.as_deref()).await?;

        Ok(Backend {
            kind: BackendKind::Document,
            games: Arc::new(MongoStore::<Game>::open(&database, logger.clone()).await?),
            reviews: Arc::new(MongoStore::<Review>::open(&database, logger).await?),
        })
    }

    /// Picks the document store when one is configured and reachable,
    /// otherwise the file store. Called once per process.
    pub async fn select(config: &Config, logger: Arc<Logger>) -> Self {
        let settings = match &config.mongodb {
            Some(settings) => settings,
            None => {
                warn!(logger, "MONGODB_URI is not set; using file storage"; "data_dir" => %config.data_dir.display());
                return Self::file(&config.data_dir, logger);
            }
        };

        #[cfg(feature = "mongo")]
        {
            info!(logger, "Connecting to MongoDB...");

            match Self::document(settings, logger.clone()).await {
                Ok(backend) => {
                    info!(logger, "Connected to MongoDB"; "backend" => %backend.kind);
                    backend
                }
                Err(e) => {
                    error!(logger, "Could not connect to MongoDB; using file storage"; "error" => ?e, "data_dir" => %config.data_dir.display());
                    Self::file(&config.data_dir, logger)
                }
            }
        }

        #[cfg(not(feature = "mongo"))]
        {
            let _ = settings;
            error!(logger, "Built without MongoDB support; using file storage"; "data_dir" => %config.data_dir.display());
            Self::file(&config.data_dir, logger)
        }
    }
}
