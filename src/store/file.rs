use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::{warn, Logger};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::errors::StorageError;
use crate::store::{FieldFilter, Record, Store};

const EMPTY_COLLECTION: &str = "[]";

/// A store that keeps a whole collection as one indented JSON array in
/// `<dir>/<collection>.json`, newest record first.
///
/// Reads never fail: an unreadable or corrupt file is logged and
/// treated as empty, and a record that no longer decodes is skipped by
/// every lookup, update and delete by id. Each write call holds the
/// collection lock for its own load and save, so two calls never
/// interleave inside one call. Callers that read, merge and then write
/// back through separate calls are not protected against each other.
pub struct FileStore<R> {
    dir: PathBuf,
    path: PathBuf,
    lock: Mutex<()>,
    logger: Arc<Logger>,
    record: PhantomData<fn() -> R>,
}

impl<R: Record> FileStore<R> {
    pub fn new(dir: impl AsRef<Path>, logger: Arc<Logger>) -> Self {
        let dir = dir.as_ref().to_owned();
        let path = dir.join(format!("{}.json", R::COLLECTION));
        let logger = Arc::new(logger.new(log::o!("collection" => R::COLLECTION)));

        FileStore {
            dir,
            path,
            lock: Mutex::new(()),
            logger,
            record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the directory and an empty collection file if either is
    /// missing.
    async fn ensure_file(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| self.io_error(&self.dir, source))?;

        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tokio::fs::write(&self.path, EMPTY_COLLECTION)
                    .await
                    .map_err(|source| self.io_error(&self.path, source))
            }
            Err(source) => Err(self.io_error(&self.path, source)),
        }
    }

    /// Loads the raw collection.
    async fn load(&self) -> Vec<Value> {
        if let Err(e) = self.ensure_file().await {
            warn!(self.logger, "Could not prepare collection file"; "path" => %self.path.display(), "error" => ?e);
            return vec![];
        }

        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(self.logger, "Could not read collection file"; "path" => %self.path.display(), "error" => %e);
                return vec![];
            }
        };

        if raw.trim().is_empty() {
            return vec![];
        }

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(self.logger, "Could not parse collection file"; "path" => %self.path.display(), "error" => %e);
                vec![]
            }
        }
    }

    /// Replaces the collection file with the given records.
    async fn save(&self, records: Vec<Value>) -> Result<(), StorageError> {
        self.ensure_file().await?;

        let contents =
            serde_json::to_vec_pretty(&records).map_err(|source| StorageError::Json { source })?;
        let dir = self.dir.clone();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &contents))
            .await
            .map_err(|source| StorageError::Task { source })?
    }

    /// Decodes raw records, skipping any that don't fit the schema.
    fn decode_all(&self, records: Vec<Value>) -> Vec<R> {
        records
            .into_iter()
            .filter_map(|record| self.decode(record))
            .collect()
    }

    fn decode(&self, record: Value) -> Option<R> {
        match serde_json::from_value(record) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(self.logger, "Skipping unreadable record"; "path" => %self.path.display(), "error" => %e);
                None
            }
        }
    }

    fn io_error(&self, path: &Path, source: io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_owned(),
            source,
        }
    }
}

fn encode<R: Record>(record: &R) -> Result<Value, StorageError> {
    serde_json::to_value(record).map_err(|source| StorageError::Json { source })
}

fn position(records: &[Value], filter: &FieldFilter) -> Option<usize> {
    records.iter().position(|record| filter.matches(record))
}

fn write_atomically(dir: &Path, path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    use tempfile::NamedTempFile;

    let io_error = |path: &Path, source: io::Error| StorageError::Io {
        path: path.to_owned(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|source| io_error(dir, source))?;
    file.write_all(contents)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|source| io_error(file.path(), source))?;
    file.persist(path)
        .map_err(|e| io_error(path, e.error))?;

    Ok(())
}

impl<R: Record> Store<R> for FileStore<R> {
    fn find_all(&self) -> BoxFuture<Result<Vec<R>, StorageError>> {
        async move { Ok(self.decode_all(self.load().await)) }.boxed()
    }

    fn find_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>> {
        let filter = FieldFilter::id(id);

        async move {
            let records = self.load().await;

            Ok(records
                .into_iter()
                .find(|record| filter.matches(record))
                .and_then(|record| self.decode(record)))
        }
        .boxed()
    }

    fn find_by_field(&self, filter: &FieldFilter) -> BoxFuture<Result<Vec<R>, StorageError>> {
        let filter = filter.clone();

        async move {
            let records = self.load().await;
            let matching = records
                .into_iter()
                .filter(|record| filter.matches(record))
                .collect();

            Ok(self.decode_all(matching))
        }
        .boxed()
    }

    fn insert(&self, record: R) -> BoxFuture<Result<R, StorageError>> {
        async move {
            let _guard = self.lock.lock().await;
            let mut records = self.load().await;

            if position(&records, &FieldFilter::id(record.id())).is_some() {
                return Err(StorageError::DuplicateId {
                    id: record.id().to_owned(),
                });
            }

            records.insert(0, encode(&record)?);
            self.save(records).await?;

            Ok(record)
        }
        .boxed()
    }

    fn update_by_id(&self, id: &str, record: R) -> BoxFuture<Result<Option<R>, StorageError>> {
        let filter = FieldFilter::id(id);

        async move {
            let _guard = self.lock.lock().await;
            let mut records = self.load().await;

            let index = match position(&records, &filter) {
                Some(index) => index,
                None => return Ok(None),
            };

            if self.decode(records[index].clone()).is_none() {
                return Ok(None);
            }

            records[index] = encode(&record)?;
            self.save(records).await?;

            Ok(Some(record))
        }
        .boxed()
    }

    fn delete_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>> {
        let filter = FieldFilter::id(id);

        async move {
            let _guard = self.lock.lock().await;
            let mut records = self.load().await;

            let index = match position(&records, &filter) {
                Some(index) => index,
                None => return Ok(None),
            };

            let decoded = match self.decode(records[index].clone()) {
                Some(decoded) => decoded,
                None => return Ok(None),
            };

            records.remove(index);
            self.save(records).await?;

            Ok(Some(decoded))
        }
        .boxed()
    }

    fn delete_where(&self, filter: &FieldFilter) -> BoxFuture<Result<u64, StorageError>> {
        let filter = filter.clone();

        async move {
            let _guard = self.lock.lock().await;
            let mut records = self.load().await;

            let before = records.len();
            records.retain(|record| !filter.matches(record));
            let removed = (before - records.len()) as u64;

            self.save(records).await?;

            Ok(removed)
        }
        .boxed()
    }
}
