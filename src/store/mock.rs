use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};

use crate::errors::StorageError;
use crate::store::{FieldFilter, Record, Store};

/// An in-memory store whose writes can be made to fail on demand.
pub(crate) struct MockStore<R> {
    pub(crate) records: RwLock<Vec<R>>,
    fail_writes: AtomicBool,
}

impl<R: Record> MockStore<R> {
    pub fn new() -> Self {
        MockStore {
            records: RwLock::new(vec![]),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Io {
                path: PathBuf::from(R::COLLECTION),
                source: io::Error::new(io::ErrorKind::Other, "writes disabled"),
            })
        } else {
            Ok(())
        }
    }

    fn matches(record: &R, filter: &FieldFilter) -> bool {
        serde_json::to_value(record)
            .map(|value| filter.matches(&value))
            .unwrap_or(false)
    }
}

impl<R: Record> Store<R> for MockStore<R> {
    fn find_all(&self) -> BoxFuture<Result<Vec<R>, StorageError>> {
        let records = self.records.read().unwrap().clone();

        async move { Ok(records) }.boxed()
    }

    fn find_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>> {
        let found = self
            .records
            .read()
            .unwrap()
            .iter()
            .find(|record| record.id() == id)
            .cloned();

        async move { Ok(found) }.boxed()
    }

    fn find_by_field(&self, filter: &FieldFilter) -> BoxFuture<Result<Vec<R>, StorageError>> {
        let found = self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|record| Self::matches(record, filter))
            .cloned()
            .collect();

        async move { Ok(found) }.boxed()
    }

    fn insert(&self, record: R) -> BoxFuture<Result<R, StorageError>> {
        let result = self.check_writable().and_then(|_| {
            let mut records = self.records.write().unwrap();

            if records.iter().any(|r| r.id() == record.id()) {
                return Err(StorageError::DuplicateId {
                    id: record.id().to_owned(),
                });
            }

            records.insert(0, record.clone());
            Ok(record)
        });

        async move { result }.boxed()
    }

    fn update_by_id(&self, id: &str, record: R) -> BoxFuture<Result<Option<R>, StorageError>> {
        let result = self.check_writable().map(|_| {
            let mut records = self.records.write().unwrap();

            records.iter_mut().find(|r| r.id() == id).map(|slot| {
                *slot = record.clone();
                record
            })
        });

        async move { result }.boxed()
    }

    fn delete_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>> {
        let result = self.check_writable().map(|_| {
            let mut records = self.records.write().unwrap();

            records
                .iter()
                .position(|r| r.id() == id)
                .map(|index| records.remove(index))
        });

        async move { result }.boxed()
    }

    fn delete_where(&self, filter: &FieldFilter) -> BoxFuture<Result<u64, StorageError>> {
        let result = self.check_writable().map(|_| {
            let mut records = self.records.write().unwrap();
            let before = records.len();

            records.retain(|record| !Self::matches(record, filter));

            (before - records.len()) as u64
        });

        async move { result }.boxed()
    }
}
