use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::TryStreamExt;
use log::{warn, Logger};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndReplaceOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::errors::StorageError;
use crate::store::{FieldFilter, Record, Store};

const APP_NAME: &str = "gametracker";
const DEFAULT_DATABASE: &str = "gametracker";
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);
const DUPLICATE_KEY: i32 = 11000;

/// Connects to the server and checks that it answers. The database is
/// the one named explicitly, else the one in the URI, else a default.
pub async fn connect(uri: &str, database: Option<&str>) -> Result<Database, StorageError> {
    let mut options = ClientOptions::parse(uri).await.map_err(map_mongo_error)?;
    options.app_name = Some(APP_NAME.to_owned());
    options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

    let client = Client::with_options(options).map_err(map_mongo_error)?;
    let database = match database {
        Some(name) => client.database(name),
        None => client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
    };

    database
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map_err(map_mongo_error)?;

    Ok(database)
}

/// A store backed by one MongoDB collection. Timestamps are kept as
/// native BSON datetimes.
pub struct MongoStore<R> {
    collection: Collection<Document>,
    logger: Arc<Logger>,
    record: PhantomData<fn() -> R>,
}

impl<R: Record> MongoStore<R> {
    /// Opens the collection, making sure IDs are unique.
    pub async fn open(database: &Database, logger: Arc<Logger>) -> Result<Self, StorageError> {
        let collection = database.collection::<Document>(R::COLLECTION);

        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        collection
            .create_index(index, None)
            .await
            .map_err(map_mongo_error)?;

        Ok(MongoStore {
            collection,
            logger: Arc::new(logger.new(log::o!("collection" => R::COLLECTION))),
            record: PhantomData,
        })
    }

    async fn find_many(&self, filter: Option<Document>) -> Result<Vec<R>, StorageError> {
        let options = FindOptions::builder().sort(doc! { "_id": -1 }).build();

        let documents: Vec<Document> = self
            .collection
            .find(filter, options)
            .await
            .map_err(map_mongo_error)?
            .try_collect()
            .await
            .map_err(map_mongo_error)?;

        Ok(documents
            .into_iter()
            .filter_map(|document| decode_or_skip(document, &self.logger))
            .collect())
    }

    /// Looks a record up by id. A stored document that no longer decodes
    /// counts as missing.
    async fn find_decodable(&self, id: &str) -> Result<Option<R>, StorageError> {
        let document = self
            .collection
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(map_mongo_error)?;

        Ok(document.and_then(|document| decode_or_skip(document, &self.logger)))
    }
}

/// Renders a filter as an `$or` over its fields.
pub fn filter_document(filter: &FieldFilter) -> Document {
    let alternatives = filter
        .fields()
        .iter()
        .map(|field| {
            let mut alternative = Document::new();
            alternative.insert(*field, filter.value());
            Bson::Document(alternative)
        })
        .collect::<Vec<_>>();

    doc! { "$or": alternatives }
}

/// Converts a record into a document, storing timestamps natively.
pub fn encode<R: Record>(record: &R) -> Result<Document, StorageError> {
    let mut document =
        bson::to_document(record).map_err(|source| StorageError::BsonEncoding { source })?;

    for field in R::TIMESTAMP_FIELDS {
        let parsed = match document.get(*field) {
            Some(Bson::String(s)) => bson::DateTime::parse_rfc3339_str(s).ok(),
            _ => None,
        };

        if let Some(datetime) = parsed {
            document.insert(*field, datetime);
        }
    }

    Ok(document)
}

/// Converts a stored document back into a record. Any top-level
/// datetime, including those under legacy field names, is rendered as
/// RFC 3339.
pub fn decode<R: Record>(mut document: Document) -> Result<R, StorageError> {
    document.remove("_id");

    for (_, value) in document.iter_mut() {
        let converted = match value {
            Bson::DateTime(datetime) => datetime.try_to_rfc3339_string().ok(),
            _ => None,
        };

        if let Some(s) = converted {
            *value = Bson::String(s);
        }
    }

    bson::from_document(document).map_err(|source| StorageError::BsonDecoding { source })
}

/// Decodes a document, logging and dropping it if it doesn't fit the
/// schema.
pub fn decode_or_skip<R: Record>(document: Document, logger: &Logger) -> Option<R> {
    match decode(document) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(logger, "Skipping unreadable document"; "error" => ?e);
            None
        }
    }
}

fn map_mongo_error(error: mongodb::error::Error) -> StorageError {
    StorageError::Mongo { source: error }
}

fn map_write_error(error: mongodb::error::Error, id: &str) -> StorageError {
    let duplicate = match *error.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    };

    if duplicate {
        StorageError::DuplicateId { id: id.to_owned() }
    } else {
        map_mongo_error(error)
    }
}

impl<R: Record> Store<R> for MongoStore<R> {
    fn find_all(&self) -> BoxFuture<Result<Vec<R>, StorageError>> {
        self.find_many(None).boxed()
    }

    fn find_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>> {
        let id = id.to_owned();

        async move { self.find_decodable(&id).await }.boxed()
    }

    fn find_by_field(&self, filter: &FieldFilter) -> BoxFuture<Result<Vec<R>, StorageError>> {
        self.find_many(Some(filter_document(filter))).boxed()
    }

    fn insert(&self, record: R) -> BoxFuture<Result<R, StorageError>> {
        async move {
            let document = encode(&record)?;

            self.collection
                .insert_one(document, None)
                .await
                .map_err(|e| map_write_error(e, record.id()))?;

            Ok(record)
        }
        .boxed()
    }

    fn update_by_id(&self, id: &str, record: R) -> BoxFuture<Result<Option<R>, StorageError>> {
        let id = id.to_owned();

        async move {
            if self.find_decodable(&id).await?.is_none() {
                return Ok(None);
            }

            let replacement = encode(&record)?;
            let options = FindOneAndReplaceOptions::builder()
                .return_document(ReturnDocument::After)
                .build();

            let document = self
                .collection
                .find_one_and_replace(doc! { "id": id.as_str() }, replacement, options)
                .await
                .map_err(|e| map_write_error(e, record.id()))?;

            Ok(document.and_then(|document| decode_or_skip(document, &self.logger)))
        }
        .boxed()
    }

    fn delete_by_id(&self, id: &str) -> BoxFuture<Result<Option<R>, StorageError>> {
        let id = id.to_owned();

        async move {
            let record = match self.find_decodable(&id).await? {
                Some(record) => record,
                None => return Ok(None),
            };

            let result = self
                .collection
                .delete_one(doc! { "id": id.as_str() }, None)
                .await
                .map_err(map_mongo_error)?;

            Ok((result.deleted_count > 0).then(|| record))
        }
        .boxed()
    }

    fn delete_where(&self, filter: &FieldFilter) -> BoxFuture<Result<u64, StorageError>> {
        let filter = filter_document(filter);

        async move {
            let result = self
                .collection
                .delete_many(filter, None)
                .await
                .map_err(map_mongo_error)?;

            Ok(result.deleted_count)
        }
        .boxed()
    }
}
