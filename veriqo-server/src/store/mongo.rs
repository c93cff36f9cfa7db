//! MongoDB implementation of the search store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::error::{Error as DriverError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Collection, Database};
use veriqo_core::SearchRecord;

use super::{
    SearchStore, StoreDiagnostics, StoreError, StoredSearch, MAX_DIAGNOSTIC_COLLECTIONS,
    SEARCH_COLLECTION,
};

/// Application name sent in the MongoDB handshake
const APP_NAME: &str = "veriqo-server";

/// MongoDB server code for DuplicateKey
const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed search store.
///
/// Documents carry the record fields plus `created_at`/`updated_at`
/// timestamps. `_id` is an `ObjectId` chosen before the first write attempt.
#[derive(Clone)]
pub struct MongoSearchStore {
    database: Database,
}

impl MongoSearchStore {
    /// Create a store for `database_name` at `database_url`.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first operation rather than here. `timeout` bounds server selection
    /// and connection establishment.
    pub async fn connect(
        database_url: &str,
        database_name: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Invalid connection string: {e}")))?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);

        let client = Client::with_options(options)?;

        tracing::info!(database = database_name, "MongoDB search store configured");

        Ok(Self::from_database(client.database(database_name)))
    }

    /// Create a store from an existing database handle.
    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> Collection<Document> {
        self.database.collection(SEARCH_COLLECTION)
    }
}

/// Parse a client-facing id back into the stored `_id` value.
fn id_to_bson(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

/// Serialize a record under `id` and stamp it with creation and update times.
fn to_document(
    id: &str,
    record: &SearchRecord,
    now: bson::DateTime,
) -> Result<Document, StoreError> {
    let mut document = bson::to_document(record)?;
    document.insert("_id", id_to_bson(id));
    document.insert("created_at", now);
    document.insert("updated_at", now);
    Ok(document)
}

/// Whether a write failed because the `_id` is already stored.
fn is_duplicate_key(error: &DriverError) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

/// Render a stored `_id` the way clients see it.
fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split a raw document into its store metadata and domain record.
fn from_document(mut document: Document) -> Result<StoredSearch, StoreError> {
    let id = document
        .remove("_id")
        .map(|id| id_to_string(&id))
        .unwrap_or_default();

    let created_at = match document.remove("created_at") {
        Some(Bson::DateTime(dt)) => DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()),
        _ => None,
    };
    document.remove("updated_at");

    let record: SearchRecord = bson::from_document(document)
        .map_err(|e| StoreError::Query(format!("Malformed search document {id}: {e}")))?;

    Ok(StoredSearch {
        id,
        created_at,
        record,
    })
}

#[async_trait]
impl SearchStore for MongoSearchStore {
    fn new_id(&self) -> String {
        ObjectId::new().to_hex()
    }

    async fn insert(&self, id: &str, record: &SearchRecord) -> Result<String, StoreError> {
        let document = to_document(id, record, bson::DateTime::now())?;

        match self.collection().insert_one(document, None).await {
            Ok(result) => Ok(id_to_string(&result.inserted_id)),
            // An earlier attempt reached the server before timing out
            Err(e) if is_duplicate_key(&e) => {
                tracing::debug!(id, "Search document already stored");
                Ok(id.to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredSearch>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        let mut cursor = self.collection().find(None, options).await?;
        let mut items = Vec::new();

        while cursor.advance().await? {
            match from_document(cursor.deserialize_current()?) {
                Ok(stored) => items.push(stored),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable search document"),
            }
        }

        Ok(items)
    }

    async fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError> {
        let mut collections = self.database.list_collection_names(None).await?;
        collections.truncate(MAX_DIAGNOSTIC_COLLECTIONS);

        Ok(StoreDiagnostics {
            database: self.database.name().to_string(),
            collections,
        })
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}

impl std::fmt::Debug for MongoSearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoSearchStore")
            .field("database", &self.database.name())
            .finish()
    }
}
