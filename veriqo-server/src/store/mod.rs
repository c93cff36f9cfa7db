//! Document store module for search history.
//!
//! The persister talks to a [`SearchStore`] injected at construction time:
//! - [`MongoSearchStore`] writes to the `search` collection of a MongoDB database
//! - [`MemorySearchStore`] keeps records in process (tests and local development)

pub mod error;
pub mod memory;
pub mod mongo;

pub use error::StoreError;
pub use memory::MemorySearchStore;
pub use mongo::MongoSearchStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use veriqo_core::SearchRecord;

/// Collection every search record is appended to
pub const SEARCH_COLLECTION: &str = "search";

/// A persisted search read back from a store.
///
/// The store-assigned identifier and timestamp sit beside the domain fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredSearch {
    /// Store-assigned identifier
    #[schema(example = "6650c1f2a4b5c6d7e8f90123")]
    pub id: String,
    /// When the record was written, if the store tracks it
    #[schema(value_type = Option<String>, example = "2026-01-08T10:00:00Z")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub record: SearchRecord,
}

/// Connectivity details reported by the diagnostic endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDiagnostics {
    /// Database name
    pub database: String,
    /// Up to ten collection names
    pub collections: Vec<String>,
}

/// Maximum number of collection names included in diagnostics
pub const MAX_DIAGNOSTIC_COLLECTIONS: usize = 10;

/// Append-only storage for search records.
///
/// Implementations must be thread-safe (`Send + Sync`) and provide their own
/// internal concurrency control. They do not retry: the persister owns the
/// timeout and retry policy.
///
/// Identifiers are assigned before the first write attempt, so a retried
/// insert of the same id must leave exactly one record behind.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Fresh identifier for a record about to be inserted.
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Append a record under `id`, returning the identifier.
    ///
    /// Inserting an id that is already stored succeeds without writing again.
    async fn insert(&self, id: &str, record: &SearchRecord) -> Result<String, StoreError>;

    /// Most recent records, newest first, at most `limit`.
    async fn recent(&self, limit: usize) -> Result<Vec<StoredSearch>, StoreError>;

    /// Database name and collection listing.
    async fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError>;

    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;
}
