//! In-memory search store
//!
//! Records live for the lifetime of the process. Used by tests and selected at
//! runtime with `SEARCH_STORE=memory`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use veriqo_core::SearchRecord;

use super::{SearchStore, StoreDiagnostics, StoreError, StoredSearch, SEARCH_COLLECTION};

/// Database name reported by diagnostics
const MEMORY_DATABASE_NAME: &str = "memory";

struct MemoryEntry {
    sequence: u64,
    created_at: DateTime<Utc>,
    record: SearchRecord,
}

/// Thread-safe in-memory storage for search records
#[derive(Default)]
pub struct MemorySearchStore {
    /// Records by id
    records: DashMap<String, MemoryEntry>,
    /// Insertion counter, orders `recent`
    next_sequence: AtomicU64,
}

impl MemorySearchStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a stored record by id
    pub fn get(&self, id: &str) -> Option<SearchRecord> {
        self.records.get(id).map(|entry| entry.record.clone())
    }
}

#[async_trait]
impl SearchStore for MemorySearchStore {
    async fn insert(&self, id: &str, record: &SearchRecord) -> Result<String, StoreError> {
        self.records
            .entry(id.to_string())
            .or_insert_with(|| MemoryEntry {
                sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
                created_at: Utc::now(),
                record: record.clone(),
            });

        Ok(id.to_string())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredSearch>, StoreError> {
        let mut entries: Vec<(u64, StoredSearch)> = self
            .records
            .iter()
            .map(|entry| {
                (
                    entry.sequence,
                    StoredSearch {
                        id: entry.key().clone(),
                        created_at: Some(entry.created_at),
                        record: entry.record.clone(),
                    },
                )
            })
            .collect();

        entries.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(entries
            .into_iter()
            .take(limit)
            .map(|(_, stored)| stored)
            .collect())
    }

    async fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError> {
        let collections = if self.records.is_empty() {
            Vec::new()
        } else {
            vec![SEARCH_COLLECTION.to_string()]
        };

        Ok(StoreDiagnostics {
            database: MEMORY_DATABASE_NAME.to_string(),
            collections,
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemorySearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySearchStore")
            .field("records", &self.records.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriqo_core::{FilenameLengthSelector, MatchEngine, UploadDetails};

    fn record(filename: &str) -> SearchRecord {
        let matches = FilenameLengthSelector::default().find_matches(Some(filename));
        SearchRecord::completed_upload(
            UploadDetails {
                filename: Some(filename.to_string()),
                ..Default::default()
            },
            matches,
            1,
        )
    }

    async fn insert(store: &MemorySearchStore, record: &SearchRecord) -> String {
        store.insert(&store.new_id(), record).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemorySearchStore::new();
        let id = insert(&store, &record("a.png")).await;

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&id).unwrap().filename.as_deref(),
            Some("a.png")
        );
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = MemorySearchStore::new();
        let a = insert(&store, &record("a.png")).await;
        let b = insert(&store, &record("a.png")).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_repeated_id_keeps_first_write() {
        let store = MemorySearchStore::new();
        let id = store.new_id();

        store.insert(&id, &record("first.png")).await.unwrap();
        let again = store.insert(&id, &record("second.png")).await.unwrap();

        assert_eq!(again, id);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&id).unwrap().filename.as_deref(),
            Some("first.png")
        );
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let store = MemorySearchStore::new();
        for name in ["one.png", "two.png", "three.png"] {
            insert(&store, &record(name)).await;
        }

        let recent = store.recent(2).await.unwrap();
        let names: Vec<_> = recent
            .iter()
            .map(|s| s.record.filename.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["three.png", "two.png"]);
        assert!(recent.iter().all(|s| s.created_at.is_some()));
    }

    #[tokio::test]
    async fn test_diagnostics_lists_collection_after_first_write() {
        let store = MemorySearchStore::new();
        assert!(store.diagnostics().await.unwrap().collections.is_empty());

        insert(&store, &record("a.png")).await;
        let diagnostics = store.diagnostics().await.unwrap();
        assert_eq!(diagnostics.database, "memory");
        assert_eq!(diagnostics.collections, vec!["search"]);
    }
}
