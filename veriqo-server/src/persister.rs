//! Best-effort persistence of search records.
//!
//! Storage failures never fail a request. A failed write yields the sentinel
//! id [`FALLBACK_SEARCH_ID`] and the failure text is attached to the record;
//! a failed read yields an empty list.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use backoff::{future::retry_notify, ExponentialBackoff};
use tracing::{debug, info, warn};
use veriqo_core::SearchRecord;

use crate::config::Config;
use crate::store::{SearchStore, StoreDiagnostics, StoreError, StoredSearch};

/// Identifier returned when a record could not be persisted
pub const FALLBACK_SEARCH_ID: &str = "-1";

/// Message used when no store was configured at startup
const NOT_CONFIGURED: &str = "Database not configured";

/// Timeout and retry settings for store calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Upper bound for a single store call.
    pub attempt_timeout: Duration,
    /// Extra attempts after a transient write failure.
    pub max_retries: u32,
    /// First retry delay.
    pub initial_interval: Duration,
    /// Largest retry delay.
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(5),
            max_retries: 2,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempt_timeout: config.store_timeout(),
            max_retries: config.store_max_retries,
            ..Self::default()
        }
    }

    /// Total attempts allowed for one write
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff schedule for writes. The elapsed-time cap is dropped when it
    /// does not fit in a `Duration`; the attempt counter still bounds retries.
    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            max_elapsed_time: self.attempt_timeout.checked_mul(self.max_attempts()),
            ..Default::default()
        }
    }
}

/// Result of a persistence attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Store-assigned id, or [`FALLBACK_SEARCH_ID`]
    pub id: String,
    /// Why the write failed, if it did
    pub error: Option<StoreError>,
}

impl PersistOutcome {
    pub fn is_persisted(&self) -> bool {
        self.error.is_none()
    }
}

/// Writes search records through an injected [`SearchStore`].
pub struct SearchPersister {
    store: Option<Arc<dyn SearchStore>>,
    policy: RetryPolicy,
}

impl SearchPersister {
    /// Persister backed by `store`.
    pub fn new(store: Arc<dyn SearchStore>, policy: RetryPolicy) -> Self {
        Self {
            store: Some(store),
            policy,
        }
    }

    /// Persister with no store; every write falls back.
    pub fn disconnected(policy: RetryPolicy) -> Self {
        Self {
            store: None,
            policy,
        }
    }

    /// Whether a store is configured
    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn require_store(&self) -> Result<&Arc<dyn SearchStore>, StoreError> {
        self.store
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable(NOT_CONFIGURED.to_string()))
    }

    /// Persist `record`, attaching the failure text to it if the write fails.
    pub async fn persist(&self, record: &mut SearchRecord) -> PersistOutcome {
        let result = match self.require_store() {
            Ok(store) => self.insert_with_retry(store.as_ref(), record).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(id) => {
                info!(id = %id, filename = ?record.filename, "Search record persisted");
                PersistOutcome { id, error: None }
            }
            Err(e) => {
                warn!(
                    kind = e.kind(),
                    error = %e,
                    filename = ?record.filename,
                    "Failed to persist search record, returning fallback id"
                );
                record.attach_error(&e);
                PersistOutcome {
                    id: FALLBACK_SEARCH_ID.to_string(),
                    error: Some(e),
                }
            }
        }
    }

    /// Most recent records, newest first. Empty if the store fails.
    pub async fn recent(&self, limit: usize) -> Vec<StoredSearch> {
        let result = match self.require_store() {
            Ok(store) => self.with_timeout(store.recent(limit)).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            warn!(kind = e.kind(), error = %e, "Recent searches unavailable");
            Vec::new()
        })
    }

    /// Store connectivity details for the diagnostic endpoint.
    pub async fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError> {
        let store = self.require_store()?;
        self.with_timeout(store.diagnostics()).await
    }

    async fn insert_with_retry(
        &self,
        store: &dyn SearchStore,
        record: &SearchRecord,
    ) -> Result<String, StoreError> {
        // Every attempt writes under the same id so a retry after a late
        // commit does not store the record twice.
        let id = store.new_id();
        let attempts = AtomicU32::new(0);
        let max_retries = self.policy.max_retries;

        retry_notify(
            self.policy.build_backoff(),
            || {
                let attempts = &attempts;
                let id = id.as_str();
                async move {
                    let attempt = attempts.fetch_add(1, Ordering::Relaxed);
                    debug!(attempt, id, backend = store.backend_name(), "Inserting search record");

                    match self.with_timeout(store.insert(id, record)).await {
                        Ok(id) => Ok(id),
                        Err(e) if e.is_transient() && attempt < max_retries => {
                            Err(backoff::Error::transient(e))
                        }
                        Err(e) => Err(backoff::Error::permanent(e)),
                    }
                }
            },
            |err: StoreError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Store write retry scheduled"
                );
            },
        )
        .await
    }

    async fn with_timeout<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let start = Instant::now();
        match tokio::time::timeout(self.policy.attempt_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            }),
        }
    }
}

impl std::fmt::Debug for SearchPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPersister")
            .field(
                "store",
                &self.store.as_ref().map(|store| store.backend_name()),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySearchStore;
    use async_trait::async_trait;
    use veriqo_core::{FilenameLengthSelector, MatchEngine, UploadDetails};

    /// Fails the first `failures` inserts with `error`, then delegates to memory.
    struct ScriptedStore {
        failures: u32,
        error: StoreError,
        calls: AtomicU32,
        delay: Duration,
        /// Stall after the first successful write, as when the server commits
        /// but the reply arrives too late
        stall_after_first_commit: Duration,
        inner: MemorySearchStore,
    }

    impl ScriptedStore {
        fn failing(failures: u32, error: StoreError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
                stall_after_first_commit: Duration::ZERO,
                inner: MemorySearchStore::new(),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::failing(0, StoreError::Query(String::new()))
            }
        }

        fn late_reply(stall: Duration) -> Self {
            Self {
                stall_after_first_commit: stall,
                ..Self::failing(0, StoreError::Query(String::new()))
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchStore for ScriptedStore {
        async fn insert(&self, id: &str, record: &SearchRecord) -> Result<String, StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if call < self.failures {
                return Err(self.error.clone());
            }
            let id = self.inner.insert(id, record).await?;
            if call == 0 && !self.stall_after_first_commit.is_zero() {
                tokio::time::sleep(self.stall_after_first_commit).await;
            }
            Ok(id)
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<StoredSearch>, StoreError> {
            Err(self.error.clone())
        }

        async fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError> {
            Err(self.error.clone())
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            attempt_timeout: Duration::from_millis(50),
            max_retries,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
        }
    }

    fn record() -> SearchRecord {
        SearchRecord::completed_upload(
            UploadDetails {
                filename: Some("cat.png".into()),
                ..Default::default()
            },
            FilenameLengthSelector::default().find_matches(Some("cat.png")),
            0,
        )
    }

    #[tokio::test]
    async fn test_persist_success_returns_store_id() {
        let store = Arc::new(MemorySearchStore::new());
        let persister = SearchPersister::new(store.clone(), fast_policy(2));

        let mut record = record();
        let outcome = persister.persist(&mut record).await;

        assert!(outcome.is_persisted());
        assert_ne!(outcome.id, FALLBACK_SEARCH_ID);
        assert!(record.error.is_none());
        assert!(store.get(&outcome.id).is_some());
    }

    #[tokio::test]
    async fn test_disconnected_falls_back() {
        let persister = SearchPersister::disconnected(fast_policy(2));
        let mut record = record();
        let outcome = persister.persist(&mut record).await;

        assert_eq!(outcome.id, FALLBACK_SEARCH_ID);
        assert!(matches!(outcome.error, Some(StoreError::Unavailable(_))));
        assert_eq!(
            record.error.as_deref(),
            Some("Database unavailable: Database not configured")
        );
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let store = Arc::new(ScriptedStore::failing(
            1,
            StoreError::Unavailable("connection reset".into()),
        ));
        let persister = SearchPersister::new(store.clone(), fast_policy(2));

        let mut record = record();
        let outcome = persister.persist(&mut record).await;

        assert!(outcome.is_persisted());
        assert_eq!(store.calls(), 2);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let store = Arc::new(ScriptedStore::failing(
            u32::MAX,
            StoreError::Unavailable("down".into()),
        ));
        let persister = SearchPersister::new(store.clone(), fast_policy(2));

        let outcome = persister.persist(&mut record()).await;

        assert_eq!(outcome.id, FALLBACK_SEARCH_ID);
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let store = Arc::new(ScriptedStore::failing(
            u32::MAX,
            StoreError::ValidationFailed("schema mismatch".into()),
        ));
        let persister = SearchPersister::new(store.clone(), fast_policy(2));

        let mut record = record();
        let outcome = persister.persist(&mut record).await;

        assert_eq!(store.calls(), 1);
        assert!(matches!(
            outcome.error,
            Some(StoreError::ValidationFailed(_))
        ));
        assert_eq!(
            record.error.as_deref(),
            Some("Document validation failed: schema mismatch")
        );
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let store = Arc::new(ScriptedStore::slow(Duration::from_millis(500)));
        let persister = SearchPersister::new(store.clone(), fast_policy(0));

        let outcome = persister.persist(&mut record()).await;

        assert_eq!(outcome.id, FALLBACK_SEARCH_ID);
        assert!(matches!(outcome.error, Some(StoreError::Timeout { .. })));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_late_commit_stores_one_record() {
        let store = Arc::new(ScriptedStore::late_reply(Duration::from_millis(500)));
        let persister = SearchPersister::new(store.clone(), fast_policy(2));

        let mut record = record();
        let outcome = persister.persist(&mut record).await;

        assert!(outcome.is_persisted());
        assert_eq!(store.calls(), 2);
        assert_eq!(store.inner.len(), 1);
        assert!(store.inner.get(&outcome.id).is_some());
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_huge_retry_budget_does_not_overflow() {
        let policy = RetryPolicy {
            max_retries: u32::MAX,
            ..fast_policy(0)
        };
        assert_eq!(policy.max_attempts(), u32::MAX);
        assert!(policy.build_backoff().max_elapsed_time.is_some());

        let unbounded = RetryPolicy {
            attempt_timeout: Duration::MAX,
            max_retries: u32::MAX,
            ..fast_policy(0)
        };
        assert!(unbounded.build_backoff().max_elapsed_time.is_none());

        let store = Arc::new(MemorySearchStore::new());
        let persister = SearchPersister::new(store.clone(), policy);
        let outcome = persister.persist(&mut record()).await;

        assert!(outcome.is_persisted());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_swallows_errors() {
        let store = Arc::new(ScriptedStore::failing(
            0,
            StoreError::Unavailable("down".into()),
        ));
        let persister = SearchPersister::new(store, fast_policy(0));
        assert!(persister.recent(5).await.is_empty());

        let disconnected = SearchPersister::disconnected(fast_policy(0));
        assert!(disconnected.recent(5).await.is_empty());
    }

    #[tokio::test]
    async fn test_recent_reads_through() {
        let store = Arc::new(MemorySearchStore::new());
        let persister = SearchPersister::new(store, fast_policy(0));
        persister.persist(&mut record()).await;
        persister.persist(&mut record()).await;

        assert_eq!(persister.recent(1).await.len(), 1);
        assert_eq!(persister.recent(10).await.len(), 2);
    }
}
