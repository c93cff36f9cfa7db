//! Veriqo Server Library - REST API components for reverse image search
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod config;
pub mod error;
pub mod handlers;
pub mod multipart;
pub mod openapi;
pub mod persister;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use config::{Config, StoreBackend};
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use persister::{PersistOutcome, RetryPolicy, SearchPersister, FALLBACK_SEARCH_ID};
pub use routes::{create_router, create_router_with_config};
pub use state::AppState;
pub use store::{
    MemorySearchStore, MongoSearchStore, SearchStore, StoreDiagnostics, StoreError, StoredSearch,
    SEARCH_COLLECTION,
};
