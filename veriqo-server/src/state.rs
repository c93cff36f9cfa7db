//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use veriqo_core::{FilenameLengthSelector, MatchEngine};

use crate::config::Config;
use crate::persister::{RetryPolicy, SearchPersister};
use crate::store::SearchStore;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Match source for uploads
    pub matcher: Arc<dyn MatchEngine>,
    /// Best-effort search history writer
    pub persister: Arc<SearchPersister>,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// State with the default selector and the given store (or none).
    pub fn new(config: Config, store: Option<Arc<dyn SearchStore>>) -> Self {
        let policy = RetryPolicy::from_config(&config);
        let persister = match store {
            Some(store) => SearchPersister::new(store, policy),
            None => SearchPersister::disconnected(policy),
        };

        Self {
            matcher: Arc::new(FilenameLengthSelector::default()),
            persister: Arc::new(persister),
            config: Arc::new(config),
        }
    }

    /// Replace the match source.
    pub fn with_matcher(mut self, matcher: Arc<dyn MatchEngine>) -> Self {
        self.matcher = matcher;
        self
    }
}
