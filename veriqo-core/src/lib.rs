//! Veriqo Core - domain model and match selection for reverse image search
//!
//! This crate holds everything about a search that does not touch the network:
//!
//! - [`Match`] and [`SearchRecord`], the values returned to clients and persisted
//! - the static candidate pool and checked-platform table ([`catalog`])
//! - the deterministic [`FilenameLengthSelector`] behind the [`MatchEngine`] trait
//!
//! # Example
//!
//! ```
//! use veriqo_core::{FilenameLengthSelector, MatchEngine};
//!
//! let selector = FilenameLengthSelector::default();
//! let matches = selector.find_matches(Some("cat.png"));
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].platform, "Instagram");
//! ```

pub mod catalog;
pub mod error;
pub mod model;
pub mod selector;

pub use catalog::{checked_platform_names, CandidatePool, Platform, CHECKED_PLATFORMS};
pub use error::{CoreError, Result};
pub use model::{Match, QueryType, SearchRecord, SearchStatus, UploadDetails, MAX_SIMILARITY};
pub use selector::{FilenameLengthSelector, MatchEngine, DEFAULT_FILENAME};
