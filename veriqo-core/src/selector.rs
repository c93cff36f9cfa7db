//! Deterministic match selection.
//!
//! There is no image analysis here: which candidates are returned depends only
//! on the character length of the uploaded filename.

use crate::catalog::CandidatePool;
use crate::model::Match;

/// Placeholder used when an upload has no filename (or an empty one).
pub const DEFAULT_FILENAME: &str = "img";

/// Source of matches for an uploaded image.
///
/// Implementations must be pure and thread-safe: they are shared across
/// concurrent requests without coordination.
pub trait MatchEngine: Send + Sync {
    /// Return the matches for an upload, never empty.
    fn find_matches(&self, filename: Option<&str>) -> Vec<Match>;
}

/// Selects candidates from a fixed pool by divisibility of the filename length.
#[derive(Debug, Clone, Default)]
pub struct FilenameLengthSelector {
    pool: CandidatePool,
}

impl FilenameLengthSelector {
    pub fn new(pool: CandidatePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    /// Which pool slots are selected for a name of `len` characters.
    fn selected_slots(len: usize) -> [bool; 3] {
        let even = len % 2 == 0;
        let triple = len % 3 == 0;
        let fallback = len % 5 == 0 || !(even || triple);
        [even, triple, fallback]
    }
}

/// Character length of the effective filename.
fn effective_len(filename: Option<&str>) -> usize {
    match filename {
        Some(name) if !name.is_empty() => name.chars().count(),
        _ => DEFAULT_FILENAME.chars().count(),
    }
}

impl MatchEngine for FilenameLengthSelector {
    fn find_matches(&self, filename: Option<&str>) -> Vec<Match> {
        let len = effective_len(filename);
        let matches: Vec<Match> = self
            .pool
            .slots()
            .iter()
            .zip(Self::selected_slots(len))
            .filter_map(|(candidate, selected)| selected.then(|| candidate.clone()))
            .collect();

        tracing::debug!(len, selected = matches.len(), "Selected candidate matches");
        matches
    }
}
