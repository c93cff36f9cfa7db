//! Static search configuration: the platforms a search reports as checked and
//! the fixed pool of candidate matches the selector draws from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::Match;

/// External platforms known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Platform {
    Twitter,
    Instagram,
    Facebook,
    Reddit,
    LinkedIn,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "Twitter",
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
            Self::Reddit => "Reddit",
            Self::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CHECKED_PLATFORMS
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownPlatform(s.to_string()))
    }
}

/// Platforms every search reports as checked, in response order.
///
/// The list is independent of which platforms produced matches.
pub const CHECKED_PLATFORMS: [Platform; 5] = [
    Platform::Twitter,
    Platform::Instagram,
    Platform::Facebook,
    Platform::Reddit,
    Platform::LinkedIn,
];

/// Owned names of [`CHECKED_PLATFORMS`].
pub fn checked_platform_names() -> Vec<String> {
    CHECKED_PLATFORMS.iter().map(|p| p.to_string()).collect()
}

/// One row of the built-in candidate table.
struct Candidate {
    platform: Platform,
    url: &'static str,
    similarity: u8,
    thumbnail: &'static str,
}

impl Candidate {
    fn to_match(&self) -> Match {
        Match::capped(
            self.platform.to_string(),
            self.url,
            self.similarity,
            Some(self.thumbnail.to_string()),
        )
    }
}

const DEFAULT_CANDIDATES: [Candidate; 3] = [
    Candidate {
        platform: Platform::Twitter,
        url: "https://twitter.com/example/status/123",
        similarity: 92,
        thumbnail: "https://picsum.photos/seed/tw/120/80",
    },
    Candidate {
        platform: Platform::Reddit,
        url: "https://reddit.com/r/example/comments/xyz",
        similarity: 87,
        thumbnail: "https://picsum.photos/seed/rd/120/80",
    },
    Candidate {
        platform: Platform::Instagram,
        url: "https://instagram.com/p/abc123",
        similarity: 78,
        thumbnail: "https://picsum.photos/seed/ig/120/80",
    },
];

/// Fixed pool of exactly three candidate matches.
///
/// Slot 0 is offered for even lengths, slot 1 for multiples of three and
/// slot 2 for multiples of five or when nothing else was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    slots: [Match; 3],
}

impl CandidatePool {
    pub fn new(slots: [Match; 3]) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Match; 3] {
        &self.slots
    }

    /// Candidate offered when no other slot is selected
    pub fn fallback(&self) -> &Match {
        &self.slots[2]
    }
}

impl Default for CandidatePool {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATES.each_ref().map(Candidate::to_match))
    }
}
