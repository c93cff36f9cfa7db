//! Search values exchanged with clients and persisted to the document store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{checked_platform_names, CandidatePool};
use crate::error::{CoreError, Result};

/// Upper bound of a similarity score.
pub const MAX_SIMILARITY: u8 = 100;

/// A claimed occurrence of the queried image on an external platform.
///
/// The similarity score is only reachable through [`Match::new`] or
/// deserialization, both of which reject scores above [`MAX_SIMILARITY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "MatchFields")]
pub struct Match {
    /// Platform name, e.g. "Twitter"
    #[cfg_attr(feature = "openapi", schema(example = "Twitter"))]
    pub platform: String,
    /// URL of the post containing the image
    #[cfg_attr(
        feature = "openapi",
        schema(example = "https://twitter.com/example/status/123")
    )]
    pub url: String,
    /// Similarity score (0-100)
    #[cfg_attr(feature = "openapi", schema(example = 92, maximum = 100))]
    similarity: u8,
    /// Optional thumbnail URL
    pub thumbnail: Option<String>,
}

impl Match {
    /// Build a match, rejecting similarity scores above [`MAX_SIMILARITY`].
    pub fn new(
        platform: impl Into<String>,
        url: impl Into<String>,
        similarity: u8,
        thumbnail: Option<String>,
    ) -> Result<Self> {
        if similarity > MAX_SIMILARITY {
            return Err(CoreError::SimilarityOutOfRange(similarity));
        }
        Ok(Self {
            platform: platform.into(),
            url: url.into(),
            similarity,
            thumbnail,
        })
    }

    /// Build a match from a built-in table row, capping the score.
    pub(crate) fn capped(
        platform: impl Into<String>,
        url: impl Into<String>,
        similarity: u8,
        thumbnail: Option<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            url: url.into(),
            similarity: similarity.min(MAX_SIMILARITY),
            thumbnail,
        }
    }

    /// Similarity score (0-100)
    pub fn similarity(&self) -> u8 {
        self.similarity
    }
}

/// Wire shape of a [`Match`] before the score is checked.
#[derive(Deserialize)]
struct MatchFields {
    platform: String,
    url: String,
    similarity: u8,
    #[serde(default)]
    thumbnail: Option<String>,
}

impl TryFrom<MatchFields> for Match {
    type Error = CoreError;

    fn try_from(fields: MatchFields) -> Result<Self> {
        Match::new(fields.platform, fields.url, fields.similarity, fields.thumbnail)
    }
}

/// How the search was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Upload,
    Url,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "upload" => Ok(Self::Upload),
            "url" => Ok(Self::Url),
            _ => Err(CoreError::UnknownQueryType(s.to_string())),
        }
    }
}

/// Lifecycle state of a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SearchStatus {
    #[default]
    Completed,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request metadata captured from an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadDetails {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// The persisted and returned unit of work for one search request.
///
/// A record owns its matches. It is created once per request and mutated at
/// most once, through [`SearchRecord::attach_error`], when persistence fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchRecord {
    pub query_type: QueryType,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// File size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Platforms checked, in table order
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub status: SearchStatus,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl SearchRecord {
    /// Build a completed upload search over the full checked-platform list.
    ///
    /// A completed search always carries at least one match: an empty
    /// `matches` is replaced by the default pool's fallback candidate.
    pub fn completed_upload(
        upload: UploadDetails,
        mut matches: Vec<Match>,
        duration_ms: u64,
    ) -> Self {
        if matches.is_empty() {
            tracing::warn!(
                filename = ?upload.filename,
                "Match engine returned no matches, using fallback candidate"
            );
            matches.push(CandidatePool::default().fallback().clone());
        }

        Self {
            query_type: QueryType::Upload,
            filename: upload.filename,
            mime_type: upload.mime_type,
            size: upload.size,
            platforms: checked_platform_names(),
            matches,
            status: SearchStatus::Completed,
            duration_ms,
            error: None,
            ip: upload.ip,
            user_agent: upload.user_agent,
        }
    }

    /// Record a failure description. Only the first error is kept.
    pub fn attach_error(&mut self, error: impl fmt::Display) {
        if self.error.is_none() {
            self.error = Some(error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match() -> Match {
        Match::new("Reddit", "https://reddit.com/r/example", 87, None).unwrap()
    }

    #[test]
    fn test_match_similarity_bounds() {
        assert!(Match::new("Twitter", "https://t", 0, None).is_ok());
        assert!(Match::new("Twitter", "https://t", 100, None).is_ok());
        assert_eq!(
            Match::new("Twitter", "https://t", 101, None),
            Err(CoreError::SimilarityOutOfRange(101))
        );
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_similarity() {
        let json = r#"{"platform": "Twitter", "url": "https://t", "similarity": 250}"#;
        assert!(serde_json::from_str::<Match>(json).is_err());

        let json = r#"{"platform": "Twitter", "url": "https://t", "similarity": 100}"#;
        let parsed: Match = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.similarity(), 100);
        assert!(parsed.thumbnail.is_none());
    }

    #[test]
    fn test_match_survives_json_round_trip() {
        let original = sample_match();
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(serde_json::from_str::<Match>(&json).unwrap(), original);
    }

    #[test]
    fn test_completed_upload_never_has_empty_matches() {
        let record = SearchRecord::completed_upload(UploadDetails::default(), Vec::new(), 0);

        assert_eq!(record.status, SearchStatus::Completed);
        assert_eq!(record.matches.len(), 1);
        assert_eq!(record.matches[0].platform, "Instagram");
    }

    #[test]
    fn test_query_type_round_trip_text() {
        assert_eq!("upload".parse::<QueryType>().unwrap(), QueryType::Upload);
        assert_eq!("URL".parse::<QueryType>().unwrap(), QueryType::Url);
        assert!("camera".parse::<QueryType>().is_err());
        assert_eq!(QueryType::Upload.to_string(), "upload");
    }

    #[test]
    fn test_record_serializes_lowercase_enums() {
        let record =
            SearchRecord::completed_upload(UploadDetails::default(), vec![sample_match()], 3);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["query_type"], "upload");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["duration_ms"], 3);
        assert!(json["error"].is_null());
        assert!(json["matches"][0]["thumbnail"].is_null());
    }

    #[test]
    fn test_record_deserializes_sparse_document() {
        let json = r#"{"query_type": "url", "matches": []}"#;
        let record: SearchRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.query_type, QueryType::Url);
        assert_eq!(record.status, SearchStatus::Completed);
        assert!(record.platforms.is_empty());
        assert_eq!(record.duration_ms, 0);
    }

    #[test]
    fn test_attach_error_keeps_first() {
        let mut record =
            SearchRecord::completed_upload(UploadDetails::default(), vec![sample_match()], 0);
        record.attach_error("connection refused");
        record.attach_error("second failure");
        assert_eq!(record.error.as_deref(), Some("connection refused"));
    }
}
