use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogItem;

/// Preference payload sent by the caller
///
/// Every field is optional; missing values fall back to the configured defaults.
/// An explicitly empty `preferredGenres` is honored and yields no results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub preferred_genres: Option<Vec<String>>,
    #[serde(default)]
    pub n: Option<i64>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub min_votes: Option<i64>,
}

/// A catalog item with its derived recommendation score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub score: f64,
}

/// Ordered recommendations, best first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResponse {
    pub ml_recommendations: Vec<RankedResult>,
    pub count: usize,
}

impl From<Vec<RankedResult>> for RecommendationResponse {
    fn from(ml_recommendations: Vec<RankedResult>) -> Self {
        Self {
            count: ml_recommendations.len(),
            ml_recommendations,
        }
    }
}

/// Document frequency and IDF weight of one vocabulary entry
#[derive(Debug, Clone, Serialize)]
pub struct GenreStats {
    pub genre: String,
    pub document_frequency: usize,
    pub idf: f64,
}

/// Summary of the indexed catalog
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub items: usize,
    pub vocabulary_size: usize,
    pub fingerprint: String,
    pub built_at: DateTime<Utc>,
    /// Most frequent genres first
    pub genres: Vec<GenreStats>,
}
