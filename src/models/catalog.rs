use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A movie from the preprocessed catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    /// Genre tags in catalog order; may be empty
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "deserialize_vote_count")]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    /// Any other fields the preprocessing step emitted, echoed back in results
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogItem {
    /// Creates a catalog item with no extra fields
    pub fn new(
        id: i64,
        title: impl Into<String>,
        genres: &[&str],
        vote_average: f64,
        vote_count: u64,
        popularity: f64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            vote_average,
            vote_count,
            popularity,
            extra: Map::new(),
        }
    }

    /// Whether the item clears both inclusive quality thresholds
    pub fn meets_quality(&self, min_rating: f64, min_votes: u64) -> bool {
        self.vote_average >= min_rating && self.vote_count >= min_votes
    }
}

/// Vote counts arrive as floats (`200.0`) when the upstream dataframe held
/// missing values, so accept any non-negative integral number.
fn deserialize_vote_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Int(u64),
        Float(f64),
    }

    match RawCount::deserialize(deserializer)? {
        RawCount::Int(count) => Ok(count),
        RawCount::Float(count) if count.is_finite() && count >= 0.0 && count.fract() == 0.0 => {
            Ok(count as u64)
        }
        RawCount::Float(count) => Err(de::Error::custom(format!(
            "vote_count must be a non-negative integer, got {}",
            count
        ))),
    }
}
