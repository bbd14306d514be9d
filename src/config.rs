use serde::Deserialize;

use crate::services::ranker::RankingPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the preprocessed catalog (JSON array of movies)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Redis connection URL; response caching is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Time-to-live for cached responses, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Query used when a request carries no preferred genres
    #[serde(default = "default_genres")]
    pub default_genres: Vec<String>,

    #[serde(default = "default_top_n")]
    pub default_top_n: i64,

    #[serde(default = "default_min_rating")]
    pub default_min_rating: f64,

    #[serde(default = "default_min_votes")]
    pub default_min_votes: i64,

    /// How many similarity-ranked candidates to examine per requested result
    #[serde(default = "default_oversample_factor")]
    pub oversample_factor: usize,

    #[serde(default = "default_popularity_threshold")]
    pub popularity_threshold: f64,

    #[serde(default = "default_popularity_boost")]
    pub popularity_boost: f64,

    /// Request file read by the one-shot file mode
    #[serde(default = "default_ml_input_path")]
    pub ml_input_path: String,

    /// Response file written by the one-shot file mode
    #[serde(default = "default_ml_output_path")]
    pub ml_output_path: String,
}

fn default_catalog_path() -> String {
    "data/processed_movies.json".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_genres() -> Vec<String> {
    vec!["Action".to_string(), "Sci-Fi".to_string(), "Drama".to_string()]
}

fn default_top_n() -> i64 {
    10
}

fn default_min_rating() -> f64 {
    6.0
}

fn default_min_votes() -> i64 {
    100
}

fn default_oversample_factor() -> usize {
    5
}

fn default_popularity_threshold() -> f64 {
    50.0
}

fn default_popularity_boost() -> f64 {
    1.05
}

fn default_ml_input_path() -> String {
    "shared/ml_input.json".to_string()
}

fn default_ml_output_path() -> String {
    "shared/ml_output.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            redis_url: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            host: default_host(),
            port: default_port(),
            default_genres: default_genres(),
            default_top_n: default_top_n(),
            default_min_rating: default_min_rating(),
            default_min_votes: default_min_votes(),
            oversample_factor: default_oversample_factor(),
            popularity_threshold: default_popularity_threshold(),
            popularity_boost: default_popularity_boost(),
            ml_input_path: default_ml_input_path(),
            ml_output_path: default_ml_output_path(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects ranking knobs that would make every score meaningless
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.popularity_boost.is_finite() || self.popularity_boost <= 0.0 {
            anyhow::bail!(
                "POPULARITY_BOOST must be a finite number above 0, got {}",
                self.popularity_boost
            );
        }
        if !self.popularity_threshold.is_finite() {
            anyhow::bail!(
                "POPULARITY_THRESHOLD must be finite, got {}",
                self.popularity_threshold
            );
        }
        if self.oversample_factor == 0 {
            anyhow::bail!("OVERSAMPLE_FACTOR must be at least 1");
        }
        Ok(())
    }

    /// Ranking knobs that are fixed for the lifetime of the process
    pub fn ranking_policy(&self) -> RankingPolicy {
        RankingPolicy {
            oversample_factor: self.oversample_factor,
            popularity_threshold: self.popularity_threshold,
            popularity_boost: self.popularity_boost,
        }
    }
}
