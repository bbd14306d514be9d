//! Genre-tag vector space over the catalog.
//!
//! Each tag is a single token: multi-word tags such as "Science Fiction" are
//! categorical labels and are not split on whitespace. Tokens are trimmed and
//! lowercased, so "Sci-Fi" and "sci-fi" share a column.
//!
//! Weights use the smoothed IDF `ln((1 + N) / (1 + df)) + 1`, multiplied by the
//! raw term count, then every vector is scaled to unit L2 norm so that a dot
//! product is the cosine similarity.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, CatalogStats, GenreStats},
};

/// Normalizes a raw tag into its vocabulary token
pub fn normalize_tag(tag: &str) -> Option<String> {
    let token = tag.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_lowercase())
    }
}

/// Token to column mapping, columns assigned in first-seen catalog order
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    columns: HashMap<String, usize>,
    tokens: Vec<String>,
}

impl Vocabulary {
    fn insert(&mut self, token: &str) -> usize {
        if let Some(&column) = self.columns.get(token) {
            return column;
        }
        let column = self.tokens.len();
        self.columns.insert(token.to_string(), column);
        self.tokens.push(token.to_string());
        column
    }

    /// Column of an already-normalized token
    pub fn column(&self, token: &str) -> Option<usize> {
        self.columns.get(token).copied()
    }

    /// Token stored at a column
    pub fn token(&self, column: usize) -> Option<&str> {
        self.tokens.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Sparse weighted vector, entries sorted by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Builds a unit-length vector from per-column weights; all-zero input stays zero
    fn normalized(weights: HashMap<usize, f64>) -> Self {
        let mut entries: Vec<(usize, f64)> =
            weights.into_iter().filter(|(_, w)| *w != 0.0).collect();
        entries.sort_by_key(|(column, _)| *column);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut entries {
                *weight /= norm;
            }
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn weight(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |(c, _)| *c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product by merging the two sorted entry lists
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;

        while i < self.entries.len() && j < other.entries.len() {
            let (a_col, a_weight) = self.entries[i];
            let (b_col, b_weight) = other.entries[j];
            match a_col.cmp(&b_col) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_weight * b_weight;
                    i += 1;
                    j += 1;
                }
            }
        }

        sum
    }
}

/// The catalog's vector space, built once and shared read-only
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    vocabulary: Vocabulary,
    document_frequency: Vec<usize>,
    idf: Vec<f64>,
    vectors: Vec<FeatureVector>,
    fingerprint: String,
    built_at: DateTime<Utc>,
}

impl CatalogIndex {
    /// Builds the vocabulary, IDF weights and per-item vectors
    pub fn build(catalog: &[CatalogItem]) -> AppResult<Self> {
        if catalog.is_empty() {
            return Err(AppError::EmptyCatalog);
        }

        let mut vocabulary = Vocabulary::default();
        let mut document_frequency: Vec<usize> = Vec::new();
        let mut term_counts: Vec<HashMap<usize, usize>> = Vec::with_capacity(catalog.len());

        for item in catalog {
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for token in item.genres.iter().filter_map(|g| normalize_tag(g)) {
                let column = vocabulary.insert(&token);
                if column == document_frequency.len() {
                    document_frequency.push(0);
                }
                *counts.entry(column).or_insert(0) += 1;
            }
            for column in counts.keys() {
                document_frequency[*column] += 1;
            }
            term_counts.push(counts);
        }

        let n_docs = catalog.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors: Vec<FeatureVector> = term_counts
            .into_iter()
            .map(|counts| {
                FeatureVector::normalized(
                    counts
                        .into_iter()
                        .map(|(column, tf)| (column, tf as f64 * idf[column]))
                        .collect(),
                )
            })
            .collect();

        let empty_items = vectors.iter().filter(|v| v.is_zero()).count();
        tracing::info!(
            items = catalog.len(),
            vocabulary = vocabulary.len(),
            empty_items,
            "Catalog index built"
        );

        Ok(Self {
            vocabulary,
            document_frequency,
            idf,
            vectors,
            fingerprint: catalog_fingerprint(catalog)?,
            built_at: Utc::now(),
        })
    }

    /// Vectorizes an arbitrary tag list with the catalog's vocabulary and IDF.
    /// Out-of-vocabulary tags contribute nothing.
    pub fn project<S: AsRef<str>>(&self, tags: &[S]) -> FeatureVector {
        let mut weights: HashMap<usize, f64> = HashMap::new();
        for token in tags.iter().filter_map(|t| normalize_tag(t.as_ref())) {
            if let Some(column) = self.vocabulary.column(&token) {
                *weights.entry(column).or_insert(0.0) += self.idf[column];
            }
        }
        FeatureVector::normalized(weights)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Normalized vectors, one per catalog item in catalog order
    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn idf(&self, token: &str) -> Option<f64> {
        normalize_tag(token)
            .and_then(|t| self.vocabulary.column(&t))
            .map(|column| self.idf[column])
    }

    /// Content hash of the catalog this index was built from
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn stats(&self) -> CatalogStats {
        let mut genres: Vec<GenreStats> = (0..self.vocabulary.len())
            .filter_map(|column| {
                self.vocabulary.token(column).map(|token| GenreStats {
                    genre: token.to_string(),
                    document_frequency: self.document_frequency[column],
                    idf: self.idf[column],
                })
            })
            .collect();
        // Stable, so equally frequent genres keep first-seen order
        genres.sort_by(|a, b| b.document_frequency.cmp(&a.document_frequency));

        CatalogStats {
            items: self.len(),
            vocabulary_size: self.vocabulary.len(),
            fingerprint: self.fingerprint.clone(),
            built_at: self.built_at,
            genres,
        }
    }
}

/// SHA-256 over the serialized catalog, hex encoded
pub fn catalog_fingerprint(catalog: &[CatalogItem]) -> AppResult<String> {
    let bytes = serde_json::to_vec(catalog)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
