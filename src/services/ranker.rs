use crate::{
    error::{AppError, AppResult},
    models::{CatalogItem, RankedResult},
    services::indexer::CatalogIndex,
};

/// Process-wide ranking knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingPolicy {
    /// Candidates examined per requested result before giving up
    pub oversample_factor: usize,
    /// Popularity strictly above this earns the boost
    pub popularity_threshold: f64,
    /// Multiplier applied to the score of popular admitted items
    pub popularity_boost: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            oversample_factor: 5,
            popularity_threshold: 50.0,
            popularity_boost: 1.05,
        }
    }
}

/// Validated per-request parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingParams {
    pub n: usize,
    pub min_rating: f64,
    pub min_votes: u64,
}

impl RankingParams {
    /// Rejects out-of-domain values instead of clamping them
    pub fn new(n: i64, min_rating: f64, min_votes: i64) -> AppResult<Self> {
        if n < 1 {
            return Err(AppError::InvalidParameter(format!(
                "n must be at least 1, got {}",
                n
            )));
        }
        if !min_rating.is_finite() || min_rating < 0.0 {
            return Err(AppError::InvalidParameter(format!(
                "minRating must be a non-negative number, got {}",
                min_rating
            )));
        }
        if min_votes < 0 {
            return Err(AppError::InvalidParameter(format!(
                "minVotes must be non-negative, got {}",
                min_votes
            )));
        }

        Ok(Self {
            n: n as usize,
            min_rating,
            min_votes: min_votes as u64,
        })
    }
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            n: 10,
            min_rating: 6.0,
            min_votes: 100,
        }
    }
}

/// Ranked results plus bookkeeping for logging
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    pub results: Vec<RankedResult>,
    /// Positive-similarity candidates looked at
    pub examined: usize,
    /// Candidates skipped by the quality filter
    pub filtered_out: usize,
}

/// Scores every catalog item against the preferred genres and returns up to
/// `params.n` admitted items, best similarity first.
///
/// Only the top `n * oversample_factor` similarity-ranked items are examined,
/// so heavy filtering can return fewer than `n`. The popularity boost changes
/// an admitted item's score but never its position.
pub fn recommend<S: AsRef<str>>(
    index: &CatalogIndex,
    catalog: &[CatalogItem],
    preferred_genres: &[S],
    params: &RankingParams,
    policy: &RankingPolicy,
) -> AppResult<RankingOutcome> {
    if index.len() != catalog.len() {
        return Err(AppError::Internal(format!(
            "index covers {} items but catalog has {}",
            index.len(),
            catalog.len()
        )));
    }

    let query = index.project(preferred_genres);
    let mut outcome = RankingOutcome {
        results: Vec::new(),
        examined: 0,
        filtered_out: 0,
    };

    if query.is_zero() {
        tracing::debug!("Query shares no vocabulary with the catalog");
        return Ok(outcome);
    }

    let similarities: Vec<f64> = index.vectors().iter().map(|v| v.dot(&query)).collect();

    // Stable sort keeps catalog order among equal similarities
    let mut order: Vec<usize> = (0..catalog.len()).collect();
    order.sort_by(|&a, &b| similarities[b].total_cmp(&similarities[a]));

    let window = params.n.saturating_mul(policy.oversample_factor.max(1));

    for &position in order.iter().take(window) {
        let similarity = similarities[position];
        if similarity <= 0.0 {
            break;
        }
        outcome.examined += 1;

        let item = &catalog[position];
        if !item.meets_quality(params.min_rating, params.min_votes) {
            outcome.filtered_out += 1;
            continue;
        }

        let mut score = similarity;
        if item.popularity > policy.popularity_threshold {
            score *= policy.popularity_boost;
        }

        // The computed score replaces any upstream field of the same name
        let mut item = item.clone();
        item.extra.remove("score");

        outcome.results.push(RankedResult { item, score });

        if outcome.results.len() >= params.n {
            break;
        }
    }

    tracing::debug!(
        window,
        examined = outcome.examined,
        filtered_out = outcome.filtered_out,
        admitted = outcome.results.len(),
        "Ranking finished"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn scenario_catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(1, "A", &["Action"], 7.0, 200, 10.0),
            CatalogItem::new(2, "B", &["Action", "Sci-Fi"], 8.0, 500, 60.0),
            CatalogItem::new(3, "C", &["Drama"], 9.0, 300, 5.0),
        ]
    }

    fn rank(
        catalog: &[CatalogItem],
        genres: &[&str],
        params: RankingParams,
    ) -> RankingOutcome {
        let index = CatalogIndex::build(catalog).unwrap();
        recommend(&index, catalog, genres, &params, &RankingPolicy::default()).unwrap()
    }

    fn ids(outcome: &RankingOutcome) -> Vec<i64> {
        outcome.results.iter().map(|r| r.item.id).collect()
    }

    #[test]
    fn test_params_reject_out_of_domain_values() {
        assert!(matches!(
            RankingParams::new(0, 6.0, 100),
            Err(AppError::InvalidParameter(_))
        ));
        assert!(matches!(
            RankingParams::new(5, -1.0, 100),
            Err(AppError::InvalidParameter(_))
        ));
        assert!(matches!(
            RankingParams::new(5, f64::NAN, 100),
            Err(AppError::InvalidParameter(_))
        ));
        assert!(matches!(
            RankingParams::new(5, 6.0, -3),
            Err(AppError::InvalidParameter(_))
        ));
        assert_eq!(RankingParams::new(10, 6.0, 100).unwrap(), RankingParams::default());
    }

    #[test]
    fn test_scenario_shared_tags_and_boost_rank_b_first() {
        let outcome = rank(
            &scenario_catalog(),
            &["Action", "Sci-Fi"],
            RankingParams::new(2, 6.0, 100).unwrap(),
        );

        assert_eq!(ids(&outcome), vec![2, 1]);
        // B matches the query exactly and is popular
        assert!((outcome.results[0].score - 1.05).abs() < EPSILON);
        assert!(outcome.results[1].score < 1.0);
        assert!(outcome.results[1].score > 0.0);
    }

    #[test]
    fn test_scenario_high_rating_threshold_returns_nothing() {
        let outcome = rank(
            &scenario_catalog(),
            &["Action", "Sci-Fi"],
            RankingParams::new(2, 9.5, 100).unwrap(),
        );

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.filtered_out, 2);
    }

    #[test]
    fn test_scenario_empty_query_returns_nothing() {
        let outcome = rank(&scenario_catalog(), &[], RankingParams::default());
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.examined, 0);
    }

    #[test]
    fn test_unknown_genres_return_nothing() {
        let outcome = rank(&scenario_catalog(), &["Western"], RankingParams::default());
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_results_respect_quality_thresholds_and_length() {
        let catalog: Vec<CatalogItem> = (0..20)
            .map(|i| {
                CatalogItem::new(
                    i,
                    format!("Movie {}", i),
                    &["Action"],
                    4.0 + (i % 6) as f64,
                    (i as u64) * 30,
                    1.0,
                )
            })
            .collect();
        let params = RankingParams::new(4, 6.0, 100).unwrap();
        let outcome = rank(&catalog, &["Action"], params);

        assert!(outcome.results.len() <= 4);
        for result in &outcome.results {
            assert!(result.item.vote_average >= 6.0);
            assert!(result.item.vote_count >= 100);
        }
    }

    #[test]
    fn test_ties_break_by_catalog_order() {
        let catalog = vec![
            CatalogItem::new(10, "First", &["Drama"], 7.0, 200, 1.0),
            CatalogItem::new(11, "Second", &["Drama"], 7.0, 200, 1.0),
            CatalogItem::new(12, "Third", &["Drama"], 7.0, 200, 1.0),
            CatalogItem::new(13, "Other", &["Comedy"], 7.0, 200, 1.0),
        ];
        let outcome = rank(&catalog, &["Drama"], RankingParams::new(3, 6.0, 100).unwrap());
        assert_eq!(ids(&outcome), vec![10, 11, 12]);
    }

    #[test]
    fn test_boost_does_not_reorder_results() {
        // X is a closer match; Y is a weaker match but popular enough that its
        // boosted score overtakes X. Order must still follow similarity.
        let catalog = vec![
            CatalogItem::new(1, "Y", &["Action", "Drama", "Comedy"], 7.0, 200, 80.0),
            CatalogItem::new(2, "X", &["Action", "Drama"], 7.0, 200, 1.0),
            CatalogItem::new(3, "Z", &["Romance"], 7.0, 200, 1.0),
            CatalogItem::new(4, "W", &["Romance", "Comedy"], 7.0, 200, 1.0),
        ];
        let index = CatalogIndex::build(&catalog).unwrap();
        let query = index.project(&["Action", "Drama"]);
        let sim_x = index.vectors()[1].dot(&query);
        let sim_y = index.vectors()[0].dot(&query);
        assert!(sim_x > sim_y);
        assert!(sim_y * 2.0 > sim_x);

        let policy = RankingPolicy {
            popularity_boost: 2.0,
            ..RankingPolicy::default()
        };
        let outcome = recommend(
            &index,
            &catalog,
            &["Action", "Drama"],
            &RankingParams::default(),
            &policy,
        )
        .unwrap();

        assert_eq!(ids(&outcome), vec![2, 1]);
        assert!((outcome.results[0].score - sim_x).abs() < EPSILON);
        assert!((outcome.results[1].score - sim_y * 2.0).abs() < EPSILON);
        assert!(outcome.results[1].score > outcome.results[0].score);
    }

    #[test]
    fn test_boost_cannot_rescue_filtered_item() {
        let catalog = vec![
            CatalogItem::new(1, "Popular but weak", &["Action"], 4.0, 5000, 500.0),
            CatalogItem::new(2, "Solid", &["Action"], 7.5, 800, 3.0),
        ];
        let outcome = rank(&catalog, &["Action"], RankingParams::default());
        assert_eq!(ids(&outcome), vec![2]);
        assert_eq!(outcome.filtered_out, 1);
    }

    #[test]
    fn test_popularity_threshold_is_strict() {
        let catalog = vec![CatalogItem::new(1, "Borderline", &["Action"], 7.0, 200, 50.0)];
        let outcome = rank(&catalog, &["Action"], RankingParams::default());
        assert!((outcome.results[0].score - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_oversampling_window_is_not_expanded() {
        // n = 1, factor 5: only the five best matches are examined. They all
        // fail the filter, so the sixth (which would pass) is never reached.
        let mut catalog: Vec<CatalogItem> = (0..5)
            .map(|i| CatalogItem::new(i, format!("Low {}", i), &["Horror"], 3.0, 500, 1.0))
            .collect();
        catalog.push(CatalogItem::new(99, "Good", &["Horror", "Mystery"], 8.0, 500, 1.0));

        let outcome = rank(&catalog, &["Horror"], RankingParams::new(1, 6.0, 100).unwrap());
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.examined, 5);
        assert_eq!(outcome.filtered_out, 5);
    }

    #[test]
    fn test_empty_genre_items_never_returned() {
        let catalog = vec![
            CatalogItem::new(1, "No genres", &[], 9.9, 99999, 999.0),
            CatalogItem::new(2, "Thriller", &["Thriller"], 7.0, 200, 1.0),
        ];
        let outcome = rank(&catalog, &["Thriller", "Action"], RankingParams::default());
        assert_eq!(ids(&outcome), vec![2]);
    }

    #[test]
    fn test_mismatched_catalog_is_rejected() {
        let catalog = scenario_catalog();
        let index = CatalogIndex::build(&catalog).unwrap();
        let result = recommend(
            &index,
            &catalog[..2],
            &["Action"],
            &RankingParams::default(),
            &RankingPolicy::default(),
        );
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_computed_score_replaces_upstream_score_field() {
        let mut stale = CatalogItem::new(1, "Stale", &["Action"], 7.0, 200, 1.0);
        stale.extra.insert("score".to_string(), serde_json::json!(0.1));
        stale
            .extra
            .insert("release_date".to_string(), serde_json::json!("1999-03-31"));
        let catalog = vec![stale];

        let outcome = rank(&catalog, &["Action"], RankingParams::default());
        let result = &outcome.results[0];
        assert!(!result.item.extra.contains_key("score"));
        assert!(result.item.extra.contains_key("release_date"));
        assert!(catalog[0].extra.contains_key("score"));

        let json = serde_json::to_string(result).unwrap();
        assert_eq!(json.matches("\"score\"").count(), 1);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!((value["score"].as_f64().unwrap() - 1.0).abs() < EPSILON);
        assert_eq!(value["release_date"], "1999-03-31");
    }

    #[test]
    fn test_catalog_is_not_mutated() {
        let catalog = scenario_catalog();
        let before = catalog.clone();
        let index = CatalogIndex::build(&catalog).unwrap();
        let _ = recommend(
            &index,
            &catalog,
            &["Action"],
            &RankingParams::default(),
            &RankingPolicy::default(),
        )
        .unwrap();
        assert_eq!(catalog, before);
    }
}
