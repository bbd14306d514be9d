use std::path::Path;

use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{CatalogItem, RecommendationRequest, RecommendationResponse},
    services::{
        catalog_source::{CatalogSource, JsonFileCatalog},
        indexer::CatalogIndex,
        ranker::{self, RankingParams, RankingPolicy},
    },
};

/// Fills request gaps from the configured defaults and validates the result
///
/// A missing `preferredGenres` becomes the default query; an explicitly empty
/// list is kept as is.
pub fn resolve_request(
    config: &Config,
    request: RecommendationRequest,
) -> AppResult<(Vec<String>, RankingParams)> {
    let params = RankingParams::new(
        request.n.unwrap_or(config.default_top_n),
        request.min_rating.unwrap_or(config.default_min_rating),
        request.min_votes.unwrap_or(config.default_min_votes),
    )?;
    let genres = request
        .preferred_genres
        .unwrap_or_else(|| config.default_genres.clone());

    Ok((genres, params))
}

/// Ranks the catalog for one preference query
pub fn rank_catalog(
    index: &CatalogIndex,
    catalog: &[CatalogItem],
    preferred_genres: &[String],
    params: &RankingParams,
    policy: &RankingPolicy,
) -> AppResult<RecommendationResponse> {
    tracing::info!(
        genres = ?preferred_genres,
        n = params.n,
        min_rating = params.min_rating,
        min_votes = params.min_votes,
        "Generating recommendations"
    );

    let outcome = ranker::recommend(index, catalog, preferred_genres, params, policy)?;

    tracing::info!(
        count = outcome.results.len(),
        examined = outcome.examined,
        filtered_out = outcome.filtered_out,
        "Recommendations generated"
    );

    Ok(RecommendationResponse::from(outcome.results))
}

/// Produces recommendations, going through the response cache when one is configured
pub async fn get_recommendations(
    index: &CatalogIndex,
    catalog: &[CatalogItem],
    cache: Option<&Cache>,
    config: &Config,
    request: RecommendationRequest,
) -> AppResult<RecommendationResponse> {
    let (genres, params) = resolve_request(config, request)?;
    let policy = config.ranking_policy();

    match cache {
        Some(cache) => {
            let key = CacheKey::recommendations(
                index.fingerprint(),
                genres.as_slice(),
                &params,
                &policy,
            );
            let response: AppResult<RecommendationResponse> =
                cached!(cache, key, config.cache_ttl_secs, async {
                    rank_catalog(index, catalog, &genres, &params, &policy)
                });
            response
        }
        None => rank_catalog(index, catalog, &genres, &params, &policy),
    }
}

/// Reads the file-mode request
///
/// Only a missing file falls back to the configured default query. A present
/// file without `preferredGenres` asks for nothing and ranks nothing.
pub async fn read_request_file(config: &Config, path: &Path) -> AppResult<RecommendationRequest> {
    if !tokio::fs::try_exists(path).await? {
        tracing::warn!(path = %path.display(), "Request file not found, using default preferences");
        return Ok(RecommendationRequest {
            preferred_genres: Some(config.default_genres.clone()),
            ..Default::default()
        });
    }

    let bytes = tokio::fs::read(path).await?;
    let mut request: RecommendationRequest = serde_json::from_slice(&bytes)?;
    request.preferred_genres.get_or_insert_with(Vec::new);

    Ok(request)
}

/// Writes a response as pretty-printed JSON, creating parent directories
pub async fn write_response_file(path: &Path, response: &RecommendationResponse) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec_pretty(response)?).await?;

    tracing::info!(path = %path.display(), count = response.count, "Recommendations written");
    Ok(())
}

/// One-shot run: request file in, catalog ranked, response file out
pub async fn run_file_mode(config: &Config) -> AppResult<RecommendationResponse> {
    let request = read_request_file(config, Path::new(&config.ml_input_path)).await?;
    let (genres, params) = resolve_request(config, request)?;

    let catalog = JsonFileCatalog::new(&config.catalog_path).load().await?;
    let index = CatalogIndex::build(&catalog)?;

    let response = rank_catalog(&index, &catalog, &genres, &params, &config.ranking_policy())?;
    write_response_file(Path::new(&config.ml_output_path), &response).await?;

    Ok(response)
}
