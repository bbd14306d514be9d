mod catalog;
mod recommendation;

pub use catalog::CatalogItem;
pub use recommendation::{
    CatalogStats, GenreStats, RankedResult, RecommendationRequest, RecommendationResponse,
};
