pub mod catalog_source;
pub mod indexer;
pub mod ranker;
pub mod recommendations;

pub use catalog_source::{CatalogSource, JsonFileCatalog};
pub use indexer::CatalogIndex;
pub use ranker::{RankingParams, RankingPolicy};
