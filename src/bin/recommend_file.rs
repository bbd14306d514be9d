//! One-shot file mode: reads a preference file, writes ranked recommendations.
//!
//! A missing request file is not fatal; the configured default query is used.

use reelrank::{config::Config, services::recommendations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reelrank::init_tracing();

    let config = Config::from_env()?;
    let response = recommendations::run_file_mode(&config).await?;

    for (rank, result) in response.ml_recommendations.iter().take(3).enumerate() {
        tracing::info!(rank = rank + 1, title = %result.item.title, score = result.score, "Top recommendation");
    }

    Ok(())
}
