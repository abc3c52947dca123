pub mod cache;
pub mod config;
pub mod fetcher;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod transform;

pub use pipeline::{SavingsError, SavingsPipeline, SavingsRequest};
pub use transform::SavingsReport;

use std::sync::Arc;

use weather_client::HistoricalForecastClient;

/// Wire the upstream client, cache and pipeline from configuration.
pub fn build_pipeline(cfg: &config::AppConfig) -> anyhow::Result<SavingsPipeline> {
    let client = HistoricalForecastClient::new(
        cfg.upstream.base_url.clone(),
        cfg.retry.policy(),
        cfg.upstream.timeout(),
    )?;

    let fetcher = fetcher::CachedWeatherFetcher::new(Arc::new(client), cfg.cache.ttl());
    Ok(SavingsPipeline::new(fetcher))
}
