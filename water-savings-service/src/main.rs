use anyhow::Result;
use water_savings_service::{
    build_pipeline,
    config::AppConfig,
    metrics_server,
    observability,
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let state = AppState::new(build_pipeline(&cfg)?);

    // Lazy expiry already hides stale entries; the sweep only bounds memory.
    let sweep_state = state.clone();
    let sweep_every = cfg.cache.ttl();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = sweep_state.pipeline.fetcher().purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "expired weather cache entries purged");
            }
        }
    });

    tracing::info!(
        upstream = %cfg.upstream.base_url,
        cache_ttl_secs = cfg.cache.ttl_secs,
        max_retries = cfg.retry.max_retries,
        "starting water savings service"
    );

    server::serve(&cfg.server.bind_addr, state).await
}
