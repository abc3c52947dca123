use std::{sync::Arc, time::Duration};

use weather_client::{ForecastPayload, ForecastQuery, WeatherApiError};

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::pipeline::WeatherSource;

/// Upstream weather lookups fronted by a TTL cache.
///
/// Concurrent misses for the same key each reach the upstream; the last
/// response written wins.
pub struct CachedWeatherFetcher {
    source: Arc<dyn WeatherSource>,
    cache: TtlCache<Arc<ForecastPayload>>,
}

impl CachedWeatherFetcher {
    pub fn new(source: Arc<dyn WeatherSource>, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn WeatherSource>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    pub async fn fetch(&self, query: &ForecastQuery) -> Result<Arc<ForecastPayload>, WeatherApiError> {
        let key = query.cache_key();

        if let Some(payload) = self.cache.get(&key) {
            metrics::counter!("weather_cache_hits_total").increment(1);
            tracing::debug!(%key, "weather cache hit");
            return Ok(payload);
        }

        metrics::counter!("weather_cache_misses_total").increment(1);
        tracing::debug!(%key, "weather cache miss, fetching upstream");

        let payload = Arc::new(self.source.hourly_precipitation(query).await?);
        self.cache.set(key, payload.clone());
        Ok(payload)
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }
}
