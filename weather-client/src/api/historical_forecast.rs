//! Client for the Open-Meteo historical forecast API.
//!
//! Only the hourly precipitation variable is requested. Transport errors
//! and non-success statuses go through the configured [`RetryPolicy`]; a
//! success body that does not decode is returned as-is without retrying.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::domain::{ForecastPayload, ForecastQuery};
use crate::retry::{retry, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://historical-forecast-api.open-meteo.com/v1/forecast";

const HOURLY_VARIABLES: &str = "precipitation";
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(thiserror::Error, Debug)]
pub enum WeatherApiError {
    #[error("weather API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("weather API response could not be decoded: {0}")]
    Decode(String),
}

/// Error object Open-Meteo returns alongside 4xx responses.
#[derive(Deserialize)]
struct UpstreamErrorBody {
    reason: String,
}

#[derive(Debug, Clone)]
pub struct HistoricalForecastClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HistoricalForecastClient {
    pub fn new(
        base_url: impl Into<String>,
        retry: RetryPolicy,
        timeout: Option<Duration>,
    ) -> Result<Self, WeatherApiError> {
        let mut builder = Client::builder().user_agent(concat!("weather-client/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
            retry,
        })
    }

    /// Fetch the hourly precipitation series for `query`, retrying
    /// transient failures.
    pub async fn hourly_precipitation(
        &self,
        query: &ForecastQuery,
    ) -> Result<ForecastPayload, WeatherApiError> {
        tracing::debug!(
            base_url = %self.base_url,
            latitude = %query.latitude,
            longitude = %query.longitude,
            start_date = %query.start_date,
            end_date = %query.end_date,
            "fetching hourly precipitation"
        );

        let body = retry(&self.retry, || self.fetch_once(query)).await?;
        serde_json::from_slice(&body).map_err(|e| WeatherApiError::Decode(e.to_string()))
    }

    async fn fetch_once(&self, query: &ForecastQuery) -> Result<Vec<u8>, WeatherApiError> {
        let params = [
            ("latitude", query.latitude.as_str()),
            ("longitude", query.longitude.as_str()),
            ("start_date", query.start_date.as_str()),
            ("end_date", query.end_date.as_str()),
            ("hourly", HOURLY_VARIABLES),
        ];

        let resp = self.client.get(&self.base_url).query(&params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WeatherApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<UpstreamErrorBody>(body) {
        Ok(parsed) => parsed.reason,
        Err(_) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}
