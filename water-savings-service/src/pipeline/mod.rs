//! Per-request flow: validate parameters, fetch, shape-check, aggregate.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use weather_client::{ForecastPayload, ForecastQuery, HistoricalForecastClient, WeatherApiError};

use crate::fetcher::CachedWeatherFetcher;
use crate::transform::{self, SavingsReport};

#[derive(thiserror::Error, Debug)]
pub enum SavingsError {
    #[error("Missing required parameters: latitude, longitude, startDate, endDate, areaSqFt")]
    MissingParameters,
    #[error("Invalid area value")]
    InvalidArea,
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
    #[error("Invalid weather data structure")]
    InvalidWeatherData,
    #[error("{0}")]
    Upstream(String),
}

impl SavingsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameters | Self::InvalidArea | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::InvalidWeatherData | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WeatherApiError> for SavingsError {
    fn from(e: WeatherApiError) -> Self {
        match e {
            WeatherApiError::Decode(reason) => {
                tracing::warn!(%reason, "weather payload did not decode");
                Self::InvalidWeatherData
            }
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for SavingsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        metrics::counter!("water_savings_errors_total", "status" => status.as_u16().to_string()).increment(1);

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "water savings request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "water savings request rejected");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Upstream seam for hourly precipitation lookups.
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn hourly_precipitation(&self, query: &ForecastQuery) -> Result<ForecastPayload, WeatherApiError>;
}

#[async_trait::async_trait]
impl WeatherSource for HistoricalForecastClient {
    async fn hourly_precipitation(&self, query: &ForecastQuery) -> Result<ForecastPayload, WeatherApiError> {
        HistoricalForecastClient::hourly_precipitation(self, query).await
    }
}

/// Query parameters as they arrive on `GET /water-savings`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterSavingsParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub area_sq_ft: Option<String>,
}

/// A validated request: where, when, and over how much roof.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsRequest {
    pub query: ForecastQuery,
    pub area_sqft: f64,
}

impl TryFrom<WaterSavingsParams> for SavingsRequest {
    type Error = SavingsError;

    fn try_from(params: WaterSavingsParams) -> Result<Self, Self::Error> {
        fn present(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }

        let (Some(latitude), Some(longitude), Some(start_date), Some(end_date), Some(area)) = (
            present(params.latitude),
            present(params.longitude),
            present(params.start_date),
            present(params.end_date),
            present(params.area_sq_ft),
        ) else {
            return Err(SavingsError::MissingParameters);
        };

        Ok(Self {
            query: ForecastQuery::new(latitude, longitude, start_date, end_date),
            area_sqft: parse_area(&area)?,
        })
    }
}

/// Area must be a finite number greater than zero.
pub fn parse_area(raw: &str) -> Result<f64, SavingsError> {
    match raw.trim().parse::<f64>() {
        Ok(area) if area.is_finite() && area > 0.0 => Ok(area),
        _ => Err(SavingsError::InvalidArea),
    }
}

pub struct SavingsPipeline {
    fetcher: CachedWeatherFetcher,
}

impl SavingsPipeline {
    pub fn new(fetcher: CachedWeatherFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &CachedWeatherFetcher {
        &self.fetcher
    }

    pub async fn run(&self, request: &SavingsRequest) -> Result<SavingsReport, SavingsError> {
        let payload: Arc<ForecastPayload> = self.fetcher.fetch(&request.query).await?;

        let series = ForecastPayload::clone(&payload).into_series().map_err(|e| {
            tracing::warn!(error = %e, key = %request.query.cache_key(), "unexpected weather payload shape");
            SavingsError::InvalidWeatherData
        })?;

        let report = transform::aggregate(&series, request.area_sqft);
        tracing::info!(
            latitude = %request.query.latitude,
            longitude = %request.query.longitude,
            start_date = %request.query.start_date,
            end_date = %request.query.end_date,
            area_sqft = request.area_sqft,
            hours = series.len(),
            total_litres = %report.total_water_collected,
            "water savings computed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_TTL;
    use crate::fetcher::tests::{payload, FakeSource};
    use weather_client::HourlyBlock;

    fn params(area: &str) -> WaterSavingsParams {
        WaterSavingsParams {
            latitude: Some("51.5".to_string()),
            longitude: Some("-0.12".to_string()),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            area_sq_ft: Some(area.to_string()),
        }
    }

    fn pipeline_over(source: Arc<FakeSource>) -> SavingsPipeline {
        SavingsPipeline::new(CachedWeatherFetcher::new(source, DEFAULT_TTL))
    }

    #[test]
    fn accepts_complete_params() {
        let req = SavingsRequest::try_from(params("1000")).unwrap();
        assert_eq!(req.area_sqft, 1000.0);
        assert_eq!(req.query.start_date, "2024-01-01");
    }

    #[test]
    fn each_missing_param_is_rejected() {
        let strip: [fn(&mut WaterSavingsParams); 5] = [
            |p| p.latitude = None,
            |p| p.longitude = None,
            |p| p.start_date = None,
            |p| p.end_date = None,
            |p| p.area_sq_ft = None,
        ];

        for f in strip {
            let mut p = params("1000");
            f(&mut p);
            assert!(matches!(
                SavingsRequest::try_from(p),
                Err(SavingsError::MissingParameters)
            ));
        }
    }

    #[test]
    fn empty_param_counts_as_missing() {
        let mut p = params("1000");
        p.latitude = Some(String::new());
        assert!(matches!(
            SavingsRequest::try_from(p),
            Err(SavingsError::MissingParameters)
        ));
    }

    #[test]
    fn non_positive_or_garbage_area_is_rejected() {
        for area in ["-5", "0", "abc", "NaN", "inf"] {
            assert!(
                matches!(SavingsRequest::try_from(params(area)), Err(SavingsError::InvalidArea)),
                "area {area} should be rejected"
            );
        }
    }

    #[test]
    fn error_statuses() {
        assert_eq!(SavingsError::MissingParameters.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(SavingsError::InvalidArea.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            SavingsError::InvalidWeatherData.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SavingsError::Upstream("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn run_aggregates_fetched_series() {
        let source = FakeSource::new(vec![Ok(payload(&["2024-01-01T00:00"], &[10.0]))]);
        let pipeline = pipeline_over(source);

        let req = SavingsRequest::try_from(params("1000")).unwrap();
        let report = pipeline.run(&req).await.unwrap();

        assert_eq!(report.total_water_collected, "929.00");
        assert_eq!(report.money_saved, "1.39");
    }

    #[tokio::test]
    async fn missing_precipitation_is_a_structure_error() {
        let source = FakeSource::new(vec![Ok(ForecastPayload {
            hourly: Some(HourlyBlock {
                time: Some(vec!["2024-01-01T00:00".to_string()]),
                precipitation: None,
            }),
        })]);
        let pipeline = pipeline_over(source);

        let req = SavingsRequest::try_from(params("1000")).unwrap();
        let err = pipeline.run(&req).await.unwrap_err();

        assert!(matches!(err, SavingsError::InvalidWeatherData));
        assert_eq!(err.to_string(), "Invalid weather data structure");
    }

    #[tokio::test]
    async fn undecodable_payload_is_a_structure_error() {
        let source = FakeSource::new(vec![Err(WeatherApiError::Decode(
            "invalid type: string \"unavailable\", expected struct HourlyBlock".to_string(),
        ))]);
        let pipeline = pipeline_over(source.clone());

        let req = SavingsRequest::try_from(params("1000")).unwrap();
        let err = pipeline.run(&req).await.unwrap_err();

        assert!(matches!(err, SavingsError::InvalidWeatherData));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_keeps_its_message() {
        let source = FakeSource::new(vec![Err(WeatherApiError::Status {
            status: 400,
            message: "Parameter 'start_date' is out of allowed range".to_string(),
        })]);
        let pipeline = pipeline_over(source);

        let req = SavingsRequest::try_from(params("1000")).unwrap();
        let err = pipeline.run(&req).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "weather API returned 400: Parameter 'start_date' is out of allowed range"
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
