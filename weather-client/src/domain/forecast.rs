use serde::{Deserialize, Serialize};

use super::series::{SeriesShapeError, WeatherSeries};

/// Delimiter used when composing cache keys from the query dimensions.
const KEY_DELIMITER: char = '_';

/// Coordinates and date range of a historical precipitation lookup.
///
/// Values are kept exactly as the caller supplied them; range checks are
/// left to the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastQuery {
    pub latitude: String,
    pub longitude: String,
    pub start_date: String,
    pub end_date: String,
}

impl ForecastQuery {
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn cache_key(&self) -> String {
        let mut key = String::with_capacity(
            self.latitude.len() + self.longitude.len() + self.start_date.len() + self.end_date.len() + 3,
        );
        for (i, part) in [&self.latitude, &self.longitude, &self.start_date, &self.end_date]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                key.push(KEY_DELIMITER);
            }
            key.push_str(part);
        }
        key
    }
}

/// Raw body returned by the historical-forecast endpoint.
///
/// Every field is optional so that a structurally wrong payload still
/// decodes and can be rejected by [`ForecastPayload::into_series`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Option<Vec<String>>,
    #[serde(default)]
    pub precipitation: Option<Vec<Option<f64>>>,
}

impl ForecastPayload {
    /// Validate the hourly block and turn it into a [`WeatherSeries`].
    ///
    /// Missing hours (`null` precipitation) read as 0 mm.
    pub fn into_series(self) -> Result<WeatherSeries, SeriesShapeError> {
        let hourly = self.hourly.ok_or(SeriesShapeError::MissingHourly)?;
        let time = hourly.time.ok_or(SeriesShapeError::MissingTime)?;
        let precipitation = hourly
            .precipitation
            .ok_or(SeriesShapeError::MissingPrecipitation)?;

        let precipitation_mm = precipitation
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();

        WeatherSeries::new(time, precipitation_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_joins_all_dimensions() {
        let q = ForecastQuery::new("51.5", "-0.12", "2024-01-01", "2024-01-31");
        assert_eq!(q.cache_key(), "51.5_-0.12_2024-01-01_2024-01-31");
    }

    #[test]
    fn cache_key_differs_per_date_range() {
        let a = ForecastQuery::new("51.5", "-0.12", "2024-01-01", "2024-01-31");
        let b = ForecastQuery::new("51.5", "-0.12", "2024-01-01", "2024-02-29");
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn payload_decodes_open_meteo_body() {
        let body = serde_json::json!({
            "latitude": 51.5,
            "longitude": -0.12,
            "hourly_units": { "time": "iso8601", "precipitation": "mm" },
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
                "precipitation": [0.4, null]
            }
        });

        let payload: ForecastPayload = serde_json::from_value(body).unwrap();
        let series = payload.into_series().unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.precipitation_mm(), &[0.4, 0.0]);
    }

    #[test]
    fn payload_without_precipitation_is_rejected() {
        let body = serde_json::json!({
            "hourly": { "time": ["2024-01-01T00:00"] }
        });

        let payload: ForecastPayload = serde_json::from_value(body).unwrap();
        assert_eq!(
            payload.into_series(),
            Err(SeriesShapeError::MissingPrecipitation)
        );
    }

    #[test]
    fn payload_without_hourly_is_rejected() {
        let payload: ForecastPayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(payload.into_series(), Err(SeriesShapeError::MissingHourly));
    }
}
