pub mod api;
pub mod domain;
pub mod retry;

pub use api::{HistoricalForecastClient, WeatherApiError, DEFAULT_BASE_URL};
pub use domain::{ForecastPayload, ForecastQuery, HourlyBlock, SeriesShapeError, WeatherSeries};
pub use retry::RetryPolicy;
