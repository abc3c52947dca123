pub mod historical_forecast;

pub use historical_forecast::{HistoricalForecastClient, WeatherApiError, DEFAULT_BASE_URL};
