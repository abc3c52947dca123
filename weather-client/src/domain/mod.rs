pub mod forecast;
pub mod series;

pub use forecast::{ForecastPayload, ForecastQuery, HourlyBlock};
pub use series::{SeriesShapeError, WeatherSeries};
