/// Hourly precipitation series with aligned timestamp and value arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSeries {
    time: Vec<String>,
    precipitation_mm: Vec<f64>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesShapeError {
    #[error("payload has no hourly block")]
    MissingHourly,
    #[error("hourly block has no time array")]
    MissingTime,
    #[error("hourly block has no precipitation array")]
    MissingPrecipitation,
    #[error("hourly arrays differ in length: {time} timestamps, {precipitation} values")]
    LengthMismatch { time: usize, precipitation: usize },
}

impl WeatherSeries {
    pub fn new(time: Vec<String>, precipitation_mm: Vec<f64>) -> Result<Self, SeriesShapeError> {
        if time.len() != precipitation_mm.len() {
            return Err(SeriesShapeError::LengthMismatch {
                time: time.len(),
                precipitation: precipitation_mm.len(),
            });
        }

        Ok(Self {
            time,
            precipitation_mm,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[String] {
        &self.time
    }

    pub fn precipitation_mm(&self) -> &[f64] {
        &self.precipitation_mm
    }

    /// Iterate `(timestamp, precipitation_mm)` pairs in series order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.time
            .iter()
            .map(String::as_str)
            .zip(self.precipitation_mm.iter().copied())
    }
}
