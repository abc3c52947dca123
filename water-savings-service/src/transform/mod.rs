use std::collections::BTreeMap;

use serde::Serialize;
use weather_client::WeatherSeries;

/// Litres collected per square foot of catchment per millimetre of rain.
pub const LITRES_PER_SQFT_MM: f64 = 0.0929;

/// GBP per 1000 litres of mains water.
pub const WATER_COST_PER_1000_LITRES: f64 = 1.50;

pub const WATER_COLLECTED_FORMULA: &str =
    "Water Collected (litres) = Area (sq ft) * Rainfall (mm) * 0.0929";

/// Per-request savings summary, serialized as the endpoint's 200 body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsReport {
    /// Full-precision litres keyed by `YYYY-MM`.
    pub monthly_water_collected: BTreeMap<String, f64>,
    pub total_water_collected: String,
    pub money_saved: String,
    #[serde(rename = "waterCostPer1000LitrePounds")]
    pub water_cost_per_1000_litres: f64,
    pub water_collected_formula: &'static str,
    #[serde(skip)]
    pub total_litres: f64,
}

/// Month bucket for a timestamp: its first seven characters, offset left
/// as given.
pub fn month_label(timestamp: &str) -> &str {
    timestamp.get(..7).unwrap_or(timestamp)
}

pub fn water_collected_litres(area_sqft: f64, rainfall_mm: f64) -> f64 {
    area_sqft * rainfall_mm * LITRES_PER_SQFT_MM
}

pub fn money_saved(total_litres: f64) -> f64 {
    total_litres / 1000.0 * WATER_COST_PER_1000_LITRES
}

/// Two-decimal display string. Exact half-cent ties round away from zero;
/// everything else rounds to the nearest cent.
pub fn format_2dp(value: f64) -> String {
    // A half-cent tie is only representable as an odd number of eighths.
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0 {
        return format!("{:.2}", (value * 100.0).round() / 100.0);
    }
    format!("{value:.2}")
}

/// Bucket an hourly series into monthly litres and price the total.
///
/// Rainfall values are used as-is; zero and negative readings are not
/// clamped.
pub fn aggregate(series: &WeatherSeries, area_sqft: f64) -> SavingsReport {
    let mut monthly: BTreeMap<String, f64> = BTreeMap::new();
    let mut total_litres = 0.0;

    for (timestamp, rainfall_mm) in series.iter() {
        let litres = water_collected_litres(area_sqft, rainfall_mm);

        *monthly.entry(month_label(timestamp).to_string()).or_insert(0.0) += litres;
        total_litres += litres;
    }

    SavingsReport {
        monthly_water_collected: monthly,
        total_water_collected: format_2dp(total_litres),
        money_saved: format_2dp(money_saved(total_litres)),
        water_cost_per_1000_litres: WATER_COST_PER_1000_LITRES,
        water_collected_formula: WATER_COLLECTED_FORMULA,
        total_litres,
    }
}
