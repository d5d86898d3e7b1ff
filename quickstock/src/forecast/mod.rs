//! Synthetic demand forecasts
//!
//! Stand-in for the forecasting endpoint when no model is deployed: a gently
//! rising daily series with random noise and fixed P10/P90 bands.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{IntelligenceError, IntelligenceResult};

pub const DEFAULT_HORIZON_DAYS: u32 = 7;
pub const MAX_HORIZON_DAYS: u32 = 90;

const BASE_DEMAND: u32 = 120;
const DAILY_GROWTH: u32 = 5;
const P10_BAND: u32 = 15;
const P90_BAND: u32 = 25;
const MAX_NOISE: u32 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastRequest {
    pub product_id: Option<String>,
    pub pincode: Option<String>,
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemandQuantiles {
    pub p10: u32,
    pub p50: u32,
    pub p90: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub demand: DemandQuantiles,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResult {
    pub forecast_id: String,
    pub product_id: String,
    pub pincode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_horizon_days: Option<u32>,
    pub forecast_date: DateTime<Utc>,
    pub predicted_demand: DemandQuantiles,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_series: Vec<ForecastPoint>,
    pub confidence_score: f64,
    pub influencing_factors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actionable_insights: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn required(value: Option<String>, field: &str) -> IntelligenceResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IntelligenceError::Validation(format!("`{}` is required", field)))
}

/// Daily series starting at `now`'s date
pub fn generate_forecast<R: Rng>(
    request: ForecastRequest,
    now: DateTime<Utc>,
    rng: &mut R,
) -> IntelligenceResult<ForecastResult> {
    let product_id = required(request.product_id, "product_id")?;
    let pincode = required(request.pincode, "pincode")?;
    let days = request.days.unwrap_or(DEFAULT_HORIZON_DAYS);
    if days == 0 || days > MAX_HORIZON_DAYS {
        return Err(IntelligenceError::Validation(format!(
            "`days` must be between 1 and {}",
            MAX_HORIZON_DAYS
        )));
    }

    let today = now.date_naive();
    let time_series: Vec<ForecastPoint> = (0..days)
        .map(|i| {
            let base = BASE_DEMAND + DAILY_GROWTH * i;
            let noise = rng.gen_range(0..MAX_NOISE);
            ForecastPoint {
                date: today + Duration::days(i64::from(i)),
                demand: DemandQuantiles {
                    p10: base + noise - P10_BAND,
                    p50: base + noise,
                    p90: base + noise + P90_BAND,
                },
            }
        })
        .collect();

    let predicted_demand = time_series[0].demand;
    tracing::info!(%product_id, %pincode, days, "Generated synthetic forecast");

    Ok(ForecastResult {
        forecast_id: format!("fc_{}", now.timestamp_millis()),
        product_id,
        pincode,
        prediction_horizon_days: Some(days),
        forecast_date: now,
        predicted_demand,
        time_series,
        confidence_score: 0.88,
        influencing_factors: vec![
            "weather_rain_probability".to_string(),
            "weekend_surge".to_string(),
            "local_festival".to_string(),
        ],
        actionable_insights: vec![
            "High probability of rain in 48h. Stock extra waterproof packaging.".to_string(),
            "Local festival detected on Day 3. Increase perishable inventory by 15%.".to_string(),
            "Competitor out-of-stock trend observed nearby.".to_string(),
        ],
        created_at: now,
    })
}

/// Most recent stored forecast for a product at a pincode
pub fn lookup_forecast(product_id: &str, pincode: &str, now: DateTime<Utc>) -> ForecastResult {
    ForecastResult {
        forecast_id: "fc_mock".to_string(),
        product_id: product_id.to_string(),
        pincode: pincode.to_string(),
        prediction_horizon_days: None,
        forecast_date: now,
        predicted_demand: DemandQuantiles {
            p10: 110,
            p50: 140,
            p90: 180,
        },
        time_series: Vec::new(),
        confidence_score: 0.9,
        influencing_factors: vec!["festival".to_string()],
        actionable_insights: Vec::new(),
        created_at: now,
    }
}
