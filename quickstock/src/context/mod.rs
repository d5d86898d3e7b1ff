//! Live platform context
//!
//! A [`LiveContext`] is the snapshot of platform state that grounds every AI
//! answer. It is produced fresh for each request by a [`LiveContextSource`]
//! and never mutated afterwards.

pub mod source;

pub use source::{LiveContextSource, StaticContextSource, SyntheticContextSource};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Snapshot of the distribution platform at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveContext {
    pub timestamp: DateTime<Utc>,
    pub platform: String,
    pub coverage: String,
    pub active_nodes: Vec<DistributionNode>,
    /// SKU -> trailing 7-day demand stats, in insertion order
    pub demand_trends: IndexMap<String, DemandTrend>,
    pub live_signals: Vec<LiveSignal>,
    /// `<sku>_<node>` -> short-horizon quantile forecast, in insertion order
    pub next_3day_forecast: IndexMap<String, QuantileForecast>,
    pub system_health: SystemHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionNode {
    /// Pincode followed by the locality, e.g. `500001 (Gachibowli)`
    pub node: String,
    pub category: String,
    pub current_stock_units: u32,
    pub reorder_point: u32,
    pub avg_daily_demand: u32,
    pub status: String,
}

impl DistributionNode {
    /// Text before the first space of the node identifier
    pub fn short_id(&self) -> &str {
        self.node.split(' ').next().unwrap_or(&self.node)
    }

    pub fn is_below_reorder_point(&self) -> bool {
        self.current_stock_units < self.reorder_point
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandTrend {
    pub unit: String,
    pub recent_7d_avg: u32,
    pub trend: String,
    pub peak_nodes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Weather,
    Event,
    Competitor,
    SupplyChain,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveSignal {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub signal: String,
}

/// P10/P50/P90 demand quantiles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantileForecast {
    pub p10: u32,
    pub p50: u32,
    pub p90: u32,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemHealth {
    pub forecast_model_accuracy: String,
    pub last_model_update: String,
    pub nodes_reporting: String,
}
