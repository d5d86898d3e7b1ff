//! Chart selection
//!
//! The chart attached to a query answer depends only on the query text and
//! the live context, never on the AI response. Rules are checked in
//! [`CHART_RULES`] order and the first match wins, so a query such as
//! "forecast stock levels" resolves to the forecast chart.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::context::{LiveContext, LiveSignal};

pub const COLOR_CYAN: &str = "#06b6d4";
pub const COLOR_GREEN: &str = "#10b981";
pub const COLOR_VIOLET: &str = "#8b5cf6";
pub const COLOR_RED: &str = "#ef4444";

/// One bar series of a bar chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarSeries {
    /// Row field holding this series' value
    pub key: String,
    /// Legend label
    pub name: String,
    pub color: String,
}

impl BarSeries {
    fn new(key: &str, name: &str, color: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartDescriptor {
    Bar {
        title: String,
        #[serde(rename = "xKey")]
        x_key: String,
        bars: Vec<BarSeries>,
        data: Vec<Value>,
    },
    Signals {
        title: String,
        data: Vec<LiveSignal>,
    },
}

impl ChartDescriptor {
    pub fn title(&self) -> &str {
        match self {
            ChartDescriptor::Bar { title, .. } | ChartDescriptor::Signals { title, .. } => title,
        }
    }

    pub fn is_bar(&self) -> bool {
        matches!(self, ChartDescriptor::Bar { .. })
    }
}

/// A keyword predicate paired with the chart it selects
pub struct ChartRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub build: fn(&LiveContext) -> ChartDescriptor,
}

impl ChartRule {
    /// `lowered_query` must already be lowercase
    pub fn matches(&self, lowered_query: &str) -> bool {
        self.keywords.iter().any(|k| lowered_query.contains(k))
    }
}

/// Priority order matters: earlier rules shadow later ones.
pub const CHART_RULES: &[ChartRule] = &[
    ChartRule {
        name: "forecast",
        keywords: &["forecast", "produce", "p50", "p10", "p90", "3 day", "next"],
        build: forecast_chart,
    },
    ChartRule {
        name: "demand",
        keywords: &["demand", "trend", "weekly", "average"],
        build: demand_chart,
    },
    ChartRule {
        name: "inventory",
        keywords: &["stock", "inventory", "node", "reorder", "optimize"],
        build: inventory_chart,
    },
    ChartRule {
        name: "signals",
        keywords: &["festival", "rain", "weather", "bathukamma", "signal", "what if"],
        build: signals_chart,
    },
];

/// First rule whose keywords appear in `query` (case-insensitive)
pub fn matching_rule(query: &str) -> Option<&'static ChartRule> {
    let lowered = query.to_lowercase();
    CHART_RULES.iter().find(|rule| rule.matches(&lowered))
}

pub fn select_chart(query: &str, context: &LiveContext) -> ChartDescriptor {
    match matching_rule(query) {
        Some(rule) => (rule.build)(context),
        None => overview_chart(context),
    }
}

/// `tomato_1kg_500001` -> `tomato 1kg`
pub fn forecast_label(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

fn forecast_chart(context: &LiveContext) -> ChartDescriptor {
    ChartDescriptor::Bar {
        title: "3-Day Demand Forecast (P10 / P50 / P90)".to_string(),
        x_key: "item".to_string(),
        bars: vec![
            BarSeries::new("p10", "P10 (Conservative)", COLOR_CYAN),
            BarSeries::new("p50", "P50 (Expected)", COLOR_GREEN),
            BarSeries::new("p90", "P90 (Peak)", COLOR_VIOLET),
        ],
        data: context
            .next_3day_forecast
            .iter()
            .map(|(key, f)| {
                json!({
                    "item": forecast_label(key),
                    "p10": f.p10,
                    "p50": f.p50,
                    "p90": f.p90,
                })
            })
            .collect(),
    }
}

fn demand_chart(context: &LiveContext) -> ChartDescriptor {
    ChartDescriptor::Bar {
        title: "7-Day Average Demand by SKU".to_string(),
        x_key: "sku".to_string(),
        bars: vec![BarSeries::new(
            "avg_demand",
            "Avg Daily Demand (units)",
            COLOR_VIOLET,
        )],
        data: context
            .demand_trends
            .iter()
            .map(|(sku, d)| {
                json!({
                    "sku": sku.replace('_', " "),
                    "avg_demand": d.recent_7d_avg,
                    "trend": d.trend,
                })
            })
            .collect(),
    }
}

fn inventory_chart(context: &LiveContext) -> ChartDescriptor {
    ChartDescriptor::Bar {
        title: "Live Inventory Levels vs Reorder Point".to_string(),
        x_key: "node".to_string(),
        bars: vec![
            BarSeries::new("current_stock", "Current Stock", COLOR_GREEN),
            BarSeries::new("reorder_point", "Reorder Point", COLOR_RED),
        ],
        data: context
            .active_nodes
            .iter()
            .map(|n| {
                json!({
                    "node": n.short_id(),
                    "current_stock": n.current_stock_units,
                    "reorder_point": n.reorder_point,
                })
            })
            .collect(),
    }
}

fn signals_chart(context: &LiveContext) -> ChartDescriptor {
    ChartDescriptor::Signals {
        title: "Active Live Signals".to_string(),
        data: context.live_signals.clone(),
    }
}

/// Fallback when no rule matches
fn overview_chart(context: &LiveContext) -> ChartDescriptor {
    ChartDescriptor::Bar {
        title: "Inventory Overview by Node".to_string(),
        x_key: "node".to_string(),
        bars: vec![BarSeries::new(
            "current_stock",
            "Current Stock Units",
            COLOR_GREEN,
        )],
        data: context
            .active_nodes
            .iter()
            .map(|n| {
                json!({
                    "node": n.short_id(),
                    "current_stock": n.current_stock_units,
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::source::baseline_context;
    use pretty_assertions::assert_eq;

    fn rule_name(query: &str) -> Option<&'static str> {
        matching_rule(query).map(|r| r.name)
    }

    #[test]
    fn test_rule_priority() {
        assert_eq!(rule_name("forecast stock levels"), Some("forecast"));
        assert_eq!(rule_name("Weekly demand at each node"), Some("demand"));
        assert_eq!(rule_name("which NODE needs a reorder?"), Some("inventory"));
        assert_eq!(rule_name("What if it rains tomorrow?"), Some("signals"));
        assert_eq!(rule_name("random unrelated text"), None);
        // "next" outranks the signal keywords
        assert_eq!(rule_name("rain in the next 48h"), Some("forecast"));
    }

    #[test]
    fn test_forecast_chart_rows() {
        let chart = select_chart("Show P50 for tomatoes", &baseline_context());
        let ChartDescriptor::Bar { title, x_key, bars, data } = chart else {
            panic!("expected bar chart");
        };
        assert_eq!(title, "3-Day Demand Forecast (P10 / P50 / P90)");
        assert_eq!(x_key, "item");
        assert_eq!(
            bars.iter().map(|b| b.color.as_str()).collect::<Vec<_>>(),
            vec![COLOR_CYAN, COLOR_GREEN, COLOR_VIOLET]
        );
        assert_eq!(
            data[0],
            json!({"item": "tomato 1kg", "p10": 110, "p50": 135, "p90": 165})
        );
        assert_eq!(data[2]["item"], "milk 1L");
    }

    #[test]
    fn test_demand_chart_rows() {
        let chart = select_chart("trend for onions", &baseline_context());
        let ChartDescriptor::Bar { bars, data, .. } = chart else {
            panic!("expected bar chart");
        };
        assert_eq!(bars.len(), 1);
        assert_eq!(
            data[1],
            json!({"sku": "onion 1kg", "avg_demand": 98, "trend": "-3% vs last week"})
        );
    }

    #[test]
    fn test_inventory_chart_uses_node_prefix() {
        let chart = select_chart("show inventory levels", &baseline_context());
        assert_eq!(chart.title(), "Live Inventory Levels vs Reorder Point");
        let ChartDescriptor::Bar { data, bars, .. } = chart else {
            panic!("expected bar chart");
        };
        assert_eq!(bars.len(), 2);
        assert_eq!(
            data[3],
            json!({"node": "500016", "current_stock": 90, "reorder_point": 200})
        );
    }

    #[test]
    fn test_signals_chart_is_verbatim() {
        let context = baseline_context();
        let chart = select_chart("What if it rains tomorrow?", &context);
        assert_eq!(
            chart,
            ChartDescriptor::Signals {
                title: "Active Live Signals".to_string(),
                data: context.live_signals.clone(),
            }
        );
    }

    #[test]
    fn test_default_overview_has_stock_only() {
        let chart = select_chart("random unrelated text", &baseline_context());
        assert_eq!(chart.title(), "Inventory Overview by Node");
        let ChartDescriptor::Bar { bars, data, .. } = chart else {
            panic!("expected bar chart");
        };
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].key, "current_stock");
        assert_eq!(data.len(), 5);
        assert!(data.iter().all(|row| row.get("reorder_point").is_none()));
    }

    #[test]
    fn test_serialized_shape() {
        let chart = select_chart("stock", &baseline_context());
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["type"], "bar");
        assert_eq!(json["xKey"], "node");
        assert_eq!(json["bars"][1]["name"], "Reorder Point");

        let signals = serde_json::to_value(select_chart("festival", &baseline_context())).unwrap();
        assert_eq!(signals["type"], "signals");
        assert_eq!(signals["data"][0]["type"], "weather");
    }

    #[test]
    fn test_forecast_label() {
        assert_eq!(forecast_label("tomato_1kg_500001"), "tomato 1kg");
        assert_eq!(forecast_label("single"), "single");
    }
}
