//! Grounding prompt construction.

use chrono::{FixedOffset, NaiveDate, Utc};

use crate::context::LiveContext;
use crate::error::IntelligenceResult;

/// IST, the platform's locale
const PLATFORM_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Today's date in the platform's timezone
pub fn platform_today() -> NaiveDate {
    let now = Utc::now();
    match FixedOffset::east_opt(PLATFORM_UTC_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

/// `Monday, 19 October 2026`
pub fn format_platform_date(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}

/// System prompt grounded on `context`, dated today
pub fn build_system_prompt(context: &LiveContext) -> IntelligenceResult<String> {
    build_system_prompt_for_date(context, platform_today())
}

pub fn build_system_prompt_for_date(
    context: &LiveContext,
    date: NaiveDate,
) -> IntelligenceResult<String> {
    let data = serde_json::to_string(context)?;
    Ok(format!(
        "
You are the QuickStock AI Intelligence — a data-driven AI agent for a hyper-local quick commerce distribution platform in Hyderabad, India.
Answer STRICTLY based on the real-time platform data below. Cite specific SKUs, node IDs, and numbers. Use markdown with bullet points. Be concise.
Today: {}.

--- LIVE PLATFORM DATA ---
{}
--- END DATA ---
",
        format_platform_date(date),
        data
    ))
}

/// User message for a what-if scenario analysis
pub fn what_if_message(scenario: &serde_json::Value) -> IntelligenceResult<String> {
    Ok(format!(
        "
Analyze this what-if scenario against the live platform data.
Scenario: {}

Provide:
1. Specific affected nodes and SKUs from the data
2. Quantified impact on demand using numbers from the data
3. Concrete 2-3 step action plan with exact quantities
",
        serde_json::to_string(scenario)?
    ))
}

/// User message asking for exactly three recommendations against a forecast
pub fn recommendations_message(forecast: &serde_json::Value) -> IntelligenceResult<String> {
    Ok(format!(
        "
Given this forecast AND the live platform data, provide exactly 3 prioritized recommendations.
Forecast: {}

Each recommendation must name the specific SKU, node ID, and give a concrete action with exact quantities.
",
        serde_json::to_string(forecast)?
    ))
}
