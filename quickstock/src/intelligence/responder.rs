//! Response assembly for the three intelligence entry points.
//!
//! Each call fetches a fresh [`LiveContext`](crate::context::LiveContext),
//! builds the grounding prompt, invokes the configured backend once and
//! packages the result. Any failure fails the whole request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chart::{select_chart, ChartDescriptor};
use super::prompt::{build_system_prompt, recommendations_message, what_if_message};
use super::provider::{invoke, AiBackend, AiResponse, ProviderKind};
use crate::context::{LiveContext, LiveContextSource};
use crate::error::{IntelligenceError, IntelligenceResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryAnswer {
    pub query: String,
    pub response_text: String,
    pub chart: ChartDescriptor,
    pub provider_used: ProviderKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhatIfAnalysis {
    pub scenario: Value,
    pub impact_analysis: String,
    pub provider_used: ProviderKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendations {
    pub recommendations: Vec<String>,
    pub provider_used: ProviderKind,
}

/// Lines of `text` whose trimmed length is at least three characters
pub fn split_recommendations(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.trim().chars().count() > 2)
        .map(|line| line.to_string())
        .collect()
}

fn require_payload(value: Option<Value>, field: &str) -> IntelligenceResult<Value> {
    match value {
        None | Some(Value::Null) => Err(IntelligenceError::Validation(format!(
            "`{}` is required",
            field
        ))),
        Some(value) => Ok(value),
    }
}

#[derive(Clone)]
pub struct IntelligenceResponder {
    source: Arc<dyn LiveContextSource>,
    backend: Arc<dyn AiBackend>,
}

impl IntelligenceResponder {
    pub fn new(source: Arc<dyn LiveContextSource>, backend: Arc<dyn AiBackend>) -> Self {
        Self { source, backend }
    }

    pub fn provider(&self) -> ProviderKind {
        self.backend.kind()
    }

    async fn ask(&self, user_message: &str) -> IntelligenceResult<(AiResponse, LiveContext)> {
        let context = self.source.fetch().await?;
        let system_prompt = build_system_prompt(&context)?;
        let response = invoke(self.backend.as_ref(), &system_prompt, user_message).await?;
        Ok((response, context))
    }

    /// Free-text question, answered with a chart picked from the query
    pub async fn answer_query(&self, query: Option<&str>) -> IntelligenceResult<QueryAnswer> {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| IntelligenceError::Validation("`query` is required".to_string()))?;

        let (response, context) = self.ask(query).await?;
        let chart = select_chart(query, &context);

        Ok(QueryAnswer {
            query: query.to_string(),
            response_text: response.text,
            chart,
            provider_used: response.provider,
            timestamp: Utc::now(),
        })
    }

    pub async fn analyze_what_if(&self, scenario: Option<Value>) -> IntelligenceResult<WhatIfAnalysis> {
        let scenario = require_payload(scenario, "scenario")?;
        let (response, _) = self.ask(&what_if_message(&scenario)?).await?;

        Ok(WhatIfAnalysis {
            scenario,
            impact_analysis: response.text,
            provider_used: response.provider,
        })
    }

    pub async fn recommend(&self, forecast: Option<Value>) -> IntelligenceResult<Recommendations> {
        let forecast = require_payload(forecast, "forecast")?;
        let (response, _) = self.ask(&recommendations_message(&forecast)?).await?;

        Ok(Recommendations {
            recommendations: split_recommendations(&response.text),
            provider_used: response.provider,
        })
    }
}
