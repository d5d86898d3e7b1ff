//! Intelligence Responder
//!
//! Query routing and response shaping for the AI assistant:
//!
//! context source -> [`prompt`] -> [`provider::select_provider`] ->
//! [`provider::AiBackend`] -> [`chart::select_chart`] -> [`responder`]

pub mod chart;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod responder;
pub mod sigv4;

pub use chart::{select_chart, BarSeries, ChartDescriptor};
pub use provider::{build_backend, invoke, select_provider, AiBackend, AiResponse, ProviderKind};
pub use responder::{
    split_recommendations, IntelligenceResponder, QueryAnswer, Recommendations, WhatIfAnalysis,
};
