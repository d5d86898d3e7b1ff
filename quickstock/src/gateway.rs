//! HTTP gateway
//!
//! Routes (all JSON):
//!   GET  /health, /api/v1/health
//!   POST /api/v1/Intelligence/query
//!   POST /api/v1/Intelligence/what-if
//!   POST /api/v1/Intelligence/recommendations
//!   POST /api/v1/forecast
//!   GET  /api/v1/forecast/:product_id/:pincode

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::IntelligenceConfig;
use crate::context::LiveContextSource;
use crate::error::{IntelligenceError, IntelligenceResult};
use crate::forecast::{generate_forecast, lookup_forecast, ForecastRequest, ForecastResult};
use crate::intelligence::{
    build_backend, ChartDescriptor, IntelligenceResponder, ProviderKind, Recommendations,
};

pub const QUERY_FAILED: &str = "Failed to process AI Intelligence query";
pub const WHAT_IF_FAILED: &str = "Failed to process what-if scenario";
pub const RECOMMENDATIONS_FAILED: &str = "Failed to generate recommendations";
pub const FORECAST_FAILED: &str = "Failed to generate forecast";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    /// Allow any origin (the dashboard is served from a different port in dev)
    pub permissive_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            permissive_cors: true,
        }
    }
}

struct GatewayState {
    responder: IntelligenceResponder,
}

/// `{ "error": "..." }` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Validation errors keep their message as a 400; everything else
    /// becomes a 500 carrying only `fallback`.
    fn from_intelligence(error: IntelligenceError, fallback: &str) -> Self {
        if error.is_validation() {
            tracing::warn!(error = %error, "Rejected request");
            return Self {
                status: StatusCode::BAD_REQUEST,
                message: error.to_string(),
            };
        }
        tracing::error!(error = %error, "{}", fallback);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: fallback.to_string(),
        }
    }

    fn bad_body(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "Rejected request body");
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(responder: IntelligenceResponder, config: &GatewayConfig) -> Router {
    let state = Arc::new(GatewayState { responder });

    let intelligence = Router::new()
        .route("/query", post(query_handler))
        .route("/what-if", post(what_if_handler))
        .route("/recommendations", post(recommendations_handler));

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/health", get(health_handler))
        .nest("/api/v1/Intelligence", intelligence)
        .route("/api/v1/forecast", post(forecast_handler))
        .route(
            "/api/v1/forecast/:product_id/:pincode",
            get(forecast_lookup_handler),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Serve `router` on an already bound listener until the future is dropped
pub async fn serve(listener: TcpListener, router: Router) -> IntelligenceResult<()> {
    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|e| IntelligenceError::Config(format!("Gateway server error: {}", e)))
}

/// Build the backend from `intelligence`, bind and serve
pub async fn start(
    config: GatewayConfig,
    intelligence: &IntelligenceConfig,
    source: Arc<dyn LiveContextSource>,
) -> IntelligenceResult<()> {
    let backend = build_backend(intelligence)?;
    let responder = IntelligenceResponder::new(source, backend);
    tracing::info!(
        provider = responder.provider().tag(),
        bind_addr = %config.bind_addr,
        "Starting QuickStock gateway"
    );

    let listener = TcpListener::bind(config.bind_addr.as_str())
        .await
        .map_err(|e| IntelligenceError::Config(format!("Gateway bind error: {}", e)))?;
    serve(listener, router(responder, &config)).await
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    provider: ProviderKind,
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "QuickStock AI Server is running",
        provider: state.responder.provider(),
    })
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    query: String,
    response: String,
    chart: ChartDescriptor,
    provider_used: ProviderKind,
    context_fetched: bool,
    timestamp: DateTime<Utc>,
}

async fn query_handler(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::bad_body)?;
    let answer = state
        .responder
        .answer_query(payload.query.as_deref())
        .await
        .map_err(|e| ApiError::from_intelligence(e, QUERY_FAILED))?;

    Ok(Json(QueryResponse {
        query: answer.query,
        response: answer.response_text,
        chart: answer.chart,
        provider_used: answer.provider_used,
        context_fetched: true,
        timestamp: answer.timestamp,
    }))
}

#[derive(Debug, Deserialize)]
struct WhatIfRequest {
    scenario: Option<Value>,
}

#[derive(Debug, Serialize)]
struct WhatIfResponse {
    scenario: Value,
    impact_analysis: String,
    provider_used: ProviderKind,
    suggestions: Vec<String>,
}

async fn what_if_handler(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<WhatIfRequest>, JsonRejection>,
) -> Result<Json<WhatIfResponse>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::bad_body)?;
    let analysis = state
        .responder
        .analyze_what_if(payload.scenario)
        .await
        .map_err(|e| ApiError::from_intelligence(e, WHAT_IF_FAILED))?;

    Ok(Json(WhatIfResponse {
        scenario: analysis.scenario,
        impact_analysis: analysis.impact_analysis,
        provider_used: analysis.provider_used,
        suggestions: Vec::new(),
    }))
}

#[derive(Debug, Deserialize)]
struct RecommendationsRequest {
    forecast: Option<Value>,
}

async fn recommendations_handler(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<RecommendationsRequest>, JsonRejection>,
) -> Result<Json<Recommendations>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::bad_body)?;
    let recommendations = state
        .responder
        .recommend(payload.forecast)
        .await
        .map_err(|e| ApiError::from_intelligence(e, RECOMMENDATIONS_FAILED))?;
    Ok(Json(recommendations))
}

async fn forecast_handler(
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastResult>, ApiError> {
    let Json(request) = payload.map_err(ApiError::bad_body)?;
    let result = {
        let mut rng = rand::thread_rng();
        generate_forecast(request, Utc::now(), &mut rng)
    };
    result
        .map(Json)
        .map_err(|e| ApiError::from_intelligence(e, FORECAST_FAILED))
}

async fn forecast_lookup_handler(
    Path((product_id, pincode)): Path<(String, String)>,
) -> Json<ForecastResult> {
    Json(lookup_forecast(&product_id, &pincode, Utc::now()))
}
