//! Analysis endpoints.
//!
//! Each handler forwards to [`AnalysisService`](crate::services::AnalysisService).
//! Transport and render failures surface as [`ApiError`](crate::error::ApiError);
//! an undecodable model reply is still a 200 carrying `{error, raw_response}`.

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::api::Outcome;
use crate::app::AppState;
use crate::domain::analysis::{
    AnalysisRequest, CompetitionResearch, CompetitiveAnalysis, CompleteAnalysis, ContextRequest,
    MarketAnalysis, ProductBrief, PromptAnalysis, TechStack,
};
use crate::error::ApiResult;
use crate::middleware::request_id::X_REQUEST_ID;

/// Request ID set by the middleware, forwarded on the completion call.
fn get_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

// =============================================================================
// Idea intake
// =============================================================================

/// Structure the raw idea into industry, product, website, MVP and impact.
///
/// POST /prompt_to_json
pub async fn prompt_to_json(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> ApiResult<Json<Outcome<PromptAnalysis>>> {
    let outcome = state
        .analysis
        .prompt_to_json(&req, get_request_id(&headers).as_deref())
        .await?;
    log_outcome("prompt_to_json", &outcome);
    Ok(Json(outcome))
}

/// Project analysis, then a product brief built from it.
///
/// POST /complete_analysis
pub async fn complete_analysis(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> ApiResult<Json<Outcome<CompleteAnalysis>>> {
    let outcome = state
        .analysis
        .complete_analysis(&req, get_request_id(&headers).as_deref())
        .await?;
    log_outcome("complete_analysis", &outcome);
    Ok(Json(outcome))
}

/// Competitor search, then a gap analysis against the MVP.
///
/// POST /competition_research
pub async fn competition_research(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> ApiResult<Json<Outcome<CompetitionResearch>>> {
    let outcome = state
        .analysis
        .competition_research(&req, get_request_id(&headers).as_deref())
        .await?;
    log_outcome("competition_research", &outcome);
    Ok(Json(outcome))
}

// =============================================================================
// Follow-up documents
// =============================================================================

/// POST /generate_product_brief
pub async fn generate_product_brief(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> ApiResult<Json<Outcome<ProductBrief>>> {
    let outcome = state
        .analysis
        .product_brief(&req, get_request_id(&headers).as_deref())
        .await?;
    log_outcome("generate_product_brief", &outcome);
    Ok(Json(outcome))
}

/// Markdown implementation plan plus a Mermaid architecture diagram.
///
/// POST /generate_tech_stack
pub async fn generate_tech_stack(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> ApiResult<Json<Outcome<TechStack>>> {
    let outcome = state
        .analysis
        .tech_stack(&req, get_request_id(&headers).as_deref())
        .await?;
    log_outcome("generate_tech_stack", &outcome);
    Ok(Json(outcome))
}

/// POST /generate_market_analysis
pub async fn generate_market_analysis(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> ApiResult<Json<Outcome<MarketAnalysis>>> {
    let outcome = state
        .analysis
        .market_analysis(&req, get_request_id(&headers).as_deref())
        .await?;
    log_outcome("generate_market_analysis", &outcome);
    Ok(Json(outcome))
}

/// Structured competitor list with a comparison diagram.
///
/// POST /analyze_competition
pub async fn analyze_competition(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> ApiResult<Json<Outcome<CompetitiveAnalysis>>> {
    let outcome = state
        .analysis
        .competitive_analysis(&req, get_request_id(&headers).as_deref())
        .await?;
    log_outcome("analyze_competition", &outcome);
    Ok(Json(outcome))
}

fn log_outcome<T>(endpoint: &'static str, outcome: &Outcome<T>) {
    match outcome {
        Outcome::Ready(_) => tracing::info!(endpoint, "Analysis generated"),
        Outcome::Failed(err) => tracing::warn!(
            endpoint,
            error = %err.error,
            raw_len = err.raw_response.len(),
            "Returning undecodable model reply"
        ),
    }
}
