pub mod analysis;
pub mod health;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Idea intake
        .route("/prompt_to_json", post(analysis::prompt_to_json))
        .route("/complete_analysis", post(analysis::complete_analysis))
        .route("/competition_research", post(analysis::competition_research))
        // Follow-up documents built from earlier results
        .route(
            "/generate_product_brief",
            post(analysis::generate_product_brief),
        )
        .route("/generate_tech_stack", post(analysis::generate_tech_stack))
        .route(
            "/generate_market_analysis",
            post(analysis::generate_market_analysis),
        )
        .route("/analyze_competition", post(analysis::analyze_competition))
}
