use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all RXL endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/transactions",
            get(handler::list_transactions).post(handler::add_transaction),
        )
        .route("/v1/transactions/:index", get(handler::get_transaction))
        .route("/v1/verify", get(handler::verify_transactions))
        .route("/v1/drugs", get(handler::list_drugs))
        .route("/v1/drugs/:drug_id/history", get(handler::drug_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
