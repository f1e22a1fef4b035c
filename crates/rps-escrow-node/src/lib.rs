//! RPS Escrow dev node
//!
//! Hosts one contract over an in-memory token ledger behind a JSON HTTP API.

pub mod config;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use handlers::*;
pub use config::{ConfigError, NodeConfig};
pub use state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // System
        .route("/health", get(health))
        .route("/contract", get(get_contract))
        .route("/events", get(get_events))
        // Token
        .route("/token/mint", post(mint))
        .route("/token/approve", post(approve))
        .route("/token/balance/:address", get(get_balance))
        // Rounds
        .route("/rounds", post(create_round))
        .route("/rounds/:round_id", get(get_round))
        .route("/rounds/:round_id/join", post(join_round))
        .route("/rounds/:round_id/commit", post(commit_move))
        .route("/rounds/:round_id/reveal", post(reveal_move))
        .route("/rounds/:round_id/archive", post(archive_round))
        .layer(cors)
        .with_state(state)
}
