//! HTTP handlers and routers for the gateway.

pub mod retrieve;

use axum::routing::get;
use axum::Router;

use crate::state::State;

/// Router for the public retrieval surface.
pub fn router(state: State) -> Router {
    Router::new()
        .route("/file", get(retrieve::handler))
        .with_state(state)
}
