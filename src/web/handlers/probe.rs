//! Connectivity probe handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::probe::{run_probe, ProbeReport};
use crate::web::handlers::AppState;

/// GET /api/fetch-test - Reachability of every candidate feed URL.
pub async fn fetch_test(State(state): State<Arc<AppState>>) -> Json<ProbeReport> {
    Json(run_probe(state.service.resolver()).await)
}
