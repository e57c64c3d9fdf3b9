//! Supplement handler.

use axum::{
    extract::{RawQuery, State},
    Json,
};
use std::sync::Arc;

use crate::service::{SupplementRequest, SupplementResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/rss-supplement - Ranked items from the publisher feeds.
pub async fn rss_supplement(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<SupplementResponse>, ApiError> {
    let request = SupplementRequest::from_query(raw.as_deref());
    tracing::debug!(
        query = %request.query,
        feeds = request.feeds.len(),
        limit = request.limit,
        days_window = ?request.days_window,
        debug = request.debug,
        "Supplement request"
    );

    let response = state.service.run(&request).await?;
    Ok(Json(response))
}
