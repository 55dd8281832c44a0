//! Query execution handler (`GET /query?q=...`).

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::ApiError;
use crate::server::ServerState;
use crate::storage::QueryResponse;

#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub q: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn handle_query(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    let command = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing query parameter q".into()))?;

    let results = state.store.exec(&command).await.map_err(ApiError::Query)?;
    Ok(Json(QueryResponse {
        results,
        error: None,
    }))
}
