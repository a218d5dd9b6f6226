//! Audit history route handlers

use crate::error::{validation_error, ApiResult};
use crate::history::AnalysisRecord;
use crate::models::SuccessResponse;
use crate::state::SharedState;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Restrict to one incoming schema content hash
    #[serde(default)]
    pub schema_hash: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub records: Vec<AnalysisRecord>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Recent analysis records, newest first
pub async fn list_history(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<SuccessResponse<HistoryResponse>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(validation_error(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let records = match &query.schema_hash {
        Some(hash) => state.history.query_by_schema(hash, limit).await?,
        None => state.history.recent(limit).await?,
    };

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} analysis records", records.len()),
        HistoryResponse { records },
    )))
}
