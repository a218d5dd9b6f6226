//! Analysis route handlers
//!
//! Entry point of the drift pipeline: one POST runs inference, diffing,
//! classification, memory lookup, and proposal for a single payload.

use crate::drift::ChangeCategory;
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{validate_execution_id, SuccessResponse};
use crate::pipeline::AnalysisOutcome;
use crate::state::SharedState;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request to analyze one payload
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[validate(length(min = 1, max = 256, message = "Execution id must be between 1 and 256 characters"))]
    #[validate(custom(function = "validate_execution_id"))]
    pub execution_id: String,

    /// Inline payload JSON; exclusive with `payloadKey`
    #[serde(default)]
    pub payload: Option<Value>,

    /// Blob store key the payload was staged under; exclusive with `payload`
    #[serde(default)]
    #[validate(length(min = 1, max = 1024, message = "payloadKey must be a non-empty object key"))]
    pub payload_key: Option<String>,

    /// Logical source of the payload, recorded in history
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

fn default_data_source() -> String {
    "raw_data".to_string()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Run the full analysis pipeline for one payload
pub async fn run_analysis(
    State(state): State<SharedState>,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<Json<SuccessResponse<AnalysisOutcome>>> {
    // Validate input
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let value = resolve_payload(&state, &payload).await?;
    let outcome = state
        .analyzer
        .analyze(&payload.execution_id, &value, &payload.data_source)
        .await?;

    let message = match outcome.category {
        ChangeCategory::NoChange => "No schema drift detected".to_string(),
        _ => format!(
            "{} drift detected, proposal parked on {}",
            outcome.category,
            outcome.approval_id.as_deref().unwrap_or("no approval")
        ),
    };

    Ok(Json(SuccessResponse::with_data(message, outcome)))
}

/// Resolve the payload from the request body or the blob store
async fn resolve_payload(state: &SharedState, req: &AnalyzeRequest) -> Result<Value, AppError> {
    match (&req.payload, &req.payload_key) {
        (Some(_), Some(_)) => Err(validation_error(
            "Provide either payload or payloadKey, not both",
        )),
        (None, None) => Err(validation_error("Provide either payload or payloadKey")),
        (Some(value), None) => Ok(value.clone()),
        (None, Some(key)) => {
            let bytes = state
                .blobs
                .get(key)
                .await?
                .ok_or_else(|| AppError::InvalidPayload {
                    location: key.clone(),
                    detail: "No object at this key".to_string(),
                })?;
            serde_json::from_slice(&bytes).map_err(|e| AppError::InvalidPayload {
                location: key.clone(),
                detail: e.to_string(),
            })
        }
    }
}
