//! Transform patch route handlers
//!
//! Advisory-only remediation: proposes a minimal patch to the bulk-transform
//! script for an observed delta and files it in the blob store for review.
//! Nothing here touches the script itself.

use crate::advisory::PatchProposal;
use crate::drift::{ChangeClassifier, SchemaDelta};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{validate_execution_id, SuccessResponse};
use crate::state::SharedState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request to propose a transform patch for a delta
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    #[validate(length(min = 1, max = 256, message = "Execution id must be between 1 and 256 characters"))]
    #[validate(custom(function = "validate_execution_id"))]
    pub execution_id: String,

    /// Delta the patch should address, as produced by an analysis
    pub delta: SchemaDelta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponse {
    pub proposal: PatchProposal,
    /// Blob store key the proposal was filed under
    pub patch_key: String,
    pub requires_review: bool,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Propose a transform job patch for an observed delta
pub async fn propose_patch(
    State(state): State<SharedState>,
    Json(payload): Json<PatchRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<PatchResponse>>)> {
    // Validate input
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let category = ChangeClassifier::classify(&payload.delta);

    // The transform job script is optional context for the advisor
    let script = match state
        .blobs
        .get(&state.settings.store.transform_script_key)
        .await?
    {
        Some(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        None => String::new(),
    };

    let proposal = state
        .advisory
        .suggest_patch(&script, &payload.delta, category)
        .await;

    let patch_key = format!(
        "{}patch-{}.json",
        state.settings.store.patch_prefix, payload.execution_id
    );
    let body = serde_json::to_vec_pretty(&proposal)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state.blobs.put(&patch_key, body).await?;

    info!("🩹 Filed patch proposal {} ({:?})", patch_key, proposal.patch_type);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Patch proposal filed for review",
            PatchResponse {
                proposal,
                patch_key,
                requires_review: true,
            },
        )),
    ))
}
