//! Contract registry route handlers
//!
//! Read-only views over published contract versions. Publishing happens only
//! through the approval workflow.

use crate::contract::{Contract, ContractSummary};
use crate::error::ApiResult;
use crate::models::SuccessResponse;
use crate::state::SharedState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractResponse {
    pub contract: Contract,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractListResponse {
    pub versions: Vec<ContractSummary>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Resolve the currently published contract
pub async fn current_contract(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<ContractResponse>>> {
    let contract = state.contracts.current().await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Current contract is v{}", contract.version),
        ContractResponse { contract },
    )))
}

/// Fetch one published contract version
pub async fn get_contract(
    State(state): State<SharedState>,
    Path(version): Path<u64>,
) -> ApiResult<Json<SuccessResponse<ContractResponse>>> {
    let contract = state.contracts.get_version(version).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found contract v{}", contract.version),
        ContractResponse { contract },
    )))
}

/// List all published contract versions
pub async fn list_contracts(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<ContractListResponse>>> {
    let versions = state.contracts.list_versions().await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} contract versions", versions.len()),
        ContractListResponse { versions },
    )))
}
