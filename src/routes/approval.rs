//! Approval workflow route handlers
//!
//! The human gate. Approving publishes the parked contract and, when a
//! reviewer decided, teaches the approval memory; rejecting only teaches the
//! memory, so structurally identical deltas keep requiring a reviewer. The
//! workflow acting on a learned pattern marks its call `autoApproved`, which
//! publishes without re-teaching the memory.

use crate::approval::{ApprovalRecord, ApprovalStatus, PatternDecision};
use crate::error::{conflict_error, ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::state::SharedState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Body of an approve/reject call
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    #[serde(default)]
    pub decided_by: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Set by the workflow when it acts on a learned `autoApprove` verdict.
    /// Pattern memory records human decisions only, so an auto-approved
    /// publish does not refresh the remembered pattern.
    #[serde(default)]
    pub auto_approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalListQuery {
    pub status: Option<ApprovalStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub approval: ApprovalRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalListResponse {
    pub approvals: Vec<ApprovalRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub approval: ApprovalRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_version: Option<u64>,
}

// =============================================================================
// HANDLERS
// =============================================================================

/// List approval records, optionally filtered by status
pub async fn list_approvals(
    State(state): State<SharedState>,
    Query(query): Query<ApprovalListQuery>,
) -> ApiResult<Json<SuccessResponse<ApprovalListResponse>>> {
    let approvals = state.approvals.list(query.status).await;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} approvals", approvals.len()),
        ApprovalListResponse { approvals },
    )))
}

/// Fetch one approval record
pub async fn get_approval(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse<ApprovalResponse>>> {
    let approval = state
        .approvals
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Approval {} not found", id)))?;

    Ok(Json(SuccessResponse::with_data(
        format!("Found approval {}", approval.approval_id),
        ApprovalResponse { approval },
    )))
}

/// Approve a pending proposal: publish the contract, then teach the memory
/// unless the workflow auto-approved
pub async fn approve_proposal(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Option<Json<DecisionRequest>>,
) -> ApiResult<Json<SuccessResponse<DecisionResponse>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let record = state
        .approvals
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Approval {} not found", id)))?;
    if record.status != ApprovalStatus::Pending {
        return Err(conflict_error(format!(
            "Approval {} is already {}",
            id, record.status
        )));
    }

    // Publish before resolving so a version conflict leaves the record pending
    state.contracts.publish(&record.contract).await?;

    let decided_by = payload.decided_by.unwrap_or_else(|| {
        if payload.auto_approved {
            "workflow".to_string()
        } else {
            "anonymous-reviewer".to_string()
        }
    });
    let approval = state
        .approvals
        .resolve(&id, ApprovalStatus::Approved, &decided_by, payload.comment)
        .await?;

    // Only a human decision may teach the pattern memory; replaying a
    // learned approval must not extend its retention window
    if !payload.auto_approved {
        state
            .recorder
            .record_decision(
                &approval.delta_pattern,
                PatternDecision::Approved,
                &approval.execution_id,
            )
            .await;
    }

    Ok(Json(SuccessResponse::with_data(
        format!("Contract v{} published", approval.contract_version),
        DecisionResponse {
            published_version: Some(approval.contract_version),
            approval,
        },
    )))
}

/// Reject a pending proposal; nothing is published
pub async fn reject_proposal(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Option<Json<DecisionRequest>>,
) -> ApiResult<Json<SuccessResponse<DecisionResponse>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let decided_by = payload
        .decided_by
        .unwrap_or_else(|| "anonymous-reviewer".to_string());
    let approval = state
        .approvals
        .resolve(&id, ApprovalStatus::Rejected, &decided_by, payload.comment)
        .await?;

    state
        .recorder
        .record_decision(
            &approval.delta_pattern,
            PatternDecision::Rejected,
            &approval.execution_id,
        )
        .await;

    Ok(Json(SuccessResponse::with_data(
        format!(
            "Proposal for contract v{} rejected",
            approval.contract_version
        ),
        DecisionResponse {
            published_version: None,
            approval,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::PatternStore;
    use crate::config::Settings;
    use crate::contract::Contract;
    use crate::drift::ChangeCategory;
    use crate::state::{AppState, SharedState};
    use std::sync::Arc;

    async fn state_with_pending(execution_id: &str, pattern: &str) -> SharedState {
        let state = Arc::new(AppState::new(Settings::default()).unwrap());
        let contract = Contract {
            version: 1,
            ..Contract::baseline()
        };
        state
            .approvals
            .create(ApprovalRecord::pending(
                execution_id,
                contract,
                pattern.to_string(),
                ChangeCategory::Additive,
                30,
            ))
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_human_approval_publishes_and_teaches_memory() {
        let state = state_with_pending("exec-h", "pattern-h").await;

        approve_proposal(
            State(state.clone()),
            Path("approval-exec-h".to_string()),
            Some(Json(DecisionRequest {
                decided_by: Some("dana".to_string()),
                ..Default::default()
            })),
        )
        .await
        .unwrap();

        assert_eq!(state.contracts.current().await.unwrap().version, 1);
        let entry = state.patterns.latest_decision("pattern-h").await.unwrap();
        assert_eq!(entry.map(|e| e.decision), Some(PatternDecision::Approved));
    }

    #[tokio::test]
    async fn test_workflow_auto_approval_skips_pattern_memory() {
        let state = state_with_pending("exec-w", "pattern-w").await;

        approve_proposal(
            State(state.clone()),
            Path("approval-exec-w".to_string()),
            Some(Json(DecisionRequest {
                auto_approved: true,
                ..Default::default()
            })),
        )
        .await
        .unwrap();

        // Contract published and record resolved, but the memory is untouched
        assert_eq!(state.contracts.current().await.unwrap().version, 1);
        let record = state.approvals.get("approval-exec-w").await.unwrap();
        assert_eq!(record.status, ApprovalStatus::Approved);
        assert_eq!(record.decided_by.as_deref(), Some("workflow"));
        assert!(state
            .patterns
            .latest_decision("pattern-w")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rejection_teaches_memory() {
        let state = state_with_pending("exec-r", "pattern-r").await;

        reject_proposal(
            State(state.clone()),
            Path("approval-exec-r".to_string()),
            Some(Json(DecisionRequest {
                decided_by: Some("dana".to_string()),
                ..Default::default()
            })),
        )
        .await
        .unwrap();

        // Nothing published; the rejection is remembered
        assert_eq!(state.contracts.current().await.unwrap().version, 0);
        let entry = state.patterns.latest_decision("pattern-r").await.unwrap();
        assert_eq!(entry.map(|e| e.decision), Some(PatternDecision::Rejected));
    }
}
