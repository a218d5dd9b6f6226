//! Drift analyzer
//!
//! Runs one payload through the whole pipeline. Analysis never publishes a
//! contract: the proposal is parked on a PENDING approval and `auto_approve`
//! is advice to the caller, who owns the gate.

use crate::advisory::{AdvisoryModel, RiskAssessment};
use crate::approval::{ApprovalMemory, ApprovalRecord, ApprovalStore};
use crate::config::PipelineConfig;
use crate::contract::{Contract, ContractStore, ContractVersioner};
use crate::drift::fingerprint::{delta_pattern, schema_content};
use crate::drift::{ChangeCategory, ChangeClassifier, DiffEngine, SchemaDelta};
use crate::error::AppError;
use crate::history::{AnalysisRecord, HistoryRecorder};
use crate::inference::{SchemaInferencer, SchemaNode};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// PIPELINE OUTPUT
// =============================================================================

/// Result of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub execution_id: String,
    pub category: ChangeCategory,
    pub delta: SchemaDelta,
    pub incoming_schema: SchemaNode,
    /// Version the payload was compared against
    pub current_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_contract: Option<Contract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<String>,
    /// Whether an identical delta pattern was previously human-approved
    pub auto_approve: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
    /// Required contract fields the concrete payload lacks; informational
    #[serde(default)]
    pub missing_required: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

// =============================================================================
// DRIFT ANALYZER
// =============================================================================

/// Orchestrates inference, diffing, classification, memory, and proposal
pub struct DriftAnalyzer {
    inferencer: SchemaInferencer,
    diff: DiffEngine,
    contracts: ContractStore,
    approvals: ApprovalStore,
    memory: ApprovalMemory,
    recorder: HistoryRecorder,
    advisory: Arc<dyn AdvisoryModel>,
    approval_ttl_days: i64,
    history_ttl_days: i64,
}

impl DriftAnalyzer {
    pub fn new(
        config: &PipelineConfig,
        contracts: ContractStore,
        approvals: ApprovalStore,
        memory: ApprovalMemory,
        recorder: HistoryRecorder,
        advisory: Arc<dyn AdvisoryModel>,
    ) -> Self {
        Self {
            inferencer: SchemaInferencer::new(config.array_sampling),
            diff: DiffEngine::new(config.diff_depth),
            contracts,
            approvals,
            memory,
            recorder,
            advisory,
            approval_ttl_days: config.approval_ttl_days,
            history_ttl_days: config.history_ttl_days,
        }
    }

    /// Run the full pipeline for one payload
    pub async fn analyze(
        &self,
        execution_id: &str,
        payload: &Value,
        data_source: &str,
    ) -> Result<AnalysisOutcome, AppError> {
        info!("🔍 Analyzing execution {} from {}", execution_id, data_source);
        let analyzed_at = Utc::now();

        // 1. Infer the shape of the incoming payload
        let incoming_schema = self.inferencer.infer(payload);
        let schema_hash = schema_content(&incoming_schema);

        // 2. Resolve the currently published contract
        let current = self.contracts.current().await?;

        // 3. Diff and classify
        let delta = self.diff.diff(&current.schema, &incoming_schema);
        let category = ChangeClassifier::classify(&delta);

        // 4. Payload findings; informational, never feeds classification
        let missing_required = current.missing_required_fields(payload);

        // 5. Advisory annotation, drift only
        let risk = if category == ChangeCategory::NoChange {
            None
        } else {
            Some(self.advisory.assess_risk(&delta, category).await)
        };

        // 6. Consult the approval memory
        let pattern_hash = delta_pattern(&delta);
        let auto_approve = self.memory.should_auto_approve(category, &pattern_hash).await;

        // 7. Record the audit trail; best-effort
        self.recorder
            .record(AnalysisRecord {
                schema_hash,
                timestamp_ms: analyzed_at.timestamp_millis(),
                execution_id: execution_id.to_string(),
                data_source: data_source.to_string(),
                incoming_schema: incoming_schema.clone(),
                expected_schema: current.schema.clone(),
                expected_version: current.version,
                delta: delta.clone(),
                category,
                risk: risk.clone(),
                missing_required: missing_required.clone(),
                expires_at: analyzed_at + Duration::days(self.history_ttl_days),
            })
            .await;

        // 8. Propose the successor contract and park it on a pending approval
        let (proposed_contract, approval_id) = if category == ChangeCategory::NoChange {
            (None, None)
        } else {
            let proposal = ContractVersioner::propose(&current, &incoming_schema, &delta);
            let record = ApprovalRecord::pending(
                execution_id,
                proposal.clone(),
                pattern_hash.clone(),
                category,
                self.approval_ttl_days,
            );
            let approval_id = record.approval_id.clone();
            match self.approvals.create(record).await {
                Ok(_) => {}
                // A replayed execution whose approval was already decided
                // still yields a full outcome; the decided record stands
                Err(AppError::Conflict(_)) => {
                    debug!(
                        "Approval {} already decided, leaving it untouched",
                        approval_id
                    );
                }
                Err(e) => return Err(e),
            }
            (Some(proposal), Some(approval_id))
        };

        info!(
            "🔍 Analysis complete for {}: category={}, auto_approve={}, v{} -> {}",
            execution_id,
            category,
            auto_approve,
            current.version,
            proposed_contract
                .as_ref()
                .map(|c| format!("v{}", c.version))
                .unwrap_or_else(|| "unchanged".to_string())
        );

        Ok(AnalysisOutcome {
            execution_id: execution_id.to_string(),
            category,
            delta,
            incoming_schema,
            current_version: current.version,
            proposed_contract,
            approval_id,
            auto_approve,
            risk,
            missing_required,
            analyzed_at,
        })
    }
}
