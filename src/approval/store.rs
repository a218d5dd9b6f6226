//! Approval store
//!
//! Pending human decisions over proposed contract versions. Records expire
//! after a configurable window; an expired approval is abandoned and
//! invisible to reads, so the queue never accumulates stale proposals.

use crate::contract::Contract;
use crate::drift::ChangeCategory;
use crate::error::{conflict_error, not_found_error, AppError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Lifecycle state of an approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending or resolved approval for a proposed contract version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    /// Stable id derived from the execution: `approval-{execution_id}`
    pub approval_id: String,
    pub execution_id: String,
    pub contract_version: u64,
    /// The full proposed contract, published verbatim on approval
    pub contract: Contract,
    pub delta_pattern: String,
    pub category: ChangeCategory,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ApprovalRecord {
    /// Create a pending approval for a proposed contract
    pub fn pending(
        execution_id: &str,
        contract: Contract,
        delta_pattern: String,
        category: ChangeCategory,
        ttl_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            approval_id: format!("approval-{execution_id}"),
            execution_id: execution_id.to_string(),
            contract_version: contract.version,
            contract,
            delta_pattern,
            category,
            status: ApprovalStatus::Pending,
            created_at: now,
            expires_at: now + Duration::days(ttl_days),
            decided_at: None,
            decided_by: None,
            comment: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Store for approval records
#[derive(Clone)]
pub struct ApprovalStore {
    records: Arc<RwLock<HashMap<String, ApprovalRecord>>>,
}

impl ApprovalStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create or refresh a pending approval
    ///
    /// Re-running an analysis refreshes its pending approval in place. A
    /// record that was already decided stays decided.
    pub async fn create(&self, record: ApprovalRecord) -> Result<ApprovalRecord, AppError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.approval_id) {
            if existing.status != ApprovalStatus::Pending && !existing.is_expired() {
                return Err(conflict_error(format!(
                    "Approval {} is already {}",
                    record.approval_id, existing.status
                )));
            }
        }
        records.insert(record.approval_id.clone(), record.clone());

        info!(
            "Created approval {} for contract v{} ({})",
            record.approval_id, record.contract_version, record.category
        );
        Ok(record)
    }

    /// Fetch a record; expired records are invisible
    pub async fn get(&self, approval_id: &str) -> Option<ApprovalRecord> {
        let records = self.records.read().await;
        records
            .get(approval_id)
            .filter(|r| !r.is_expired())
            .cloned()
    }

    /// List records, optionally filtered by status, newest first
    pub async fn list(&self, status: Option<ApprovalStatus>) -> Vec<ApprovalRecord> {
        let records = self.records.read().await;
        let mut list: Vec<ApprovalRecord> = records
            .values()
            .filter(|r| !r.is_expired())
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Resolve a pending approval to a final status
    pub async fn resolve(
        &self,
        approval_id: &str,
        decision: ApprovalStatus,
        decided_by: &str,
        comment: Option<String>,
    ) -> Result<ApprovalRecord, AppError> {
        if decision == ApprovalStatus::Pending {
            return Err(AppError::Internal(
                "Cannot resolve an approval back to PENDING".to_string(),
            ));
        }

        let mut records = self.records.write().await;
        let record = records
            .get_mut(approval_id)
            .ok_or_else(|| not_found_error(format!("Approval {} not found", approval_id)))?;

        if record.is_expired() {
            return Err(conflict_error(format!(
                "Approval {} expired at {} and was abandoned",
                approval_id, record.expires_at
            )));
        }
        if record.status != ApprovalStatus::Pending {
            return Err(conflict_error(format!(
                "Approval {} is already {}",
                approval_id, record.status
            )));
        }

        record.status = decision;
        record.decided_at = Some(Utc::now());
        record.decided_by = Some(decided_by.to_string());
        record.comment = comment;

        info!("Approval {} resolved as {} by {}", approval_id, decision, decided_by);
        Ok(record.clone())
    }
}

impl Default for ApprovalStore {
    fn default() -> Self {
        Self::new()
    }
}
