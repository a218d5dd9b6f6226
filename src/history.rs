//! Analysis history
//!
//! Append-only audit trail of every analysis the control plane has run,
//! keyed by incoming schema hash. Recording is best-effort: a history outage
//! degrades the audit trail, never the analysis itself.

use crate::advisory::RiskAssessment;
use crate::approval::{MemoryEntry, PatternDecision, PatternStore};
use crate::drift::{ChangeCategory, SchemaDelta};
use crate::inference::SchemaNode;
use crate::storage::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// One analyzed execution
///
/// Keyed by `(schema_hash, timestamp_ms)`, so re-recording the same analysis
/// is an idempotent upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Content hash of the incoming schema
    pub schema_hash: String,
    pub timestamp_ms: i64,
    pub execution_id: String,
    pub data_source: String,
    pub incoming_schema: SchemaNode,
    pub expected_schema: SchemaNode,
    pub expected_version: u64,
    pub delta: SchemaDelta,
    pub category: ChangeCategory,
    /// Advisory annotation; absent when no drift was detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
    #[serde(default)]
    pub missing_required: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Typed store for analysis records
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn put(&self, record: AnalysisRecord) -> Result<(), StorageError>;

    /// Records for one schema hash, newest first
    async fn query_by_schema(
        &self,
        schema_hash: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StorageError>;

    /// Most recent records across all schemas, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError>;
}

/// Process-local history store
#[derive(Clone)]
pub struct MemoryHistoryStore {
    // Schema hash -> (timestamp -> record)
    records: Arc<RwLock<HashMap<String, BTreeMap<i64, AnalysisRecord>>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn put(&self, record: AnalysisRecord) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        records
            .entry(record.schema_hash.clone())
            .or_default()
            .insert(record.timestamp_ms, record);
        Ok(())
    }

    async fn query_by_schema(
        &self,
        schema_hash: &str,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .get(schema_hash)
            .map(|partition| {
                partition
                    .values()
                    .rev()
                    .filter(|r| !r.is_expired())
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError> {
        let records = self.records.read().await;
        let mut all: Vec<AnalysisRecord> = records
            .values()
            .flat_map(|partition| partition.values())
            .filter(|r| !r.is_expired())
            .cloned()
            .collect();
        all.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        all.truncate(limit);
        Ok(all)
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort writer for the audit trail and the approval memory
#[derive(Clone)]
pub struct HistoryRecorder {
    history: Arc<dyn HistoryStore>,
    patterns: Arc<dyn PatternStore>,
    memory_ttl_days: i64,
}

impl HistoryRecorder {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        patterns: Arc<dyn PatternStore>,
        memory_ttl_days: i64,
    ) -> Self {
        Self {
            history,
            patterns,
            memory_ttl_days,
        }
    }

    /// Record an analysis; failures are logged and swallowed
    pub async fn record(&self, record: AnalysisRecord) {
        let execution_id = record.execution_id.clone();
        if let Err(e) = self.history.put(record).await {
            warn!("History write failed for {}: {}", execution_id, e);
        }
    }

    /// Remember a human decision for a delta pattern; failures are logged
    /// and swallowed
    pub async fn record_decision(
        &self,
        pattern_hash: &str,
        decision: PatternDecision,
        execution_id: &str,
    ) {
        let entry = MemoryEntry::new(pattern_hash, decision, execution_id, self.memory_ttl_days);
        if let Err(e) = self.patterns.put(entry).await {
            warn!("Pattern memory write failed for {}: {}", execution_id, e);
        }
    }
}
