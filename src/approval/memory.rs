//! Approval memory
//!
//! Learned auto-approval: once a reviewer approves a delta pattern, the same
//! pattern on a later execution can skip the review queue. Only additive
//! deltas are ever eligible, and every failure path answers "no".

use crate::drift::ChangeCategory;
use crate::storage::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Reviewer decision remembered for a delta pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternDecision {
    Approved,
    Rejected,
}

/// One remembered human decision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub pattern_hash: String,
    pub decision: PatternDecision,
    /// Execution whose review produced this decision
    pub execution_id: String,
    pub decided_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(
        pattern_hash: &str,
        decision: PatternDecision,
        execution_id: &str,
        ttl_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            pattern_hash: pattern_hash.to_string(),
            decision,
            execution_id: execution_id.to_string(),
            decided_at: now,
            expires_at: now + Duration::days(ttl_days),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Typed store for remembered pattern decisions
#[async_trait]
pub trait PatternStore: Send + Sync {
    async fn put(&self, entry: MemoryEntry) -> Result<(), StorageError>;

    /// Most recent non-expired decision for a pattern
    async fn latest_decision(&self, pattern_hash: &str)
        -> Result<Option<MemoryEntry>, StorageError>;
}

/// Process-local pattern store
#[derive(Clone)]
pub struct MemoryPatternStore {
    entries: Arc<RwLock<HashMap<String, Vec<MemoryEntry>>>>,
}

impl MemoryPatternStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl PatternStore for MemoryPatternStore {
    async fn put(&self, entry: MemoryEntry) -> Result<(), StorageError> {
        let mut entries = self.entries.write().await;
        entries
            .entry(entry.pattern_hash.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn latest_decision(
        &self,
        pattern_hash: &str,
    ) -> Result<Option<MemoryEntry>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(pattern_hash)
            .and_then(|decisions| {
                decisions
                    .iter()
                    .filter(|e| !e.is_expired())
                    .max_by_key(|e| e.decided_at)
            })
            .cloned())
    }
}

impl Default for MemoryPatternStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Consults the pattern store to decide whether review can be skipped
#[derive(Clone)]
pub struct ApprovalMemory {
    patterns: Arc<dyn PatternStore>,
}

impl ApprovalMemory {
    pub fn new(patterns: Arc<dyn PatternStore>) -> Self {
        Self { patterns }
    }

    /// Whether a delta may skip human review
    ///
    /// Fail closed: only an additive delta whose pattern carries a
    /// remembered APPROVED decision qualifies, and a lookup failure means
    /// "no" rather than an error.
    pub async fn should_auto_approve(&self, category: ChangeCategory, pattern_hash: &str) -> bool {
        if category != ChangeCategory::Additive {
            return false;
        }

        match self.patterns.latest_decision(pattern_hash).await {
            Ok(Some(entry)) if entry.decision == PatternDecision::Approved => {
                debug!(
                    "Pattern {} carries approval learned from {}",
                    pattern_hash, entry.execution_id
                );
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!("Pattern lookup failed, not auto-approving: {}", e);
                false
            }
        }
    }
}
