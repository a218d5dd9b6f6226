//! Application state management
//!
//! Wires the stores, the advisory model, and the analyzer once at startup;
//! handlers share the result behind an `Arc`.

use crate::advisory::{AdvisoryModel, HttpAdvisor, StubAdvisor};
use crate::approval::{ApprovalMemory, ApprovalStore, MemoryPatternStore, PatternStore};
use crate::config::{AdvisoryMode, Settings};
use crate::contract::ContractStore;
use crate::error::AppError;
use crate::history::{HistoryRecorder, HistoryStore, MemoryHistoryStore};
use crate::pipeline::DriftAnalyzer;
use crate::storage::{BlobStore, MemoryBlobStore};
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,

    /// Object store holding contracts, staged payloads, and patch proposals
    pub blobs: Arc<dyn BlobStore>,

    /// Published contract versions and the version pointer
    pub contracts: ContractStore,

    /// Pending and decided approval records
    pub approvals: ApprovalStore,

    /// Read side of the audit trail
    pub history: Arc<dyn HistoryStore>,

    /// Learned delta-pattern decisions; written only through the recorder
    pub patterns: Arc<dyn PatternStore>,

    /// Write side of the audit trail and the approval memory
    pub recorder: HistoryRecorder,

    /// Risk and patch advisor (stub or HTTP, per configuration)
    pub advisory: Arc<dyn AdvisoryModel>,

    /// The drift analysis pipeline
    pub analyzer: DriftAnalyzer,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        Self::with_blobs(settings, Arc::new(MemoryBlobStore::new()))
    }

    /// Wire the state over a caller-supplied blob store
    pub fn with_blobs(settings: Settings, blobs: Arc<dyn BlobStore>) -> Result<Self, AppError> {
        let contracts = ContractStore::new(blobs.clone(), settings.store.contracts_prefix.clone());
        let approvals = ApprovalStore::new();
        let patterns: Arc<dyn PatternStore> = Arc::new(MemoryPatternStore::new());
        let history: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
        let recorder = HistoryRecorder::new(
            history.clone(),
            patterns.clone(),
            settings.pipeline.history_ttl_days,
        );

        let advisory: Arc<dyn AdvisoryModel> = match settings.advisory.mode {
            AdvisoryMode::Stub => Arc::new(StubAdvisor::new()),
            AdvisoryMode::Http => Arc::new(
                HttpAdvisor::new(&settings.advisory)
                    .map_err(|e| AppError::Config(e.to_string()))?,
            ),
        };

        let analyzer = DriftAnalyzer::new(
            &settings.pipeline,
            contracts.clone(),
            approvals.clone(),
            ApprovalMemory::new(patterns.clone()),
            recorder.clone(),
            advisory.clone(),
        );

        Ok(Self {
            settings,
            blobs,
            contracts,
            approvals,
            history,
            patterns,
            recorder,
            advisory,
            analyzer,
        })
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
