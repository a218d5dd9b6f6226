//! Contract store
//!
//! Versioned contract persistence over the blob store. Each version is an
//! immutable object (`contract_v{N}.json`); the current version is named by
//! a pointer object, with a prefix scan as the fallback for stores written
//! before the pointer existed.

use super::model::Contract;
use crate::error::{conflict_error, not_found_error, AppError};
use crate::storage::BlobStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Pointer object naming the current contract version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionPointer {
    pub version: u64,
    pub key: String,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight listing entry for a stored contract version
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSummary {
    pub version: u64,
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Store for versioned contracts
#[derive(Clone)]
pub struct ContractStore {
    blobs: Arc<dyn BlobStore>,
    prefix: String,
}

impl ContractStore {
    pub fn new(blobs: Arc<dyn BlobStore>, prefix: impl Into<String>) -> Self {
        Self {
            blobs,
            prefix: prefix.into(),
        }
    }

    fn contract_key(&self, version: u64) -> String {
        format!("{}contract_v{}.json", self.prefix, version)
    }

    fn pointer_key(&self) -> String {
        format!("{}contract_latest.json", self.prefix)
    }

    fn scan_prefix(&self) -> String {
        format!("{}contract_v", self.prefix)
    }

    fn parse_version(&self, key: &str) -> Option<u64> {
        key.strip_prefix(&self.prefix)?
            .strip_prefix("contract_v")?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }

    /// The current contract
    ///
    /// Resolution order: pointer object, then prefix scan, then the implicit
    /// baseline. An unreachable store also degrades to the baseline so that
    /// analysis keeps working; a stored contract that fails to parse is an
    /// error, because silently treating it as absent would mis-classify
    /// every field as new.
    pub async fn current(&self) -> Result<Contract, AppError> {
        let pointer_key = self.pointer_key();
        let pointer_bytes = match self.blobs.get(&pointer_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Contract store unreachable, degrading to baseline: {}", e);
                return Ok(Contract::baseline());
            }
        };

        if let Some(bytes) = pointer_bytes {
            match serde_json::from_slice::<VersionPointer>(&bytes) {
                Ok(pointer) => match self.blobs.get(&pointer.key).await {
                    Ok(Some(contract_bytes)) => {
                        return parse_contract(&pointer.key, &contract_bytes);
                    }
                    Ok(None) => {
                        warn!(
                            "Version pointer names missing object {}, falling back to scan",
                            pointer.key
                        );
                    }
                    Err(e) => {
                        warn!("Contract store unreachable, degrading to baseline: {}", e);
                        return Ok(Contract::baseline());
                    }
                },
                Err(e) => {
                    warn!("Corrupt version pointer {}: {}, falling back to scan", pointer_key, e);
                }
            }
        }

        self.latest_by_scan().await
    }

    async fn latest_by_scan(&self) -> Result<Contract, AppError> {
        let metas = match self.blobs.list(&self.scan_prefix()).await {
            Ok(metas) => metas,
            Err(e) => {
                warn!("Contract listing failed, degrading to baseline: {}", e);
                return Ok(Contract::baseline());
            }
        };

        let latest = metas
            .iter()
            .filter_map(|m| self.parse_version(&m.key).map(|v| (v, m.key.clone())))
            .max_by_key(|(version, _)| *version);

        let Some((_, key)) = latest else {
            return Ok(Contract::baseline());
        };

        match self.blobs.get(&key).await {
            Ok(Some(bytes)) => parse_contract(&key, &bytes),
            Ok(None) => {
                warn!("Listed contract {} vanished, degrading to baseline", key);
                Ok(Contract::baseline())
            }
            Err(e) => {
                warn!("Contract store unreachable, degrading to baseline: {}", e);
                Ok(Contract::baseline())
            }
        }
    }

    /// Highest published version, with storage errors surfaced
    async fn latest_version_strict(&self) -> Result<u64, AppError> {
        if let Some(bytes) = self.blobs.get(&self.pointer_key()).await? {
            if let Ok(pointer) = serde_json::from_slice::<VersionPointer>(&bytes) {
                return Ok(pointer.version);
            }
        }
        let metas = self.blobs.list(&self.scan_prefix()).await?;
        Ok(metas
            .iter()
            .filter_map(|m| self.parse_version(&m.key))
            .max()
            .unwrap_or(0))
    }

    /// Publish a contract as the new current version
    ///
    /// The version chain is linear: a contract can only be published over
    /// its own predecessor. Approving a stale proposal after another version
    /// went live is a conflict.
    pub async fn publish(&self, contract: &Contract) -> Result<(), AppError> {
        let latest = self.latest_version_strict().await?;
        if contract.version != latest + 1 {
            return Err(conflict_error(format!(
                "Contract v{} cannot be published over current v{}",
                contract.version, latest
            )));
        }

        let key = self.contract_key(contract.version);
        let bytes = serde_json::to_vec_pretty(contract)
            .map_err(|e| AppError::Internal(format!("Failed to serialize contract: {e}")))?;
        self.blobs.put(&key, bytes).await?;

        let pointer = VersionPointer {
            version: contract.version,
            key: key.clone(),
            updated_at: Utc::now(),
        };
        let pointer_bytes = serde_json::to_vec_pretty(&pointer)
            .map_err(|e| AppError::Internal(format!("Failed to serialize pointer: {e}")))?;
        self.blobs.put(&self.pointer_key(), pointer_bytes).await?;

        info!("📦 Published contract v{} at {}", contract.version, key);
        Ok(())
    }

    /// A specific stored version; version 0 resolves to the baseline
    pub async fn get_version(&self, version: u64) -> Result<Contract, AppError> {
        if version == 0 {
            return Ok(Contract::baseline());
        }
        let key = self.contract_key(version);
        match self.blobs.get(&key).await? {
            Some(bytes) => parse_contract(&key, &bytes),
            None => Err(not_found_error(format!("Contract v{} not found", version))),
        }
    }

    /// List stored versions, newest first
    pub async fn list_versions(&self) -> Result<Vec<ContractSummary>, AppError> {
        let metas = self.blobs.list(&self.scan_prefix()).await?;
        let mut summaries: Vec<ContractSummary> = metas
            .into_iter()
            .filter_map(|m| {
                self.parse_version(&m.key).map(|version| ContractSummary {
                    version,
                    key: m.key,
                    last_modified: m.last_modified,
                })
            })
            .collect();
        summaries.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(summaries)
    }
}

fn parse_contract(key: &str, bytes: &[u8]) -> Result<Contract, AppError> {
    serde_json::from_slice(bytes).map_err(|e| AppError::CorruptContract {
        key: key.to_string(),
        detail: e.to_string(),
    })
}
