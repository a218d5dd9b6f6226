//! Contract Module
//!
//! Versioned data contracts: the governed description of what event
//! payloads are allowed to look like. This module provides:
//! - The contract model (schema plus governance metadata)
//! - The versioner (building the proposed next version from a delta)
//! - The contract store (versioned persistence behind a current pointer)

pub mod model;
pub mod store;
pub mod versioner;

pub use model::{Contract, ContractMetadata};
pub use store::{ContractStore, ContractSummary, VersionPointer};
pub use versioner::ContractVersioner;
