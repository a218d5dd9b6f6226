//! Approval Module
//!
//! Human review of proposed contract versions, plus the learned memory that
//! lets repeated additive patterns skip the queue. This module provides:
//! - Approval records (pending decisions with an expiry window)
//! - The approval store (lifecycle guards around resolution)
//! - Approval memory (pattern decisions learned from past reviews)

pub mod memory;
pub mod store;

pub use memory::{ApprovalMemory, MemoryEntry, MemoryPatternStore, PatternDecision, PatternStore};
pub use store::{ApprovalRecord, ApprovalStatus, ApprovalStore};
