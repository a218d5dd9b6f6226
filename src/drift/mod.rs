//! Drift Detection Module
//!
//! The heart of the control plane - detecting what changed in the event stream.
//! This module provides:
//! - Schema diff engine (expected contract vs incoming payload)
//! - Change classification (the category that drives governance policy)
//! - Fingerprints (canonical hashes keying history and approval memory)

pub mod classify;
pub mod diff;
pub mod fingerprint;

pub use classify::{ChangeCategory, ChangeClassifier};
pub use diff::{DiffDepth, DiffEngine, FieldChange, SchemaDelta, TypeChange};
