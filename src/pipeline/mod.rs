//! Drift Analysis Pipeline
//!
//! Runs one payload through the five governance stages:
//!
//! 1. **Inference**: Build a recursive schema tree from the raw payload
//! 2. **Diff**: Compare it against the currently published contract
//! 3. **Classification**: `NO_CHANGE` / `ADDITIVE` / `BREAKING` / `UNKNOWN`
//! 4. **Memory**: Consult past human decisions for safe auto-approval
//! 5. **Proposal**: Derive the next contract version and open an approval

pub mod analyzer;

pub use analyzer::{AnalysisOutcome, DriftAnalyzer};
