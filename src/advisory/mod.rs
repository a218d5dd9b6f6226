//! Advisory Module
//!
//! Risk commentary and patch suggestions from an external model. Advisory
//! output annotates analyses and patch proposals; it never gates a decision.
//! Implementations absorb their own failures and degrade to conservative
//! defaults, so the pipeline never sees an advisory error.

pub mod http;
pub mod stub;

pub use http::HttpAdvisor;
pub use stub::StubAdvisor;

use crate::drift::{ChangeCategory, SchemaDelta};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk grade attached to an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory risk commentary for a schema delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub impacts: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub safe_to_auto_approve: bool,
}

impl RiskAssessment {
    /// Default used whenever the model cannot be consulted
    pub fn conservative() -> Self {
        Self {
            risk_level: RiskLevel::Medium,
            impacts: Vec::new(),
            recommendations: vec!["Manual review recommended".to_string()],
            safe_to_auto_approve: false,
        }
    }
}

/// Kind of remediation suggested for a transform job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatchType {
    FieldMapping,
    TypeCoercion,
    ErrorHandling,
    ManualReview,
}

/// Suggested remediation for a transform job affected by drift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchProposal {
    pub patch_type: PatchType,
    #[serde(default)]
    pub code_changes: String,
    #[serde(default)]
    pub explanation: String,
    pub risk_level: RiskLevel,
    pub testing_required: bool,
}

impl PatchProposal {
    /// Default used whenever the model cannot be consulted
    pub fn manual_review() -> Self {
        Self {
            patch_type: PatchType::ManualReview,
            code_changes: String::new(),
            explanation: "Automatic patch generation unavailable; review the transform job manually"
                .to_string(),
            risk_level: RiskLevel::High,
            testing_required: true,
        }
    }
}

/// External advisory model
///
/// Both methods are total: implementations catch their own errors and
/// return conservative defaults instead.
#[async_trait]
pub trait AdvisoryModel: Send + Sync {
    /// Commentary on the blast radius of a delta
    async fn assess_risk(&self, delta: &SchemaDelta, category: ChangeCategory) -> RiskAssessment;

    /// Suggested transform job patch for a delta
    async fn suggest_patch(
        &self,
        script: &str,
        delta: &SchemaDelta,
        category: ChangeCategory,
    ) -> PatchProposal;
}
