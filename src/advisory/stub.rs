//! Stub advisor
//!
//! Deterministic advisory backend used when no model endpoint is configured.
//! Always conservative, so deployments without a model lean fully on the
//! classifier and the approval memory.

use super::{AdvisoryModel, PatchProposal, RiskAssessment};
use crate::drift::{ChangeCategory, SchemaDelta};
use async_trait::async_trait;

pub struct StubAdvisor;

impl StubAdvisor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdvisoryModel for StubAdvisor {
    async fn assess_risk(
        &self,
        _delta: &SchemaDelta,
        _category: ChangeCategory,
    ) -> RiskAssessment {
        RiskAssessment::conservative()
    }

    async fn suggest_patch(
        &self,
        _script: &str,
        _delta: &SchemaDelta,
        _category: ChangeCategory,
    ) -> PatchProposal {
        PatchProposal::manual_review()
    }
}
