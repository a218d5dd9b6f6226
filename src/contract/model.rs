//! Contract model
//!
//! A contract is the versioned, governed description of an event stream's
//! shape. Version 0 is implicit: before anything is published, the current
//! contract is an empty baseline that treats every field as new.

use crate::drift::SchemaDelta;
use crate::inference::SchemaNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Evolution policy applied to new contracts until an owner overrides it
pub const DEFAULT_EVOLUTION_POLICY: &str = "ADDITIVE_ONLY";

/// Governance metadata carried by every contract version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub owner: String,
    pub domain: String,
    pub classification: String,
    /// Version this contract evolved from; absent on the baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<u64>,
}

impl Default for ContractMetadata {
    fn default() -> Self {
        Self {
            owner: "data-platform-team".to_string(),
            domain: "events".to_string(),
            classification: "internal".to_string(),
            previous_version: None,
        }
    }
}

/// A versioned data contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub schema: SchemaNode,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub optional_fields: Vec<String>,
    #[serde(default = "empty_rules")]
    pub validation_rules: Value,
    #[serde(default = "default_policy")]
    pub evolution_policy: String,
    #[serde(default = "default_true")]
    pub backward_compatible: bool,
    /// Delta that produced this version, empty on the baseline
    #[serde(default)]
    pub changes: SchemaDelta,
    #[serde(default)]
    pub metadata: ContractMetadata,
}

fn empty_rules() -> Value {
    Value::Object(Default::default())
}

fn default_policy() -> String {
    DEFAULT_EVOLUTION_POLICY.to_string()
}

fn default_true() -> bool {
    true
}

impl Contract {
    /// The implicit v0 contract used before any version has been published
    pub fn baseline() -> Self {
        Self {
            version: 0,
            created_at: Utc::now(),
            description: "Baseline contract - no schema published yet".to_string(),
            schema: SchemaNode::empty_object(),
            required_fields: Vec::new(),
            optional_fields: Vec::new(),
            validation_rules: empty_rules(),
            evolution_policy: default_policy(),
            backward_compatible: true,
            changes: SchemaDelta::default(),
            metadata: ContractMetadata::default(),
        }
    }

    /// Required fields that are absent or null in the payload
    ///
    /// Advisory only: findings are reported alongside the analysis but never
    /// change how the delta is classified. A non-object payload misses every
    /// required field.
    pub fn missing_required_fields(&self, payload: &Value) -> Vec<String> {
        match payload.as_object() {
            Some(map) => self
                .required_fields
                .iter()
                .filter(|name| map.get(name.as_str()).map_or(true, Value::is_null))
                .cloned()
                .collect(),
            None => self.required_fields.clone(),
        }
    }
}
