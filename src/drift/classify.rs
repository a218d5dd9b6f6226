//! Change classification
//!
//! Buckets a schema delta into the category that drives governance policy.
//! Classification is deliberately pessimistic: any removal or type change
//! makes the whole delta breaking, regardless of what else it contains.

use super::diff::SchemaDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Governance category of a schema delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeCategory {
    /// Incoming schema matches the contract exactly
    NoChange,
    /// At least one field removed or retyped
    Breaking,
    /// New fields only
    Additive,
    /// Delta shape not covered by the rules above
    Unknown,
}

impl ChangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::NoChange => "NO_CHANGE",
            ChangeCategory::Breaking => "BREAKING",
            ChangeCategory::Additive => "ADDITIVE",
            ChangeCategory::Unknown => "UNKNOWN",
        }
    }

    pub fn is_breaking(&self) -> bool {
        matches!(self, ChangeCategory::Breaking)
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies schema deltas
pub struct ChangeClassifier;

impl ChangeClassifier {
    /// Classify a delta. Rules apply in order, first match wins.
    pub fn classify(delta: &SchemaDelta) -> ChangeCategory {
        if delta.is_empty() {
            return ChangeCategory::NoChange;
        }
        if !delta.removed_fields.is_empty() || !delta.type_changes.is_empty() {
            return ChangeCategory::Breaking;
        }
        if !delta.added_fields.is_empty() {
            return ChangeCategory::Additive;
        }
        ChangeCategory::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::diff::{FieldChange, TypeChange};
    use crate::inference::SchemaKind;

    fn field(name: &str) -> FieldChange {
        FieldChange {
            field: name.to_string(),
            kind: SchemaKind::String,
        }
    }

    #[test]
    fn test_empty_delta_is_no_change() {
        assert_eq!(
            ChangeClassifier::classify(&SchemaDelta::default()),
            ChangeCategory::NoChange
        );
    }

    #[test]
    fn test_removal_is_breaking() {
        let delta = SchemaDelta {
            removed_fields: vec![field("amount")],
            ..Default::default()
        };
        assert_eq!(ChangeClassifier::classify(&delta), ChangeCategory::Breaking);
    }

    #[test]
    fn test_type_change_is_breaking() {
        let delta = SchemaDelta {
            type_changes: vec![TypeChange {
                field: "ts".to_string(),
                expected_type: SchemaKind::Integer,
                incoming_type: SchemaKind::String,
            }],
            ..Default::default()
        };
        assert_eq!(ChangeClassifier::classify(&delta), ChangeCategory::Breaking);
    }

    #[test]
    fn test_breaking_dominates_additions() {
        let delta = SchemaDelta {
            added_fields: vec![field("new_field")],
            removed_fields: vec![field("old_field")],
            ..Default::default()
        };
        assert_eq!(ChangeClassifier::classify(&delta), ChangeCategory::Breaking);
    }

    #[test]
    fn test_additions_only_is_additive() {
        let delta = SchemaDelta {
            added_fields: vec![field("payment_method"), field("customer.phone")],
            ..Default::default()
        };
        assert_eq!(ChangeClassifier::classify(&delta), ChangeCategory::Additive);
    }

    #[test]
    fn test_wire_format_is_screaming_snake() {
        let json = serde_json::to_value(ChangeCategory::NoChange).unwrap();
        assert_eq!(json, "NO_CHANGE");
        let parsed: ChangeCategory = serde_json::from_value(serde_json::json!("BREAKING")).unwrap();
        assert_eq!(parsed, ChangeCategory::Breaking);
    }
}
