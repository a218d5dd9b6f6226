//! Contract versioner
//!
//! Builds the proposed next contract version from the current contract and
//! an observed delta. Proposing is pure: nothing here touches storage, so a
//! proposal that never gets approved leaves no trace in the version chain.

use super::model::{Contract, ContractMetadata};
use crate::drift::{ChangeClassifier, SchemaDelta};
use crate::inference::SchemaNode;
use chrono::Utc;

/// Derives contract versions
pub struct ContractVersioner;

impl ContractVersioner {
    /// Propose the successor of `current` for an observed incoming schema
    ///
    /// The incoming schema is adopted wholesale. Required fields, validation
    /// rules, evolution policy, and governance metadata carry forward; newly
    /// added root-level fields join the optional set exactly once.
    pub fn propose(
        current: &Contract,
        incoming_schema: &SchemaNode,
        delta: &SchemaDelta,
    ) -> Contract {
        let category = ChangeClassifier::classify(delta);
        let version = current.version + 1;

        let mut optional_fields = current.optional_fields.clone();
        for change in &delta.added_fields {
            // Nested additions change the schema tree, not the field lists
            if change.field.contains('.') || change.field.contains('[') {
                continue;
            }
            if current.required_fields.iter().any(|f| f == &change.field) {
                continue;
            }
            if optional_fields.iter().any(|f| f == &change.field) {
                continue;
            }
            optional_fields.push(change.field.clone());
        }

        Contract {
            version,
            created_at: Utc::now(),
            description: format!("Auto-generated contract v{version} - Schema evolution"),
            schema: incoming_schema.clone(),
            required_fields: current.required_fields.clone(),
            optional_fields,
            validation_rules: current.validation_rules.clone(),
            evolution_policy: current.evolution_policy.clone(),
            backward_compatible: !category.is_breaking(),
            changes: delta.clone(),
            metadata: ContractMetadata {
                previous_version: Some(current.version),
                ..current.metadata.clone()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::{DiffEngine, FieldChange};
    use crate::inference::{SchemaInferencer, SchemaKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema_of(value: serde_json::Value) -> SchemaNode {
        SchemaInferencer::default().infer(&value)
    }

    fn current_contract() -> Contract {
        Contract {
            version: 3,
            schema: schema_of(json!({ "order_id": "a", "amount": 1.0 })),
            required_fields: vec!["order_id".to_string()],
            optional_fields: vec!["amount".to_string()],
            validation_rules: json!({ "order_id": { "max_length": 64 } }),
            ..Contract::baseline()
        }
    }

    #[test]
    fn test_proposal_bumps_version_and_links_predecessor() {
        let current = current_contract();
        let incoming = schema_of(json!({ "order_id": "a", "amount": 1.0, "payment_method": "card" }));
        let delta = DiffEngine::default().diff(&current.schema, &incoming);

        let proposed = ContractVersioner::propose(&current, &incoming, &delta);
        assert_eq!(proposed.version, 4);
        assert_eq!(proposed.metadata.previous_version, Some(3));
        assert_eq!(proposed.description, "Auto-generated contract v4 - Schema evolution");
    }

    #[test]
    fn test_incoming_schema_is_adopted_wholesale() {
        let current = current_contract();
        // `amount` disappears, `ts` arrives
        let incoming = schema_of(json!({ "order_id": "a", "ts": 1 }));
        let delta = DiffEngine::default().diff(&current.schema, &incoming);

        let proposed = ContractVersioner::propose(&current, &incoming, &delta);
        assert_eq!(proposed.schema, incoming);
        assert!(!proposed.schema.properties().contains_key("amount"));
    }

    #[test]
    fn test_additive_proposal_is_backward_compatible() {
        let current = current_contract();
        let incoming = schema_of(json!({ "order_id": "a", "amount": 1.0, "payment_method": "card" }));
        let delta = DiffEngine::default().diff(&current.schema, &incoming);

        let proposed = ContractVersioner::propose(&current, &incoming, &delta);
        assert!(proposed.backward_compatible);
        assert_eq!(proposed.changes, delta);
        assert_eq!(
            proposed.optional_fields,
            vec!["amount".to_string(), "payment_method".to_string()]
        );
    }

    #[test]
    fn test_breaking_proposal_is_flagged() {
        let current = current_contract();
        let incoming = schema_of(json!({ "order_id": 42, "amount": 1.0 }));
        let delta = DiffEngine::default().diff(&current.schema, &incoming);

        let proposed = ContractVersioner::propose(&current, &incoming, &delta);
        assert!(!proposed.backward_compatible);
    }

    #[test]
    fn test_optional_union_is_idempotent() {
        let current = current_contract();
        let incoming = schema_of(json!({ "order_id": "a", "amount": 1.0, "payment_method": "card" }));
        let delta = DiffEngine::default().diff(&current.schema, &incoming);

        let first = ContractVersioner::propose(&current, &incoming, &delta);
        let second = ContractVersioner::propose(&first, &incoming, &delta);
        assert_eq!(second.optional_fields, first.optional_fields);
    }

    #[test]
    fn test_required_fields_never_become_optional() {
        let current = current_contract();
        let incoming = schema_of(json!({ "order_id": "a", "amount": 1.0 }));
        let delta = SchemaDelta {
            added_fields: vec![FieldChange {
                field: "order_id".to_string(),
                kind: SchemaKind::String,
            }],
            ..Default::default()
        };

        let proposed = ContractVersioner::propose(&current, &incoming, &delta);
        assert_eq!(proposed.optional_fields, vec!["amount".to_string()]);
        assert_eq!(proposed.required_fields, vec!["order_id".to_string()]);
    }

    #[test]
    fn test_nested_additions_stay_out_of_field_lists() {
        let current = current_contract();
        let incoming = schema_of(json!({
            "order_id": "a",
            "amount": 1.0,
            "customer": { "phone": "+1" }
        }));
        let delta = SchemaDelta {
            added_fields: vec![
                FieldChange { field: "customer".to_string(), kind: SchemaKind::Object },
                FieldChange { field: "customer.phone".to_string(), kind: SchemaKind::String },
            ],
            ..Default::default()
        };

        let proposed = ContractVersioner::propose(&current, &incoming, &delta);
        assert_eq!(
            proposed.optional_fields,
            vec!["amount".to_string(), "customer".to_string()]
        );
    }

    #[test]
    fn test_governance_settings_carry_forward() {
        let current = current_contract();
        let incoming = schema_of(json!({ "order_id": "a", "amount": 1.0, "extra": true }));
        let delta = DiffEngine::default().diff(&current.schema, &incoming);

        let proposed = ContractVersioner::propose(&current, &incoming, &delta);
        assert_eq!(proposed.validation_rules, current.validation_rules);
        assert_eq!(proposed.evolution_policy, current.evolution_policy);
        assert_eq!(proposed.metadata.owner, current.metadata.owner);
        assert_eq!(proposed.metadata.domain, current.metadata.domain);
    }
}
