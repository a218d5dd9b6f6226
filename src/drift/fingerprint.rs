//! Drift fingerprints
//!
//! Canonical content hashes for schemas and deltas. The delta pattern hash
//! keys the approval memory: two executions producing the same delta share
//! one pattern, no matter which order the diff emitted the findings in.

use super::diff::SchemaDelta;
use crate::inference::SchemaNode;
use sha2::{Digest, Sha256};

/// Hash of a delta's content, independent of finding order
pub fn delta_pattern(delta: &SchemaDelta) -> String {
    let mut canonical = delta.clone();
    canonical.normalize();
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    hex_digest(&bytes)
}

/// Hash of a schema tree's content
///
/// Property maps are ordered, so serialization is already canonical.
pub fn schema_content(schema: &SchemaNode) -> String {
    let bytes = serde_json::to_vec(schema).unwrap_or_default();
    hex_digest(&bytes)
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::diff::FieldChange;
    use crate::inference::{SchemaInferencer, SchemaKind};
    use serde_json::json;

    fn field(name: &str, kind: SchemaKind) -> FieldChange {
        FieldChange {
            field: name.to_string(),
            kind,
        }
    }

    #[test]
    fn test_delta_pattern_ignores_finding_order() {
        let forward = SchemaDelta {
            added_fields: vec![
                field("a", SchemaKind::String),
                field("b", SchemaKind::Integer),
            ],
            ..Default::default()
        };
        let backward = SchemaDelta {
            added_fields: vec![
                field("b", SchemaKind::Integer),
                field("a", SchemaKind::String),
            ],
            ..Default::default()
        };

        assert_eq!(delta_pattern(&forward), delta_pattern(&backward));
    }

    #[test]
    fn test_different_deltas_have_different_patterns() {
        let additive = SchemaDelta {
            added_fields: vec![field("a", SchemaKind::String)],
            ..Default::default()
        };
        let destructive = SchemaDelta {
            removed_fields: vec![field("a", SchemaKind::String)],
            ..Default::default()
        };

        assert_ne!(delta_pattern(&additive), delta_pattern(&destructive));
    }

    #[test]
    fn test_schema_content_is_stable() {
        let inferencer = SchemaInferencer::default();
        let one = inferencer.infer(&json!({ "x": 1, "y": "a" }));
        let two = inferencer.infer(&json!({ "y": "b", "x": 2 }));

        // Same structure, same hash; values are irrelevant
        assert_eq!(schema_content(&one), schema_content(&two));
    }

    #[test]
    fn test_schema_content_tracks_types() {
        let inferencer = SchemaInferencer::default();
        let int_schema = inferencer.infer(&json!({ "x": 1 }));
        let str_schema = inferencer.infer(&json!({ "x": "1" }));

        assert_ne!(schema_content(&int_schema), schema_content(&str_schema));
    }

    #[test]
    fn test_hash_is_hex_encoded_sha256() {
        let hash = delta_pattern(&SchemaDelta::default());
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
