//! Schema Diff Engine
//!
//! The core comparison engine that detects structural drift between the
//! expected contract schema and an incoming inferred schema. This is the
//! "git diff" for event payloads.

use crate::inference::{SchemaKind, SchemaNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How deep the diff walks the schema tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffDepth {
    /// Walk nested objects and array elements
    Recursive,
    /// Compare root-level fields only
    TopLevel,
}

/// A field present on one side only
///
/// `field` is the full path from the root, e.g. `customer.phone` for nested
/// fields and `orders[].discount` for fields inside array elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: SchemaKind,
}

/// A field present on both sides with a different structural type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeChange {
    pub field: String,
    pub expected_type: SchemaKind,
    pub incoming_type: SchemaKind,
}

/// Complete diff between an expected and an incoming schema
///
/// The three sets are disjoint: a path appears in at most one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDelta {
    #[serde(default)]
    pub added_fields: Vec<FieldChange>,
    #[serde(default)]
    pub removed_fields: Vec<FieldChange>,
    #[serde(default)]
    pub type_changes: Vec<TypeChange>,
}

impl SchemaDelta {
    pub fn is_empty(&self) -> bool {
        self.added_fields.is_empty()
            && self.removed_fields.is_empty()
            && self.type_changes.is_empty()
    }

    /// Sort all three sets by field path for a canonical representation
    pub fn normalize(&mut self) {
        self.added_fields.sort_by(|a, b| a.field.cmp(&b.field));
        self.removed_fields.sort_by(|a, b| a.field.cmp(&b.field));
        self.type_changes.sort_by(|a, b| a.field.cmp(&b.field));
    }
}

/// The diff engine that compares schema trees
pub struct DiffEngine {
    depth: DiffDepth,
}

impl DiffEngine {
    pub fn new(depth: DiffDepth) -> Self {
        Self { depth }
    }

    /// Compare the expected schema against an incoming schema
    ///
    /// Both roots are treated as objects; a non-object root contributes an
    /// empty property set, so every field on the other side surfaces as
    /// added or removed.
    ///
    /// A property whose stored kind is `unknown` (legacy contracts persisted
    /// without type information, empty-array items) carries no structural
    /// evidence and never produces a type change: drift against an untyped
    /// field does not count as breaking, and republishing once restores full
    /// typing.
    pub fn diff(&self, expected: &SchemaNode, incoming: &SchemaNode) -> SchemaDelta {
        let mut delta = SchemaDelta::default();
        self.diff_properties(expected.properties(), incoming.properties(), "", &mut delta);
        delta.normalize();
        delta
    }

    fn diff_properties(
        &self,
        expected: &BTreeMap<String, SchemaNode>,
        incoming: &BTreeMap<String, SchemaNode>,
        parent: &str,
        delta: &mut SchemaDelta,
    ) {
        // Detect added fields
        for (name, node) in incoming {
            if !expected.contains_key(name) {
                delta.added_fields.push(FieldChange {
                    field: field_path(parent, name),
                    kind: node.kind,
                });
            }
        }

        // Detect removed fields
        for (name, node) in expected {
            if !incoming.contains_key(name) {
                delta.removed_fields.push(FieldChange {
                    field: field_path(parent, name),
                    kind: node.kind,
                });
            }
        }

        // Compare fields present on both sides
        for (name, expected_node) in expected {
            let Some(incoming_node) = incoming.get(name) else {
                continue;
            };
            let path = field_path(parent, name);

            // `unknown` on either side means no structural evidence
            if expected_node.kind == SchemaKind::Unknown
                || incoming_node.kind == SchemaKind::Unknown
            {
                continue;
            }

            if expected_node.kind != incoming_node.kind {
                delta.type_changes.push(TypeChange {
                    field: path,
                    expected_type: expected_node.kind,
                    incoming_type: incoming_node.kind,
                });
                continue;
            }

            if self.depth == DiffDepth::TopLevel {
                continue;
            }

            match expected_node.kind {
                SchemaKind::Object => self.diff_properties(
                    expected_node.properties(),
                    incoming_node.properties(),
                    &path,
                    delta,
                ),
                SchemaKind::Array => self.diff_items(
                    expected_node.items.as_deref(),
                    incoming_node.items.as_deref(),
                    &path,
                    delta,
                ),
                _ => {}
            }
        }
    }

    fn diff_items(
        &self,
        expected: Option<&SchemaNode>,
        incoming: Option<&SchemaNode>,
        path: &str,
        delta: &mut SchemaDelta,
    ) {
        let (Some(expected), Some(incoming)) = (expected, incoming) else {
            return;
        };
        // An empty array on either side carries no element evidence
        if expected.kind == SchemaKind::Unknown || incoming.kind == SchemaKind::Unknown {
            return;
        }

        let item_path = format!("{path}[]");
        if expected.kind != incoming.kind {
            delta.type_changes.push(TypeChange {
                field: item_path,
                expected_type: expected.kind,
                incoming_type: incoming.kind,
            });
            return;
        }

        match expected.kind {
            SchemaKind::Object => {
                self.diff_properties(expected.properties(), incoming.properties(), &item_path, delta)
            }
            SchemaKind::Array => {
                self.diff_items(expected.items.as_deref(), incoming.items.as_deref(), &item_path, delta)
            }
            _ => {}
        }
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffDepth::Recursive)
    }
}

fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::SchemaInferencer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema_of(value: serde_json::Value) -> SchemaNode {
        SchemaInferencer::default().infer(&value)
    }

    fn added(delta: &SchemaDelta) -> Vec<&str> {
        delta.added_fields.iter().map(|c| c.field.as_str()).collect()
    }

    fn removed(delta: &SchemaDelta) -> Vec<&str> {
        delta.removed_fields.iter().map(|c| c.field.as_str()).collect()
    }

    fn changed(delta: &SchemaDelta) -> Vec<&str> {
        delta.type_changes.iter().map(|c| c.field.as_str()).collect()
    }

    #[test]
    fn test_identical_schemas_produce_empty_delta() {
        let schema = schema_of(json!({ "id": "a", "count": 1, "nested": { "x": true } }));
        let delta = DiffEngine::default().diff(&schema, &schema);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_added_and_removed_fields() {
        let expected = schema_of(json!({ "order_id": "a", "amount": 1.0 }));
        let incoming = schema_of(json!({ "order_id": "a", "payment_method": "card" }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(added(&delta), vec!["payment_method"]);
        assert_eq!(removed(&delta), vec!["amount"]);
        assert!(delta.type_changes.is_empty());
        assert_eq!(delta.added_fields[0].kind, SchemaKind::String);
    }

    #[test]
    fn test_type_change() {
        let expected = schema_of(json!({ "ts": 1700000000 }));
        let incoming = schema_of(json!({ "ts": "2023-11-14T00:00:00Z" }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(changed(&delta), vec!["ts"]);
        let change = &delta.type_changes[0];
        assert_eq!(change.expected_type, SchemaKind::Integer);
        assert_eq!(change.incoming_type, SchemaKind::String);
    }

    #[test]
    fn test_non_object_incoming_removes_everything() {
        let expected = schema_of(json!({ "a": 1, "b": 2 }));
        let incoming = schema_of(json!([1, 2, 3]));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(removed(&delta), vec!["a", "b"]);
        assert!(delta.added_fields.is_empty());
    }

    #[test]
    fn test_recursive_nested_additions() {
        let expected = schema_of(json!({ "customer": { "id": 1 } }));
        let incoming = schema_of(json!({ "customer": { "id": 1, "phone": "+1-555" } }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(added(&delta), vec!["customer.phone"]);
    }

    #[test]
    fn test_recursive_nested_type_change() {
        let expected = schema_of(json!({ "meta": { "retries": 3 } }));
        let incoming = schema_of(json!({ "meta": { "retries": "three" } }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(changed(&delta), vec!["meta.retries"]);
    }

    #[test]
    fn test_top_level_depth_ignores_nested_drift() {
        let expected = schema_of(json!({ "meta": { "retries": 3 } }));
        let incoming = schema_of(json!({ "meta": { "retries": "three", "extra": true } }));

        let delta = DiffEngine::new(DiffDepth::TopLevel).diff(&expected, &incoming);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_object_vs_scalar_is_one_type_change() {
        let expected = schema_of(json!({ "data": { "x": 1 } }));
        let incoming = schema_of(json!({ "data": "gone" }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(changed(&delta), vec!["data"]);
        // No recursion past a type change
        assert!(delta.removed_fields.is_empty());
    }

    #[test]
    fn test_array_item_type_change() {
        let expected = schema_of(json!({ "tags": ["a"] }));
        let incoming = schema_of(json!({ "tags": [1] }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(changed(&delta), vec!["tags[]"]);
    }

    #[test]
    fn test_array_of_objects_nested_addition() {
        let expected = schema_of(json!({ "orders": [{ "id": 1 }] }));
        let incoming = schema_of(json!({ "orders": [{ "id": 1, "discount": 0.1 }] }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(added(&delta), vec!["orders[].discount"]);
    }

    #[test]
    fn test_untyped_contract_property_yields_no_type_change() {
        // Legacy contracts stored properties without a type field
        let expected: SchemaNode = serde_json::from_value(json!({
            "type": "object",
            "properties": { "ts": {} }
        }))
        .unwrap();
        let incoming = schema_of(json!({ "ts": "2024-01-05T10:30:00Z" }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_empty_array_carries_no_evidence() {
        let expected = schema_of(json!({ "tags": ["a"] }));
        let incoming = schema_of(json!({ "tags": [] }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert!(delta.is_empty());
    }

    #[test]
    fn test_delta_is_sorted() {
        let expected = schema_of(json!({ "z": 1, "a": 1 }));
        let incoming = schema_of(json!({ "m": 1, "b": 1 }));

        let delta = DiffEngine::default().diff(&expected, &incoming);
        assert_eq!(added(&delta), vec!["b", "m"]);
        assert_eq!(removed(&delta), vec!["a", "z"]);
    }
}
