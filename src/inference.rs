//! Schema inference
//!
//! Derives a structural schema from a raw JSON event payload. Inference is
//! total: every JSON value maps to a schema node, so malformed-but-parseable
//! payloads never fail analysis, they surface as drift instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Structural type of a single schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Boolean,
    Integer,
    Number,
    Null,
    Unknown,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::String => "string",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Null => "null",
            SchemaKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SchemaKind {
    fn default() -> Self {
        SchemaKind::Unknown
    }
}

/// A node in an inferred schema tree
///
/// Objects carry `properties`, arrays carry `items`. Scalars carry neither.
/// Legacy contract objects stored without a `type` field deserialize as
/// `unknown`, which downstream treats as "no evidence".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default)]
    pub kind: SchemaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            properties: None,
            items: None,
        }
    }

    pub fn object(properties: BTreeMap<String, SchemaNode>) -> Self {
        Self {
            kind: SchemaKind::Object,
            properties: Some(properties),
            items: None,
        }
    }

    pub fn empty_object() -> Self {
        Self::object(BTreeMap::new())
    }

    pub fn array(items: SchemaNode) -> Self {
        Self {
            kind: SchemaKind::Array,
            properties: None,
            items: Some(Box::new(items)),
        }
    }

    /// Property map of this node, empty for non-objects
    pub fn properties(&self) -> &BTreeMap<String, SchemaNode> {
        static EMPTY: BTreeMap<String, SchemaNode> = BTreeMap::new();
        self.properties.as_ref().unwrap_or(&EMPTY)
    }
}

/// Strategy for inferring the element schema of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySampling {
    /// Use the first element only
    FirstElement,
    /// Sample up to `sample_limit` elements and take the most frequent kind
    Dominant { sample_limit: usize },
}

/// Derives schemas from payloads
#[derive(Debug, Clone, Copy)]
pub struct SchemaInferencer {
    sampling: ArraySampling,
}

impl SchemaInferencer {
    pub fn new(sampling: ArraySampling) -> Self {
        Self { sampling }
    }

    /// Infer the schema of an arbitrary JSON value
    pub fn infer(&self, value: &Value) -> SchemaNode {
        match value {
            Value::Object(map) => SchemaNode::object(
                map.iter()
                    .map(|(name, child)| (name.clone(), self.infer(child)))
                    .collect(),
            ),
            Value::Array(items) => SchemaNode::array(self.infer_items(items)),
            Value::String(_) => SchemaNode::of(SchemaKind::String),
            Value::Bool(_) => SchemaNode::of(SchemaKind::Boolean),
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    SchemaNode::of(SchemaKind::Integer)
                } else {
                    SchemaNode::of(SchemaKind::Number)
                }
            }
            Value::Null => SchemaNode::of(SchemaKind::Null),
        }
    }

    fn infer_items(&self, items: &[Value]) -> SchemaNode {
        if items.is_empty() {
            // No evidence about the element type
            return SchemaNode::of(SchemaKind::Unknown);
        }

        match self.sampling {
            ArraySampling::FirstElement => self.infer(&items[0]),
            ArraySampling::Dominant { sample_limit } => {
                let sampled: Vec<SchemaNode> = items
                    .iter()
                    .take(sample_limit.max(1))
                    .map(|v| self.infer(v))
                    .collect();

                let mut counts: HashMap<SchemaKind, usize> = HashMap::new();
                for node in &sampled {
                    *counts.entry(node.kind).or_insert(0) += 1;
                }
                let max_count = counts.values().copied().max().unwrap_or(0);

                // Ties resolve to the earliest element in the array
                sampled
                    .iter()
                    .find(|node| counts.get(&node.kind) == Some(&max_count))
                    .cloned()
                    .unwrap_or_else(|| SchemaNode::of(SchemaKind::Unknown))
            }
        }
    }
}

impl Default for SchemaInferencer {
    fn default() -> Self {
        Self::new(ArraySampling::FirstElement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn infer(value: &Value) -> SchemaNode {
        SchemaInferencer::default().infer(value)
    }

    #[test]
    fn test_scalar_kinds() {
        assert_eq!(infer(&json!("hello")).kind, SchemaKind::String);
        assert_eq!(infer(&json!(true)).kind, SchemaKind::Boolean);
        assert_eq!(infer(&json!(42)).kind, SchemaKind::Integer);
        assert_eq!(infer(&json!(-7)).kind, SchemaKind::Integer);
        assert_eq!(infer(&json!(3.25)).kind, SchemaKind::Number);
        assert_eq!(infer(&json!(null)).kind, SchemaKind::Null);
    }

    #[test]
    fn test_nested_object() {
        let schema = infer(&json!({
            "order_id": "ord-1",
            "amount": 12.5,
            "customer": { "id": 9, "vip": false }
        }));

        assert_eq!(schema.kind, SchemaKind::Object);
        let props = schema.properties();
        assert_eq!(props["order_id"].kind, SchemaKind::String);
        assert_eq!(props["amount"].kind, SchemaKind::Number);
        let customer = &props["customer"];
        assert_eq!(customer.kind, SchemaKind::Object);
        assert_eq!(customer.properties()["id"].kind, SchemaKind::Integer);
        assert_eq!(customer.properties()["vip"].kind, SchemaKind::Boolean);
    }

    #[test]
    fn test_array_uses_first_element() {
        let schema = infer(&json!({ "tags": ["a", 1, true] }));
        let items = schema.properties()["tags"].items.as_deref();
        assert_eq!(items.map(|n| n.kind), Some(SchemaKind::String));
    }

    #[test]
    fn test_empty_array_has_unknown_items() {
        let schema = infer(&json!([]));
        assert_eq!(schema.kind, SchemaKind::Array);
        assert_eq!(schema.items.as_deref().map(|n| n.kind), Some(SchemaKind::Unknown));
    }

    #[test]
    fn test_dominant_sampling_picks_majority() {
        let inferencer = SchemaInferencer::new(ArraySampling::Dominant { sample_limit: 10 });
        let schema = inferencer.infer(&json!(["a", 1, 2]));
        assert_eq!(schema.items.as_deref().map(|n| n.kind), Some(SchemaKind::Integer));
    }

    #[test]
    fn test_dominant_sampling_tie_prefers_first() {
        let inferencer = SchemaInferencer::new(ArraySampling::Dominant { sample_limit: 10 });
        let schema = inferencer.infer(&json!([1, "a"]));
        assert_eq!(schema.items.as_deref().map(|n| n.kind), Some(SchemaKind::Integer));
    }

    #[test]
    fn test_dominant_sampling_respects_limit() {
        let inferencer = SchemaInferencer::new(ArraySampling::Dominant { sample_limit: 1 });
        let schema = inferencer.infer(&json!(["a", 1, 2, 3]));
        assert_eq!(schema.items.as_deref().map(|n| n.kind), Some(SchemaKind::String));
    }

    #[test]
    fn test_inference_is_deterministic() {
        let payload = json!({ "a": [1, 2], "b": { "c": null } });
        assert_eq!(infer(&payload), infer(&payload));
    }

    #[test]
    fn test_wire_shape() {
        let schema = infer(&json!({ "id": 1 }));
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["properties"]["id"]["type"], "integer");

        // Legacy contracts stored `{}` for the schema
        let legacy: SchemaNode = serde_json::from_value(json!({})).unwrap();
        assert_eq!(legacy.kind, SchemaKind::Unknown);
    }
}
