//! JSON rendering of decoded trees, for tools and UIs.

use crate::node::BoxNode;

/// Serialize a decoded tree as compact JSON.
pub fn to_json(nodes: &[BoxNode]) -> serde_json::Result<String> {
    serde_json::to_string(nodes)
}

/// Serialize a decoded tree as indented JSON.
pub fn to_json_pretty(nodes: &[BoxNode]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(nodes)
}
