//! Plan, import and metadata types exchanged with the host.
//!
//! These types provide a more ergonomic API over the raw protobuf types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The top-level attribute or block name that changed.
    pub path: String,
    /// The value before the change (None if the attribute was unset).
    pub before: Option<Value>,
    /// The value after the change (None if the attribute becomes unset).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a change between two optional values.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// An attribute that gains a value.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// An attribute that loses its value.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// An attribute whose value changes.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

fn decode_json(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(bytes).ok()
    }
}

fn encode_json(value: Option<Value>) -> Vec<u8> {
    value
        .and_then(|v| serde_json::to_vec(&v).ok())
        .unwrap_or_default()
}

impl From<crate::generated::AttributeChange> for AttributeChange {
    fn from(proto: crate::generated::AttributeChange) -> Self {
        Self {
            path: proto.path,
            before: decode_json(&proto.before),
            after: decode_json(&proto.after),
        }
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            path: change.path,
            before: encode_json(change.before),
            after: encode_json(change.after),
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation (null when the resource is destroyed).
    pub planned_state: Value,
    /// Attribute changes, sorted by path.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource has to be destroyed and created again.
    pub requires_replace: bool,
}

impl PlanResult {
    /// A plan that leaves the resource untouched.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// A plan carrying changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Whether the plan changes anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// The paths of all changed attributes.
    pub fn changed_paths(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.path.as_str()).collect()
    }
}

/// A resource produced by `ImportResourceState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The state read from the API.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names, sorted.
    pub resources: Vec<String>,
    /// Data source type names, sorted.
    pub data_sources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider supports planning destroy operations.
    pub plan_destroy: bool,
}

/// The protocol version announced in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix printed on stdout.
pub const HANDSHAKE_PREFIX: &str = "CHECKLY_PROVIDER";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("api"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("api")));

        let removed = AttributeChange::removed("tags", json!(["prod"]));
        assert_eq!(removed.before, Some(json!(["prod"])));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("frequency", json!(1), json!(5));
        assert_eq!(modified.before, Some(json!(1)));
        assert_eq!(modified.after, Some(json!(5)));
    }

    #[test]
    fn test_attribute_change_proto_conversion() {
        let change = AttributeChange::added("locations", json!(["eu-west-1"]));

        let proto: crate::generated::AttributeChange = change.clone().into();
        assert_eq!(proto.path, "locations");
        assert!(proto.before.is_empty());

        let back: AttributeChange = proto.into();
        assert_eq!(back, change);
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(json!({"id": "123"}));
        assert!(!no_change.has_changes());
        assert!(!no_change.requires_replace);

        let replace = PlanResult::with_changes(
            json!({"id": "123", "host": "api.example.com"}),
            vec![AttributeChange::modified(
                "host",
                json!("old.example.com"),
                json!("api.example.com"),
            )],
            true,
        );
        assert!(replace.has_changes());
        assert_eq!(replace.changed_paths(), vec!["host"]);
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("checkly_snippet", json!({"id": "42"}));
        assert_eq!(imported.resource_type, "checkly_snippet");
        assert_eq!(imported.state["id"], "42");
    }

    #[test]
    fn test_protocol_constants() {
        assert_eq!(PROTOCOL_VERSION, 1);
        assert_eq!(HANDSHAKE_PREFIX, "CHECKLY_PROVIDER");
    }
}
