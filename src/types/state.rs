use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource state as a property bag with nested members.
///
/// Serves two roles: the would-be state of a resource under a CREATE/UPDATE
/// check, and the response vehicle a decision is written into. In JSON form
/// the properties sit at the top level next to `id` and `members`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ResourceState>,

    #[serde(flatten)]
    pub properties: HashMap<String, Value>,
}

impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn put_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// String value of a property. Non-string properties yield `None`.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(Value::as_str)
    }

    pub fn add_member(&mut self, member: ResourceState) {
        self.members.push(member);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties() {
        let mut state = ResourceState::new();
        state.put_property("user", "john");
        state.put_property("completed", false);

        assert_eq!(state.property_str("user"), Some("john"));
        assert_eq!(state.property("completed"), Some(&Value::Bool(false)));

        // Non-string properties have no string value
        assert_eq!(state.property_str("completed"), None);
        assert_eq!(state.property_str("missing"), None);
    }

    #[test]
    fn test_members() {
        let mut state = ResourceState::with_id("parent");
        state.add_member(ResourceState::with_id("child"));

        assert_eq!(state.members.len(), 1);
        assert_eq!(state.members[0].id.as_deref(), Some("child"));
    }

    #[test]
    fn test_json_shape() {
        // Properties live at the top level of the JSON object
        let state: ResourceState = serde_json::from_str(r#"{"user":"john","completed":"false"}"#).unwrap();
        assert_eq!(state.property_str("user"), Some("john"));
        assert!(state.id.is_none());
        assert!(state.members.is_empty());

        let mut state = ResourceState::with_id("todo");
        state.put_property("user", "john");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, serde_json::json!({"id": "todo", "user": "john"}));
    }
}
