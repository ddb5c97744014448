//! Resource data exchanged with the host
//!
//! [`ResourceData`] is the only channel between a resource implementation
//! and whatever drives it (a Terraform-style plan/apply host, or a test).
//! Resources read desired fields from it, write observed fields back, and
//! set or clear the ID. It performs no validation of its own.

use crate::config::ResourceTimeouts;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};

/// Attribute bag for one resource instance
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    /// Remote ID, `None` until created or after deletion
    id: Option<String>,

    /// Current attribute values
    attributes: Map<String, Value>,

    /// Attributes whose planned value differs from the prior state
    changed: BTreeSet<String>,

    /// Deadlines set by the host, overriding the resource defaults
    timeouts: Option<ResourceTimeouts>,
}

impl ResourceData {
    /// Data for a resource about to be created: every planned field counts as changed
    pub fn new(planned: Value) -> Result<Self> {
        let attributes = into_object(planned)?;
        let changed = attributes.keys().cloned().collect();
        Ok(Self {
            id: None,
            attributes,
            changed,
            timeouts: None,
        })
    }

    /// Data for an existing resource, loaded from prior state
    pub fn from_state(id: impl Into<String>, state: Value) -> Result<Self> {
        Ok(Self {
            id: Some(id.into()),
            attributes: into_object(state)?,
            changed: BTreeSet::new(),
            timeouts: None,
        })
    }

    /// Apply a new plan on top of the current state, recording which fields changed
    pub fn plan(&mut self, planned: Value) -> Result<()> {
        let planned = into_object(planned)?;
        self.changed = planned
            .iter()
            .filter(|(key, value)| self.attributes.get(*key) != Some(*value))
            .map(|(key, _)| key.clone())
            .collect();
        self.attributes.extend(planned);
        Ok(())
    }

    /// Override the deadlines for this instance
    pub fn with_timeouts(mut self, timeouts: ResourceTimeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Deadlines set by the host, if any
    pub fn timeouts(&self) -> Option<ResourceTimeouts> {
        self.timeouts
    }

    /// Remote ID
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Remote ID, or an error naming the resource kind
    pub fn require_id(&self, kind: &str) -> Result<&str> {
        self.id()
            .ok_or_else(|| Error::invalid_input(format!("{kind} has no ID set")))
    }

    /// Set the remote ID after a successful create
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Forget the remote ID, marking the resource as gone
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Raw attribute value; JSON null counts as unset
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// String attribute
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// String attribute, treating `""` as unset
    pub fn get_non_empty_str(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    /// Integer attribute
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Boolean attribute
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Map of string values; non-string entries are rejected
    pub fn get_string_map(&self, key: &str) -> Result<Option<HashMap<String, String>>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone()).map_err(|e| {
                Error::invalid_input(format!("{key} must be a map of strings: {e}"))
            })?)),
        }
    }

    /// Whether the field changed in the current plan
    pub fn has_change(&self, key: &str) -> bool {
        self.changed.contains(key)
    }

    /// Write an observed value back
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        self.attributes.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// All attributes, as the host should persist them
    pub fn state(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(Error::invalid_input(format!(
            "Resource data must be a JSON object, got: {other}"
        ))),
    }
}
