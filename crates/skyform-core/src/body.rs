//! Request body and query builders
//!
//! Option structs are turned into JSON bodies through [`RequestBody`].
//! Presence is explicit: a field wrapped in `Some` is always sent, even when
//! it holds a zero value such as `size = 0`, and `None` is always omitted.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Types that can be turned into a JSON request body
pub trait ToRequestBody {
    /// Assemble the request body
    fn to_request_body(&self) -> Result<Value>;
}

/// Types that can be turned into query parameters
pub trait ToQuery {
    /// Assemble the query pairs
    fn to_query(&self) -> Vec<(String, String)>;
}

/// Builder for a JSON object body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody {
    fields: Map<String, Value>,
}

impl RequestBody {
    /// Create an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field that must be present
    ///
    /// Null values and empty strings are rejected with
    /// [`Error::InvalidInput`] naming the missing field.
    pub fn required<T: Serialize>(mut self, key: &str, value: T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        let missing = match &value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if missing {
            return Err(Error::invalid_input(format!("Missing input for argument [{key}]")));
        }
        self.fields.insert(key.to_string(), value);
        Ok(self)
    }

    /// Add a field only when it is `Some`
    pub fn optional<T: Serialize>(mut self, key: &str, value: Option<T>) -> Result<Self> {
        if let Some(value) = value {
            self.fields.insert(key.to_string(), serde_json::to_value(value)?);
        }
        Ok(self)
    }

    /// Nest another body under `key`
    pub fn nested(mut self, key: &str, body: RequestBody) -> Self {
        self.fields.insert(key.to_string(), body.build());
        self
    }

    /// Nest another body under `key` only when it is `Some` and not empty
    pub fn nested_optional(self, key: &str, body: Option<RequestBody>) -> Self {
        match body {
            Some(body) if !body.is_empty() => self.nested(key, body),
            _ => self,
        }
    }

    /// Whether no field has been added
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Finish the body as a JSON object
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    /// Finish the body wrapped under a root key, e.g. `{"nat_gateway": {...}}`
    pub fn wrap(self, root: &str) -> Value {
        let mut outer = Map::new();
        outer.insert(root.to_string(), self.build());
        Value::Object(outer)
    }
}

/// Append query pairs to a URL
pub fn append_query(url: &str, pairs: &[(String, String)]) -> Result<String> {
    if pairs.is_empty() {
        return Ok(url.to_string());
    }

    let mut parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::invalid_input(format!("Invalid URL {url}: {e}")))?;
    parsed
        .query_pairs_mut()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zero_values_are_kept_when_present() {
        let body = RequestBody::new()
            .optional("size", Some(0))
            .unwrap()
            .optional("multiattach", Some(false))
            .unwrap()
            .optional::<String>("name", None)
            .unwrap()
            .build();

        assert_eq!(body, json!({ "size": 0, "multiattach": false }));
    }

    #[test]
    fn test_required_field_missing() {
        let err = RequestBody::new().required("router_id", "").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("router_id"));

        let err = RequestBody::new().required::<Option<u32>>("size", None).unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_wrap_and_nested() {
        let scheduler = RequestBody::new()
            .optional::<&str>("dedicated_storage_id", None)
            .unwrap();
        let body = RequestBody::new()
            .required("name", "gw")
            .unwrap()
            .nested_optional("hints", Some(scheduler))
            .wrap("nat_gateway");

        assert_eq!(body, json!({ "nat_gateway": { "name": "gw" } }));
    }

    #[test]
    fn test_append_query() {
        let url = append_query(
            "https://evs.example.com/v2/p/cloudvolumes/vol-1",
            &[("cascade".to_string(), "true".to_string())],
        )
        .unwrap();
        assert_eq!(url, "https://evs.example.com/v2/p/cloudvolumes/vol-1?cascade=true");

        let url = append_query("https://evs.example.com/v2", &[]).unwrap();
        assert_eq!(url, "https://evs.example.com/v2");
    }
}
