//! Result envelope for single API calls
//!
//! Every SDK operation returns an [`ApiResult`]: either the decoded response
//! body or the error that ended the call. Extraction consumes the envelope,
//! so the call site that produced it is its only consumer.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Outcome of one API call
#[derive(Debug)]
#[must_use = "an ApiResult carries the outcome of the API call"]
pub struct ApiResult {
    outcome: Result<Value>,
}

impl ApiResult {
    /// Wrap a successfully received body (`Value::Null` when the response was empty)
    pub fn ok(body: Value) -> Self {
        Self { outcome: Ok(body) }
    }

    /// Wrap an error
    pub fn err(error: Error) -> Self {
        Self {
            outcome: Err(error),
        }
    }

    /// Whether the call succeeded
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The error, if the call failed
    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    /// Whether the call failed with a 404
    pub fn is_not_found(&self) -> bool {
        self.error().is_some_and(Error::is_not_found)
    }

    /// Decode the whole body into `T`
    pub fn extract<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.outcome?;
        Ok(serde_json::from_value(body)?)
    }

    /// Decode the value stored under a top-level key, e.g. `{"volume": {...}}`
    pub fn extract_into<T: DeserializeOwned>(self, key: &str) -> Result<T> {
        let body = self.outcome?;
        match body {
            Value::Object(mut map) => {
                let inner = map.remove(key).ok_or_else(|| {
                    Error::Other(format!("Response body has no {key:?} field"))
                })?;
                Ok(serde_json::from_value(inner)?)
            }
            other => Err(Error::Other(format!(
                "Expected a JSON object with a {key:?} field, got: {other}"
            ))),
        }
    }

    /// Discard the body and keep only the error, for calls without a payload
    pub fn extract_err(self) -> Result<()> {
        self.outcome.map(|_| ())
    }

    /// The raw body
    pub fn into_body(self) -> Result<Value> {
        self.outcome
    }
}

impl From<Result<Value>> for ApiResult {
    fn from(outcome: Result<Value>) -> Self {
        Self { outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Volume {
        id: String,
        size: u32,
    }

    #[test]
    fn test_extract_into_named_field() {
        let result = ApiResult::ok(json!({ "volume": { "id": "vol-1", "size": 0 } }));
        let volume: Volume = result.extract_into("volume").unwrap();
        assert_eq!(
            volume,
            Volume {
                id: "vol-1".to_string(),
                size: 0
            }
        );
    }

    #[test]
    fn test_extract_into_missing_field() {
        let result = ApiResult::ok(json!({ "nat_gateway": {} }));
        let err = result.extract_into::<Volume>("volume").unwrap_err();
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn test_error_passes_through() {
        let result = ApiResult::err(Error::not_found("vol-1"));
        assert!(!result.is_ok());
        assert!(result.is_not_found());
        assert!(result.extract_err().unwrap_err().is_not_found());
    }

    #[test]
    fn test_extract_err_ignores_empty_body() {
        assert!(ApiResult::ok(Value::Null).extract_err().is_ok());
    }
}
