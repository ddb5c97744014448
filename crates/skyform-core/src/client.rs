//! HTTP service client
//!
//! [`ServiceClient`] issues GET/POST/PUT/DELETE calls against one cloud
//! service endpoint and classifies failures into [`Error`] kinds.
//!
//! ## Sharing
//!
//! A client holds only immutable configuration plus a `reqwest::Client`
//! (which is internally reference counted), so it can be cloned freely and
//! shared read-only between concurrent pollers. Endpoint variants such as a
//! versioned resource base are produced as copies with
//! [`ServiceClient::with_api_version`]; the original is never mutated.

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::result::ApiResult;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

/// Header carrying the IAM token
const AUTH_HEADER: &str = "X-Auth-Token";

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOpts {
    /// Accepted status codes; `None` uses the defaults of the HTTP verb
    pub ok_codes: Option<Vec<u16>>,

    /// Extra headers
    pub headers: Vec<(String, String)>,
}

impl RequestOpts {
    /// Accept exactly these status codes
    pub fn ok_codes(codes: &[u16]) -> Self {
        Self {
            ok_codes: Some(codes.to_vec()),
            headers: Vec::new(),
        }
    }

    /// Add an extra header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status codes accepted when a request does not set its own
pub fn default_ok_codes(method: &Method) -> &'static [u16] {
    match *method {
        Method::GET => &[200],
        Method::POST => &[200, 201, 202],
        Method::PUT => &[200, 201, 202],
        Method::PATCH => &[200, 202, 204],
        Method::DELETE => &[200, 202, 204],
        _ => &[200],
    }
}

/// Build the shared HTTP client for a provider configuration
pub fn build_http_client(config: &ProviderConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))
}

/// Client for one service endpoint
#[derive(Clone)]
pub struct ServiceClient {
    /// Shared HTTP client
    http: reqwest::Client,

    /// Service endpoint, e.g. `https://evs.cn-north-1.myhuaweicloud.com/`
    endpoint: String,

    /// Base for resource URLs, e.g. `{endpoint}v2/{project_id}/`
    resource_base: String,

    /// Project ID
    project_id: String,

    /// IAM token
    /// ⚠️ NEVER log this value
    auth_token: String,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("endpoint", &self.endpoint)
            .field("resource_base", &self.resource_base)
            .field("project_id", &self.project_id)
            .field("auth_token", &"<REDACTED>")
            .finish()
    }
}

impl ServiceClient {
    /// Create a client from its parts
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        resource_base: impl Into<String>,
        project_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            resource_base: resource_base.into(),
            project_id: project_id.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Create a client for `service` at `version` in `region`
    ///
    /// The resource base is `{endpoint}{version}/{project_id}/`.
    pub fn for_service(
        http: reqwest::Client,
        config: &ProviderConfig,
        service: &str,
        version: &str,
        region: &str,
    ) -> Result<Self> {
        if region.is_empty() {
            return Err(Error::config(format!("No region set for service {service}")));
        }

        let endpoint = config.endpoint_for(service, region);
        let resource_base = format!("{}{}/{}/", endpoint, version, config.project_id);

        Ok(Self::new(
            http,
            endpoint,
            resource_base,
            config.project_id.clone(),
            config.auth_token.clone(),
        ))
    }

    /// Service endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Base for resource URLs
    pub fn resource_base_url(&self) -> &str {
        &self.resource_base
    }

    /// Project ID
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Join path segments onto the resource base
    pub fn service_url(&self, parts: &[&str]) -> String {
        format!("{}{}", self.resource_base, parts.join("/"))
    }

    /// Copy of this client with one API version segment swapped
    ///
    /// `with_api_version("v2", "v2.1")` turns `.../v2/{project}/` into
    /// `.../v2.1/{project}/`. Only the first occurrence is replaced.
    pub fn with_api_version(&self, from: &str, to: &str) -> Self {
        let mut copy = self.clone();
        copy.resource_base = self
            .resource_base
            .replacen(&format!("/{from}/"), &format!("/{to}/"), 1);
        copy
    }

    /// Issue a GET
    pub async fn get(&self, url: &str, opts: RequestOpts) -> ApiResult {
        self.request(Method::GET, url, None, opts).await.into()
    }

    /// Issue a POST with a JSON body
    pub async fn post(&self, url: &str, body: &Value, opts: RequestOpts) -> ApiResult {
        self.request(Method::POST, url, Some(body), opts).await.into()
    }

    /// Issue a PUT with a JSON body
    pub async fn put(&self, url: &str, body: &Value, opts: RequestOpts) -> ApiResult {
        self.request(Method::PUT, url, Some(body), opts).await.into()
    }

    /// Issue a DELETE
    pub async fn delete(&self, url: &str, opts: RequestOpts) -> ApiResult {
        self.request(Method::DELETE, url, None, opts).await.into()
    }

    /// Perform one request
    ///
    /// A status in the accepted list yields the parsed body (`Value::Null`
    /// when empty). Any other status is classified by [`Error::from_status`].
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        opts: RequestOpts,
    ) -> Result<Value> {
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTH_HEADER, &self.auth_token)
            .header("Accept", "application/json");

        for (name, value) in &opts.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("{method} {url} failed: {e}")))?;

        let status = response.status().as_u16();
        let accepted = match &opts.ok_codes {
            Some(codes) => codes.contains(&status),
            None => default_ok_codes(&method).contains(&status),
        };

        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response from {url}: {e}")))?;

        if !accepted {
            debug!(method = %method, url = %url, status, "Request rejected");
            return Err(Error::from_status(status, url, text));
        }

        debug!(method = %method, url = %url, status, "Request succeeded");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
