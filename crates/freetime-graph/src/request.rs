//! Request descriptions and their single-shot execution.
//!
//! A [`RequestSpec`] says what to fetch; [`execute`] sends it once with a
//! given bearer token. Keeping the two apart lets the fetcher replay the
//! exact same request after a token refresh.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{GraphError, GraphResult};

/// HTTP methods the Graph queries use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Everything needed to issue one data request, minus the token.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Path relative to the Graph root, without a leading slash.
    pub path: String,
    pub query: Vec<(String, String)>,
    /// JSON body, sent only with POST.
    pub body: Option<Value>,
    /// Sent as `Prefer: outlook.timezone="..."`.
    pub timezone: String,
}

impl RequestSpec {
    /// A GET request for `path`.
    pub fn get(path: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timezone: timezone.into(),
        }
    }

    /// A POST request for `path` carrying `body` as JSON.
    pub fn post(path: impl Into<String>, body: Value, timezone: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            timezone: timezone.into(),
        }
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Resolves the request URL against the Graph root.
    pub fn url(&self, root: &Url) -> GraphResult<Url> {
        root.join(self.path.trim_start_matches('/')).map_err(|e| {
            GraphError::invalid_query(format!("invalid request path '{}': {}", self.path, e))
        })
    }
}

/// Outcome of a request the service answered successfully or with 404.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    /// A 2xx answer and its JSON body.
    Found(Value),
    /// The service reported the resource as absent (HTTP 404). This is a
    /// valid empty answer, so it has no error code.
    NotFound,
}

/// Value of the `Prefer` header selecting the response timezone.
pub(crate) fn prefer_header(timezone: &str) -> String {
    format!("outlook.timezone=\"{}\"", timezone)
}

/// Sends `spec` once, authenticated with `token`.
///
/// 401 comes back as `AuthenticationExpired` for the caller to act on. Every
/// other non-success status except 404 is a `RemoteRequestError`.
pub async fn execute(
    http: &reqwest::Client,
    root: &Url,
    spec: &RequestSpec,
    token: &str,
) -> GraphResult<FetchResponse> {
    let url = spec.url(root)?;
    debug!(method = %spec.method, path = %spec.path, "sending request");

    let mut request = match spec.method {
        HttpMethod::Get => http.get(url),
        HttpMethod::Post => http.post(url),
    };
    request = request
        .bearer_auth(token)
        .header("Prefer", prefer_header(&spec.timezone));
    if !spec.query.is_empty() {
        request = request.query(&spec.query);
    }
    if let (HttpMethod::Post, Some(body)) = (spec.method, &spec.body) {
        request = request.json(body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| GraphError::from_transport("request failed", e))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        warn!(path = %spec.path, "no matching data found");
        return Ok(FetchResponse::NotFound);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GraphError::authentication_expired());
    }

    let body = response
        .text()
        .await
        .map_err(|e| GraphError::from_transport("failed to read response", e))?;

    if !status.is_success() {
        warn!(path = %spec.path, status = status.as_u16(), "request rejected");
        return Err(GraphError::remote_request(status.as_u16(), &body));
    }

    let value = serde_json::from_str(&body).map_err(|e| {
        GraphError::malformed(format!("response for {} is not JSON: {}", spec.path, e))
    })?;
    Ok(FetchResponse::Found(value))
}
