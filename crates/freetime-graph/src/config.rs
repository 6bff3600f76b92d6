//! Microsoft Graph connection settings.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderValue;
use url::Url;

use crate::error::{GraphError, GraphResult};
use crate::request::prefer_header;

/// Settings shared by the token endpoint, the data endpoint and the
/// credential store.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Identity platform authority, without the tenant segment.
    pub authority: String,

    /// Root URL every data request path is joined onto.
    pub graph_root: String,

    /// Scopes sent with the refresh grant.
    pub scopes: Vec<String>,

    /// Timezone the service is asked to answer in
    /// (`Prefer: outlook.timezone`).
    pub timezone: String,

    /// Domain appended to bare attendee names.
    pub default_domain: Option<String>,

    /// Request timeout for both endpoints.
    pub timeout: Duration,

    /// Location of the credential record.
    pub credential_path: PathBuf,

    /// `$top` used for list queries.
    pub page_size: u32,
}

impl GraphConfig {
    /// Default identity authority.
    pub const DEFAULT_AUTHORITY: &'static str = "https://login.microsoftonline.com";

    /// Default Graph API root.
    pub const DEFAULT_GRAPH_ROOT: &'static str = "https://graph.microsoft.com/v1.0/";

    /// Scopes requested when none are configured.
    pub const DEFAULT_SCOPES: [&'static str; 6] = [
        "openid",
        "offline_access",
        "User.Read",
        "Calendars.Read",
        "Calendars.Read.Shared",
        "People.Read",
    ];

    /// Default response timezone.
    pub const DEFAULT_TIMEZONE: &'static str = "UTC";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// The service returns ten items by default; ask for everything.
    pub const DEFAULT_PAGE_SIZE: u32 = 1500;

    /// Creates a configuration with every default applied.
    pub fn new() -> Self {
        Self {
            authority: Self::DEFAULT_AUTHORITY.to_string(),
            graph_root: Self::DEFAULT_GRAPH_ROOT.to_string(),
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            timezone: Self::DEFAULT_TIMEZONE.to_string(),
            default_domain: None,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            credential_path: Self::default_credential_path(),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// Returns `$XDG_CONFIG_HOME/freetime/credential.json`.
    pub fn default_credential_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freetime")
            .join("credential.json")
    }

    /// Sets the authority.
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Sets the Graph root.
    pub fn with_graph_root(mut self, root: impl Into<String>) -> Self {
        self.graph_root = root.into();
        self
    }

    /// Sets the scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the response timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Sets the domain used to qualify bare attendee names.
    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = Some(domain.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the credential record location.
    pub fn with_credential_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_path = path.into();
        self
    }

    /// Sets the `$top` for list queries.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Token endpoint for the refresh grant.
    pub fn token_url(&self) -> GraphResult<Url> {
        let authority = self.authority.trim_end_matches('/');
        let raw = format!("{}/common/oauth2/v2.0/token", authority);
        Url::parse(&raw).map_err(|e| {
            GraphError::configuration(format!("invalid authority '{}': {}", self.authority, e))
        })
    }

    /// Graph root with a guaranteed trailing slash, so relative paths join
    /// below the version segment instead of replacing it.
    pub fn graph_root_url(&self) -> GraphResult<Url> {
        let mut raw = self.graph_root.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| {
            GraphError::configuration(format!("invalid graph root '{}': {}", self.graph_root, e))
        })
    }

    /// Space-joined scope list for the token request.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Checks the settings before any request is built.
    pub fn validate(&self) -> GraphResult<()> {
        if self.scopes.iter().all(|s| s.trim().is_empty()) {
            return Err(GraphError::configuration("at least one scope is required"));
        }
        if self.timeout.is_zero() {
            return Err(GraphError::configuration("timeout must be greater than zero"));
        }
        if self.timezone.trim().is_empty() {
            return Err(GraphError::configuration("timezone must not be empty"));
        }
        if self.timezone.contains('"')
            || HeaderValue::from_str(&prefer_header(&self.timezone)).is_err()
        {
            return Err(GraphError::configuration(format!(
                "timezone {:?} cannot be sent in a request header",
                self.timezone
            )));
        }
        if self.page_size == 0 {
            return Err(GraphError::configuration("page_size must be greater than zero"));
        }
        self.token_url()?;
        self.graph_root_url()?;
        Ok(())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new()
    }
}
