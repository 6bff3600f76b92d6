//! The on-disk credential record and the store that owns it.
//!
//! The record is a flat JSON object. `access_token` is mandatory for every
//! request; `client_id`, `client_secret` and `refresh_token` only matter when
//! the access token has to be refreshed. Every other key (`expires_in`,
//! `token_type`, `scope`...) is carried along untouched.
//!
//! Writes go to a sibling temp file that is renamed over the record, so a
//! reader never sees a half-written file. There is no cross-process lock: two
//! processes refreshing at the same moment both succeed and the last rename
//! wins.

use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::oauth::{OAuthClient, RefreshGrant, TokenResponse};

/// Authentication secrets for one account.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    /// Creates a record holding only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Sets the refresh token.
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Sets the OAuth client identity.
    pub fn with_client(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self.client_secret = Some(secret.into());
        self
    }

    /// Parses a record, naming the first required field that is missing.
    pub fn from_json(content: &str) -> GraphResult<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| {
            GraphError::corrupt_credential(format!("credential record is not valid JSON: {}", e))
        })?;
        if !value.is_object() {
            return Err(GraphError::corrupt_credential(
                "credential record must be a JSON object",
            ));
        }
        match value.get("access_token") {
            Some(Value::String(token)) if !token.is_empty() => {}
            _ => {
                return Err(GraphError::corrupt_credential(
                    "credential record is missing 'access_token'",
                ));
            }
        }
        serde_json::from_value(value).map_err(|e| {
            GraphError::corrupt_credential(format!("credential record has invalid fields: {}", e))
        })
    }

    /// Borrows the fields the refresh grant needs.
    ///
    /// Empty strings count as missing; `init` writes them when the client
    /// identity is left blank.
    pub fn refresh_grant(&self) -> GraphResult<RefreshGrant<'_>> {
        fn required<'a>(value: &'a Option<String>, name: &str) -> GraphResult<&'a str> {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    GraphError::corrupt_credential(format!(
                        "credential record is missing '{}', required to refresh the access token",
                        name
                    ))
                })
        }

        Ok(RefreshGrant {
            client_id: required(&self.client_id, "client_id")?,
            client_secret: required(&self.client_secret, "client_secret")?,
            refresh_token: required(&self.refresh_token, "refresh_token")?,
        })
    }

    /// Folds a token response into the record: the new access token, a
    /// rotated refresh token when one was issued, and every other field.
    pub fn merge(&mut self, response: TokenResponse) {
        self.access_token = response.access_token;
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        for (key, value) in response.fields {
            match key.as_str() {
                "client_id" | "client_secret" => {}
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &redact(&self.refresh_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Sole reader and writer of the credential record.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    oauth: OAuthClient,
}

impl CredentialStore {
    /// Creates a store for the record at `path`.
    pub fn new(path: impl Into<PathBuf>, oauth: OAuthClient) -> Self {
        Self {
            path: path.into(),
            oauth,
        }
    }

    /// Returns the record location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record from disk.
    pub fn load(&self) -> GraphResult<Credential> {
        if !self.path.exists() {
            return Err(GraphError::configuration(format!(
                "no credential record at {}, run `freetime init` first",
                self.path.display()
            )));
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            GraphError::configuration(format!(
                "failed to read credential record {}",
                self.path.display()
            ))
            .with_source(e)
        })?;
        let credential = Credential::from_json(&content)?;
        debug!(path = %self.path.display(), "loaded credential record");
        Ok(credential)
    }

    /// Current access token.
    pub fn access_token(&self) -> GraphResult<String> {
        self.load().map(|c| c.access_token)
    }

    /// Replaces the record atomically, with owner-only permissions on Unix.
    pub fn save(&self, credential: &Credential) -> GraphResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                GraphError::configuration(format!(
                    "failed to create credential directory {}",
                    parent.display()
                ))
                .with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(credential).map_err(|e| {
            GraphError::configuration("failed to serialize credential record").with_source(e)
        })?;

        let temp_path = self.temp_path();
        write_private(&temp_path, content.as_bytes()).map_err(|e| {
            GraphError::configuration(format!(
                "failed to write credential record {}",
                temp_path.display()
            ))
            .with_source(e)
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            GraphError::configuration(format!(
                "failed to replace credential record {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        debug!(path = %self.path.display(), "saved credential record");
        Ok(())
    }

    /// Exchanges the refresh token for a new access token, persists the
    /// merged record and returns the new token.
    ///
    /// The record is re-read right before merging so fields written by
    /// another process since the last load survive.
    pub async fn refresh(&self) -> GraphResult<String> {
        let credential = self.load()?;
        let response = self.oauth.refresh_token(credential.refresh_grant()?).await?;

        let mut current = self.load()?;
        current.merge(response);
        self.save(&current)?;

        info!(path = %self.path.display(), "persisted refreshed credential");
        Ok(current.access_token)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credential.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; a stale temp file keeps its old bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
