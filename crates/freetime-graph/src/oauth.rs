//! Refresh-token grant against the identity platform.
//!
//! Only the `refresh_token` grant is supported. Obtaining the first token
//! pair happens outside this tool; `freetime init` just records it.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GraphError, GraphResult};

/// Client for the token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
    token_url: Url,
    scope: String,
}

/// The secrets the refresh grant needs, borrowed from the credential record.
pub struct RefreshGrant<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub refresh_token: &'a str,
}

impl OAuthClient {
    /// Creates a client posting to `token_url` with a space-joined `scope`.
    pub fn new(http_client: reqwest::Client, token_url: Url, scope: impl Into<String>) -> Self {
        Self {
            http_client,
            token_url,
            scope: scope.into(),
        }
    }

    /// Returns the token endpoint.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// A non-2xx answer is returned as `AuthServerError` carrying the status
    /// and body. It is never retried here.
    pub async fn refresh_token(&self, grant: RefreshGrant<'_>) -> GraphResult<TokenResponse> {
        let params = [
            ("scope", self.scope.as_str()),
            ("client_id", grant.client_id),
            ("client_secret", grant.client_secret),
            ("refresh_token", grant.refresh_token),
            ("grant_type", "refresh_token"),
        ];

        debug!(url = %self.token_url, "requesting token refresh");
        let response = self
            .http_client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::from_transport("token refresh request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GraphError::from_transport("failed to read token response", e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "token refresh rejected");
            return Err(GraphError::auth_server(status.as_u16(), &body));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| GraphError::malformed(format!("invalid token response: {}", e)))?;
        if token_response.access_token.trim().is_empty() {
            warn!("token response carries an empty access_token");
            return Err(GraphError::malformed("token response has an empty access_token"));
        }

        info!(
            rotated_refresh_token = token_response.refresh_token.is_some(),
            "refreshed access token"
        );
        Ok(token_response)
    }
}

/// Successful token endpoint answer.
///
/// Every field besides the two tokens is kept in `fields` so the credential
/// record can absorb the whole response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphErrorCode;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> OAuthClient {
        let url = Url::parse(&format!("{}/common/oauth2/v2.0/token", server.url())).unwrap();
        OAuthClient::new(reqwest::Client::new(), url, "openid offline_access")
    }

    fn grant() -> RefreshGrant<'static> {
        RefreshGrant {
            client_id: "client",
            client_secret: "secret",
            refresh_token: "refresh-1",
        }
    }

    #[tokio::test]
    async fn posts_refresh_grant_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/common/oauth2/v2.0/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("scope".into(), "openid offline_access".into()),
                Matcher::UrlEncoded("client_id".into(), "client".into()),
                Matcher::UrlEncoded("client_secret".into(), "secret".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"new","refresh_token":"refresh-2","expires_in":3599,"token_type":"Bearer"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let response = client(&server).refresh_token(grant()).await.unwrap();
        assert_eq!(response.access_token, "new");
        assert_eq!(response.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(response.fields["expires_in"], 3599);
        assert_eq!(response.fields["token_type"], "Bearer");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejection_is_auth_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/common/oauth2/v2.0/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let err = client(&server).refresh_token(grant()).await.unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::AuthServerError);
        assert_eq!(err.status(), Some(400));
        assert!(err.message().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn response_without_access_token_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/common/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let err = client(&server).refresh_token(grant()).await.unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::MalformedResponse);
    }

    #[tokio::test]
    async fn empty_access_token_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/common/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"access_token":"","token_type":"Bearer"}"#)
            .create_async()
            .await;

        let err = client(&server).refresh_token(grant()).await.unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::MalformedResponse);
        assert!(err.message().contains("empty access_token"));
    }

    #[test]
    fn debug_redacts_tokens() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"very-secret","refresh_token":"also-secret","scope":"User.Read"}"#,
        )
        .unwrap();
        let debug = format!("{:?}", response);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("also-secret"));
        assert!(debug.contains("scope"));
    }
}
