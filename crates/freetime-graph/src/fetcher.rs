//! Authenticated fetching with a single refresh-and-retry.

use tracing::{info, warn};
use url::Url;

use crate::credential::CredentialStore;
use crate::error::{GraphError, GraphErrorCode, GraphResult};
use crate::request::{FetchResponse, RequestSpec, execute};

/// Issues data requests with the stored access token.
///
/// When the service rejects the token, the fetcher refreshes it once and
/// replays the same request. A second rejection is final.
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    http: reqwest::Client,
    root: Url,
    store: CredentialStore,
}

impl ResilientFetcher {
    /// Creates a fetcher sending requests below `root`.
    pub fn new(http: reqwest::Client, root: Url, store: CredentialStore) -> Self {
        Self { http, root, store }
    }

    /// Returns the credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Fetches `spec`, recovering from one expired access token.
    ///
    /// `AuthenticationExpired` never escapes: the first one triggers a
    /// refresh, the second becomes a `RemoteRequestError` with status 401.
    pub async fn fetch(&self, spec: &RequestSpec) -> GraphResult<FetchResponse> {
        let token = self.store.access_token()?;
        match execute(&self.http, &self.root, spec, &token).await {
            Err(e) if e.is_authentication_expired() => {
                warn!(path = %spec.path, "access token rejected, refreshing");
                let token = self.store.refresh().await?;
                info!(path = %spec.path, "retrying request with refreshed token");
                execute(&self.http, &self.root, spec, &token)
                    .await
                    .map_err(|e| {
                        if e.is_authentication_expired() {
                            GraphError::new(
                                GraphErrorCode::RemoteRequestError,
                                "access token still rejected after refresh",
                            )
                            .with_status(401)
                        } else {
                            e
                        }
                    })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::OAuthClient;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        server: mockito::ServerGuard,
        fetcher: ResilientFetcher,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let token_url = Url::parse(&format!("{}/common/oauth2/v2.0/token", server.url())).unwrap();
        let http = reqwest::Client::new();
        let store = CredentialStore::new(
            dir.path().join("credential.json"),
            OAuthClient::new(http.clone(), token_url, "openid offline_access"),
        );
        std::fs::write(
            store.path(),
            json!({
                "access_token": "old",
                "refresh_token": "r1",
                "client_id": "id",
                "client_secret": "secret"
            })
            .to_string(),
        )
        .unwrap();
        let root = Url::parse(&format!("{}/v1.0/", server.url())).unwrap();
        Fixture {
            server,
            fetcher: ResilientFetcher::new(http, root, store),
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn valid_token_needs_no_refresh() {
        let mut fx = fixture().await;
        let token = fx
            .server
            .mock("POST", "/common/oauth2/v2.0/token")
            .expect(0)
            .create_async()
            .await;
        let data = fx
            .server
            .mock("GET", "/v1.0/me")
            .match_header("authorization", "Bearer old")
            .with_status(200)
            .with_body(r#"{"id":"1"}"#)
            .expect(1)
            .create_async()
            .await;

        let response = fx.fetcher.fetch(&RequestSpec::get("me", "UTC")).await.unwrap();
        assert_eq!(response, FetchResponse::Found(json!({"id": "1"})));
        token.assert_async().await;
        data.assert_async().await;
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_exactly_once() {
        let mut fx = fixture().await;
        let token = fx
            .server
            .mock("POST", "/common/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"access_token":"new","expires_in":3599}"#)
            .expect(1)
            .create_async()
            .await;
        let rejected = fx
            .server
            .mock("GET", "/v1.0/me")
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let accepted = fx
            .server
            .mock("GET", "/v1.0/me")
            .match_header("authorization", "Bearer new")
            .with_status(200)
            .with_body(r#"{"id":"1"}"#)
            .expect(1)
            .create_async()
            .await;

        let response = fx.fetcher.fetch(&RequestSpec::get("me", "UTC")).await.unwrap();
        assert_eq!(response, FetchResponse::Found(json!({"id": "1"})));
        token.assert_async().await;
        rejected.assert_async().await;
        accepted.assert_async().await;
        assert_eq!(fx.fetcher.store().access_token().unwrap(), "new");
    }

    #[tokio::test]
    async fn second_rejection_is_final() {
        let mut fx = fixture().await;
        let token = fx
            .server
            .mock("POST", "/common/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"access_token":"new"}"#)
            .expect(1)
            .create_async()
            .await;
        let data = fx
            .server
            .mock("GET", "/v1.0/me")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;

        let err = fx
            .fetcher
            .fetch(&RequestSpec::get("me", "UTC"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::RemoteRequestError);
        assert_eq!(err.status(), Some(401));
        token.assert_async().await;
        data.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_rejection_surfaces_without_retry() {
        let mut fx = fixture().await;
        let token = fx
            .server
            .mock("POST", "/common/oauth2/v2.0/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .expect(1)
            .create_async()
            .await;
        let data = fx
            .server
            .mock("GET", "/v1.0/me")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let err = fx
            .fetcher
            .fetch(&RequestSpec::get("me", "UTC"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::AuthServerError);
        assert_eq!(err.status(), Some(400));
        token.assert_async().await;
        data.assert_async().await;
        assert_eq!(fx.fetcher.store().access_token().unwrap(), "old");
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let mut fx = fixture().await;
        let token = fx
            .server
            .mock("POST", "/common/oauth2/v2.0/token")
            .expect(0)
            .create_async()
            .await;
        let data = fx
            .server
            .mock("GET", "/v1.0/me")
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create_async()
            .await;

        let err = fx
            .fetcher
            .fetch(&RequestSpec::get("me", "UTC"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::RemoteRequestError);
        assert_eq!(err.status(), Some(500));
        token.assert_async().await;
        data.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_after_refresh_is_still_empty() {
        let mut fx = fixture().await;
        let _token = fx
            .server
            .mock("POST", "/common/oauth2/v2.0/token")
            .with_status(200)
            .with_body(r#"{"access_token":"new"}"#)
            .create_async()
            .await;
        let _rejected = fx
            .server
            .mock("GET", "/v1.0/me/people")
            .match_header("authorization", "Bearer old")
            .with_status(401)
            .create_async()
            .await;
        let _missing = fx
            .server
            .mock("GET", "/v1.0/me/people")
            .match_header("authorization", "Bearer new")
            .with_status(404)
            .create_async()
            .await;

        let response = fx
            .fetcher
            .fetch(&RequestSpec::get("me/people", "UTC"))
            .await
            .unwrap();
        assert_eq!(response, FetchResponse::NotFound);
    }
}
