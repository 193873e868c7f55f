// Gateway HTTP client
//
// Wraps `reqwest::Client` with bearer authentication, resource URL
// construction and the 401 retry contract: a rejected request triggers
// exactly one token refresh and one retry of that single request. Both
// the polling fetch sequence and command writes in `homecom-core` inherit
// that behavior from here, so neither implements its own retry loop.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::auth::OAuthSession;
use crate::endpoints::DEFAULT_BASE_URL;
use crate::error::Error;
use crate::models::{Device, ResourcePayload};
use crate::transport::TransportConfig;

/// Authenticated client for the gateway REST API.
pub struct HomeComClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<OAuthSession>,
}

impl HomeComClient {
    /// Create a client against the production API.
    pub fn new(session: Arc<OAuthSession>, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL)?;
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            session,
        })
    }

    /// Create a client against a custom base URL (tests, staging).
    pub fn with_base_url(
        base_url: Url,
        session: Arc<OAuthSession>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            session,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Arc<OAuthSession>) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    /// The OAuth session backing this client.
    pub fn session(&self) -> &Arc<OAuthSession> {
        &self.session
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List all gateways registered to the account.
    pub async fn get_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.api_url("/gateways")?;
        let response = self.send_authorized(Method::GET, &url, None).await?;
        parse_json(response, "/gateways").await
    }

    /// Read one resource from a device's tree.
    pub async fn get_resource(
        &self,
        device_id: &str,
        path: &str,
    ) -> Result<ResourcePayload, Error> {
        let url = self.resource_url(device_id, path)?;
        let response = self.send_authorized(Method::GET, &url, None).await?;
        parse_json(response, path).await
    }

    /// Read an arbitrary resource path as raw JSON (diagnostics passthrough).
    pub async fn get_raw(&self, device_id: &str, path: &str) -> Result<Value, Error> {
        let url = self.resource_url(device_id, path)?;
        let response = self.send_authorized(Method::GET, &url, None).await?;
        parse_json(response, path).await
    }

    /// Write one value to a device resource: `PUT {path}` with
    /// `{"value": ...}`.
    pub async fn put_value(&self, device_id: &str, path: &str, value: Value) -> Result<(), Error> {
        let url = self.resource_url(device_id, path)?;
        let body = json!({ "value": value });
        self.send_authorized(Method::PUT, &url, Some(&body))
            .await?;
        Ok(())
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        Ok(Url::parse(&full)?)
    }

    fn resource_url(&self, device_id: &str, path: &str) -> Result<Url, Error> {
        self.api_url(&format!("/gateways/{device_id}/resource{path}"))
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Send one authenticated request, refreshing the token and retrying
    /// exactly once on 401. Any remaining non-success status becomes
    /// [`Error::Api`]; a second 401 becomes [`Error::TokenRejected`].
    async fn send_authorized(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, Error> {
        let token = self.session.ensure_valid().await?;
        debug!(%method, %url, "sending request");

        let response = self
            .request(method.clone(), url, body, token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            debug!(%url, "bearer token rejected, refreshing once");
            let fresh = self
                .session
                .refresh_after_rejection(token.expose_secret())
                .await?;
            let retry = self
                .request(method, url, body, fresh.expose_secret())
                .send()
                .await
                .map_err(Error::Transport)?;
            if retry.status() == StatusCode::UNAUTHORIZED {
                return Err(Error::TokenRejected);
            }
            retry
        } else {
            response
        };

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                path: url.path().to_owned(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    fn request(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let mut request = self.http.request(method, url.clone()).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }
}

async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
    path: &str,
) -> Result<T, Error> {
    let body = response.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{path}: {e}"),
        body,
    })
}
