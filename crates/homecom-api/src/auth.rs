// OAuth token lifecycle for the cloud session.
//
// Access tokens are short-lived JWTs; the session keeps the current
// access/refresh pair behind a `watch` channel so the pair is replaced
// atomically and interested parties (the host's config-entry store) can
// persist every rotation. Refreshes are serialized through a mutex:
// concurrent 401s from parallel devices trigger exactly one exchange.
//
// The interactive flows (authorization code, password grant) exist for
// initial setup and explicit re-authentication only — background polling
// goes through `ensure_valid`, which never falls back to them and instead
// surfaces `Error::Auth` so the host can prompt the user.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tracing::debug;
use url::Url;

use crate::endpoints::{DEFAULT_TOKEN_URL, OAUTH_CLIENT_ID, OAUTH_REDIRECT_URI};
use crate::error::Error;
use crate::models::TokenResponse;

/// Clock skew subtracted from the `exp` claim before comparing against now.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Credentials accepted at session creation.
///
/// Exactly one form is active per configuration entry. Token pairs come
/// from a previous session; the code and password forms run an interactive
/// exchange once and then behave identically to a stored pair.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// A previously persisted access/refresh pair.
    Tokens {
        access: SecretString,
        refresh: SecretString,
    },
    /// Resource-owner password grant.
    Password {
        username: String,
        password: SecretString,
    },
    /// Authorization code from the browser login flow.
    Code { code: SecretString },
}

/// The current access/refresh token pair.
///
/// Both halves are [`SecretString`] — `Debug` output is redacted and the
/// raw values never reach the log stream.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: SecretString,
}

/// OAuth endpoint configuration, overridable for tests.
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    pub token_url: Url,
    pub client_id: String,
    pub redirect_uri: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            token_url: Url::parse(DEFAULT_TOKEN_URL).expect("default token URL is valid"),
            client_id: OAUTH_CLIENT_ID.into(),
            redirect_uri: OAUTH_REDIRECT_URI.into(),
        }
    }
}

impl OAuthEndpoints {
    /// Endpoints rooted at a custom token URL (wiremock servers in tests).
    pub fn with_token_url(token_url: Url) -> Self {
        Self {
            token_url,
            ..Self::default()
        }
    }
}

/// Holds the current token pair and refreshes it on demand.
pub struct OAuthSession {
    http: reqwest::Client,
    endpoints: OAuthEndpoints,
    tokens: watch::Sender<TokenPair>,
    refresh_gate: Mutex<()>,
}

impl OAuthSession {
    /// Create a session from a stored token pair. No network traffic.
    pub fn new(http: reqwest::Client, endpoints: OAuthEndpoints, initial: TokenPair) -> Self {
        let (tokens, _) = watch::channel(initial);
        Self {
            http,
            endpoints,
            tokens,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Create a session from any credential form, running the interactive
    /// exchange where one is needed.
    pub async fn from_credentials(
        http: reqwest::Client,
        endpoints: OAuthEndpoints,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        match credentials {
            Credentials::Tokens { access, refresh } => {
                Ok(Self::new(http, endpoints, TokenPair { access, refresh }))
            }
            Credentials::Password { username, password } => {
                Self::from_password(http, endpoints, &username, &password).await
            }
            Credentials::Code { code } => Self::from_code(http, endpoints, &code).await,
        }
    }

    /// Exchange an authorization code for a fresh token pair.
    pub async fn from_code(
        http: reqwest::Client,
        endpoints: OAuthEndpoints,
        code: &SecretString,
    ) -> Result<Self, Error> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.expose_secret()),
            ("client_id", endpoints.client_id.as_str()),
            ("redirect_uri", endpoints.redirect_uri.as_str()),
        ];
        let response = http
            .post(endpoints.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;
        let pair = parse_token_response(response).await?;
        debug!("authorization code exchange successful");
        Ok(Self::new(http, endpoints, pair))
    }

    /// Log in with username/password (resource-owner password grant).
    pub async fn from_password(
        http: reqwest::Client,
        endpoints: OAuthEndpoints,
        username: &str,
        password: &SecretString,
    ) -> Result<Self, Error> {
        let form = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password.expose_secret()),
            ("client_id", endpoints.client_id.as_str()),
        ];
        let response = http
            .post(endpoints.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;
        let pair = parse_token_response(response).await?;
        debug!(%username, "password login successful");
        Ok(Self::new(http, endpoints, pair))
    }

    /// The current access token, without validity checks.
    pub fn access_token(&self) -> SecretString {
        self.tokens.borrow().access.clone()
    }

    /// The current token pair.
    pub fn token_pair(&self) -> TokenPair {
        self.tokens.borrow().clone()
    }

    /// Subscribe to token rotations, e.g. to persist every new pair.
    pub fn subscribe(&self) -> watch::Receiver<TokenPair> {
        self.tokens.subscribe()
    }

    /// Return an access token guaranteed non-expired at return time.
    ///
    /// If the current token's `exp` claim (minus skew) is still in the
    /// future this performs zero network calls. Otherwise the refresh
    /// token is exchanged once; a rejected exchange surfaces
    /// [`Error::Auth`] — the interactive flow is never run from here.
    pub async fn ensure_valid(&self) -> Result<SecretString, Error> {
        let access = self.access_token();
        if !is_expired(access.expose_secret()) {
            return Ok(access);
        }

        let _gate = self.refresh_gate.lock().await;
        // A concurrent caller may have refreshed while we waited.
        let access = self.access_token();
        if !is_expired(access.expose_secret()) {
            return Ok(access);
        }
        self.exchange_refresh_token().await
    }

    /// Refresh after the gateway rejected `rejected` with a 401.
    ///
    /// The `exp` claim said the token was fine, the server disagreed
    /// (revocation, clock drift). If another caller already rotated the
    /// pair, the new token is returned without a second exchange.
    pub async fn refresh_after_rejection(&self, rejected: &str) -> Result<SecretString, Error> {
        let _gate = self.refresh_gate.lock().await;
        let current = self.access_token();
        if current.expose_secret() != rejected {
            return Ok(current);
        }
        self.exchange_refresh_token().await
    }

    async fn exchange_refresh_token(&self) -> Result<SecretString, Error> {
        let refresh = self.tokens.borrow().refresh.clone();
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh.expose_secret()),
            ("client_id", self.endpoints.client_id.as_str()),
        ];
        let response = self
            .http
            .post(self.endpoints.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let pair = parse_token_response(response).await?;
        let access = pair.access.clone();
        // send_replace updates even with zero subscribers.
        self.tokens.send_replace(pair);
        debug!("token pair refreshed");
        Ok(access)
    }
}

async fn parse_token_response(response: reqwest::Response) -> Result<TokenPair, Error> {
    let status = response.status();
    let body = response.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        return Err(Error::Auth {
            message: format!("token exchange failed (HTTP {status}): {body}"),
        });
    }

    let parsed: TokenResponse =
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })?;

    Ok(TokenPair {
        access: SecretString::from(parsed.access_token),
        refresh: SecretString::from(parsed.refresh_token),
    })
}

/// Whether `token`'s `exp` claim (minus skew) is in the past.
///
/// Tokens without a decodable `exp` claim count as expired, which forces
/// a refresh rather than a guaranteed 401 round-trip.
fn is_expired(token: &str) -> bool {
    match jwt_expiry(token) {
        Some(exp) => exp - EXPIRY_SKEW_SECS <= Utc::now().timestamp(),
        None => true,
    }
}

/// Extract the `exp` claim from an unverified JWT.
fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forged_jwt(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp }).to_string());
        format!("header.{payload}.signature")
    }

    #[test]
    fn jwt_expiry_reads_exp_claim() {
        assert_eq!(jwt_expiry(&forged_jwt(4_102_444_800)), Some(4_102_444_800));
    }

    #[test]
    fn garbage_token_counts_as_expired() {
        assert!(is_expired("not-a-jwt"));
        assert!(is_expired(""));
    }

    #[test]
    fn future_exp_is_not_expired() {
        let exp = Utc::now().timestamp() + 3600;
        assert!(!is_expired(&forged_jwt(exp)));
    }

    #[test]
    fn exp_within_skew_counts_as_expired() {
        let exp = Utc::now().timestamp() + 10;
        assert!(is_expired(&forged_jwt(exp)));
    }
}
