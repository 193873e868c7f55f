use thiserror::Error;

/// Top-level error type for the `homecom-api` crate.
///
/// Covers every failure mode of the cloud API surface: OAuth exchange,
/// HTTP transport, gateway resource reads/writes, and payload decoding.
/// `homecom-core` maps these into its own taxonomy for consumers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The token exchange was rejected (expired refresh token, revoked
    /// grant, bad authorization code). Re-authentication is required.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The gateway rejected the bearer token twice in a row — once
    /// before and once after a refresh.
    #[error("bearer token rejected after refresh")]
    TokenRejected,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Gateway API ─────────────────────────────────────────────────
    /// Non-success status from a gateway endpoint.
    #[error("gateway API error (HTTP {status}) at {path}")]
    Api {
        status: u16,
        path: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the credential is no longer
    /// usable and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::TokenRejected)
    }

    /// Returns `true` if this is a transient transport error worth
    /// retrying on the next poll cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 502..=504 | 429),
            _ => false,
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
