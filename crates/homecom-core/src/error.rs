// ── Core error types ──
//
// User-facing errors from homecom-core. Consumers never see HTTP status
// codes or JSON parse failures directly — the `From<homecom_api::Error>`
// impl translates transport-layer errors into the taxonomy the host acts
// on: `AuthFailed` prompts re-authentication, `ConnectFailed`/`UpdateFailed`
// mark the device unavailable for one cycle and auto-recover.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Credential errors ────────────────────────────────────────────
    /// The credential is invalid or expired and a refresh did not help.
    /// The host should start a re-authentication flow.
    #[error("authentication failed: {message}")]
    AuthFailed { message: String },

    // ── Cycle errors (self-healing) ──────────────────────────────────
    /// Network/transport failure reaching the cloud.
    #[error("cannot reach the HomeCom cloud: {message}")]
    ConnectFailed { message: String },

    /// One poll cycle failed after the single 401 retry. Entities go
    /// unavailable until the next successful cycle.
    #[error("update cycle failed: {message}")]
    UpdateFailed { message: String },

    /// A response body was missing the structure we require.
    #[error("invalid sensor data: {message}")]
    InvalidSensorData { message: String },

    // ── Command errors ───────────────────────────────────────────────
    /// The gateway rejected a command write.
    #[error("command rejected (HTTP {status}): {message}")]
    CommandRejected { status: u16, message: String },

    // ── Lookup / lifecycle errors ────────────────────────────────────
    #[error("device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    /// Entry setup could not complete; the host should retry later.
    #[error("setup failed: {message}")]
    SetupFailed { message: String },

    /// The static projection table is inconsistent (startup validation).
    #[error("projection table invalid: {message}")]
    InvalidProjection { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<homecom_api::Error> for CoreError {
    fn from(err: homecom_api::Error) -> Self {
        match err {
            homecom_api::Error::Auth { message } => CoreError::AuthFailed { message },
            homecom_api::Error::TokenRejected => CoreError::AuthFailed {
                message: "bearer token rejected after refresh".into(),
            },
            homecom_api::Error::Transport(ref e) if e.is_connect() || e.is_timeout() => {
                CoreError::ConnectFailed {
                    message: e.to_string(),
                }
            }
            homecom_api::Error::Transport(e) => CoreError::UpdateFailed {
                message: e.to_string(),
            },
            homecom_api::Error::InvalidUrl(e) => CoreError::SetupFailed {
                message: format!("invalid URL: {e}"),
            },
            homecom_api::Error::Api { status, path, .. } => CoreError::UpdateFailed {
                message: format!("HTTP {status} at {path}"),
            },
            homecom_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidSensorData { message }
            }
        }
    }
}

impl CoreError {
    /// Returns `true` if the host should start a re-authentication flow.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, Self::AuthFailed { .. })
    }

    /// Returns `true` if the condition clears on its own at the next
    /// successful poll cycle.
    pub fn is_cycle_local(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. } | Self::UpdateFailed { .. } | Self::InvalidSensorData { .. }
        )
    }
}
