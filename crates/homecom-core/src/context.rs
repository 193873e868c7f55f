// ── Per-entry context ──
//
// One context per host configuration entry, replacing any global
// registry: it owns the shared HTTP client, the OAuth session, one
// coordinator per enabled device and the token-persistence task. The
// host calls `setup` when the entry loads and `unload` when it goes
// away; everything in between (custom actions, entity lookups) routes
// through this object.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use homecom_api::auth::{Credentials, OAuthEndpoints, OAuthSession, TokenPair};
use homecom_api::transport::TransportConfig;
use homecom_api::{Device, Error as ApiError, HomeComClient};

use crate::command::{ChargeMode, Command};
use crate::coordinator::{Coordinator, CoordinatorConfig};
use crate::error::CoreError;
use crate::projection;

/// Host-side persistence for rotated token pairs.
///
/// Called from the persistence task on every refresh so a process
/// restart never forces a re-login. Implementations write to the host's
/// configuration-entry record.
pub trait TokenStore: Send + Sync + 'static {
    fn persist(&self, tokens: &TokenPair);
}

/// Everything the host hands over when an entry loads.
#[derive(Debug, Clone)]
pub struct EntryConfig {
    pub credentials: Credentials,
    /// Override the production API base URL (tests, staging).
    pub base_url: Option<Url>,
    pub oauth: OAuthEndpoints,
    /// Per-device enable selection, keyed `"{device_id}_{device_type}"`.
    /// An empty map enables every discovered device.
    pub devices: HashMap<String, bool>,
    pub coordinator: CoordinatorConfig,
    pub transport: TransportConfig,
}

impl EntryConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: None,
            oauth: OAuthEndpoints::default(),
            devices: HashMap::new(),
            coordinator: CoordinatorConfig::default(),
            transport: TransportConfig::default(),
        }
    }

    fn device_enabled(&self, device: &Device) -> bool {
        if self.devices.is_empty() {
            return true;
        }
        self.devices
            .get(&format!("{}_{}", device.device_id, device.device_type))
            .copied()
            .unwrap_or(false)
    }
}

/// The live state of one configuration entry.
pub struct EntryContext {
    client: Arc<HomeComClient>,
    coordinators: DashMap<String, Coordinator>,
    cancel: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl EntryContext {
    /// Bring an entry up: authenticate, discover devices, run the first
    /// refresh for each enabled device and start the background tasks.
    ///
    /// A failed first refresh surfaces [`CoreError::SetupFailed`] so the
    /// host can retry the whole entry later; an invalid credential
    /// surfaces [`CoreError::AuthFailed`] so it can prompt re-auth
    /// instead.
    pub async fn setup(
        config: EntryConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, CoreError> {
        // Fail fast on an inconsistent projection table.
        projection::validate_all()?;

        let http = config
            .transport
            .build_client()
            .map_err(|e| CoreError::SetupFailed {
                message: e.to_string(),
            })?;

        let session = OAuthSession::from_credentials(
            http.clone(),
            config.oauth.clone(),
            config.credentials.clone(),
        )
        .await
        .map_err(setup_error)?;
        let session = Arc::new(session);

        let client = match &config.base_url {
            Some(base) => HomeComClient::with_client(http, base.clone(), Arc::clone(&session)),
            None => HomeComClient::new(Arc::clone(&session), &config.transport)
                .map_err(setup_error)?,
        };
        let client = Arc::new(client);

        let cancel = CancellationToken::new();
        let mut handles = Vec::new();
        handles.push(spawn_persistence(&session, store, cancel.clone()));

        let devices = client.get_devices().await.map_err(setup_error)?;
        let coordinators: DashMap<String, Coordinator> = DashMap::new();

        for device in devices {
            if !config.device_enabled(&device) {
                debug!(device_id = %device.device_id, "device disabled by entry selection");
                continue;
            }

            let coordinator =
                Coordinator::new(Arc::clone(&client), device.clone(), config.coordinator.clone());

            // First refresh up-front so entities start with real data.
            if let Err(e) = coordinator.refresh().await {
                cancel.cancel();
                for entry in coordinators.iter() {
                    entry.value().shutdown();
                }
                return Err(match e {
                    CoreError::AuthFailed { .. } => e,
                    other => CoreError::SetupFailed {
                        message: other.to_string(),
                    },
                });
            }

            handles.push(coordinator.spawn());
            coordinators.insert(device.device_id.clone(), coordinator);
        }

        info!(devices = coordinators.len(), "entry setup complete");
        Ok(Self {
            client,
            coordinators,
            cancel,
            handles: Mutex::new(handles),
        })
    }

    /// Tear the entry down: cancel every background task cooperatively
    /// and wait for them to finish. In-flight requests are abandoned.
    pub async fn unload(&self) {
        self.cancel.cancel();
        for entry in self.coordinators.iter() {
            entry.value().shutdown();
        }

        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("entry unloaded");
    }

    /// The shared API client.
    pub fn client(&self) -> &Arc<HomeComClient> {
        &self.client
    }

    /// Look up one device's coordinator.
    pub fn coordinator(&self, device_id: &str) -> Option<Coordinator> {
        self.coordinators.get(device_id).map(|c| c.value().clone())
    }

    /// All coordinators (clones of the cheap handles).
    pub fn coordinators(&self) -> Vec<Coordinator> {
        self.coordinators.iter().map(|c| c.value().clone()).collect()
    }

    fn require(&self, device_id: &str) -> Result<Coordinator, CoreError> {
        self.coordinator(device_id)
            .ok_or_else(|| CoreError::DeviceNotFound {
                device_id: device_id.to_owned(),
            })
    }

    // ── Custom host actions ──────────────────────────────────────────

    /// Change one temp level's setpoint on a DHW circuit.
    pub async fn set_dhw_temperature(
        &self,
        device_id: &str,
        circuit: &str,
        level: &str,
        temperature: f64,
    ) -> Result<(), CoreError> {
        self.require(device_id)?
            .execute(Command::SetDhwTempLevelSetpoint {
                circuit: circuit.to_owned(),
                level: level.to_owned(),
                temperature,
            })
            .await
    }

    /// Start or stop an extra-hot-water charge, optionally setting the
    /// charge duration first when starting.
    pub async fn set_dhw_extra_hot_water(
        &self,
        device_id: &str,
        circuit: &str,
        mode: ChargeMode,
        duration_minutes: Option<u32>,
    ) -> Result<(), CoreError> {
        let coordinator = self.require(device_id)?;

        if mode == ChargeMode::Start {
            if let Some(minutes) = duration_minutes {
                let (path, value) = Command::SetDhwChargeDuration {
                    circuit: circuit.to_owned(),
                    minutes,
                }
                .request();
                self.client
                    .put_value(device_id, &path, value)
                    .await
                    .map_err(command_error)?;
            }
        }

        coordinator
            .execute(Command::SetDhwCharge {
                circuit: circuit.to_owned(),
                mode,
            })
            .await
    }

    /// Free-form GET passthrough for diagnostics.
    pub async fn get_custom_path(
        &self,
        device_id: &str,
        path: &str,
    ) -> Result<Value, CoreError> {
        self.require(device_id)?;
        self.client
            .get_raw(device_id, path)
            .await
            .map_err(CoreError::from)
    }
}

/// Forward every rotated token pair to the host's store.
fn spawn_persistence(
    session: &Arc<OAuthSession>,
    store: Arc<dyn TokenStore>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut rotations = session.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = rotations.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let pair = rotations.borrow_and_update().clone();
                    store.persist(&pair);
                    debug!("persisted rotated token pair");
                }
            }
        }
    })
}

fn setup_error(err: ApiError) -> CoreError {
    if err.is_auth_expired() {
        CoreError::AuthFailed {
            message: err.to_string(),
        }
    } else {
        CoreError::SetupFailed {
            message: err.to_string(),
        }
    }
}

fn command_error(err: ApiError) -> CoreError {
    match err {
        ApiError::Api { status, body, .. } => CoreError::CommandRejected {
            status,
            message: body,
        },
        other => other.into(),
    }
}
