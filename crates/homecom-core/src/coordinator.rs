// ── Per-device polling coordinator ──
//
// One coordinator per enabled device. Each cycle runs the device-type-
// specific fetch plan strictly sequentially, normalizes the bodies into
// one immutable snapshot and publishes it wholesale through a `watch`
// channel. The refresh mutex guarantees at most one in-flight cycle per
// device, covering both the periodic tick and out-of-cycle refreshes
// after commands.
//
// Firmware and notifications change rarely, so they are only re-fetched
// every `full_fetch_cycles`th cycle and their fetch errors degrade to
// the previous value instead of failing the cycle. Everything else in
// the plan fails the cycle with `UpdateFailed`, flipping availability
// until the next successful pass. The single 401 retry lives in the API
// client; the coordinator never loops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use homecom_api::endpoints::{ac, boiler, common};
use homecom_api::{
    Device, DeviceType, Error as ApiError, HomeComClient, Notification, ResourcePayload,
};

use crate::command::Command;
use crate::error::CoreError;
use crate::model::{DeviceSnapshot, FieldValue};
use crate::normalize::{RawBundle, normalize, normalize_firmware, normalize_notifications};

/// How often firmware and notifications are re-fetched, in cycles.
pub const FULL_FETCH_CYCLES: u64 = 72;

/// Default poll interval, matching the vendor app's cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(240);

/// Polling cadence knobs, per configuration entry.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Timer interval between poll cycles.
    pub refresh_interval: Duration,
    /// Firmware/notifications are fetched on every Nth cycle, counting
    /// from the first.
    pub full_fetch_cycles: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            full_fetch_cycles: FULL_FETCH_CYCLES,
        }
    }
}

/// Cheaply cloneable handle to one device's polling loop and latest
/// snapshot.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: Arc<HomeComClient>,
    device: Device,
    config: CoordinatorConfig,
    cycle: Mutex<CycleState>,
    snapshot: watch::Sender<Arc<DeviceSnapshot>>,
    available: watch::Sender<bool>,
    cancel: CancellationToken,
}

/// Mutable per-cycle bookkeeping, guarded by the refresh mutex.
struct CycleState {
    counter: u64,
    firmware: FieldValue,
    notifications: Vec<Notification>,
}

impl Coordinator {
    pub fn new(client: Arc<HomeComClient>, device: Device, config: CoordinatorConfig) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(DeviceSnapshot::empty(device.clone())));
        let (available, _) = watch::channel(false);

        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                device,
                config,
                cycle: Mutex::new(CycleState {
                    counter: 0,
                    firmware: FieldValue::Unknown,
                    notifications: Vec::new(),
                }),
                snapshot,
                available,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    pub fn device_id(&self) -> &str {
        &self.inner.device.device_id
    }

    /// The latest fully assembled snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<DeviceSnapshot> {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot publications.
    pub fn subscribe(&self) -> watch::Receiver<Arc<DeviceSnapshot>> {
        self.inner.snapshot.subscribe()
    }

    /// Subscribe to availability transitions.
    pub fn subscribe_availability(&self) -> watch::Receiver<bool> {
        self.inner.available.subscribe()
    }

    /// Whether the last cycle succeeded.
    pub fn is_available(&self) -> bool {
        *self.inner.available.borrow()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Run one poll cycle and publish the resulting snapshot.
    ///
    /// Serialized per device: a second caller waits for the in-flight
    /// cycle to finish before starting its own.
    pub async fn refresh(&self) -> Result<Arc<DeviceSnapshot>, CoreError> {
        let mut cycle = self.inner.cycle.lock().await;

        match self.run_cycle(&mut cycle).await {
            Ok(snapshot) => {
                self.inner.snapshot.send_replace(Arc::clone(&snapshot));
                self.inner.available.send_replace(true);
                debug!(device_id = %self.device_id(), "refresh complete");
                Ok(snapshot)
            }
            Err(e) => {
                self.inner.available.send_replace(false);
                Err(e)
            }
        }
    }

    /// Out-of-cycle refresh after a command; failures only log because
    /// the command itself already succeeded and the periodic timer will
    /// recover the snapshot.
    pub async fn request_refresh(&self) {
        if let Err(e) = self.refresh().await {
            warn!(device_id = %self.device_id(), error = %e, "post-command refresh failed");
        }
    }

    async fn run_cycle(&self, cycle: &mut CycleState) -> Result<Arc<DeviceSnapshot>, CoreError> {
        if cycle.counter % self.inner.config.full_fetch_cycles == 0 {
            if let Some(payload) = self.fetch_soft(common::FIRMWARE).await? {
                cycle.firmware = normalize_firmware(Some(&payload));
            }
            if let Some(payload) = self.fetch_soft(common::NOTIFICATIONS).await? {
                cycle.notifications = normalize_notifications(Some(&payload));
            }
        }
        cycle.counter += 1;

        let raw = self.fetch_data().await?;
        let data = normalize(self.inner.device.device_type, &raw);

        Ok(Arc::new(DeviceSnapshot {
            device: self.inner.device.clone(),
            firmware: cycle.firmware.clone(),
            notifications: cycle.notifications.clone(),
            data,
        }))
    }

    /// The device-type-specific fetch plan, strictly sequential.
    async fn fetch_data(&self) -> Result<RawBundle, CoreError> {
        let mut raw = RawBundle::default();

        match self.inner.device.device_type {
            DeviceType::Rac => {
                raw.standard_functions = self.fetch_section(ac::STANDARD_FUNCTIONS).await?;
                raw.advanced_functions = self.fetch_section(ac::ADVANCED_FUNCTIONS).await?;
                raw.switch_programs = self.fetch_section(ac::SWITCH_PROGRAMS).await?;
            }
            DeviceType::K30 | DeviceType::K40 | DeviceType::Icom => {
                raw.holiday_mode = self.fetch_section(boiler::HOLIDAY_MODE).await?;
                raw.away_mode = self.fetch_section(boiler::AWAY_MODE).await?;
                raw.power_limitation = self.fetch_section(boiler::POWER_LIMITATION).await?;
                raw.outdoor_temp = self.fetch_section(boiler::OUTDOOR_TEMP).await?;
                raw.heat_sources = self.fetch_section(boiler::HEAT_SOURCES).await?;
                raw.dhw_circuits = self.fetch_section(boiler::DHW_CIRCUITS).await?;
                raw.heating_circuits = self.fetch_section(boiler::HEATING_CIRCUITS).await?;
                raw.ventilation = self.fetch_section(boiler::VENTILATION).await?;
            }
            DeviceType::Wddw2 => {
                raw.dhw_circuits = self.fetch_section(boiler::DHW_CIRCUITS).await?;
            }
            DeviceType::Generic => {}
        }

        Ok(raw)
    }

    /// One data-plan fetch. A 404 means the installation doesn't have
    /// this resource (no ventilation zones, say) — absence, not failure.
    async fn fetch_section(&self, path: &str) -> Result<Option<ResourcePayload>, CoreError> {
        match self.inner.client.get_resource(self.device_id(), path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(ApiError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Firmware/notification fetch: every error except an expired
    /// credential degrades to "keep the previous value".
    async fn fetch_soft(&self, path: &str) -> Result<Option<ResourcePayload>, CoreError> {
        match self.inner.client.get_resource(self.device_id(), path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.is_auth_expired() => Err(e.into()),
            Err(e) => {
                warn!(
                    device_id = %self.device_id(),
                    path,
                    error = %e,
                    "optional fetch failed, keeping previous value"
                );
                Ok(None)
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Issue one command write, then refresh out of cycle so the UI
    /// reflects the change without waiting for the next timer tick.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        let (path, value) = command.request();
        debug!(device_id = %self.device_id(), %path, "executing command");

        match self
            .inner
            .client
            .put_value(self.device_id(), &path, value)
            .await
        {
            Ok(()) => {}
            Err(ApiError::Api { status, body, .. }) => {
                return Err(CoreError::CommandRejected {
                    status,
                    message: body,
                });
            }
            Err(e) => return Err(e.into()),
        }

        self.request_refresh().await;
        Ok(())
    }

    // ── Background task ──────────────────────────────────────────────

    /// Spawn the periodic refresh loop. The caller keeps the handle and
    /// awaits it after [`shutdown`](Self::shutdown).
    pub fn spawn(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(coordinator.inner.config.refresh_interval);
            interval.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    _ = coordinator.inner.cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = coordinator.refresh().await {
                            warn!(
                                device_id = %coordinator.device_id(),
                                error = %e,
                                "periodic refresh failed"
                            );
                        }
                    }
                }
            }
        })
    }

    /// Cancel the periodic loop cooperatively.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }
}
