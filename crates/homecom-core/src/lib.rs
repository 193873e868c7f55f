// homecom-core: Reactive data layer between homecom-api and host integrations.

pub mod command;
pub mod context;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod model;
pub mod normalize;
pub mod projection;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{ChargeMode, Command, FanSpeed, HvacMode};
pub use context::{EntryConfig, EntryContext, TokenStore};
pub use coordinator::{Coordinator, CoordinatorConfig};
pub use entity::{ProjectedEntity, entities_for};
pub use error::CoreError;
pub use projection::{FieldProjection, Platform, ProjectedState, Render, Source, projections};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AcData, BoilerData, Circuit, DeviceSnapshot, FieldValue, HeatSources, HotWaterData, RefField,
    RefMap, SnapshotData,
};

// Wire types consumers need when wiring up a session.
pub use homecom_api::{Credentials, Device, DeviceType, Notification};
