// ── Normalized domain model ──
//
// Every type in this module is the post-normalization representation of
// vendor data: lookups are total (missing data yields the `unknown`
// sentinel, never an error) and all collections are immutable once a
// snapshot is assembled.

mod circuit;
mod field;
mod snapshot;

pub use circuit::{Circuit, HeatSources};
pub use field::{FieldValue, RefField, UNKNOWN};
pub use snapshot::{AcData, BoilerData, DeviceSnapshot, HotWaterData, RefMap, SnapshotData};
