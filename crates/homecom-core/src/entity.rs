// ── Generic projected entity ──
//
// The single presentation type behind every platform: a projection row
// bound to a coordinator's snapshot channel. Stateless between updates —
// `state()` recomputes from the latest snapshot, and `changed()` waits
// for the next published cycle. Circuit-scoped projections fan out to
// one entity per circuit discovered in the first snapshot.

use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::coordinator::Coordinator;
use crate::model::DeviceSnapshot;
use crate::projection::{FieldProjection, Platform, ProjectedState, Source, projections, read};

/// One presentation entity, bound 1:1 to a projection table row (and a
/// circuit, for circuit-scoped rows).
pub struct ProjectedEntity {
    unique_id: String,
    name: String,
    circuit: Option<String>,
    projection: &'static FieldProjection,
    receiver: watch::Receiver<Arc<DeviceSnapshot>>,
}

impl ProjectedEntity {
    fn new(
        coordinator: &Coordinator,
        projection: &'static FieldProjection,
        circuit: Option<String>,
    ) -> Self {
        let device_id = coordinator.device_id();
        let (unique_id, name) = match &circuit {
            Some(circuit) => (
                format!("{device_id}-{circuit}-{}", projection.key),
                format!("{circuit}_{}", projection.key),
            ),
            None => (
                format!("{device_id}-{}", projection.key),
                projection.key.to_owned(),
            ),
        };

        Self {
            unique_id,
            name,
            circuit,
            projection,
            receiver: coordinator.subscribe(),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &'static str {
        self.projection.key
    }

    pub fn platform(&self) -> Platform {
        self.projection.platform
    }

    pub fn circuit(&self) -> Option<&str> {
        self.circuit.as_deref()
    }

    /// The display state computed from the latest snapshot.
    pub fn state(&self) -> ProjectedState {
        let snapshot = self.receiver.borrow().clone();
        read(&snapshot, self.projection, self.circuit.as_deref())
    }

    /// Wait for the next published snapshot and return the recomputed
    /// state. `None` once the coordinator is gone.
    pub async fn changed(&mut self) -> Option<ProjectedState> {
        self.receiver.changed().await.ok()?;
        let snapshot = self.receiver.borrow_and_update().clone();
        Some(read(&snapshot, self.projection, self.circuit.as_deref()))
    }

    /// Convert into a `Stream` of states for combinator-style consumers.
    pub fn into_stream(self) -> impl Stream<Item = ProjectedState> {
        let projection = self.projection;
        let circuit = self.circuit;
        WatchStream::new(self.receiver)
            .map(move |snapshot| read(&snapshot, projection, circuit.as_deref()))
    }
}

/// Build the full entity set for a coordinator from its current snapshot.
///
/// Circuit-scoped rows expand to one entity per discovered circuit, the
/// same fan-out the per-circuit selects and sensors had before the
/// projection table. Call after the first refresh so circuits are known.
pub fn entities_for(coordinator: &Coordinator) -> Vec<ProjectedEntity> {
    let snapshot = coordinator.snapshot();
    let mut entities = Vec::new();

    for projection in projections(snapshot.device.device_type) {
        match projection.source {
            Source::Dhw(_) => {
                for circuit in snapshot.dhw_circuits() {
                    entities.push(ProjectedEntity::new(
                        coordinator,
                        projection,
                        Some(circuit.short_id().to_owned()),
                    ));
                }
            }
            Source::Hc(_) => {
                for circuit in snapshot.heating_circuits() {
                    entities.push(ProjectedEntity::new(
                        coordinator,
                        projection,
                        Some(circuit.short_id().to_owned()),
                    ));
                }
            }
            Source::Ventilation(_) => {
                for zone in snapshot.ventilation_zones() {
                    entities.push(ProjectedEntity::new(
                        coordinator,
                        projection,
                        Some(zone.short_id().to_owned()),
                    ));
                }
            }
            _ => entities.push(ProjectedEntity::new(coordinator, projection, None)),
        }
    }

    entities
}
