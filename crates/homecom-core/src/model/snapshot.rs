use std::collections::BTreeMap;

use serde::Serialize;

use homecom_api::{Device, DeviceType, Notification};

use super::circuit::{Circuit, HeatSources};
use super::field::{FieldValue, RefField};

/// Flat reference objects keyed by the last segment of their id path.
pub type RefMap = BTreeMap<String, RefField>;

/// One immutable, fully assembled poll-cycle result for a device.
///
/// A snapshot is replaced wholesale each cycle; entities only ever read
/// the latest `Arc<DeviceSnapshot>` reference, so no reader can observe a
/// partially updated cycle.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub device: Device,
    pub firmware: FieldValue,
    pub notifications: Vec<Notification>,
    pub data: SnapshotData,
}

/// Device-type-specific collections.
#[derive(Debug, Clone, Serialize)]
pub enum SnapshotData {
    /// Residential air conditioner (rac).
    Ac(AcData),
    /// Boiler / heat pump (k30, k40, icom).
    Boiler(BoilerData),
    /// Heat-pump water heater (wddw2).
    HotWater(HotWaterData),
    /// Firmware and notifications only.
    Generic,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AcData {
    pub standard_functions: RefMap,
    pub advanced_functions: RefMap,
    pub switch_programs: RefMap,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoilerData {
    pub holiday_mode: RefField,
    pub away_mode: RefField,
    pub power_limitation: RefField,
    pub outdoor_temp: RefField,
    pub heat_sources: HeatSources,
    pub dhw_circuits: Vec<Circuit>,
    pub heating_circuits: Vec<Circuit>,
    pub ventilation: Vec<Circuit>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HotWaterData {
    pub dhw_circuits: Vec<Circuit>,
}

impl SnapshotData {
    /// The empty data shape for a device type, used before the first
    /// successful cycle.
    pub fn empty_for(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::Rac => Self::Ac(AcData::default()),
            DeviceType::K30 | DeviceType::K40 | DeviceType::Icom => {
                Self::Boiler(BoilerData::default())
            }
            DeviceType::Wddw2 => Self::HotWater(HotWaterData::default()),
            DeviceType::Generic => Self::Generic,
        }
    }
}

impl DeviceSnapshot {
    /// Placeholder published before the first refresh completes.
    pub fn empty(device: Device) -> Self {
        let data = SnapshotData::empty_for(device.device_type);
        Self {
            device,
            firmware: FieldValue::Unknown,
            notifications: Vec::new(),
            data,
        }
    }

    // ── Total accessors (fail-soft: misses return the unknown field) ──

    /// Standard-function lookup by id suffix (rac only).
    pub fn standard(&self, key: &str) -> RefField {
        match &self.data {
            SnapshotData::Ac(ac) => ac.standard_functions.get(key).cloned().unwrap_or_default(),
            _ => RefField::unknown(),
        }
    }

    /// Advanced-function lookup by id suffix (rac only).
    pub fn advanced(&self, key: &str) -> RefField {
        match &self.data {
            SnapshotData::Ac(ac) => ac.advanced_functions.get(key).cloned().unwrap_or_default(),
            _ => RefField::unknown(),
        }
    }

    /// Switch-program lookup by id suffix (rac only).
    pub fn switch_program(&self, key: &str) -> RefField {
        match &self.data {
            SnapshotData::Ac(ac) => ac.switch_programs.get(key).cloned().unwrap_or_default(),
            _ => RefField::unknown(),
        }
    }

    /// DHW circuits for boiler and hot-water devices; empty otherwise.
    pub fn dhw_circuits(&self) -> &[Circuit] {
        match &self.data {
            SnapshotData::Boiler(b) => &b.dhw_circuits,
            SnapshotData::HotWater(w) => &w.dhw_circuits,
            _ => &[],
        }
    }

    pub fn heating_circuits(&self) -> &[Circuit] {
        match &self.data {
            SnapshotData::Boiler(b) => &b.heating_circuits,
            _ => &[],
        }
    }

    pub fn ventilation_zones(&self) -> &[Circuit] {
        match &self.data {
            SnapshotData::Boiler(b) => &b.ventilation,
            _ => &[],
        }
    }

    /// Find a circuit (any family) by its short id.
    pub fn dhw_circuit(&self, short_id: &str) -> Option<&Circuit> {
        self.dhw_circuits().iter().find(|c| c.short_id() == short_id)
    }

    pub fn heating_circuit(&self, short_id: &str) -> Option<&Circuit> {
        self.heating_circuits()
            .iter()
            .find(|c| c.short_id() == short_id)
    }

    pub fn ventilation_zone(&self, short_id: &str) -> Option<&Circuit> {
        self.ventilation_zones()
            .iter()
            .find(|c| c.short_id() == short_id)
    }

    pub fn heat_sources(&self) -> Option<&HeatSources> {
        match &self.data {
            SnapshotData::Boiler(b) => Some(&b.heat_sources),
            _ => None,
        }
    }

    pub fn outdoor_temp(&self) -> RefField {
        match &self.data {
            SnapshotData::Boiler(b) => b.outdoor_temp.clone(),
            _ => RefField::unknown(),
        }
    }

    pub fn holiday_mode(&self) -> RefField {
        match &self.data {
            SnapshotData::Boiler(b) => b.holiday_mode.clone(),
            _ => RefField::unknown(),
        }
    }

    pub fn away_mode(&self) -> RefField {
        match &self.data {
            SnapshotData::Boiler(b) => b.away_mode.clone(),
            _ => RefField::unknown(),
        }
    }

    pub fn power_limitation(&self) -> RefField {
        match &self.data {
            SnapshotData::Boiler(b) => b.power_limitation.clone(),
            _ => RefField::unknown(),
        }
    }

    /// Notification display state: `"{dcd}-{ccd}"` per entry, one per
    /// line, skipping entries missing either code.
    pub fn notifications_display(&self) -> String {
        self.notifications
            .iter()
            .filter_map(|n| match (&n.dcd, &n.ccd) {
                (Some(dcd), Some(ccd)) => Some(format!("{dcd}-{ccd}")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(device_type: DeviceType) -> Device {
        Device {
            device_id: "123456789".into(),
            device_type,
        }
    }

    #[test]
    fn empty_snapshot_matches_device_type() {
        let snap = DeviceSnapshot::empty(device(DeviceType::Rac));
        assert!(matches!(snap.data, SnapshotData::Ac(_)));

        let snap = DeviceSnapshot::empty(device(DeviceType::Icom));
        assert!(matches!(snap.data, SnapshotData::Boiler(_)));

        let snap = DeviceSnapshot::empty(device(DeviceType::Wddw2));
        assert!(matches!(snap.data, SnapshotData::HotWater(_)));
    }

    #[test]
    fn accessors_are_total_on_empty_data() {
        let snap = DeviceSnapshot::empty(device(DeviceType::Generic));
        assert!(snap.standard("temperatureSetpoint").value.is_unknown());
        assert!(snap.dhw_circuits().is_empty());
        assert!(snap.outdoor_temp().value.is_unknown());
        assert_eq!(snap.notifications_display(), "");
    }

    #[test]
    fn notifications_join_dcd_and_ccd() {
        let mut snap = DeviceSnapshot::empty(device(DeviceType::K40));
        snap.notifications = vec![
            Notification {
                dcd: Some("E1".into()),
                ccd: Some("02".into()),
                ..Notification::default()
            },
            Notification {
                dcd: Some("A7".into()),
                ccd: None,
                ..Notification::default()
            },
        ];
        assert_eq!(snap.notifications_display(), "E1-02");
    }
}
