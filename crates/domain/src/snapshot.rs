//! Persistence-boundary snapshot types and installation import/export.
//!
//! The engine never persists anything itself: callers pull an
//! [`InstallationSnapshot`] on save and push one back on load. Import is
//! defensive — a snapshot with non-contiguous or colliding ids, dangling
//! wires, or an inconsistent `nextId` counter is repaired, never rejected.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceKind};
use crate::id::{DeviceId, RoomId};
use crate::installation::{DEFAULT_TEMPERATURE, Installation};
use crate::room::Room;

/// Serialized form of a whole installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstallationSnapshot {
    pub rooms: BTreeMap<RoomId, RoomSnapshot>,
    pub next_id: u64,
    pub temperature: i32,
}

impl Default for InstallationSnapshot {
    fn default() -> Self {
        Self {
            rooms: BTreeMap::new(),
            next_id: 1,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// One room's devices and wires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSnapshot {
    pub devices: Vec<DeviceSnapshot>,
    pub wires: Vec<WireSnapshot>,
}

/// Serialized device state.
///
/// Only `kind` is required; every other field falls back to a safe default
/// (`connected = true`, `powered_on = false`, position at the origin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    #[serde(default)]
    pub id: u64,
    pub kind: DeviceKind,
    #[serde(default = "default_true")]
    pub connected: bool,
    #[serde(default)]
    pub powered_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armed: Option<bool>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// Serialized undirected wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSnapshot {
    pub origin_id: u64,
    pub dest_id: u64,
}

fn default_true() -> bool {
    true
}

impl From<&Device> for DeviceSnapshot {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.get(),
            kind: device.kind,
            connected: device.connected,
            powered_on: device.powered_on,
            armed: device.armed,
            x: device.x,
            y: device.y,
        }
    }
}

impl Installation {
    /// Export the full installation state.
    #[must_use]
    pub fn to_snapshot(&self) -> InstallationSnapshot {
        let rooms = self
            .rooms()
            .map(|room| {
                let devices = room.devices().map(DeviceSnapshot::from).collect();
                let wires = room
                    .wires()
                    .map(|wire| {
                        let (a, b) = wire.endpoints();
                        WireSnapshot {
                            origin_id: a.get(),
                            dest_id: b.get(),
                        }
                    })
                    .collect();
                (room.id().clone(), RoomSnapshot { devices, wires })
            })
            .collect();
        InstallationSnapshot {
            rooms,
            next_id: self.next_id().get(),
            temperature: self.temperature(),
        }
    }

    /// Rebuild an installation from a snapshot, repairing anything that
    /// violates the domain invariants instead of failing the load:
    ///
    /// - non-positive or duplicate device ids are reassigned past the
    ///   largest id seen
    /// - `powered_on` is cleared on disconnected devices, `armed` on
    ///   unpowered sensors; stray arming state on non-sensors is dropped
    /// - a second voltage source in one room is skipped
    /// - wires with a missing endpoint or identical endpoints are skipped
    /// - the id counter resumes one past the largest id when the persisted
    ///   counter lags behind it
    #[must_use]
    pub fn from_snapshot(snapshot: &InstallationSnapshot) -> Self {
        let mut max_id: u64 = snapshot
            .rooms
            .values()
            .flat_map(|room| &room.devices)
            .map(|device| device.id)
            .max()
            .unwrap_or(0);

        let mut installation = Self::new();
        installation.set_temperature(snapshot.temperature);

        let mut seen: BTreeSet<u64> = BTreeSet::new();
        for (room_id, room_snapshot) in &snapshot.rooms {
            if room_id.as_str().is_empty() {
                continue;
            }
            let mut room = Room::new(room_id.clone());

            for device_snapshot in &room_snapshot.devices {
                let raw = if device_snapshot.id == 0 || seen.contains(&device_snapshot.id) {
                    max_id = max_id.saturating_add(1);
                    max_id
                } else {
                    device_snapshot.id
                };
                let Some(id) = DeviceId::new(raw) else {
                    continue;
                };
                seen.insert(raw);

                let connected = device_snapshot.connected;
                let powered_on = device_snapshot.powered_on && connected;
                let armed = (device_snapshot.kind == DeviceKind::MotionSensor)
                    .then(|| device_snapshot.armed.unwrap_or(false) && powered_on);
                let device = Device {
                    id,
                    kind: device_snapshot.kind,
                    connected,
                    powered_on,
                    armed,
                    x: device_snapshot.x,
                    y: device_snapshot.y,
                };
                // Second source in a room: drop it.
                let _ = room.insert_device(device);
            }

            for wire in &room_snapshot.wires {
                let (Some(a), Some(b)) = (
                    DeviceId::new(wire.origin_id),
                    DeviceId::new(wire.dest_id),
                ) else {
                    continue;
                };
                // Self-loops and dangling endpoints are rejected by the room.
                let _ = room.connect(a, b);
            }

            if let Ok(slot) = installation.ensure_room(room_id) {
                *slot = room;
            }
        }

        let resumed = snapshot.next_id.max(max_id.saturating_add(1));
        if let Some(next_id) = DeviceId::new(resumed) {
            installation.advance_next_id(next_id);
        }
        installation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> DeviceId {
        DeviceId::new(raw).unwrap()
    }

    fn chain_snapshot() -> InstallationSnapshot {
        // Source 1 — lamp 2 — bulb 3, source switched on.
        serde_json::from_value(serde_json::json!({
            "rooms": {
                "kitchen": {
                    "devices": [
                        {"id": 1, "kind": "VoltageSource", "poweredOn": true},
                        {"id": 2, "kind": "Lamp", "poweredOn": true},
                        {"id": 3, "kind": "Bulb", "poweredOn": true},
                    ],
                    "wires": [
                        {"originId": 1, "destId": 2},
                        {"originId": 2, "destId": 3},
                    ],
                },
            },
            "nextId": 4,
            "temperature": 25,
        }))
        .unwrap()
    }

    #[test]
    fn should_roundtrip_an_installation() {
        let installation = Installation::from_snapshot(&chain_snapshot());
        let exported = installation.to_snapshot();
        assert_eq!(exported, chain_snapshot());

        let reimported = Installation::from_snapshot(&exported);
        assert_eq!(reimported, installation);
    }

    #[test]
    fn should_default_missing_fields() {
        let snapshot: InstallationSnapshot = serde_json::from_value(serde_json::json!({
            "rooms": {"bedroom": {"devices": [{"kind": "Lamp"}]}},
        }))
        .unwrap();
        let device = &snapshot.rooms[&RoomId::new("bedroom")].devices[0];
        assert_eq!(device.id, 0);
        assert!(device.connected);
        assert!(!device.powered_on);
        assert_eq!((device.x, device.y), (0, 0));
        assert_eq!(snapshot.next_id, 1);
        assert_eq!(snapshot.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn should_reassign_zero_and_duplicate_ids() {
        let snapshot: InstallationSnapshot = serde_json::from_value(serde_json::json!({
            "rooms": {
                "kitchen": {
                    "devices": [
                        {"id": 0, "kind": "Lamp"},
                        {"id": 5, "kind": "Bulb"},
                        {"id": 5, "kind": "Radio"},
                    ],
                },
            },
        }))
        .unwrap();

        let installation = Installation::from_snapshot(&snapshot);
        let room = installation.room(&RoomId::new("kitchen")).unwrap();
        assert_eq!(room.device_count(), 3);
        let ids: Vec<u64> = room.devices().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![5, 6, 7]);
        assert_eq!(installation.next_id().get(), 8);
    }

    #[test]
    fn should_drop_dangling_and_self_loop_wires() {
        let snapshot: InstallationSnapshot = serde_json::from_value(serde_json::json!({
            "rooms": {
                "kitchen": {
                    "devices": [
                        {"id": 1, "kind": "Lamp"},
                        {"id": 2, "kind": "Bulb"},
                    ],
                    "wires": [
                        {"originId": 1, "destId": 2},
                        {"originId": 1, "destId": 1},
                        {"originId": 2, "destId": 9},
                    ],
                },
            },
        }))
        .unwrap();

        let installation = Installation::from_snapshot(&snapshot);
        let room = installation.room(&RoomId::new("kitchen")).unwrap();
        assert_eq!(room.wire_count(), 1);
        assert_eq!(room.neighbors(id(1)), BTreeSet::from([id(2)]));
    }

    #[test]
    fn should_skip_second_source_in_a_room() {
        let snapshot: InstallationSnapshot = serde_json::from_value(serde_json::json!({
            "rooms": {
                "kitchen": {
                    "devices": [
                        {"id": 1, "kind": "VoltageSource"},
                        {"id": 2, "kind": "VoltageSource"},
                    ],
                },
            },
        }))
        .unwrap();

        let installation = Installation::from_snapshot(&snapshot);
        let room = installation.room(&RoomId::new("kitchen")).unwrap();
        assert_eq!(room.device_count(), 1);
        assert_eq!(room.source().unwrap().id, id(1));
    }

    #[test]
    fn should_clamp_state_to_invariants() {
        let snapshot: InstallationSnapshot = serde_json::from_value(serde_json::json!({
            "rooms": {
                "kitchen": {
                    "devices": [
                        {"id": 1, "kind": "Lamp", "connected": false, "poweredOn": true},
                        {"id": 2, "kind": "MotionSensor", "poweredOn": false, "armed": true},
                        {"id": 3, "kind": "Tv", "armed": true},
                    ],
                },
            },
        }))
        .unwrap();

        let installation = Installation::from_snapshot(&snapshot);
        let room = installation.room(&RoomId::new("kitchen")).unwrap();
        for device in room.devices() {
            device.validate().unwrap();
        }
        assert!(!room.device(id(1)).unwrap().powered_on);
        assert_eq!(room.device(id(2)).unwrap().armed, Some(false));
        assert_eq!(room.device(id(3)).unwrap().armed, None);
    }

    #[test]
    fn should_recompute_next_id_when_counter_lags() {
        let snapshot: InstallationSnapshot = serde_json::from_value(serde_json::json!({
            "rooms": {"kitchen": {"devices": [{"id": 9, "kind": "Lamp"}]}},
            "nextId": 2,
        }))
        .unwrap();

        let installation = Installation::from_snapshot(&snapshot);
        assert_eq!(installation.next_id().get(), 10);
    }

    #[test]
    fn should_accept_unordered_non_contiguous_ids() {
        let snapshot: InstallationSnapshot = serde_json::from_value(serde_json::json!({
            "rooms": {
                "kitchen": {
                    "devices": [
                        {"id": 40, "kind": "Bulb"},
                        {"id": 7, "kind": "Lamp"},
                    ],
                    "wires": [{"originId": 40, "destId": 7}],
                },
            },
            "nextId": 41,
        }))
        .unwrap();

        let installation = Installation::from_snapshot(&snapshot);
        let room = installation.room(&RoomId::new("kitchen")).unwrap();
        assert_eq!(room.device_count(), 2);
        assert_eq!(room.wire_count(), 1);
        assert_eq!(installation.next_id().get(), 41);
    }
}
