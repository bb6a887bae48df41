//! File-backed implementation of [`SnapshotStore`].
//!
//! The whole installation lives in one JSON document. Loading is tolerant at
//! the entry level: a device, wire, or room that fails to parse is logged
//! and dropped while the rest of the document survives. Only a document
//! that cannot be parsed as JSON at all is reported as malformed.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use homecircuit_app::ports::SnapshotStore;
use homecircuit_domain::error::{CircuitError, MalformedSnapshotError};
use homecircuit_domain::id::RoomId;
use homecircuit_domain::installation::DEFAULT_TEMPERATURE;
use homecircuit_domain::snapshot::{
    DeviceSnapshot, InstallationSnapshot, RoomSnapshot, WireSnapshot,
};

use crate::error::StorageError;

/// Snapshot store persisting to a single JSON file.
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(
        &self,
    ) -> impl Future<Output = Result<Option<InstallationSnapshot>, CircuitError>> + Send {
        let path = self.path.clone();
        async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(StorageError::from(err).into()),
            };
            let value: Value = serde_json::from_slice(&bytes)
                .map_err(MalformedSnapshotError::new)?;
            Ok(Some(decode_snapshot(value)))
        }
    }

    fn save(
        &self,
        snapshot: &InstallationSnapshot,
    ) -> impl Future<Output = Result<(), CircuitError>> + Send {
        let path = self.path.clone();
        let encoded = serde_json::to_vec_pretty(snapshot).map_err(StorageError::from);
        async move {
            let encoded = encoded?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(StorageError::from)?;
            }
            tokio::fs::write(&path, encoded)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }
}

/// Decode a parsed document entry by entry, dropping whatever fails.
fn decode_snapshot(value: Value) -> InstallationSnapshot {
    let Value::Object(mut root) = value else {
        tracing::warn!("snapshot document is not an object, starting empty");
        return InstallationSnapshot::default();
    };

    let mut snapshot = InstallationSnapshot::default();
    if let Some(next_id) = root.get("nextId").and_then(Value::as_u64) {
        snapshot.next_id = next_id;
    }
    if let Some(temperature) = root.get("temperature").and_then(Value::as_i64) {
        snapshot.temperature =
            i32::try_from(temperature).unwrap_or(DEFAULT_TEMPERATURE);
    }

    let Some(Value::Object(rooms)) = root.remove("rooms") else {
        return snapshot;
    };
    for (name, entry) in rooms {
        let room = decode_room(&name, entry);
        snapshot.rooms.insert(RoomId::new(name), room);
    }
    snapshot
}

fn decode_room(name: &str, entry: Value) -> RoomSnapshot {
    let Value::Object(mut entry) = entry else {
        tracing::warn!(room = name, "room entry is not an object, keeping it empty");
        return RoomSnapshot::default();
    };
    let mut room = RoomSnapshot::default();
    if let Some(Value::Array(devices)) = entry.remove("devices") {
        for device in devices {
            match serde_json::from_value::<DeviceSnapshot>(device) {
                Ok(device) => room.devices.push(device),
                Err(error) => {
                    tracing::warn!(room = name, %error, "skipping malformed device entry");
                }
            }
        }
    }
    if let Some(Value::Array(wires)) = entry.remove("wires") {
        for wire in wires {
            match serde_json::from_value::<WireSnapshot>(wire) {
                Ok(wire) => room.wires.push(wire),
                Err(error) => {
                    tracing::warn!(room = name, %error, "skipping malformed wire entry");
                }
            }
        }
    }
    room
}

#[cfg(test)]
mod tests {
    use super::*;
    use homecircuit_domain::device::DeviceKind;

    fn store_in(dir: &tempfile::TempDir) -> JsonSnapshotStore {
        JsonSnapshotStore::new(dir.path().join("installation.json"))
    }

    fn sample() -> InstallationSnapshot {
        let kitchen = RoomSnapshot {
            devices: vec![
                DeviceSnapshot {
                    id: 1,
                    kind: DeviceKind::VoltageSource,
                    connected: true,
                    powered_on: true,
                    armed: None,
                    x: 10,
                    y: 20,
                },
                DeviceSnapshot {
                    id: 2,
                    kind: DeviceKind::MotionSensor,
                    connected: true,
                    powered_on: true,
                    armed: Some(true),
                    x: 0,
                    y: 0,
                },
            ],
            wires: vec![WireSnapshot {
                origin_id: 1,
                dest_id: 2,
            }],
        };
        InstallationSnapshot {
            rooms: std::collections::BTreeMap::from([(RoomId::new("kitchen"), kitchen)]),
            next_id: 3,
            temperature: 28,
        }
    }

    #[tokio::test]
    async fn should_return_none_when_no_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_roundtrip_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&sample()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn should_create_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("nested/deep/state.json"));

        store.save(&sample()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn should_report_an_unparseable_document_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), b"{ not json").unwrap();

        let result = store.load().await;
        assert!(matches!(result, Err(CircuitError::MalformedSnapshot(_))));
    }

    #[tokio::test]
    async fn should_skip_malformed_entries_and_keep_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            serde_json::json!({
                "rooms": {
                    "kitchen": {
                        "devices": [
                            {"id": 1, "kind": "Lamp"},
                            {"id": 2, "kind": "Hologram"},
                            {"id": 3},
                        ],
                        "wires": [
                            {"originId": 1, "destId": 3},
                            {"originId": "one"},
                        ],
                    },
                    "hallway": 42,
                },
                "nextId": 4,
            })
            .to_string(),
        )
        .unwrap();

        let snapshot = store.load().await.unwrap().unwrap();
        let kitchen = &snapshot.rooms[&RoomId::new("kitchen")];
        assert_eq!(kitchen.devices.len(), 1);
        assert_eq!(kitchen.devices[0].kind, DeviceKind::Lamp);
        assert_eq!(kitchen.wires.len(), 1);
        assert!(snapshot.rooms[&RoomId::new("hallway")].devices.is_empty());
        assert_eq!(snapshot.next_id, 4);
        assert_eq!(snapshot.temperature, DEFAULT_TEMPERATURE);
    }

    #[tokio::test]
    async fn should_start_empty_from_a_non_object_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), b"[1, 2, 3]").unwrap();

        let snapshot = store.load().await.unwrap().unwrap();
        assert_eq!(snapshot, InstallationSnapshot::default());
    }
}
