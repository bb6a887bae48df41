//! Room — the authoritative per-room store of devices and wires.
//!
//! A room holds no power semantics of its own: it answers graph queries and
//! enforces the structural invariants (one source per room, wires only
//! between present devices, cascade removal).

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::device::{Device, DeviceKind};
use crate::error::{CircuitError, DuplicateSourceError, InvalidConnectionError, NotFoundError};
use crate::id::{DeviceId, RoomId};
use crate::wire::Wire;

/// One room's device graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    id: RoomId,
    devices: BTreeMap<DeviceId, Device>,
    wires: BTreeSet<Wire>,
}

impl Room {
    /// An empty room.
    #[must_use]
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            devices: BTreeMap::new(),
            wires: BTreeSet::new(),
        }
    }

    /// The room's identifier.
    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Create a fresh device of `kind` under the pre-allocated `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateSourceError`] when `kind` is a voltage source and
    /// the room already has one, or a validation error when `id` is taken.
    pub fn add_device(&mut self, id: DeviceId, kind: DeviceKind) -> Result<Device, CircuitError> {
        let device = Device::new(id, kind);
        self.insert_device(device.clone())?;
        Ok(device)
    }

    /// Insert a fully-formed device, enforcing the one-source invariant.
    ///
    /// # Errors
    ///
    /// Same contract as [`add_device`](Self::add_device).
    pub fn insert_device(&mut self, device: Device) -> Result<(), CircuitError> {
        if device.kind.is_source() && self.source().is_some() {
            return Err(DuplicateSourceError {
                room: self.id.clone(),
            }
            .into());
        }
        match self.devices.entry(device.id) {
            Entry::Vacant(slot) => {
                slot.insert(device);
                Ok(())
            }
            Entry::Occupied(_) => {
                Err(crate::error::ValidationError::DeviceIdInUse(device.id).into())
            }
        }
    }

    /// Delete a device and every wire touching it.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no device with `id` exists.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<Device, CircuitError> {
        let device = self.devices.remove(&id).ok_or_else(|| NotFoundError {
            entity: "Device",
            id: id.to_string(),
        })?;
        self.wires.retain(|wire| !wire.touches(id));
        Ok(device)
    }

    /// Insert the undirected wire `a — b`.
    ///
    /// Returns `Ok(true)` when a new wire was inserted and `Ok(false)` when
    /// the wire already existed (in either orientation).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConnectionError`] on a self-loop or when either
    /// endpoint is absent from the room.
    pub fn connect(&mut self, a: DeviceId, b: DeviceId) -> Result<bool, CircuitError> {
        let wire = Wire::between(a, b)?;
        for end in [a, b] {
            if !self.devices.contains_key(&end) {
                return Err(InvalidConnectionError::MissingEndpoint(end).into());
            }
        }
        Ok(self.wires.insert(wire))
    }

    /// Remove the matching undirected wire. Returns whether one was removed.
    pub fn disconnect(&mut self, a: DeviceId, b: DeviceId) -> bool {
        Wire::between(a, b).is_ok_and(|wire| self.wires.remove(&wire))
    }

    /// All ids directly wired to `id`.
    #[must_use]
    pub fn neighbors(&self, id: DeviceId) -> BTreeSet<DeviceId> {
        self.wires
            .iter()
            .filter_map(|wire| wire.other_end(id))
            .collect()
    }

    /// Look up a device.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// Mutable device lookup.
    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(&id)
    }

    /// Devices in ascending id order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Mutable iteration in ascending id order.
    pub fn devices_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.values_mut()
    }

    /// All wires in canonical order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter()
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// The room's voltage source, if one has been placed.
    #[must_use]
    pub fn source(&self) -> Option<&Device> {
        self.devices.values().find(|d| d.kind.is_source())
    }

    /// Ids of sources that are wired in and switched on.
    ///
    /// With the one-source invariant this holds at most one id, but
    /// propagation treats it as a set of traversal roots.
    #[must_use]
    pub fn active_source_ids(&self) -> BTreeSet<DeviceId> {
        self.devices
            .values()
            .filter(|d| d.kind.is_source() && d.connected && d.powered_on)
            .map(|d| d.id)
            .collect()
    }
}
