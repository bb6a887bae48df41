//! Installation — the top-level `RoomId → Room` map.
//!
//! Owns the monotonic device-id counter (shared across rooms) and the global
//! temperature. Rooms never reference one another; every cross-room concern
//! (the heat alarm) is evaluated by iterating the map.

use std::collections::BTreeMap;

use crate::error::{CircuitError, NotFoundError, ValidationError};
use crate::id::{DeviceId, RoomId};
use crate::room::Room;

/// Temperature assumed before anyone touches the thermostat, in °C.
pub const DEFAULT_TEMPERATURE: i32 = 25;

/// All rooms of one household plus installation-wide state.
#[derive(Debug, Clone, PartialEq)]
pub struct Installation {
    rooms: BTreeMap<RoomId, Room>,
    next_id: DeviceId,
    temperature: i32,
}

impl Default for Installation {
    fn default() -> Self {
        Self::new()
    }
}

impl Installation {
    /// An empty installation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: BTreeMap::new(),
            next_id: DeviceId::FIRST,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Hand out the next device id. Ids are never reused in a session.
    pub fn allocate_id(&mut self) -> DeviceId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// The id the next allocation will return.
    #[must_use]
    pub fn next_id(&self) -> DeviceId {
        self.next_id
    }

    /// Force the counter forward; ignored when `next_id` is not ahead of
    /// the current counter (the counter never moves backwards).
    pub fn advance_next_id(&mut self, next_id: DeviceId) {
        if next_id > self.next_id {
            self.next_id = next_id;
        }
    }

    /// Look up a room, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRoomName`] for an empty id.
    pub fn ensure_room(&mut self, id: &RoomId) -> Result<&mut Room, CircuitError> {
        if id.as_str().is_empty() {
            return Err(ValidationError::EmptyRoomName.into());
        }
        Ok(self
            .rooms
            .entry(id.clone())
            .or_insert_with(|| Room::new(id.clone())))
    }

    /// Look up an existing room.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no room with `id` exists.
    pub fn room(&self, id: &RoomId) -> Result<&Room, CircuitError> {
        match self.rooms.get(id) {
            Some(room) => Ok(room),
            None => Err(NotFoundError {
                entity: "Room",
                id: id.to_string(),
            }
            .into()),
        }
    }

    /// Mutable room lookup.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no room with `id` exists.
    pub fn room_mut(&mut self, id: &RoomId) -> Result<&mut Room, CircuitError> {
        match self.rooms.get_mut(id) {
            Some(room) => Ok(room),
            None => Err(NotFoundError {
                entity: "Room",
                id: id.to_string(),
            }
            .into()),
        }
    }

    /// Rooms in id order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Mutable iteration over rooms in id order.
    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    /// Current global temperature in °C.
    #[must_use]
    pub fn temperature(&self) -> i32 {
        self.temperature
    }

    pub fn set_temperature(&mut self, celsius: i32) {
        self.temperature = celsius;
    }
}
