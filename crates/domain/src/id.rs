//! Typed identifier newtypes for devices and rooms.

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a [`Device`](crate::device::Device).
///
/// Ids are positive integers handed out monotonically by the
/// [`Installation`](crate::installation::Installation); the ids of removed
/// devices are not recycled within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(NonZeroU64);

impl DeviceId {
    /// The first id an installation hands out.
    pub const FIRST: Self = Self(NonZeroU64::MIN);

    /// Wrap a raw integer; `None` when `raw` is zero.
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The id handed out after this one (saturating at the top of the range).
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.checked_add(1).unwrap_or(NonZeroU64::MAX))
    }

    /// Access the raw integer value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NonZeroU64>().map(Self)
    }
}

/// Identifier of a [`Room`](crate::room::Room) — its unique name.
///
/// Rooms are fully isolated from one another; the id is the only handle the
/// engine exposes for them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a room name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The room name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RoomId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_zero_as_device_id() {
        assert!(DeviceId::new(0).is_none());
        assert!(DeviceId::new(1).is_some());
    }

    #[test]
    fn should_increment_monotonically() {
        let first = DeviceId::FIRST;
        let second = first.next();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert!(second > first);
    }

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let id = DeviceId::new(42).unwrap();
        let text = id.to_string();
        let parsed: DeviceId = text.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_return_error_when_parsing_zero() {
        let result: Result<DeviceId, _> = "0".parse();
        assert!(result.is_err());
    }

    #[test]
    fn should_serialize_device_id_as_plain_integer() {
        let id = DeviceId::new(7).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let parsed: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_serialize_room_id_as_plain_string() {
        let room = RoomId::new("living-room");
        let json = serde_json::to_string(&room).unwrap();
        assert_eq!(json, "\"living-room\"");
        let parsed: RoomId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, room);
    }
}
