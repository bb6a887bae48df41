//! Engine events — typed records published on the in-process bus.
//!
//! The presentation layer subscribes to drive visuals and audio: a
//! `PowerChanged` for an audible appliance starts or stops playback, an
//! `AlarmTriggered` plays the siren. Each transition is published exactly
//! once.

use serde::Serialize;

use crate::device::DeviceKind;
use crate::id::{DeviceId, RoomId};
use crate::time::{Timestamp, now};

/// An event published by the engine, stamped at creation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub at: Timestamp,
    #[serde(flatten)]
    pub data: EventData,
}

impl Event {
    /// Stamp `data` with the current time.
    #[must_use]
    pub fn new(data: EventData) -> Self {
        Self { at: now(), data }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventData {
    DeviceAdded {
        room: RoomId,
        device: DeviceId,
        kind: DeviceKind,
    },
    DeviceRemoved {
        room: RoomId,
        device: DeviceId,
        kind: DeviceKind,
    },
    WireConnected {
        room: RoomId,
        origin: DeviceId,
        dest: DeviceId,
    },
    WireDisconnected {
        room: RoomId,
        origin: DeviceId,
        dest: DeviceId,
    },
    /// Propagation flipped a device's `powered_on` flag.
    PowerChanged {
        room: RoomId,
        device: DeviceId,
        kind: DeviceKind,
        powered_on: bool,
    },
    /// A connect closed a loop in the room's wiring.
    ClosedCircuit { room: RoomId },
    /// A motion sensor became powered and its arming delay started.
    SensorArming { room: RoomId, device: DeviceId },
    /// The arming delay elapsed with power still present.
    SensorArmed { room: RoomId, device: DeviceId },
    SensorDisarmed { room: RoomId, device: DeviceId },
    /// A user interaction happened in a room with an armed motion sensor.
    AlarmTriggered { room: RoomId },
    HeatAlarmChanged { active: bool },
    TemperatureChanged { celsius: i32 },
}
