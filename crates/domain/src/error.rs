//! Common error types used across the workspace.
//!
//! Every engine error is local and non-fatal: invalid requests are rejected
//! with a typed error and leave state untouched.

use crate::id::{DeviceId, RoomId};

/// Base error enum with typed source errors and `#[from]` conversion.
///
/// Each layer defines its own typed errors and converts via `#[from]`.
#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    /// A second voltage source was requested for a room.
    #[error("duplicate voltage source")]
    DuplicateSource(#[from] DuplicateSourceError),

    /// An operation referenced something that does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A wire request that can never form a valid edge.
    #[error("invalid connection")]
    InvalidConnection(#[from] InvalidConnectionError),

    /// A persisted snapshot could not be read at all.
    #[error("malformed snapshot")]
    MalformedSnapshot(#[from] MalformedSnapshotError),

    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// An adapter-level persistence failure.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// At most one `VoltageSource` may exist per room.
#[derive(Debug, thiserror::Error)]
#[error("room '{room}' already has a voltage source")]
pub struct DuplicateSourceError {
    pub room: RoomId,
}

/// An operation referenced an absent room or device.
#[derive(Debug, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A wire request rejected before touching the graph.
#[derive(Debug, thiserror::Error)]
pub enum InvalidConnectionError {
    /// Both endpoints name the same device.
    #[error("cannot wire device {0} to itself")]
    SelfLoop(DeviceId),

    /// An endpoint id is not present in the room.
    #[error("wire endpoint {0} is not in the room")]
    MissingEndpoint(DeviceId),
}

/// The persisted snapshot was unreadable as a whole.
///
/// Field-level damage never produces this error — the loader substitutes
/// safe defaults per malformed field instead.
#[derive(Debug, thiserror::Error)]
#[error("malformed snapshot")]
pub struct MalformedSnapshotError {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl MalformedSnapshotError {
    /// Wrap the underlying parse or IO failure.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("room name cannot be empty")]
    EmptyRoomName,

    #[error("device id {0} is already in use")]
    DeviceIdInUse(DeviceId),

    #[error("device {0} is powered while disconnected")]
    PoweredWhileDisconnected(DeviceId),

    #[error("motion sensor {0} is armed while unpowered")]
    ArmedWhileUnpowered(DeviceId),

    #[error("device {0} carries arming state but is not a motion sensor")]
    ArmedStateOnNonSensor(DeviceId),
}
