//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the engine core and the outside world.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod event_bus;
pub mod snapshot_store;

pub use event_bus::EventPublisher;
pub use snapshot_store::SnapshotStore;
