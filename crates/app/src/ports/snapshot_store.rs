//! Snapshot store port — persistence for installation snapshots.

use std::future::Future;

use homecircuit_domain::error::CircuitError;
use homecircuit_domain::snapshot::InstallationSnapshot;

/// Loads and saves whole-installation snapshots.
///
/// The engine never persists anything on its own; the composition root
/// decides when to pull a snapshot and hand it to the store.
pub trait SnapshotStore {
    /// Load the persisted snapshot, or `None` when nothing was saved yet.
    fn load(&self)
    -> impl Future<Output = Result<Option<InstallationSnapshot>, CircuitError>> + Send;

    /// Persist `snapshot`, replacing any previous one.
    fn save(
        &self,
        snapshot: &InstallationSnapshot,
    ) -> impl Future<Output = Result<(), CircuitError>> + Send;
}

impl<T: SnapshotStore + Send + Sync> SnapshotStore for std::sync::Arc<T> {
    fn load(
        &self,
    ) -> impl Future<Output = Result<Option<InstallationSnapshot>, CircuitError>> + Send {
        (**self).load()
    }

    fn save(
        &self,
        snapshot: &InstallationSnapshot,
    ) -> impl Future<Output = Result<(), CircuitError>> + Send {
        (**self).save(snapshot)
    }
}
