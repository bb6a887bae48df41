//! # homecircuit-app
//!
//! Application layer — the circuit engine and its **port definitions**.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `SnapshotStore` — load & save installation snapshots
//!   - `EventPublisher` — fan out engine events
//! - Provide the **driving port**: [`engine::CircuitEngine`], the single
//!   entry point for every mutation and query on the installation
//! - Own the pure graph algorithms (power propagation, cycle detection) and
//!   the motion-sensor arming scheduler
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `homecircuit-domain` only (plus `tokio::sync`/`tokio::time`
//! for channels and timers). Never imports adapter crates. Adapters depend
//! on *this* crate, not the reverse.

pub mod cycle;
pub mod engine;
pub mod event_bus;
pub mod ports;
pub mod power;
pub mod sensors;
