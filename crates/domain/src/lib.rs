//! # homecircuit-domain
//!
//! Pure domain model for the homecircuit household-circuit engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (loads, sensors, the voltage source) and their kinds
//! - Define **Wires** (undirected edges between device ids)
//! - Define **Rooms** (the per-room device graph and its invariants)
//! - Define the **Installation** (room map, id allocator, global temperature)
//! - Define **Events** (typed records published by the engine)
//! - Define **Snapshots** (the persistence-boundary data shape plus
//!   defensive import/export)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod event;
pub mod installation;
pub mod room;
pub mod snapshot;
pub mod wire;
