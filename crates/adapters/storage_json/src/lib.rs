//! # homecircuit-adapter-storage-json
//!
//! JSON file persistence adapter.
//!
//! ## Responsibilities
//! - Implement the `SnapshotStore` port defined in `homecircuit-app::ports`
//! - Store the whole installation as one pretty-printed JSON document
//! - Tolerate damaged documents: a malformed device, wire, or room entry is
//!   logged and skipped, only an unreadable document is an error
//!
//! ## Dependency rule
//! Depends on `homecircuit-app` (for the port trait) and
//! `homecircuit-domain` (for snapshot types). The `app` and `domain` crates
//! must never reference this adapter.

pub mod error;
pub mod store;

pub use store::JsonSnapshotStore;
