//! Workspace placeholder crate.
//!
//! This crate exists to expose a single feature flag that maps to the
//! workspace crates (`core-service` and the native bridge it wires in).
//! Host applications can depend on `club-sync-workspace` and enable the
//! `native` feature without wiring each crate individually.

#[cfg(feature = "native")]
pub use core_service::*;
