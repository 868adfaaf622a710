//! # FFF Federation Provider
//!
//! Implements `FederationSource` for the French football federation's public
//! data API (`api-dofa.fff.fr`).
//!
//! ## Overview
//!
//! This crate provides:
//! - Endpoint building for club, team, engagement, match and standings data
//! - Normalization of the API's inconsistent collection envelopes
//! - Page following with a configurable page cap
//! - Fan-out over the club's engagements for matches and standings

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{FffConnector, FffSettings};
pub use error::{FffError, Result};
