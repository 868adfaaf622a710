//! # Host Bridge Traits
//!
//! Capability traits the sync core depends on but does not implement itself.
//!
//! ## Overview
//!
//! This crate defines the contract between the synchronization core and the
//! outside world. Each trait represents a capability the core requires whose
//! implementation differs between production and tests.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//!
//! ### Remote data
//! - [`FederationSource`](federation::FederationSource) - Club, roster, match and
//!   standings collections of the federation API
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Implementations
//!
//! | Capability        | Implementation Crate |
//! |-------------------|----------------------|
//! | `HttpClient`      | `bridge-native`      |
//! | `FederationSource`| `provider-fff`       |
//! | `Clock`           | this crate (`SystemClock`, `FixedClock`) |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should:
//!
//! - Convert library-specific errors to `BridgeError`
//! - Provide actionable error messages (URL, status code)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared behind `Arc`
//! across async tasks.

pub mod error;
pub mod federation;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use federation::{
    ClubRecord, CompetitionRecord, EngagementRecord, FederationSource, MatchRecord, MemberRecord,
    StandingRecord, TeamRecord, VenueRecord, VenueReference,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use time::{Clock, FixedClock, SystemClock};
