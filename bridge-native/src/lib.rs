//! # Native Bridge Implementations
//!
//! Production implementations of bridge traits for server and desktop hosts.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (rustls, connection pooling, retry with backoff)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_native::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(30))?;
//! let connector = FffConnector::new(Arc::new(http_client), settings);
//! ```

mod http;

pub use http::ReqwestHttpClient;
