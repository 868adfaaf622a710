//! # Club Data Store
//!
//! Owns the SQLite database that mirrors the federation's view of one club
//! and exposes read repositories over it.
//!
//! ## Overview
//!
//! This crate manages:
//! - The schema and its embedded migrations
//! - Connection pooling ([`db`])
//! - Row models ([`models`])
//! - Repositories for reads, configuration, run logs and the run lock
//!
//! Writes performed during a sync run live in `core-sync`, which executes
//! them inside a single transaction.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
