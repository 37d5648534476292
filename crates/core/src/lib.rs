//! Atelier Core - Shared types library.
//!
//! This crate provides common types used across all Atelier components:
//! - `live` - Realtime order feed (reconciliation, statistics, liveness)
//! - the (out-of-tree) dashboard rendering layer
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no async runtime. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, orders, statuses, and derived statistics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
