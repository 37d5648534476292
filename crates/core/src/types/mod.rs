//! Core types for Atelier.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order;
pub mod stats;
pub mod status;

pub use id::*;
pub use order::{BoutiqueSummary, CustomerSummary, Order};
pub use stats::Statistics;
pub use status::OrderStatus;
