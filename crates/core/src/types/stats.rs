//! Aggregate statistics derived from the canonical order list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived order metrics. Never mutated independently; always recomputed
/// from the canonical list by the live feed's statistics aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Total number of orders in the list.
    pub total_orders: usize,
    /// Sum of all order amounts (absent prices count as zero).
    pub total_amount: Decimal,
    /// Orders with status pending or processing.
    pub pending_orders: usize,
    /// Orders with status completed.
    pub completed_orders: usize,
    /// Orders created on the same calendar day as the evaluation instant.
    pub today_orders: usize,
    /// Amount of orders created on the same calendar day as the evaluation
    /// instant.
    pub today_amount: Decimal,
}
