//! Aggregate statistics over the canonical order list.
//!
//! Pure recomputation on every call; nothing is cached. "Today" is the UTC
//! calendar day of the evaluation instant, so results reflect render time,
//! not event time. Around midnight the today figures shift as `now` crosses
//! the day boundary.

use atelier_core::{Order, OrderStatus, Statistics};
use chrono::{DateTime, Utc};

/// Compute derived metrics from the canonical list.
///
/// Calling this twice with the same inputs yields identical results; pass
/// the same `now` to make that hold across the midnight boundary too.
#[must_use]
pub fn compute(orders: &[Order], now: DateTime<Utc>) -> Statistics {
    let today = now.date_naive();
    let mut stats = Statistics {
        total_orders: orders.len(),
        ..Statistics::default()
    };

    for order in orders {
        stats.total_amount += order.amount();
        if order.status.is_open() {
            stats.pending_orders += 1;
        }
        if order.status == OrderStatus::Completed {
            stats.completed_orders += 1;
        }
        if order.date_created.date_naive() == today {
            stats.today_orders += 1;
            stats.today_amount += order.amount();
        }
    }

    stats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::{OrderId, OrderStatus};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn order(id: &str, status: OrderStatus, price: i64, date: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(id),
            total_price: Some(Decimal::new(price, 0)),
            status,
            date_created: date,
            customer: None,
            boutique: None,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_counts_and_sums() {
        let now = fixed_now();
        let yesterday = now - chrono::Duration::days(1);
        let orders = vec![
            order("a", OrderStatus::Pending, 100, now),
            order("b", OrderStatus::Processing, 40, yesterday),
            order("c", OrderStatus::Completed, 60, now),
            order("d", OrderStatus::Cancelled, 10, yesterday),
        ];

        let stats = compute(&orders, now);
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.total_amount, Decimal::new(210, 0));
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.completed_orders, 1);
        assert_eq!(stats.today_orders, 2);
        assert_eq!(stats.today_amount, Decimal::new(160, 0));
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let now = fixed_now();
        let mut priceless = order("a", OrderStatus::Pending, 0, now);
        priceless.total_price = None;
        let stats = compute(&[priceless], now);
        assert_eq!(stats.total_amount, Decimal::ZERO);
        assert_eq!(stats.today_amount, Decimal::ZERO);
        assert_eq!(stats.total_orders, 1);
    }

    #[test]
    fn test_purity() {
        let now = fixed_now();
        let orders = vec![
            order("a", OrderStatus::Pending, 100, now),
            order("b", OrderStatus::Completed, 50, now),
        ];
        assert_eq!(compute(&orders, now), compute(&orders, now));
    }

    #[test]
    fn test_unknown_status_is_neither_pending_nor_completed() {
        let now = fixed_now();
        let orders = vec![order(
            "a",
            OrderStatus::Other("awaiting_pickup".into()),
            25,
            now,
        )];
        let stats = compute(&orders, now);
        assert_eq!(stats.pending_orders, 0);
        assert_eq!(stats.completed_orders, 0);
        assert_eq!(stats.total_amount, Decimal::new(25, 0));
    }
}
