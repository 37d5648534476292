//! Order domain types for the Atelier back office.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{BoutiqueId, CustomerId, OrderId};
use super::status::OrderStatus;

/// Condensed customer info attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    /// Customer ID.
    pub id: CustomerId,
    /// Display name (e.g., "Jamie Moreau").
    pub display_name: String,
}

/// Condensed boutique info attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoutiqueSummary {
    /// Boutique ID.
    pub id: BoutiqueId,
    /// Boutique name (e.g., "Atelier Marais").
    pub name: String,
}

/// An order as seen by the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Total price. Absent on some legacy orders; treated as zero for
    /// aggregation.
    #[serde(default)]
    pub total_price: Option<Decimal>,
    /// Order status.
    pub status: OrderStatus,
    /// Creation timestamp.
    pub date_created: DateTime<Utc>,
    /// Customer summary.
    #[serde(default)]
    pub customer: Option<CustomerSummary>,
    /// Boutique summary.
    #[serde(default)]
    pub boutique: Option<BoutiqueSummary>,
}

impl Order {
    /// Total price, with absent values treated as zero.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.total_price.unwrap_or_default()
    }

    /// Best-available customer label: display name, falling back to the
    /// order ID when no customer is attached.
    #[must_use]
    pub fn customer_label(&self) -> &str {
        self.customer
            .as_ref()
            .map_or(self.id.as_str(), |c| c.display_name.as_str())
    }

    /// Boutique name, falling back to a generic label.
    #[must_use]
    pub fn boutique_label(&self) -> &str {
        self.boutique.as_ref().map_or("the boutique", |b| b.name.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order {
            id: OrderId::new("o-1"),
            total_price: Some(Decimal::new(12_50, 2)),
            status: OrderStatus::Pending,
            date_created: Utc::now(),
            customer: Some(CustomerSummary {
                id: CustomerId::new("c-1"),
                display_name: "Jamie Moreau".to_string(),
            }),
            boutique: Some(BoutiqueSummary {
                id: BoutiqueId::new("b-1"),
                name: "Atelier Marais".to_string(),
            }),
        }
    }

    #[test]
    fn test_amount_defaults_to_zero() {
        let mut order = sample_order();
        order.total_price = None;
        assert_eq!(order.amount(), Decimal::ZERO);
    }

    #[test]
    fn test_customer_label_falls_back_to_id() {
        let mut order = sample_order();
        assert_eq!(order.customer_label(), "Jamie Moreau");
        order.customer = None;
        assert_eq!(order.customer_label(), "o-1");
    }

    #[test]
    fn test_order_deserializes_without_optional_fields() {
        let json = r#"{
            "id": "o-9",
            "status": "awaiting_pickup",
            "date_created": "2026-08-30T10:00:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.total_price.is_none());
        assert!(order.customer.is_none());
        assert_eq!(order.status, OrderStatus::Other("awaiting_pickup".into()));
    }
}
