//! Reconciliation of mutation events into the canonical order list.
//!
//! The merge itself is pure: applying an event mutates the list and returns
//! an [`OrderEffect`] describing the user-visible side effect to fire, or
//! `None` for no-ops. The effect runner lives in [`crate::notify`], so this
//! module is unit-testable without UI or audio collaborators.

use atelier_core::{Order, OrderId};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::event::{MutationEvent, MutationKind};

/// What user-visible side effect a successfully applied event calls for.
///
/// Descriptors carry pre-extracted display data so the effect runner never
/// needs to look back into the canonical list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEffect {
    /// A new order landed at the front of the list.
    Created {
        /// Order ID.
        id: OrderId,
        /// Customer display name (order ID when no customer is attached).
        customer: String,
        /// Boutique name.
        boutique: String,
        /// Order amount (zero when absent).
        amount: Decimal,
    },
    /// An existing order was replaced in place.
    Updated {
        /// Order ID.
        id: OrderId,
        /// Customer display name or order ID.
        customer: String,
    },
    /// An order was removed.
    Deleted {
        /// Order ID.
        id: OrderId,
    },
}

/// The single in-memory source of truth for the order list.
///
/// Ordered sequence of orders, unique by id. Insertion order is newest
/// create first, otherwise initial snapshot order; updates and deletes never
/// re-sort surviving entries.
#[derive(Debug, Clone, Default)]
pub struct CanonicalOrderList {
    orders: Vec<Order>,
}

impl CanonicalOrderList {
    /// Empty list, as created when a feed is spawned.
    #[must_use]
    pub const fn new() -> Self {
        Self { orders: Vec::new() }
    }

    /// Initialize from a resolved snapshot, preserving snapshot order.
    ///
    /// Duplicate ids in the snapshot keep their first occurrence; the backend
    /// should never send them, so each duplicate is logged.
    #[must_use]
    pub fn from_snapshot(snapshot: Vec<Order>) -> Self {
        let mut orders: Vec<Order> = Vec::with_capacity(snapshot.len());
        for order in snapshot {
            if orders.iter().any(|o| o.id == order.id) {
                warn!(order_id = %order.id, "duplicate id in snapshot, keeping first");
            } else {
                orders.push(order);
            }
        }
        Self { orders }
    }

    /// Number of orders in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// The orders, in canonical order.
    #[must_use]
    pub fn as_slice(&self) -> &[Order] {
        &self.orders
    }

    /// Clone the orders out, in canonical order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Order> {
        self.orders.clone()
    }

    fn position(&self, id: &OrderId) -> Option<usize> {
        self.orders.iter().position(|o| &o.id == id)
    }

    /// Merge one mutation event into the list.
    ///
    /// Exactly one event is processed per call, and a non-no-op apply yields
    /// exactly one effect descriptor:
    ///
    /// - create: prepend; a duplicate id is a no-op (idempotent against
    ///   duplicate delivery)
    /// - update: replace in place, index preserved; unknown ids are dropped
    /// - delete: remove; absent ids are a no-op
    ///
    /// Malformed events (create/update without a payload, or whose payload
    /// id disagrees with the envelope id) are dropped and logged, never
    /// surfaced as errors.
    pub fn apply(&mut self, event: MutationEvent) -> Option<OrderEffect> {
        match event.kind {
            MutationKind::Create => {
                let Some(order) = event.payload else {
                    warn!(order_id = %event.id, "dropping create event without payload");
                    return None;
                };
                if order.id != event.id {
                    warn!(
                        order_id = %event.id,
                        payload_id = %order.id,
                        "dropping create event with mismatched payload id"
                    );
                    return None;
                }
                if self.position(&event.id).is_some() {
                    debug!(order_id = %event.id, "duplicate create, already present");
                    return None;
                }
                let effect = OrderEffect::Created {
                    id: order.id.clone(),
                    customer: order.customer_label().to_string(),
                    boutique: order.boutique_label().to_string(),
                    amount: order.amount(),
                };
                self.orders.insert(0, order);
                Some(effect)
            }
            MutationKind::Update => {
                let Some(order) = event.payload else {
                    warn!(order_id = %event.id, "dropping update event without payload");
                    return None;
                };
                if order.id != event.id {
                    warn!(
                        order_id = %event.id,
                        payload_id = %order.id,
                        "dropping update event with mismatched payload id"
                    );
                    return None;
                }
                let Some(index) = self.position(&event.id) else {
                    warn!(order_id = %event.id, "dropping update for unknown order");
                    return None;
                };
                let effect = OrderEffect::Updated {
                    id: order.id.clone(),
                    customer: order.customer_label().to_string(),
                };
                if let Some(slot) = self.orders.get_mut(index) {
                    *slot = order;
                }
                Some(effect)
            }
            MutationKind::Delete => {
                let Some(index) = self.position(&event.id) else {
                    debug!(order_id = %event.id, "delete for absent order, no-op");
                    return None;
                };
                self.orders.remove(index);
                Some(OrderEffect::Deleted { id: event.id })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use atelier_core::{CustomerSummary, OrderStatus};
    use chrono::Utc;

    use super::*;

    fn order(id: &str) -> Order {
        Order {
            id: OrderId::new(id),
            total_price: Some(Decimal::new(100, 0)),
            status: OrderStatus::Pending,
            date_created: Utc::now(),
            customer: Some(CustomerSummary {
                id: atelier_core::CustomerId::new(format!("c-{id}")),
                display_name: format!("Customer {id}"),
            }),
            boutique: None,
        }
    }

    fn list(ids: &[&str]) -> CanonicalOrderList {
        CanonicalOrderList::from_snapshot(ids.iter().map(|id| order(id)).collect())
    }

    fn ids(list: &CanonicalOrderList) -> Vec<&str> {
        list.as_slice().iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_create_prepends() {
        let mut list = list(&["a", "b", "c"]);
        let effect = list.apply(MutationEvent::with_payload(MutationKind::Create, order("d")));
        assert!(matches!(effect, Some(OrderEffect::Created { .. })));
        assert_eq!(ids(&list), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_create_is_idempotent() {
        let mut list = CanonicalOrderList::new();
        let event = MutationEvent::with_payload(MutationKind::Create, order("a"));
        assert!(list.apply(event.clone()).is_some());
        assert!(list.apply(event).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut list = list(&["a", "b", "c"]);
        let mut updated = order("b");
        updated.status = OrderStatus::Completed;
        let effect = list.apply(MutationEvent::with_payload(MutationKind::Update, updated));
        assert!(matches!(effect, Some(OrderEffect::Updated { .. })));
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
        assert_eq!(list.as_slice()[1].status, OrderStatus::Completed);
    }

    #[test]
    fn test_update_unknown_id_is_dropped() {
        let mut list = list(&["a", "c"]);
        let effect = list.apply(MutationEvent::with_payload(MutationKind::Update, order("z")));
        assert!(effect.is_none());
        assert_eq!(ids(&list), vec!["a", "c"]);
    }

    #[test]
    fn test_delete_removes_matching_id() {
        let mut list = list(&["a", "b", "c"]);
        let effect = list.apply(MutationEvent::without_payload(
            MutationKind::Delete,
            OrderId::new("b"),
        ));
        assert_eq!(
            effect,
            Some(OrderEffect::Deleted {
                id: OrderId::new("b")
            })
        );
        assert_eq!(ids(&list), vec!["a", "c"]);
    }

    #[test]
    fn test_delete_absent_id_is_noop() {
        let mut list = list(&["a", "c"]);
        let effect = list.apply(MutationEvent::without_payload(
            MutationKind::Delete,
            OrderId::new("z"),
        ));
        assert!(effect.is_none());
        assert_eq!(ids(&list), vec!["a", "c"]);
    }

    #[test]
    fn test_malformed_create_is_dropped() {
        let mut list = CanonicalOrderList::new();
        let effect = list.apply(MutationEvent::without_payload(
            MutationKind::Create,
            OrderId::new("a"),
        ));
        assert!(effect.is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn test_mismatched_update_payload_id_is_dropped() {
        let mut list = list(&["a", "b"]);
        // Envelope says "a" but the payload carries "b", which is already
        // present; applying it must not produce a second "b" entry.
        let event = MutationEvent {
            kind: MutationKind::Update,
            id: OrderId::new("a"),
            payload: Some(order("b")),
        };
        assert!(list.apply(event).is_none());
        assert_eq!(ids(&list), vec!["a", "b"]);
    }

    #[test]
    fn test_mismatched_create_payload_id_is_dropped() {
        let mut list = list(&["b"]);
        let event = MutationEvent {
            kind: MutationKind::Create,
            id: OrderId::new("a"),
            payload: Some(order("b")),
        };
        assert!(list.apply(event).is_none());
        assert_eq!(ids(&list), vec!["b"]);
    }

    #[test]
    fn test_created_effect_carries_display_data() {
        let mut list = CanonicalOrderList::new();
        let effect = list
            .apply(MutationEvent::with_payload(MutationKind::Create, order("a")))
            .unwrap();
        let OrderEffect::Created {
            customer,
            boutique,
            amount,
            ..
        } = effect
        else {
            panic!("expected Created effect");
        };
        assert_eq!(customer, "Customer a");
        assert_eq!(boutique, "the boutique");
        assert_eq!(amount, Decimal::new(100, 0));
    }

    #[test]
    fn test_snapshot_deduplicates_by_id() {
        let list = CanonicalOrderList::from_snapshot(vec![order("a"), order("a"), order("b")]);
        assert_eq!(ids(&list), vec!["a", "b"]);
    }
}
