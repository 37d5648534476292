//! Mutation events delivered over the live stream.

use atelier_core::{Order, OrderId};
use serde::{Deserialize, Serialize};

/// Kind of order mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// A new order was placed.
    Create,
    /// An existing order changed.
    Update,
    /// An order was removed.
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A discrete create/update/delete notification from the mutation stream.
///
/// Events arrive one at a time, in arrival order, from a single logical
/// stream per feed instance. The payload is absent for deletes; the id alone
/// is sufficient there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// What happened.
    pub kind: MutationKind,
    /// The order this event targets.
    pub id: OrderId,
    /// The full order for creates and updates.
    #[serde(default)]
    pub payload: Option<Order>,
}

impl MutationEvent {
    /// Event carrying a full order payload (creates and updates).
    #[must_use]
    pub fn with_payload(kind: MutationKind, order: Order) -> Self {
        Self {
            kind,
            id: order.id.clone(),
            payload: Some(order),
        }
    }

    /// Payload-less event (deletes).
    #[must_use]
    pub const fn without_payload(kind: MutationKind, id: OrderId) -> Self {
        Self {
            kind,
            id,
            payload: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_event_deserializes_without_payload() {
        let json = r#"{"kind": "delete", "id": "o-3"}"#;
        let event: MutationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, MutationKind::Delete);
        assert_eq!(event.id, OrderId::new("o-3"));
        assert!(event.payload.is_none());
    }
}
