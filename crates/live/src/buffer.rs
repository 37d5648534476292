//! Bounded buffer for events that arrive before the snapshot resolves.
//!
//! The snapshot fetch and the mutation stream are independent async
//! operations and may resolve in either order. Events targeting ids not yet
//! present used to be lost when the stream won the race; instead they are
//! queued here and replayed in arrival order once the snapshot lands.

use std::collections::VecDeque;

use tracing::warn;

use crate::event::MutationEvent;

/// Default capacity for the pre-snapshot event buffer.
pub const DEFAULT_CAPACITY: usize = 256;

/// FIFO queue of mutation events awaiting the initial snapshot.
///
/// When full, the oldest event is discarded to make room; a snapshot slow
/// enough to overflow the buffer will be refetched by the operator anyway.
#[derive(Debug)]
pub struct EventBuffer {
    events: VecDeque<MutationEvent>,
    capacity: usize,
}

impl EventBuffer {
    /// Create a buffer holding at most `capacity` events.
    ///
    /// A zero capacity is bumped to one so the most recent event always
    /// survives.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Queue an event, evicting the oldest when full.
    pub fn push(&mut self, event: MutationEvent) {
        if self.events.len() == self.capacity
            && let Some(evicted) = self.events.pop_front()
        {
            warn!(
                order_id = %evicted.id,
                kind = %evicted.kind,
                capacity = self.capacity,
                "pre-snapshot buffer full, discarding oldest event"
            );
        }
        self.events.push_back(event);
    }

    /// Drain all buffered events in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = MutationEvent> + '_ {
        self.events.drain(..)
    }

    /// Number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
