//! Stream liveness tracking from multiple independent signal sources.
//!
//! Two sources report liveness and neither is authoritative: the mutation
//! stream's own lifecycle (payload arrivals, terminal errors) and the
//! transport-level status broadcast. Each source's latest signal is kept in a
//! per-source table; the merged flag follows an explicit combination rule.
//!
//! The combination rule is last-write-wins: the merged state is whichever
//! signal was observed most recently, regardless of source. The flag can
//! flicker when sources disagree in quick succession; the per-source table
//! exists so the policy is inspectable and swappable without touching
//! callers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Liveness value reported by a signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Live updates are flowing.
    Connected,
    /// A connection attempt is in progress.
    Connecting,
    /// Live updates are paused until the transport self-heals.
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Independent sources that report liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// The mutation stream lifecycle (payload arrivals, terminal errors).
    Stream,
    /// The transport-level status broadcast.
    Transport,
}

/// A timestamped liveness report from one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSignal {
    /// Which source reported.
    pub source: SignalSource,
    /// The reported state.
    pub state: ConnectionState,
    /// When the signal was observed. Advisory; merge order is arrival order.
    pub observed_at: DateTime<Utc>,
}

impl ConnectionSignal {
    /// A signal observed now.
    #[must_use]
    pub fn now(source: SignalSource, state: ConnectionState) -> Self {
        Self {
            source,
            state,
            observed_at: Utc::now(),
        }
    }
}

/// Explicit event bus for transport-level connection status.
///
/// Constructed once at app start and passed by reference; each feed holds a
/// receiver that is dropped on teardown, so there is no ambient module-level
/// state to leak between consumers.
#[derive(Debug, Clone)]
pub struct ConnectionBus {
    tx: broadcast::Sender<ConnectionSignal>,
}

impl ConnectionBus {
    /// Create a bus. Signals published while no receiver is subscribed are
    /// discarded.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    /// Publish a transport-level status change to all subscribers.
    pub fn publish(&self, state: ConnectionState) {
        let signal = ConnectionSignal::now(SignalSource::Transport, state);
        if self.tx.send(signal).is_err() {
            debug!(state = %state, "no connection bus subscribers");
        }
    }

    /// Subscribe to transport-level status changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionSignal> {
        self.tx.subscribe()
    }
}

impl Default for ConnectionBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-source state table with a last-write-wins merge.
///
/// Initial merged state is disconnected until the first signal arrives.
#[derive(Debug)]
pub struct ConnectionTracker {
    table: HashMap<SignalSource, ConnectionSignal>,
    latest: Option<ConnectionSignal>,
}

impl ConnectionTracker {
    /// Tracker with no observations yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            latest: None,
        }
    }

    /// Record a signal, updating both the source's table entry and the
    /// merged state.
    pub fn observe(&mut self, signal: ConnectionSignal) {
        self.table.insert(signal.source, signal);
        self.latest = Some(signal);
    }

    /// The merged state under the last-write-wins rule.
    #[must_use]
    pub fn merged(&self) -> ConnectionState {
        self.latest
            .map_or(ConnectionState::Disconnected, |signal| signal.state)
    }

    /// Whether the merged state is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.merged() == ConnectionState::Connected
    }

    /// The latest signal from one source, for diagnostics.
    #[must_use]
    pub fn source_state(&self, source: SignalSource) -> Option<&ConnectionSignal> {
        self.table.get(&source)
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.merged(), ConnectionState::Disconnected);
        assert!(!tracker.is_connected());
    }

    #[test]
    fn test_last_write_wins_across_sources() {
        let mut tracker = ConnectionTracker::new();
        tracker.observe(ConnectionSignal::now(
            SignalSource::Stream,
            ConnectionState::Disconnected,
        ));
        tracker.observe(ConnectionSignal::now(
            SignalSource::Transport,
            ConnectionState::Connected,
        ));
        assert!(tracker.is_connected());

        tracker.observe(ConnectionSignal::now(
            SignalSource::Stream,
            ConnectionState::Disconnected,
        ));
        assert!(!tracker.is_connected());
    }

    #[test]
    fn test_table_retains_per_source_state() {
        let mut tracker = ConnectionTracker::new();
        tracker.observe(ConnectionSignal::now(
            SignalSource::Stream,
            ConnectionState::Connected,
        ));
        tracker.observe(ConnectionSignal::now(
            SignalSource::Transport,
            ConnectionState::Connecting,
        ));

        assert_eq!(
            tracker.source_state(SignalSource::Stream).unwrap().state,
            ConnectionState::Connected
        );
        assert_eq!(
            tracker.source_state(SignalSource::Transport).unwrap().state,
            ConnectionState::Connecting
        );
        // merged follows the most recent observation, not the table order
        assert_eq!(tracker.merged(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = ConnectionBus::new();
        let mut rx = bus.subscribe();
        bus.publish(ConnectionState::Connected);
        let signal = rx.recv().await.unwrap();
        assert_eq!(signal.source, SignalSource::Transport);
        assert_eq!(signal.state, ConnectionState::Connected);
    }
}
