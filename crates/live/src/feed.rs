//! Feed orchestration: one task owning the canonical list.
//!
//! [`LiveOrderFeed::spawn`] wires a snapshot source, a mutation stream, and
//! the connection bus into a single tokio task. The reconciliation step is
//! synchronous and non-reentrant; one event is fully applied before the next
//! is considered, so the canonical list needs no locking. Consumers observe
//! immutable state snapshots through a watch channel on the returned
//! [`FeedHandle`]; dropping the handle tears the task down and guards
//! against late-resolving results being applied.

use std::sync::Arc;

use atelier_core::{Order, Statistics};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::buffer::{self, EventBuffer};
use crate::connection::{
    ConnectionBus, ConnectionSignal, ConnectionState, ConnectionTracker, SignalSource,
};
use crate::error::{SnapshotError, StreamError};
use crate::event::MutationEvent;
use crate::notify::NotificationDispatcher;
use crate::reconcile::CanonicalOrderList;
use crate::sources::{MutationStream, SnapshotSource};
use crate::stats;

/// Tuning knobs for a feed instance.
#[derive(Debug, Clone, Copy)]
pub struct FeedOptions {
    /// Capacity of the pre-snapshot event buffer.
    pub buffer_capacity: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: buffer::DEFAULT_CAPACITY,
        }
    }
}

/// The read model exposed to the render layer.
///
/// Statistics are deliberately not a field: they depend on the evaluation
/// instant ("today" figures), so watch subscribers derive them from a state
/// via [`FeedState::statistics_at`] and handle holders call
/// [`FeedHandle::statistics`].
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// The canonical order list, newest create first.
    pub orders: Vec<Order>,
    /// Whether the initial snapshot (or a refetch) is in flight.
    pub loading: bool,
    /// The latest snapshot error, verbatim. Stale data stays visible.
    pub error: Option<String>,
    /// Merged liveness flag across all signal sources.
    pub connected: bool,
}

impl FeedState {
    fn initial() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// Statistics over the current list, evaluated at `now`.
    #[must_use]
    pub fn statistics_at(&self, now: DateTime<Utc>) -> Statistics {
        stats::compute(&self.orders, now)
    }
}

/// Handle to a running feed.
///
/// Dropping the handle aborts the feed task, unsubscribing it from the
/// mutation stream and the connection bus.
#[derive(Debug)]
pub struct FeedHandle {
    state: watch::Receiver<FeedState>,
    refetch_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// The canonical order list, newest create first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.state.borrow().orders.clone()
    }

    /// Whether a snapshot fetch is in flight.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// The latest snapshot error, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Merged liveness flag.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.state.borrow().connected
    }

    /// Statistics over the current list.
    ///
    /// Recomputed at call time, never cached, so the today figures reflect
    /// the moment of the call rather than the last event.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.state.borrow().statistics_at(Utc::now())
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    /// Force a snapshot reload. Coalesced while a fetch is in flight.
    pub fn refetch(&self) {
        if self.refetch_tx.try_send(()).is_err() {
            debug!("refetch already queued");
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns feed tasks. Stateless; exists to group the wiring.
pub struct LiveOrderFeed;

impl LiveOrderFeed {
    /// Spawn a feed over the given collaborators.
    ///
    /// The canonical list starts empty, is populated once by the first
    /// resolved snapshot, and is mutated thereafter by applied events.
    pub fn spawn<S: SnapshotSource>(
        source: S,
        stream: MutationStream,
        bus: &ConnectionBus,
        dispatcher: NotificationDispatcher,
        options: FeedOptions,
    ) -> FeedHandle {
        let (state_tx, state_rx) = watch::channel(FeedState::initial());
        let (refetch_tx, refetch_rx) = mpsc::channel(1);
        let bus_rx = bus.subscribe();
        let feed_id = Uuid::new_v4();

        let task = tokio::spawn(
            run(
                Arc::new(source),
                stream,
                bus_rx,
                dispatcher,
                options,
                state_tx,
                refetch_rx,
            )
            .instrument(info_span!("live_feed", feed = %feed_id)),
        );

        FeedHandle {
            state: state_rx,
            refetch_tx,
            task,
        }
    }
}

fn spawn_fetch<S: SnapshotSource>(
    source: Arc<S>,
    results: mpsc::Sender<Result<Vec<Order>, SnapshotError>>,
) {
    tokio::spawn(async move {
        let result = source.fetch().await;
        // Send fails only when the feed task is gone; the late result is
        // intentionally discarded then.
        let _ = results.send(result).await;
    });
}

#[allow(clippy::too_many_arguments)]
async fn run<S: SnapshotSource>(
    source: Arc<S>,
    mut stream: MutationStream,
    mut bus_rx: broadcast::Receiver<ConnectionSignal>,
    dispatcher: NotificationDispatcher,
    options: FeedOptions,
    state_tx: watch::Sender<FeedState>,
    mut refetch_rx: mpsc::Receiver<()>,
) {
    let (snap_tx, mut snap_rx) = mpsc::channel(1);
    spawn_fetch(Arc::clone(&source), snap_tx.clone());

    let mut task = FeedTask {
        list: CanonicalOrderList::new(),
        buffer: EventBuffer::with_capacity(options.buffer_capacity),
        tracker: ConnectionTracker::new(),
        dispatcher,
        state_tx,
        loading: true,
        error: None,
        snapshot_loaded: false,
        snapshot_inflight: true,
    };

    let mut stream_open = true;
    let mut bus_open = true;

    loop {
        tokio::select! {
            Some(result) = snap_rx.recv() => task.on_snapshot(result),
            event = stream.next(), if stream_open => match event {
                Some(item) => task.on_stream_item(item),
                None => {
                    stream_open = false;
                    task.on_stream_closed();
                }
            },
            signal = bus_rx.recv(), if bus_open => match signal {
                Ok(signal) => task.on_signal(signal),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "lagged behind the connection bus");
                }
                Err(broadcast::error::RecvError::Closed) => bus_open = false,
            },
            cmd = refetch_rx.recv() => match cmd {
                Some(()) => {
                    if task.snapshot_inflight {
                        debug!("refetch coalesced, snapshot already in flight");
                    } else {
                        task.snapshot_inflight = true;
                        task.loading = true;
                        task.publish();
                        spawn_fetch(Arc::clone(&source), snap_tx.clone());
                    }
                }
                None => break, // handle dropped
            },
        }
    }
}

/// Per-feed mutable state, owned exclusively by the feed task.
struct FeedTask {
    list: CanonicalOrderList,
    buffer: EventBuffer,
    tracker: ConnectionTracker,
    dispatcher: NotificationDispatcher,
    state_tx: watch::Sender<FeedState>,
    loading: bool,
    error: Option<String>,
    snapshot_loaded: bool,
    snapshot_inflight: bool,
}

impl FeedTask {
    fn on_snapshot(&mut self, result: Result<Vec<Order>, SnapshotError>) {
        self.snapshot_inflight = false;
        self.loading = false;
        match result {
            Ok(orders) => {
                self.error = None;
                self.list = CanonicalOrderList::from_snapshot(orders);
                if self.snapshot_loaded {
                    info!(orders = self.list.len(), "snapshot refetched");
                } else {
                    self.snapshot_loaded = true;
                    info!(orders = self.list.len(), "snapshot loaded");
                    self.replay_buffered();
                }
            }
            Err(e) => {
                // Stale-but-present data is preferred over empty: the list
                // is left untouched.
                error!(error = %e, "snapshot fetch failed");
                self.error = Some(e.to_string());
            }
        }
        self.publish();
    }

    fn replay_buffered(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        info!(events = self.buffer.len(), "replaying buffered events");
        for event in self.buffer.drain() {
            if let Some(effect) = self.list.apply(event) {
                self.dispatcher.dispatch(&effect);
            }
        }
    }

    fn on_stream_item(&mut self, item: Result<MutationEvent, StreamError>) {
        match item {
            Ok(event) => {
                // Any payload arrival means the stream is live.
                self.tracker.observe(ConnectionSignal::now(
                    SignalSource::Stream,
                    ConnectionState::Connected,
                ));
                if self.snapshot_loaded {
                    if let Some(effect) = self.list.apply(event) {
                        self.dispatcher.dispatch(&effect);
                    }
                } else {
                    self.buffer.push(event);
                }
            }
            Err(e) => {
                error!(error = %e, "mutation stream error");
                self.tracker.observe(ConnectionSignal::now(
                    SignalSource::Stream,
                    ConnectionState::Disconnected,
                ));
            }
        }
        self.publish();
    }

    fn on_stream_closed(&mut self) {
        warn!("mutation stream ended, live updates paused");
        self.tracker.observe(ConnectionSignal::now(
            SignalSource::Stream,
            ConnectionState::Disconnected,
        ));
        self.publish();
    }

    fn on_signal(&mut self, signal: ConnectionSignal) {
        self.tracker.observe(signal);
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(FeedState {
            orders: self.list.to_vec(),
            loading: self.loading,
            error: self.error.clone(),
            connected: self.tracker.is_connected(),
        });
    }
}
