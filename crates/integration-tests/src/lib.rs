//! Integration test harness for the Atelier live order feed.
//!
//! Provides in-memory stand-ins for the external collaborators (snapshot
//! source, mutation stream, notifier, audio player) so tests can drive the
//! whole feed pipeline deterministically, without a backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atelier-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use atelier_core::{Order, OrderId, OrderStatus};
use atelier_live::error::{SnapshotError, StreamError};
use atelier_live::event::MutationEvent;
use atelier_live::feed::FeedState;
use atelier_live::notify::{AudioError, AudioPlayer, Notifier};
use atelier_live::sources::{MutationStream, SnapshotSource};
use chrono::Utc;
use futures::channel::mpsc::UnboundedSender;
use rust_decimal::Decimal;
use tokio::sync::watch;

/// Build a minimal order for test fixtures.
#[must_use]
pub fn order(id: &str, status: &str, price: i64) -> Order {
    Order {
        id: OrderId::new(id),
        total_price: Some(Decimal::new(price, 0)),
        status: OrderStatus::from(status.to_string()),
        date_created: Utc::now(),
        customer: None,
        boutique: None,
    }
}

/// Snapshot source resolving immediately with a fixed order list.
pub struct FixedSnapshot(pub Vec<Order>);

impl SnapshotSource for FixedSnapshot {
    async fn fetch(&self) -> Result<Vec<Order>, SnapshotError> {
        Ok(self.0.clone())
    }
}

/// Hand-driven mutation stream: push events through the returned sender.
#[must_use]
pub fn mutation_channel() -> (
    UnboundedSender<Result<MutationEvent, StreamError>>,
    MutationStream,
) {
    let (tx, rx) = futures::channel::mpsc::unbounded();
    (tx, Box::pin(rx))
}

/// A recorded toast: level and message.
pub type Toast = (&'static str, String);

/// Notifier that records every toast it is asked to show.
#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    /// All toasts recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().expect("lock poisoned").clone()
    }

    fn record(&self, level: &'static str, message: &str) {
        self.toasts
            .lock()
            .expect("lock poisoned")
            .push((level, message.to_string()));
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str, _duration: Duration) {
        self.record("success", message);
    }

    fn info(&self, message: &str, _duration: Duration) {
        self.record("info", message);
    }

    fn warning(&self, message: &str, _duration: Duration) {
        self.record("warning", message);
    }
}

/// Audio player that records requested cue URLs.
#[derive(Default)]
pub struct RecordingAudio {
    plays: Mutex<Vec<String>>,
}

impl RecordingAudio {
    /// Cue URLs played so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn plays(&self) -> Vec<String> {
        self.plays.lock().expect("lock poisoned").clone()
    }
}

impl AudioPlayer for RecordingAudio {
    fn play(&self, url: &str) -> Result<(), AudioError> {
        self.plays
            .lock()
            .expect("lock poisoned")
            .push(url.to_string());
        Ok(())
    }
}

/// Wait (bounded) until the feed state satisfies `pred`, returning it.
///
/// # Panics
///
/// Panics if the condition is not reached within five seconds or the feed
/// task goes away.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<FeedState>,
    pred: impl Fn(&FeedState) -> bool,
) -> FeedState {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if pred(&rx.borrow()) {
                return rx.borrow().clone();
            }
            rx.changed().await.expect("feed task ended");
        }
    })
    .await
    .expect("timed out waiting for feed state")
}

/// Ids of the orders in a state, in canonical order.
#[must_use]
pub fn order_ids(state: &FeedState) -> Vec<String> {
    state.orders.iter().map(|o| o.id.to_string()).collect()
}

/// A dispatcher wired to recording collaborators, returned alongside them.
#[must_use]
pub fn recording_dispatcher(
    sound_url: Option<String>,
) -> (
    atelier_live::notify::NotificationDispatcher,
    Arc<RecordingNotifier>,
    Arc<RecordingAudio>,
) {
    let notifier = Arc::new(RecordingNotifier::default());
    let audio = Arc::new(RecordingAudio::default());
    let dispatcher = atelier_live::notify::NotificationDispatcher::new(
        notifier.clone(),
        audio.clone(),
        sound_url,
        Duration::from_secs(5),
    );
    (dispatcher, notifier, audio)
}
