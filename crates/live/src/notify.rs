//! Effect runner: turns reconcile outcomes into user-facing notifications.
//!
//! The dispatcher fires exactly one notification per effect descriptor it is
//! handed, plus an optional audio cue for new orders. All side effects are
//! fire-and-forget: a failing audio backend or notifier must never stall
//! event processing.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::reconcile::OrderEffect;

/// Audio playback failure. Environments without playback support report
/// [`AudioError::Unsupported`].
#[derive(Debug, Error)]
pub enum AudioError {
    /// Playback is not available in this environment.
    #[error("audio playback not supported")]
    Unsupported,
    /// Playback was attempted and failed.
    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// User-visible toast notifications, implemented by the render layer.
pub trait Notifier: Send + Sync {
    /// Positive notification (new order).
    fn success(&self, message: &str, duration: Duration);
    /// Informational notification (order updated).
    fn info(&self, message: &str, duration: Duration);
    /// Warning notification (order removed).
    fn warning(&self, message: &str, duration: Duration);
}

/// Best-effort audio cue playback.
pub trait AudioPlayer: Send + Sync {
    /// Play the cue at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError`] when the environment cannot play the cue; the
    /// dispatcher logs and suppresses it.
    fn play(&self, url: &str) -> Result<(), AudioError>;
}

/// Notifier that logs through `tracing`, used by the headless binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str, _duration: Duration) {
        info!(kind = "success", "{message}");
    }

    fn info(&self, message: &str, _duration: Duration) {
        info!(kind = "info", "{message}");
    }

    fn warning(&self, message: &str, _duration: Duration) {
        warn!(kind = "warning", "{message}");
    }
}

/// Audio player for environments without playback support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioPlayer;

impl AudioPlayer for NullAudioPlayer {
    fn play(&self, _url: &str) -> Result<(), AudioError> {
        Err(AudioError::Unsupported)
    }
}

/// Fires one user-visible side effect per processed event.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    audio: Arc<dyn AudioPlayer>,
    /// Cue played on new orders when sound is enabled in configuration.
    sound_url: Option<String>,
    duration: Duration,
}

impl NotificationDispatcher {
    /// Build a dispatcher. `sound_url: None` disables the audio cue.
    #[must_use]
    pub fn new(
        notifier: Arc<dyn Notifier>,
        audio: Arc<dyn AudioPlayer>,
        sound_url: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            notifier,
            audio,
            sound_url,
            duration,
        }
    }

    /// Fire the notification (and optional cue) described by `effect`.
    pub fn dispatch(&self, effect: &OrderEffect) {
        match effect {
            OrderEffect::Created {
                customer,
                boutique,
                amount,
                ..
            } => {
                let message = format!("New order: {customer} at {boutique} ({amount})");
                self.notifier.success(&message, self.duration);
                self.play_cue();
            }
            OrderEffect::Updated { customer, .. } => {
                let message = format!("Order for {customer} was updated");
                self.notifier.info(&message, self.duration);
            }
            OrderEffect::Deleted { id } => {
                let message = format!("Order {id} was removed");
                self.notifier.warning(&message, self.duration);
            }
        }
    }

    fn play_cue(&self) {
        if let Some(url) = &self.sound_url
            && let Err(e) = self.audio.play(url)
        {
            warn!(error = %e, url = %url, "audio cue failed");
        }
    }
}
