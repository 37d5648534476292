//! Atelier Live - headless feed runner.
//!
//! Connects the live order feed to the configured GraphQL/SSE endpoints and
//! logs list and statistics changes. The dashboard render layer embeds the
//! library directly; this binary exists for operating the feed standalone
//! (smoke checks, soak runs against staging).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use atelier_live::config::LiveConfig;
use atelier_live::connection::ConnectionBus;
use atelier_live::feed::{FeedOptions, LiveOrderFeed};
use atelier_live::graphql::OrdersClient;
use atelier_live::notify::{NotificationDispatcher, NullAudioPlayer, TracingNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed before tracing so the
    // .env file can set RUST_LOG)
    let config = LiveConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atelier_live=info".into());

    // Use JSON format on Fly.io for structured log parsing, text format locally
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!(?config, "starting live order feed");

    let bus = ConnectionBus::new();
    let client = OrdersClient::new(config.clone());
    let stream = client.mutation_stream(bus.clone());
    let dispatcher = NotificationDispatcher::new(
        Arc::new(TracingNotifier),
        Arc::new(NullAudioPlayer),
        config.sound_url.clone(),
        config.notify_duration,
    );

    let handle = LiveOrderFeed::spawn(
        client,
        stream,
        &bus,
        dispatcher,
        FeedOptions {
            buffer_capacity: config.buffer_capacity,
        },
    );

    let mut changes = handle.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = changes.borrow_and_update().clone();
                let stats = handle.statistics();
                tracing::info!(
                    orders = stats.total_orders,
                    total = %stats.total_amount,
                    pending = stats.pending_orders,
                    today = stats.today_orders,
                    connected = state.connected,
                    loading = state.loading,
                    "feed updated"
                );
            }
            () = &mut shutdown => break,
        }
    }

    drop(handle);
    tracing::info!("live feed stopped");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping feed");
}
