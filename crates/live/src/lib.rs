//! Atelier Live - realtime order feed library.
//!
//! Keeps a client-visible order list consistent between a point-in-time
//! snapshot fetch and a continuous stream of mutation events, derives
//! aggregate statistics, fires one user-facing notification per applied
//! event, and tracks stream liveness from multiple independent signals.
//!
//! # Architecture
//!
//! - [`reconcile`] - pure merge of one mutation event into the canonical list
//! - [`buffer`] - bounded queue for events arriving before the snapshot
//! - [`connection`] - per-source liveness table and the connection event bus
//! - [`stats`] - pure aggregate statistics over the canonical list
//! - [`notify`] - effect runner turning reconcile outcomes into notifications
//! - [`feed`] - the orchestration task tying everything together
//! - [`graphql`] - production snapshot/stream transport over GraphQL and SSE
//!
//! Page-level rendering lives outside this crate; consumers observe the feed
//! through [`feed::FeedHandle`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod buffer;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod feed;
pub mod graphql;
pub mod notify;
pub mod reconcile;
pub mod sources;
pub mod stats;

pub use config::LiveConfig;
pub use connection::{ConnectionBus, ConnectionState, SignalSource};
pub use event::{MutationEvent, MutationKind};
pub use feed::{FeedHandle, FeedOptions, FeedState, LiveOrderFeed};
pub use notify::{NotificationDispatcher, Notifier};
pub use reconcile::{CanonicalOrderList, OrderEffect};
