//! Seams to the external data collaborators.
//!
//! The feed is written against these abstractions; the production
//! implementation over GraphQL and SSE lives in [`crate::graphql`], and the
//! integration tests drive the feed with in-memory stand-ins.

use std::pin::Pin;

use atelier_core::Order;
use futures::Stream;

use crate::error::{SnapshotError, StreamError};
use crate::event::MutationEvent;

/// One-time fetch of the full current order list.
///
/// Refetching goes through the same source, so implementations must be
/// callable more than once.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetch the snapshot.
    fn fetch(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Order>, SnapshotError>> + Send;
}

/// The mutation event stream, assumed pre-filtered by server-side
/// authorization. Items arrive one at a time in delivery order.
pub type MutationStream = Pin<Box<dyn Stream<Item = Result<MutationEvent, StreamError>> + Send>>;
