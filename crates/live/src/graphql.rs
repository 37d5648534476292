//! Production transport: GraphQL snapshot query and SSE mutation stream.
//!
//! The snapshot is a plain GraphQL POST; mutation events arrive over a
//! server-sent-events endpoint, one JSON event per `data:` line. Transport
//! lifecycle changes (connecting, connected, disconnected) are published to
//! the [`ConnectionBus`] so the feed's liveness tracker sees them alongside
//! the stream's own signals. Retry and backoff are the server/proxy's
//! responsibility; this client reports and stops.

use atelier_core::{BoutiqueId, BoutiqueSummary, CustomerId, CustomerSummary, Order, OrderId};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::LiveConfig;
use crate::connection::{ConnectionBus, ConnectionState};
use crate::error::{SnapshotError, StreamError};
use crate::event::MutationEvent;
use crate::sources::{MutationStream, SnapshotSource};

/// Snapshot query against the back-office GraphQL API. The only document
/// this crate sends, so it lives inline rather than in a `.graphql` file.
const ORDERS_QUERY: &str = r"
    query LiveOrders {
        orders {
            id
            totalPrice
            status
            dateCreated
            customer { id displayName }
            boutique { id name }
        }
    }
";

/// Client for the order snapshot and mutation event endpoints.
#[derive(Debug, Clone)]
pub struct OrdersClient {
    client: reqwest::Client,
    config: LiveConfig,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OrdersData {
    orders: Vec<OrderRow>,
}

/// Wire shape of an order as the GraphQL API returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRow {
    id: String,
    #[serde(default)]
    total_price: Option<Decimal>,
    status: String,
    date_created: DateTime<Utc>,
    #[serde(default)]
    customer: Option<CustomerRow>,
    #[serde(default)]
    boutique: Option<BoutiqueRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRow {
    id: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct BoutiqueRow {
    id: String,
    name: String,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            total_price: row.total_price,
            status: row.status.into(),
            date_created: row.date_created,
            customer: row.customer.map(|c| CustomerSummary {
                id: CustomerId::new(c.id),
                display_name: c.display_name,
            }),
            boutique: row.boutique.map(|b| BoutiqueSummary {
                id: BoutiqueId::new(b.id),
                name: b.name,
            }),
        }
    }
}

impl OrdersClient {
    /// Create a client over the configured endpoints.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: LiveConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Fetch the full current order list.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Http` on network failures,
    /// `SnapshotError::GraphQl` when the server answers with errors, and
    /// `SnapshotError::MissingData` on an empty 200 response.
    #[instrument(skip(self))]
    pub async fn orders_snapshot(&self) -> Result<Vec<Order>, SnapshotError> {
        let body = serde_json::json!({
            "query": ORDERS_QUERY,
            "variables": serde_json::Value::Null,
        });

        let response = self
            .client
            .post(self.config.graphql_url.clone())
            .bearer_auth(self.config.api_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let graphql_response: GraphQlResponse<OrdersData> = response.json().await?;

        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(SnapshotError::GraphQl(messages.join("; ")));
        }

        let data = graphql_response.data.ok_or(SnapshotError::MissingData)?;
        Ok(data.orders.into_iter().map(Order::from).collect())
    }

    /// Open the mutation event stream.
    ///
    /// Transport status transitions are published to `bus` as they happen.
    /// The stream ends after a transport failure; the caller decides whether
    /// to open a new one.
    #[must_use]
    pub fn mutation_stream(&self, bus: ConnectionBus) -> MutationStream {
        let client = self.client.clone();
        let url = self.config.events_url.clone();
        let token = self.config.api_token.clone();

        Box::pin(async_stream::stream! {
            bus.publish(ConnectionState::Connecting);

            let response = match client
                .get(url)
                .bearer_auth(token.expose_secret())
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    bus.publish(ConnectionState::Disconnected);
                    yield Err(StreamError::Transport(e.to_string()));
                    return;
                }
            };

            if !response.status().is_success() {
                bus.publish(ConnectionState::Disconnected);
                yield Err(StreamError::Transport(format!(
                    "unexpected status {}",
                    response.status()
                )));
                return;
            }

            bus.publish(ConnectionState::Connected);

            let mut bytes = response.bytes_stream();
            let mut pending = Vec::new();

            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for line in split_lines(&mut pending, &chunk) {
                            if let Some(data) = parse_sse_data(&line) {
                                yield decode_event(data);
                            }
                        }
                    }
                    Err(e) => {
                        bus.publish(ConnectionState::Disconnected);
                        yield Err(StreamError::Transport(e.to_string()));
                        return;
                    }
                }
            }

            debug!("event stream closed by server");
            bus.publish(ConnectionState::Disconnected);
        })
    }
}

impl SnapshotSource for OrdersClient {
    async fn fetch(&self) -> Result<Vec<Order>, SnapshotError> {
        self.orders_snapshot().await
    }
}

/// Append a chunk to the undecoded remainder and return the lines it
/// completed.
///
/// Chunk boundaries fall anywhere, including inside a multibyte UTF-8
/// sequence, so decoding happens per completed line rather than per chunk.
fn split_lines(pending: &mut Vec<u8>, chunk: &[u8]) -> Vec<String> {
    pending.extend_from_slice(chunk);
    let mut lines = Vec::new();
    while let Some(newline) = pending.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = pending.drain(..=newline).collect();
        lines.push(String::from_utf8_lossy(&line).into_owned());
    }
    lines
}

/// Extract the payload of a `data:` SSE line, if it carries one.
///
/// Comment lines, field lines we don't use (`event:`, `id:`), and blank
/// separator lines yield `None`.
fn parse_sse_data(line: &str) -> Option<&str> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let data = trimmed.strip_prefix("data:")?.trim_start();
    if data.is_empty() { None } else { Some(data) }
}

fn decode_event(data: &str) -> Result<MutationEvent, StreamError> {
    serde_json::from_str(data).map_err(StreamError::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::OrderStatus;

    use super::*;
    use crate::event::MutationKind;

    #[test]
    fn test_order_row_conversion() {
        let json = r#"{
            "id": "o-1",
            "totalPrice": "120.50",
            "status": "processing",
            "dateCreated": "2026-08-30T09:30:00Z",
            "customer": {"id": "c-1", "displayName": "Jamie Moreau"},
            "boutique": {"id": "b-1", "name": "Atelier Marais"}
        }"#;
        let row: OrderRow = serde_json::from_str(json).unwrap();
        let order = Order::from(row);
        assert_eq!(order.id, OrderId::new("o-1"));
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total_price, Some(Decimal::new(120_50, 2)));
        assert_eq!(order.customer.unwrap().display_name, "Jamie Moreau");
    }

    #[test]
    fn test_parse_sse_data() {
        assert_eq!(
            parse_sse_data("data: {\"kind\":\"delete\",\"id\":\"o-1\"}\n"),
            Some("{\"kind\":\"delete\",\"id\":\"o-1\"}")
        );
        assert_eq!(parse_sse_data("\r\n"), None);
        assert_eq!(parse_sse_data(": keepalive\n"), None);
        assert_eq!(parse_sse_data("event: order\n"), None);
        assert_eq!(parse_sse_data("data:\n"), None);
    }

    #[test]
    fn test_multibyte_event_split_across_chunks() {
        let frame = "data: {\"kind\":\"create\",\"id\":\"o-1\",\"payload\":{\
            \"id\":\"o-1\",\"status\":\"pending\",\
            \"date_created\":\"2026-08-30T10:00:00Z\",\
            \"customer\":{\"id\":\"c-1\",\"display_name\":\"No\u{e9}mie\"}}}\n";
        let bytes = frame.as_bytes();
        // Split in the middle of the two-byte encoding of the accent.
        let mid = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let (head, tail) = bytes.split_at(mid);

        let mut pending = Vec::new();
        assert!(split_lines(&mut pending, head).is_empty());
        let lines = split_lines(&mut pending, tail);
        assert_eq!(lines.len(), 1);

        let line = lines.first().unwrap();
        let event = decode_event(parse_sse_data(line).unwrap()).unwrap();
        assert_eq!(
            event.payload.unwrap().customer.unwrap().display_name,
            "No\u{e9}mie"
        );
    }

    #[test]
    fn test_decode_event() {
        let event = decode_event(r#"{"kind":"delete","id":"o-3"}"#).unwrap();
        assert_eq!(event.kind, MutationKind::Delete);

        let err = decode_event("not json").unwrap_err();
        assert!(matches!(err, StreamError::Malformed(_)));
    }
}
