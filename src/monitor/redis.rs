//! Redis Sentinel transport.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use ::redis::aio::MultiplexedConnection;
use ::redis::RedisError;

use crate::monitor::client::{EventStream, MonitorConnector, MonitorError, MonitorLink, SubscriptionEvent};
use crate::monitor::event::{parse_primaries, PrimaryInfo};

/// Connects to Sentinel instances over the Redis protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

#[async_trait]
impl MonitorConnector for RedisConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn MonitorLink>, MonitorError> {
        let unreachable = |e: RedisError| MonitorError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        };

        let client = ::redis::Client::open(format!("redis://{}/", endpoint)).map_err(unreachable)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unreachable)?;

        Ok(Box::new(SentinelLink {
            endpoint: endpoint.to_string(),
            client,
            conn,
        }))
    }
}

/// A live connection to one Sentinel.
struct SentinelLink {
    endpoint: String,
    client: ::redis::Client,
    conn: MultiplexedConnection,
}

fn classify(e: RedisError) -> MonitorError {
    if e.is_io_error() || e.is_connection_dropped() {
        MonitorError::Transport(e.to_string())
    } else {
        MonitorError::Protocol(e.to_string())
    }
}

#[async_trait]
impl MonitorLink for SentinelLink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn primaries(&mut self) -> Result<Vec<PrimaryInfo>, MonitorError> {
        let rows: Vec<Vec<String>> = ::redis::cmd("SENTINEL")
            .arg("masters")
            .query_async(&mut self.conn)
            .await
            .map_err(classify)?;
        parse_primaries(&rows)
    }

    async fn subscribe(&mut self, topic: &str) -> Result<EventStream, MonitorError> {
        let mut pubsub = self.client.get_async_pubsub().await.map_err(classify)?;
        pubsub.subscribe(topic).await.map_err(classify)?;

        // The pubsub connection consumes the confirmation itself, so it is
        // surfaced here once the subscribe call has succeeded.
        let ack = stream::once(std::future::ready(SubscriptionEvent::Ack {
            channel: topic.to_string(),
            count: 1,
        }));
        let messages = pubsub.into_on_message().map(|msg| SubscriptionEvent::Data {
            channel: msg.get_channel_name().to_string(),
            payload: String::from_utf8_lossy(msg.get_payload_bytes()).into_owned(),
        });
        let closed = stream::once(std::future::ready(SubscriptionEvent::TransportError(
            format!("subscription connection to {} closed", self.endpoint),
        )));

        Ok(ack.chain(messages).chain(closed).boxed())
    }
}
