use async_trait::async_trait;
use std::error::Error;

/// A live, connection-scoped handle that publishes messages to a broker.
///
/// Producers own exactly one such handle at a time and never use it from two
/// tasks at once: implementations need not be safe for concurrent publishing.
/// The handle may be swapped for a fresh one after a reconnection (see
/// [`SyncProducer::set_channel`](crate::SyncProducer::set_channel) and
/// [`AsyncProducer::set_channel`](crate::AsyncProducer::set_channel)).
///
/// Neither method should panic on broker failures: failures are reported as
/// [`Error`](BrokerChannel::Error) values.
#[async_trait]
pub trait BrokerChannel: Send + 'static {
    /// Broker-specific publishing options, passed through unchanged from the
    /// [`ProducerConfig`](crate::ProducerConfig).
    type Options: Send + Sync + 'static;

    /// The failure reported by this channel.
    type Error: Error + Send + Sync + 'static;

    /// Publishes the given payload to the given exchange with the given
    /// routing key. Resolves once the broker has accepted the message, or
    /// failed to.
    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        options: &Self::Options,
    ) -> Result<(), Self::Error>;

    /// Closes this channel. A failure to close still leaves the channel
    /// unusable.
    async fn close(&mut self) -> Result<(), Self::Error>;
}
