use crate::{BrokerChannel, LifecycleState};
use async_trait::async_trait;

pub mod asynchronous;
mod shared;
pub mod synchronous;

/// The surface shared by both producer flavors, as seen by whoever manages
/// their lifecycle and their broker channel (e.g., a reconnection manager).
///
/// Publishing itself is not part of this trait: the
/// [synchronous](crate::SyncProducer) flavor returns the outcome of every
/// publish, while the [asynchronous](crate::AsyncProducer) one reports
/// failures to its [`ErrorSink`](crate::ErrorSink).
#[async_trait]
pub trait Producer: Send + Sync {
    /// The broker channel type this producer publishes through.
    type Channel: BrokerChannel;

    /// Reports the unique, human-readable name of this producer.
    fn name(&self) -> &str;

    /// Reports the current lifecycle stage of this producer.
    fn lifecycle(&self) -> LifecycleState;

    /// Makes this producer ready to publish. Calling it again has no effect.
    fn start(&self);

    /// Replaces the owned broker channel with the given fresh one. Once
    /// stopped, closes the given channel instead.
    async fn set_channel(&self, channel: Self::Channel);

    /// Stops this producer and closes its broker channel. Returns once the
    /// producer is fully quiesced. Calling it again has no effect.
    async fn stop(&self);
}

/// A single outgoing message on its way to the broker.
#[derive(Debug)]
pub(crate) struct OutboundMessage {
    pub(crate) payload: Vec<u8>,
    pub(crate) routing_key: String,
}
