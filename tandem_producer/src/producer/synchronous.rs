use crate::lifecycle::Lifecycle;
use crate::producer::OutboundMessage;
use crate::producer::shared::Shared;
use crate::{BrokerChannel, ErrorSink, LifecycleState, Producer, ProducerConfig, ProducerError};
use async_trait::async_trait;

/// Publishes messages inline: every call takes exclusive hold of the broker
/// channel, publishes, and returns the broker's verdict to the caller.
///
/// There is no worker and no queue. Concurrent callers queue up on the
/// channel lock and publish one at a time. A producer is ready as soon as it
/// is constructed.
///
/// Failures to publish are returned to the caller. Failures to close the
/// channel on [`stop`](SyncProducer::stop) are reported to the [`ErrorSink`].
pub struct SyncProducer<C: BrokerChannel> {
    shared: Shared<C>,
    lifecycle: Lifecycle,
}

impl<C: BrokerChannel> SyncProducer<C> {
    /// Creates a new [`SyncProducer`] that publishes through the given
    /// channel according to the given configuration.
    pub fn new(
        channel: C,
        errors: ErrorSink<C::Error>,
        config: ProducerConfig<C::Options>,
    ) -> Self {
        let shared = Shared::new("sync", channel, errors, config);
        let lifecycle = Lifecycle::running();

        Self { shared, lifecycle }
    }

    /// Reports the name of this [`SyncProducer`].
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Reports the lifecycle stage of this [`SyncProducer`].
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle.state()
    }
}

impl<C: BrokerChannel> SyncProducer<C> {
    /// Publishes the given payload with the configured routing key, and
    /// returns once the broker accepted it or failed to.
    pub async fn produce(&self, payload: impl Into<Vec<u8>>) -> Result<(), ProducerError<C::Error>> {
        let message = self.shared.message(payload.into(), None);

        self.send(message).await
    }

    /// Publishes the given payload with the given routing key, and returns
    /// once the broker accepted it or failed to.
    pub async fn produce_with_routing_key(
        &self,
        payload: impl Into<Vec<u8>>,
        routing_key: impl Into<String>,
    ) -> Result<(), ProducerError<C::Error>> {
        let message = self.shared.message(payload.into(), Some(routing_key.into()));

        self.send(message).await
    }

    /// Replaces the broker channel. Waits for any publish or close in
    /// progress to finish first.
    ///
    /// A stopped producer closes the given channel instead of keeping it.
    pub async fn set_channel(&self, channel: C) {
        self.shared.replace_channel(channel, &self.lifecycle).await;
    }

    /// Closes the broker channel. A failure to close is reported to the
    /// [`ErrorSink`].
    ///
    /// Only the first call closes the channel. Later calls (including
    /// concurrent ones) wait for that close to finish and change nothing.
    pub async fn stop(&self) {
        let mut channel_guard = self.shared.lock().await;

        // Check under the lock, so that late callers wait for the winner
        if !self.lifecycle.mark_stopped() {
            return;
        }

        let result = self.shared.close_on(&mut channel_guard).await;
        drop(channel_guard);

        if let Err(error) = result {
            self.shared.report(error).await;
        }
    }

    async fn send(&self, message: OutboundMessage) -> Result<(), ProducerError<C::Error>> {
        let mut channel_guard = self.shared.lock().await;

        // The channel is closed for good
        if self.lifecycle.state() == LifecycleState::Stopped {
            return Err(ProducerError::Stopped {
                routing_key: message.routing_key,
            });
        }

        self.shared.publish_on(&mut channel_guard, &message).await
    }
}

#[async_trait]
impl<C: BrokerChannel> Producer for SyncProducer<C> {
    type Channel = C;

    fn name(&self) -> &str {
        SyncProducer::name(self)
    }

    fn lifecycle(&self) -> LifecycleState {
        SyncProducer::lifecycle(self)
    }

    fn start(&self) {
        // Ready since construction
    }

    async fn set_channel(&self, channel: C) {
        SyncProducer::set_channel(self, channel).await;
    }

    async fn stop(&self) {
        SyncProducer::stop(self).await;
    }
}
