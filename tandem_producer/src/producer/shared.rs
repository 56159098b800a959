use crate::lifecycle::Lifecycle;
use crate::producer::OutboundMessage;
use crate::{BrokerChannel, ErrorSink, LifecycleState, ProducerConfig, ProducerError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::{debug, error};

/// The state both producer flavors share: the configuration, the error sink,
/// and the broker channel behind the one lock that serializes every publish,
/// close and replacement.
pub(crate) struct Shared<C: BrokerChannel> {
    /// The globally unique name of the producer, for logging/debugging
    /// purposes.
    name: Arc<str>,
    exchange: Arc<str>,
    config: ProducerConfig<C::Options>,
    errors: ErrorSink<C::Error>,
    /// The current broker channel.
    channel: AsyncMutex<C>,
}

impl<C: BrokerChannel> Shared<C> {
    pub(crate) fn new(
        flavor: &str,
        channel: C,
        errors: ErrorSink<C::Error>,
        config: ProducerConfig<C::Options>,
    ) -> Self {
        let name = Self::compose_name(flavor, config.exchange());
        let exchange = config.shared_exchange();
        let channel = AsyncMutex::new(channel);

        Self {
            name,
            exchange,
            config,
            errors,
            channel,
        }
    }

    /// Composes a globally unique, human-readable producer name.
    fn compose_name(flavor: &str, exchange: &str) -> Arc<str> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        Arc::from(format!(
            "tandem:{}:{}:{}",
            flavor,
            exchange,
            COUNTER.fetch_add(1, Ordering::Relaxed),
        ))
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Builds a message, falling back to the configured routing key.
    pub(crate) fn message(&self, payload: Vec<u8>, routing_key: Option<String>) -> OutboundMessage {
        let routing_key = routing_key.unwrap_or_else(|| self.config.routing_key().to_string());

        OutboundMessage {
            payload,
            routing_key,
        }
    }

    /// Grants exclusive access to the broker channel.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, C> {
        self.channel.lock().await
    }

    /// Swaps in the given channel. The previous channel is dropped without
    /// closing: it belongs to a connection that is already gone.
    ///
    /// A stopped producer never publishes again, so it closes the given
    /// channel right away instead of keeping it. A failure to close is
    /// reported to the error sink.
    pub(crate) async fn replace_channel(&self, channel: C, lifecycle: &Lifecycle) {
        let mut channel_guard = self.lock().await;

        // Checked under the lock, so the channel is closed either here or by
        // the shutdown
        if lifecycle.state() == LifecycleState::Stopped {
            let mut channel = channel;
            let result = self.close_on(&mut channel).await;
            drop(channel_guard);

            debug!(
                producer = self.name.as_ref(),
                "Closed a broker channel handed to a stopped producer",
            );

            if let Err(error) = result {
                self.report(error).await;
            }

            return;
        }

        *channel_guard = channel;
        drop(channel_guard);

        debug!(producer = self.name.as_ref(), "Replaced the broker channel");
    }

    /// Publishes the given message through the given (locked) channel.
    pub(crate) async fn publish_on(
        &self,
        channel: &mut C,
        message: &OutboundMessage,
    ) -> Result<(), ProducerError<C::Error>> {
        let result = channel
            .publish(
                &self.exchange,
                &message.routing_key,
                &message.payload,
                self.config.options(),
            )
            .await;

        result.map_err(|error| {
            error!(
                alert = true,
                producer = self.name.as_ref(),
                exchange = self.exchange.as_ref(),
                routing_key = message.routing_key.as_str(),
                ?error,
                error_message = %error,
                byte_preview = String::from_utf8_lossy(&message.payload).as_ref(),
                "Failed to publish a message",
            );

            ProducerError::Publish {
                exchange: Arc::clone(&self.exchange),
                routing_key: message.routing_key.clone(),
                source: error,
            }
        })
    }

    /// Publishes the given message and reports a failure to the error sink.
    /// The message is dropped either way.
    pub(crate) async fn deliver(&self, message: OutboundMessage) {
        let mut channel_guard = self.lock().await;
        let result = self.publish_on(&mut channel_guard, &message).await;
        drop(channel_guard);

        if let Err(error) = result {
            self.report(error).await;
        }
    }

    /// Closes the given (locked) channel.
    pub(crate) async fn close_on(&self, channel: &mut C) -> Result<(), ProducerError<C::Error>> {
        channel.close().await.map_err(|error| {
            error!(
                alert = true,
                producer = self.name.as_ref(),
                ?error,
                error_message = %error,
                "Failed to close the broker channel",
            );

            ProducerError::Close { source: error }
        })
    }

    /// Closes the current channel and reports a failure to the error sink.
    pub(crate) async fn close(&self) {
        let mut channel_guard = self.lock().await;
        let result = self.close_on(&mut channel_guard).await;
        drop(channel_guard);

        if let Err(error) = result {
            self.report(error).await;
        }
    }

    /// Sends the given failure to the error sink.
    pub(crate) async fn report(&self, error: ProducerError<C::Error>) {
        self.errors.report(&self.name, error).await;
    }
}
