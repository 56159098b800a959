use crate::{ConfirmationLevel, PublishOptions, RabbitError};
use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::publisher_confirm::Confirmation;
use lapin::{Channel, Connection, Error as LapinError};
use tandem_producer::BrokerChannel;
use tracing::{debug, error, info};

/// Reply code sent to the broker when closing a channel on purpose.
const REPLY_SUCCESS: u16 = 200;

/// A [`BrokerChannel`] that publishes to RabbitMQ through a single
/// [`lapin::Channel`].
///
/// Every publish transmits the message and then, depending on the
/// [`ConfirmationLevel`], waits for the broker to confirm it:
///
/// - [`Transmitted`](ConfirmationLevel::Transmitted): done once the message is
///   written to the network.
/// - [`Accepted`](ConfirmationLevel::Accepted): done once the broker
///   acknowledges the message.
/// - [`Routed`](ConfirmationLevel::Routed): as above, and the message is
///   published as `mandatory`, so an unroutable message comes back as
///   [`RabbitError::Returned`].
///
/// No retries happen here. A failed publish is reported to the producer, which
/// forwards it to the caller or the error sink.
#[derive(Debug)]
pub struct RabbitChannel {
    channel: Channel,
    confirmation: ConfirmationLevel,
}

impl RabbitChannel {
    /// Opens a fresh channel on the given connection, enabling publisher
    /// confirms if the given level needs them.
    pub async fn open(
        connection: &Connection,
        confirmation: ConfirmationLevel,
    ) -> Result<Self, RabbitError> {
        let channel = connection
            .create_channel()
            .await
            .map_err(|error| Self::report_channel_error(error, "Failed to create a RabbitMQ channel"))?;

        Self::wrap(channel, confirmation).await
    }

    /// Wraps an already open channel, enabling publisher confirms on it if the
    /// given level needs them.
    pub async fn wrap(channel: Channel, confirmation: ConfirmationLevel) -> Result<Self, RabbitError> {
        if confirmation.requires_any_confirmation() {
            channel
                .confirm_select(ConfirmSelectOptions { nowait: false })
                .await
                .map_err(|error| {
                    Self::report_channel_error(
                        error,
                        "Failed to enable publisher confirms on a RabbitMQ channel",
                    )
                })?;
        }

        debug!(
            channel_id = channel.id(),
            ?confirmation,
            "Opened a RabbitMQ channel for publishing",
        );

        Ok(Self {
            channel,
            confirmation,
        })
    }

    /// Reports the [`ConfirmationLevel`] of this channel.
    pub fn confirmation(&self) -> ConfirmationLevel {
        self.confirmation
    }

    fn report_channel_error(error: LapinError, message: &'static str) -> RabbitError {
        error!(
            alert = true,
            ?error,
            error_message = %error,
            "{}",
            message,
        );

        RabbitError::Channel(error)
    }
}

#[async_trait]
impl BrokerChannel for RabbitChannel {
    type Options = PublishOptions;
    type Error = RabbitError;

    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        options: &Self::Options,
    ) -> Result<(), Self::Error> {
        // Transmit
        let future_confirm = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions {
                    mandatory: self.confirmation.requires_mandatory_publish(),
                    immediate: false, // this flag is not supported and ignored by RabbitMQ v3+
                },
                payload,
                options.properties(),
            )
            .await
            .map_err(RabbitError::Transmission)?;

        // Confirm
        match future_confirm.await {
            // Publisher confirm was not requested
            Ok(Confirmation::NotRequested) => Ok(()),

            // RabbitMQ acknowledged our transmission
            Ok(Confirmation::Ack(None)) => Ok(()),

            // RabbitMQ acknowledged our transmission, but returned the message
            Ok(Confirmation::Ack(Some(returned))) => Err(RabbitError::Returned {
                reply_code: returned.reply_code,
                reply_text: returned.reply_text.to_string(),
            }),

            // RabbitMQ negatively acknowledged our transmission, which only
            // happens on internal error
            Ok(Confirmation::Nack(_)) => Err(RabbitError::Nacked),

            // Errored out on receiving publisher confirm
            Err(error) => Err(RabbitError::Confirmation(error)),
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        match self.channel.close(REPLY_SUCCESS, "Producer stopped").await {
            Ok(()) => {
                info!(channel_id = self.channel.id(), "Closed a RabbitMQ channel");

                Ok(())
            }

            // Already closed or lost along with its connection
            Err(LapinError::InvalidChannelState(state)) => {
                info!(
                    channel_id = self.channel.id(),
                    "Ignored a RabbitMQ channel in the invalid state '{:?}' on close",
                    state,
                );

                Ok(())
            }

            Err(error) => Err(RabbitError::Close(error)),
        }
    }
}
