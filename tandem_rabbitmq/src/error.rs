use lapin::Error as LapinError;
use thiserror::Error;

/// Represents the ways a [`RabbitChannel`](crate::RabbitChannel) can fail.
#[derive(Error, Debug)]
pub enum RabbitError {
    /// Could not connect to the broker.
    #[error("failed to establish a RabbitMQ connection: {0}")]
    Connection(#[source] LapinError),

    /// Could not open a channel, or enable publisher confirms on it.
    #[error("failed to open a RabbitMQ channel: {0}")]
    Channel(#[source] LapinError),

    /// Could not write the message to the channel.
    #[error("failed to transmit an outgoing RabbitMQ message: {0}")]
    Transmission(#[source] LapinError),

    /// The broker acknowledged the message, but returned it as unroutable.
    #[error("the broker returned an outgoing RabbitMQ message ({reply_code}: '{reply_text}')")]
    Returned {
        /// AMQP reply code sent back with the message.
        reply_code: u16,
        /// AMQP reply text sent back with the message.
        reply_text: String,
    },

    /// The broker negatively acknowledged the message, which only happens on
    /// an internal broker error.
    #[error("the broker negatively acknowledged an outgoing RabbitMQ message")]
    Nacked,

    /// Communication broke down while waiting for the publisher confirm.
    #[error("failed to confirm an outgoing RabbitMQ message: {0}")]
    Confirmation(#[source] LapinError),

    /// Could not cleanly close the channel.
    #[error("failed to close a RabbitMQ channel: {0}")]
    Close(#[source] LapinError),
}

impl RabbitError {
    /// Reports whether the broker itself refused the message, as opposed to
    /// the communication with it failing.
    pub fn is_refusal(&self) -> bool {
        matches!(self, RabbitError::Returned { .. } | RabbitError::Nacked)
    }
}
