use serde::Deserialize;

/// Defines the extent to which a [`RabbitChannel`](crate::RabbitChannel)
/// confirms each publish with the broker.
///
/// At the [lowest level](ConfirmationLevel::Transmitted) a publish is done as
/// soon as the message is written to the network. Any higher level enables
/// publisher confirms on the channel, and every publish then waits for the
/// broker to acknowledge the message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationLevel {
    /// Ensures network transmission.
    #[default]
    #[serde(alias = "transmit", alias = "Transmitted")]
    Transmitted,

    /// Ensures network transmission **and** exchange existence.
    #[serde(alias = "accept", alias = "Accepted")]
    Accepted,

    /// Ensures network transmission **and** exchange existence **and** routing
    /// to at least one queue.
    #[serde(alias = "route", alias = "Routed")]
    Routed,
}

impl ConfirmationLevel {
    /// Reports whether this level needs publisher confirms enabled on the
    /// channel.
    pub const fn requires_any_confirmation(&self) -> bool {
        match self {
            ConfirmationLevel::Transmitted => false,
            ConfirmationLevel::Accepted => true,
            ConfirmationLevel::Routed => true,
        }
    }

    /// Reports whether this level warrants a `mandatory` flag on the RabbitMQ
    /// `basic_publish` call.
    pub const fn requires_mandatory_publish(&self) -> bool {
        match self {
            ConfirmationLevel::Transmitted => false,
            ConfirmationLevel::Accepted => false,
            ConfirmationLevel::Routed => true,
        }
    }
}
