use serde::Deserialize;

/// Defines whether RabbitMQ persists the messages to disk, which affects
/// whether such messages are able to survive a broker restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Delivery mode `1`: non-persistent (transient): messages sent with this
    /// mode will **not** survive a broker restart.
    #[serde(alias = "Transient", alias = "non_persistent")]
    Transient,
    /// Delivery mode `2`: persistent (durable): messages sent with this mode
    /// will be written to disk and, if they are **also** routed to a **durable
    /// queue**, they **will** survive a broker restart.
    #[serde(alias = "Durable", alias = "persistent")]
    Durable,
}

impl DeliveryMode {
    /// Returns the appropriate `u8` value recognized by RabbitMQ.
    pub const fn rabbitmq_value(&self) -> u8 {
        match self {
            DeliveryMode::Transient => 1,
            DeliveryMode::Durable => 2,
        }
    }
}
