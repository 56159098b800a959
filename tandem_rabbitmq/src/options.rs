use crate::DeliveryMode;
use lapin::BasicProperties;
use lapin::types::ShortString;
use serde::Deserialize;
use std::time::Duration;

/// Per-producer AMQP properties applied to every message published through a
/// [`RabbitChannel`](crate::RabbitChannel).
///
/// Travels as the `options` of a
/// [`ProducerConfig`](tandem_producer::ProducerConfig). Every property is
/// optional; unset properties are left for the broker to default.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishOptions {
    delivery_mode: Option<DeliveryMode>,
    content_type: Option<String>,
    priority: Option<u8>,
    #[serde(alias = "expiration")]
    expiration_ms: Option<u64>,
}

impl PublishOptions {
    /// Creates options with no properties set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every message as [durable](DeliveryMode::Durable).
    pub fn durable(self) -> Self {
        self.with_delivery_mode(DeliveryMode::Durable)
    }

    /// Marks every message as [transient](DeliveryMode::Transient).
    pub fn transient(self) -> Self {
        self.with_delivery_mode(DeliveryMode::Transient)
    }

    /// Sets the given [`DeliveryMode`] on every message.
    pub fn with_delivery_mode(self, delivery_mode: DeliveryMode) -> Self {
        Self {
            delivery_mode: Some(delivery_mode),
            ..self
        }
    }

    /// Sets the given MIME content type on every message.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..self
        }
    }

    /// Sets the given priority on every message.
    pub fn with_priority(self, priority: u8) -> Self {
        Self {
            priority: Some(priority),
            ..self
        }
    }

    /// Sets the given per-message TTL on every message. Sub-millisecond
    /// precision is truncated.
    pub fn with_expiration(self, expiration: Duration) -> Self {
        let millis = u64::try_from(expiration.as_millis()).unwrap_or(u64::MAX);

        Self {
            expiration_ms: Some(millis),
            ..self
        }
    }
}

impl PublishOptions {
    /// Reports the delivery mode, if set.
    pub fn delivery_mode(&self) -> Option<DeliveryMode> {
        self.delivery_mode
    }

    /// Reports the content type, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Reports the priority, if set.
    pub fn priority(&self) -> Option<u8> {
        self.priority
    }

    /// Reports the per-message TTL, if set.
    pub fn expiration(&self) -> Option<Duration> {
        self.expiration_ms.map(Duration::from_millis)
    }

    /// Renders these options as the AMQP properties of an outgoing message.
    pub(crate) fn properties(&self) -> BasicProperties {
        let mut properties = BasicProperties::default();

        if let Some(delivery_mode) = self.delivery_mode {
            properties = properties.with_delivery_mode(delivery_mode.rabbitmq_value());
        }

        if let Some(content_type) = &self.content_type {
            properties = properties.with_content_type(ShortString::from(content_type.clone()));
        }

        if let Some(priority) = self.priority {
            properties = properties.with_priority(priority);
        }

        // AMQP carries the TTL as a decimal string of milliseconds
        if let Some(expiration_ms) = self.expiration_ms {
            properties = properties.with_expiration(ShortString::from(expiration_ms.to_string()));
        }

        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_properties() {
        // Given
        let options = PublishOptions::new();

        // When
        let properties = options.properties();

        // Then
        assert_eq!(*properties.delivery_mode(), None);
        assert_eq!(*properties.content_type(), None);
        assert_eq!(*properties.priority(), None);
        assert_eq!(*properties.expiration(), None);
    }

    #[test]
    fn full_properties() {
        // Given
        let options = PublishOptions::new()
            .durable()
            .with_content_type("application/json")
            .with_priority(7)
            .with_expiration(Duration::from_millis(1500));

        // When
        let properties = options.properties();

        // Then
        assert_eq!(*properties.delivery_mode(), Some(2));
        assert_eq!(
            properties.content_type().as_ref().map(ShortString::as_str),
            Some("application/json"),
        );
        assert_eq!(*properties.priority(), Some(7));
        assert_eq!(
            properties.expiration().as_ref().map(ShortString::as_str),
            Some("1500"),
        );
    }

    #[test]
    fn later_delivery_mode_wins() {
        // When
        let options = PublishOptions::new().durable().transient();

        // Then
        assert_eq!(options.delivery_mode(), Some(DeliveryMode::Transient));
        assert_eq!(*options.properties().delivery_mode(), Some(1));
    }

    #[test]
    fn deserialize_from_map() {
        // Given
        let input = r#"
delivery_mode: durable
content_type: text/plain
priority: 3
expiration: 60000
"#;

        // When
        let actual: PublishOptions = serde_yml::from_str(input).unwrap();

        // Then
        assert_eq!(
            actual,
            PublishOptions::new()
                .durable()
                .with_content_type("text/plain")
                .with_priority(3)
                .with_expiration(Duration::from_secs(60)),
        );
        assert_eq!(actual.expiration(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn deserialize_empty_map() {
        // When
        let actual: PublishOptions = serde_yml::from_str("{}").unwrap();

        // Then
        assert_eq!(actual, PublishOptions::default());
    }

    #[test]
    fn deserialize_unknown_field() {
        // When
        let result = serde_yml::from_str::<PublishOptions>("mandatory: true");

        // Then
        assert!(result.is_err());
    }
}
