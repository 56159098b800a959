use serde::de::{Error, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// Built-in exchanges that route by the routing key and thus require one.
const KEYED_BUILTIN_EXCHANGES: [&str; 3] = ["", "amq.direct", "amq.topic"];

/// Built-in exchanges that ignore the routing key and thus must not have one.
const UNKEYED_BUILTIN_EXCHANGES: [&str; 3] = ["amq.fanout", "amq.headers", "amq.match"];

/// Defines where a producer publishes its messages: the exchange, the default
/// routing key, and the broker-specific publishing options `O`.
///
/// The options are opaque to the producers: they are handed to the
/// [`BrokerChannel`](crate::BrokerChannel) as-is with every publish call.
///
/// A configuration is immutable once built. Producers take their own copy of
/// it at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerConfig<O = ()> {
    exchange: Arc<str>,
    routing_key: Arc<str>,
    options: O,
}

impl ProducerConfig {
    /// Creates a new [`ProducerConfigBuilder`] with no options. Attach
    /// broker-specific options with
    /// [`with_options`](ProducerConfigBuilder::with_options).
    pub fn builder() -> ProducerConfigBuilder<()> {
        ProducerConfigBuilder::new()
    }
}

impl<O> ProducerConfig<O> {
    /// Reports the exchange name of this configuration.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Reports the default routing key of this configuration.
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Exposes the broker-specific publishing options of this configuration.
    pub fn options(&self) -> &O {
        &self.options
    }

    /// Returns a shared handle on the exchange name.
    pub(crate) fn shared_exchange(&self) -> Arc<str> {
        Arc::clone(&self.exchange)
    }
}

/// Builds a [`ProducerConfig`] incrementally and validates it on the final
/// stage.
#[derive(Debug, Clone)]
pub struct ProducerConfigBuilder<O> {
    exchange: Arc<str>,
    routing_key: Arc<str>,
    options: O,
}

impl ProducerConfigBuilder<()> {
    /// Creates a new builder with empty exchange and routing key and no
    /// options.
    pub fn new() -> Self {
        Self {
            exchange: Arc::from(ProducerConfig::<()>::default_exchange()),
            routing_key: Arc::from(ProducerConfig::<()>::default_routing_key()),
            options: (),
        }
    }
}

impl Default for ProducerConfigBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> ProducerConfigBuilder<O> {
    /// Recreates this builder with the given exchange name.
    pub fn with_exchange(self, exchange: impl AsRef<str>) -> Self {
        Self {
            exchange: Arc::from(exchange.as_ref()),
            ..self
        }
    }

    /// Recreates this builder with the given default routing key.
    pub fn with_routing_key(self, routing_key: impl AsRef<str>) -> Self {
        Self {
            routing_key: Arc::from(routing_key.as_ref()),
            ..self
        }
    }

    /// Recreates this builder with the given broker-specific options,
    /// possibly changing the options type.
    pub fn with_options<P>(self, options: P) -> ProducerConfigBuilder<P> {
        ProducerConfigBuilder {
            exchange: self.exchange,
            routing_key: self.routing_key,
            options,
        }
    }

    /// Finalizes the builder, validates its state, and, assuming valid state,
    /// returns the [`ProducerConfig`].
    ///
    /// Custom exchanges accept any routing key. For the built-in RabbitMQ
    /// exchanges, the routing key must be present where the exchange routes
    /// by it (the default exchange, `amq.direct`, `amq.topic`), and absent
    /// where the exchange ignores it (`amq.fanout`, `amq.headers`,
    /// `amq.match`).
    pub fn build(self) -> Result<ProducerConfig<O>, ProducerConfigError> {
        self.validate()?;

        Ok(ProducerConfig {
            exchange: self.exchange,
            routing_key: self.routing_key,
            options: self.options,
        })
    }

    fn validate(&self) -> Result<(), ProducerConfigError> {
        let exchange = self.exchange.as_ref();

        if KEYED_BUILTIN_EXCHANGES.contains(&exchange) && self.routing_key.is_empty() {
            return Err(ProducerConfigError::ExchangeRequiresRoutingKey {
                exchange: exchange.to_string(),
            });
        }

        if UNKEYED_BUILTIN_EXCHANGES.contains(&exchange) && !self.routing_key.is_empty() {
            return Err(ProducerConfigError::ExchangeCannotHaveRoutingKey {
                exchange: exchange.to_string(),
                routing_key: self.routing_key.to_string(),
            });
        }

        Ok(())
    }
}

impl<O> ProducerConfig<O> {
    fn default_exchange() -> &'static str {
        ""
    }

    fn default_routing_key() -> &'static str {
        ""
    }
}

/// Represents the various error states of a [`ProducerConfig`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProducerConfigError {
    /// Indicates the absence of a routing key where it is required.
    #[error(
        "invalid producer configuration with built-in exchange '{exchange}': expected routing key, found none/empty"
    )]
    ExchangeRequiresRoutingKey {
        /// Built-in exchange that requires a routing key
        exchange: String,
    },

    /// Indicates the presence of a routing key where it is ignored.
    #[error(
        "invalid producer configuration with built-in exchange '{exchange}': expected no/empty routing key, found '{routing_key}'"
    )]
    ExchangeCannotHaveRoutingKey {
        /// Built-in exchange that ignores a routing key
        exchange: String,
        /// Given routing key
        routing_key: String,
    },
}

const _: () = {
    impl<'de, O> Deserialize<'de> for ProducerConfig<O>
    where
        O: Deserialize<'de> + Default,
    {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(ProducerConfigVisitor {
                options: PhantomData,
            })
        }
    }

    struct ProducerConfigVisitor<O> {
        options: PhantomData<O>,
    }

    impl<'de, O> Visitor<'de> for ProducerConfigVisitor<O>
    where
        O: Deserialize<'de> + Default,
    {
        type Value = ProducerConfig<O>;

        fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
            formatter.write_str("a map of producer configuration or a string routing key")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            ProducerConfig::builder()
                .with_routing_key(value)
                .with_options(O::default())
                .build()
                .map_err(Error::custom)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut exchange: Option<String> = None;
            let mut routing_key: Option<String> = None;
            let mut options: Option<O> = None;

            while let Some(key) = map.next_key()? {
                match key {
                    ProducerConfigField::Exchange => {
                        poll(&mut map, &mut exchange, "exchange")?;
                    }
                    ProducerConfigField::RoutingKey => {
                        poll(&mut map, &mut routing_key, "routing_key")?;
                    }
                    ProducerConfigField::Options => {
                        poll(&mut map, &mut options, "options")?;
                    }
                    ProducerConfigField::Ignored => {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
            }

            let exchange = exchange
                .as_deref()
                .unwrap_or_else(|| ProducerConfig::<O>::default_exchange());
            let routing_key = routing_key
                .as_deref()
                .unwrap_or_else(|| ProducerConfig::<O>::default_routing_key());

            ProducerConfig::builder()
                .with_exchange(exchange)
                .with_routing_key(routing_key)
                .with_options(options.unwrap_or_default())
                .build()
                .map_err(Error::custom)
        }
    }

    /// Reads the next value into the given slot, refusing duplicates.
    fn poll<'de, A, T>(map: &mut A, slot: &mut Option<T>, field: &'static str) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
        T: Deserialize<'de>,
    {
        if slot.is_some() {
            return Err(Error::duplicate_field(field));
        }

        *slot = Some(map.next_value()?);

        Ok(())
    }

    #[derive(Deserialize)]
    #[serde(field_identifier, rename_all = "snake_case")]
    enum ProducerConfigField {
        Exchange,
        #[serde(alias = "key")]
        RoutingKey,
        Options,
        #[serde(other)]
        Ignored,
    }
};
