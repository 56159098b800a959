#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes the producer configuration.
mod config;
pub use self::config::{ProducerConfig, ProducerConfigBuilder, ProducerConfigError};

mod lifecycle;
pub use self::lifecycle::LifecycleState;

/// Exposes the capability surface that producers require from a broker
/// channel.
mod channel;
pub use self::channel::BrokerChannel;

mod error;
pub use self::error::ProducerError;

/// Exposes the out-of-band error reporting machinery.
mod sink;
pub use self::sink::{ErrorSink, ErrorStream};

/// Exposes both producer flavors.
mod producer;
pub use self::producer::Producer;
pub use self::producer::asynchronous::AsyncProducer;
pub use self::producer::synchronous::SyncProducer;

// Re-export the attribute macro needed to implement [`BrokerChannel`].
pub use async_trait::async_trait;

#[cfg(test)]
mod testing;
