#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes the RabbitMQ implementation of the broker channel.
mod channel;
pub use self::channel::RabbitChannel;

mod connection;
pub use self::connection::connect;

mod error;
pub use self::error::RabbitError;

/// Exposes the per-producer publishing options.
mod options;
pub use self::options::PublishOptions;

/// Exposes the domain enumerations that shape the publishing.
mod repr {
    pub mod confirmation;
    pub mod delivery;
}
pub use self::repr::confirmation::ConfirmationLevel;
pub use self::repr::delivery::DeliveryMode;
