use std::sync::Arc;
use thiserror::Error;

/// Represents a failure observed by a producer. The broker-originated
/// failures wrap the [`BrokerChannel::Error`](crate::BrokerChannel::Error)
/// `E`.
///
/// The synchronous producer returns publishing failures to its caller. All
/// other failures (and all failures of the asynchronous producer) arrive at
/// the [`ErrorSink`](crate::ErrorSink).
#[derive(Error, Debug)]
pub enum ProducerError<E> {
    /// The broker channel failed to publish a message. The message is
    /// dropped.
    #[error(
        "failed to publish a message to exchange '{exchange}' with routing key '{routing_key}': {source}"
    )]
    Publish {
        /// Exchange the message was addressed to
        exchange: Arc<str>,
        /// Routing key the message was published with
        routing_key: String,
        /// Failure reported by the broker channel
        #[source]
        source: E,
    },

    /// The broker channel failed to close. The channel is considered closed
    /// regardless.
    #[error("failed to close the broker channel: {source}")]
    Close {
        /// Failure reported by the broker channel
        #[source]
        source: E,
    },

    /// The producer was already stopped and did not take the message.
    #[error("the producer is stopped: a message with routing key '{routing_key}' was not accepted")]
    Stopped {
        /// Routing key of the refused message
        routing_key: String,
    },
}

impl<E> ProducerError<E> {
    /// Exposes the underlying broker channel failure, if any.
    pub fn broker_error(&self) -> Option<&E> {
        match self {
            ProducerError::Publish { source, .. } => Some(source),
            ProducerError::Close { source } => Some(source),
            ProducerError::Stopped { .. } => None,
        }
    }

    /// Reports whether this failure was caused by the producer being stopped.
    pub fn is_stopped(&self) -> bool {
        matches!(self, ProducerError::Stopped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubError;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[test]
    fn publish_error_display_and_source() {
        // Given
        let error = ProducerError::Publish {
            exchange: Arc::from("orders"),
            routing_key: "new".to_string(),
            source: StubError("unreachable"),
        };

        // Then
        assert_eq!(
            error.to_string(),
            "failed to publish a message to exchange 'orders' with routing key 'new': stub failure: unreachable",
        );
        assert!(error.source().is_some());
        assert_eq!(error.broker_error(), Some(&StubError("unreachable")));
        assert!(!error.is_stopped());
    }

    #[test]
    fn stopped_error_has_no_broker_error() {
        // Given
        let error: ProducerError<StubError> = ProducerError::Stopped {
            routing_key: "late".to_string(),
        };

        // Then
        assert!(error.is_stopped());
        assert_eq!(error.broker_error(), None);
        assert!(error.source().is_none());
    }
}
