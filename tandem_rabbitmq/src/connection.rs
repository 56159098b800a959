use crate::RabbitError;
use lapin::{Connection, ConnectionProperties};
use tracing::{info, warn};

/// Establishes a RabbitMQ connection to the given AMQP URI, driven by the
/// current Tokio runtime.
///
/// Must be called from within a Tokio runtime. Reconnecting on loss is left to
/// the caller, which can hand fresh channels to running producers through
/// [`Producer::set_channel`](tandem_producer::Producer::set_channel).
pub async fn connect(uri: &str) -> Result<Connection, RabbitError> {
    // Set up the connection properties to use the current Tokio context
    let connection_properties = ConnectionProperties::default()
        .with_executor(tokio_executor_trait::Tokio::current())
        .with_reactor(tokio_reactor_trait::Tokio);

    match Connection::connect(uri, connection_properties).await {
        Ok(connection) => {
            info!("Established a RabbitMQ connection");

            Ok(connection)
        }
        Err(error) => {
            warn!(
                ?error,
                error_message = %error,
                "Failed to establish a RabbitMQ connection",
            );

            Err(RabbitError::Connection(error))
        }
    }
}
