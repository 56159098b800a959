use crate::ProducerError;
use std::error::Error;
use tokio::sync::mpsc;
use tracing::warn;

/// The send-only stream through which producers report failures
/// out-of-band.
///
/// The owner of the producers must keep draining the linked [`ErrorStream`]:
/// a producer reporting into a full sink waits until there is room. Reports
/// made after the stream is dropped are logged and discarded.
#[derive(Debug)]
pub struct ErrorSink<E> {
    sender: mpsc::Sender<ProducerError<E>>,
}

/// The receiving end of an [`ErrorSink`].
#[derive(Debug)]
pub struct ErrorStream<E> {
    receiver: mpsc::Receiver<ProducerError<E>>,
}

impl<E> ErrorSink<E> {
    /// Creates a linked [`ErrorSink`] and [`ErrorStream`] that can hold up to
    /// `capacity` undrained failures (at least one).
    pub fn channel(capacity: usize) -> (Self, ErrorStream<E>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        (Self { sender }, ErrorStream { receiver })
    }
}

impl<E> ErrorSink<E>
where
    E: Error + Send + 'static,
{
    /// Sends the given failure to the owner, waiting for room if necessary.
    pub(crate) async fn report(&self, producer: &str, error: ProducerError<E>) {
        if let Err(mpsc::error::SendError(error)) = self.sender.send(error).await {
            warn!(
                producer,
                ?error,
                error_message = %error,
                "Discarded a producer error: the error stream is gone",
            );
        }
    }
}

impl<E> Clone for ErrorSink<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> From<mpsc::Sender<ProducerError<E>>> for ErrorSink<E> {
    fn from(sender: mpsc::Sender<ProducerError<E>>) -> Self {
        Self { sender }
    }
}

impl<E> ErrorStream<E> {
    /// Waits for the next reported failure. Returns [`None`] once every
    /// linked [`ErrorSink`] is dropped and all failures are drained.
    pub async fn next(&mut self) -> Option<ProducerError<E>> {
        self.receiver.recv().await
    }

    /// Returns an already reported failure without waiting, if any.
    pub fn try_next(&mut self) -> Option<ProducerError<E>> {
        self.receiver.try_recv().ok()
    }
}
