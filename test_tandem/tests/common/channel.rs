use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tandem_producer::{BrokerChannel, async_trait};
use thiserror::Error;

/// The failure returned by a refusing [`RecordingChannel`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("broker refused the message: {0}")]
pub struct Refusal(pub &'static str);

/// One publish observed by a [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub channel: &'static str,
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
    pub options: &'static str,
}

/// Collects everything done to the channels it hands out, and notices any two
/// calls running at the same time.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    published: Arc<Mutex<Vec<Published>>>,
    closed: Arc<Mutex<Vec<&'static str>>>,
    in_flight: Arc<AtomicUsize>,
    overlaps: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn channel(&self, label: &'static str) -> RecordingChannel {
        RecordingChannel {
            label,
            recorder: self.clone(),
            refusal: None,
            latency: Duration::ZERO,
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.published
            .lock()
            .iter()
            .map(|published| published.payload.clone())
            .collect()
    }

    pub fn closed(&self) -> Vec<&'static str> {
        self.closed.lock().clone()
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    async fn enter(&self, latency: Duration) {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct RecordingChannel {
    label: &'static str,
    recorder: Recorder,
    refusal: Option<Refusal>,
    latency: Duration,
}

impl RecordingChannel {
    /// Makes every publish on this channel fail with the given reason.
    pub fn refusing(self, reason: &'static str) -> Self {
        Self {
            refusal: Some(Refusal(reason)),
            ..self
        }
    }

    /// Makes every call on this channel take at least the given time.
    pub fn with_latency(self, latency: Duration) -> Self {
        Self { latency, ..self }
    }
}

#[async_trait]
impl BrokerChannel for RecordingChannel {
    type Options = &'static str;
    type Error = Refusal;

    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        options: &Self::Options,
    ) -> Result<(), Self::Error> {
        self.recorder.enter(self.latency).await;

        let result = match &self.refusal {
            Some(refusal) => Err(refusal.clone()),
            None => {
                self.recorder.published.lock().push(Published {
                    channel: self.label,
                    exchange: exchange.to_string(),
                    routing_key: routing_key.to_string(),
                    payload: payload.to_vec(),
                    options: *options,
                });
                Ok(())
            }
        };

        self.recorder.leave();

        result
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.recorder.enter(self.latency).await;
        self.recorder.closed.lock().push(self.label);
        self.recorder.leave();

        Ok(())
    }
}
