use crate::BrokerChannel;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stub failure: {0}")]
pub(crate) struct StubError(pub(crate) &'static str);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Publish {
        channel: u8,
        exchange: String,
        routing_key: String,
        payload: Vec<u8>,
    },
    Close {
        channel: u8,
    },
}

/// Shared journal of every call made against any stub channel created from
/// it, plus overlap detection.
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
    busy: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
}

impl Journal {
    pub(crate) fn channel(&self, id: u8) -> StubChannel {
        StubChannel {
            id,
            journal: self.clone(),
            publish_failure: None,
            close_failure: None,
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn publishes(&self) -> usize {
        self.count(|call| matches!(call, Call::Publish { .. }))
    }

    pub(crate) fn closes(&self) -> usize {
        self.count(|call| matches!(call, Call::Close { .. }))
    }

    pub(crate) fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    async fn enter(&self, delay: Duration, call: Call) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().push(call);
        self.busy.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub(crate) struct StubChannel {
    id: u8,
    journal: Journal,
    publish_failure: Option<StubError>,
    close_failure: Option<StubError>,
    delay: Duration,
}

impl StubChannel {
    pub(crate) fn failing_publish(self, reason: &'static str) -> Self {
        Self {
            publish_failure: Some(StubError(reason)),
            ..self
        }
    }

    pub(crate) fn failing_close(self, reason: &'static str) -> Self {
        Self {
            close_failure: Some(StubError(reason)),
            ..self
        }
    }

    pub(crate) fn slow(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

#[async_trait]
impl BrokerChannel for StubChannel {
    type Options = ();
    type Error = StubError;

    async fn publish(
        &mut self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        _options: &Self::Options,
    ) -> Result<(), Self::Error> {
        let call = Call::Publish {
            channel: self.id,
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.to_vec(),
        };
        self.journal.enter(self.delay, call).await;

        match &self.publish_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        let call = Call::Close { channel: self.id };
        self.journal.enter(self.delay, call).await;

        match &self.close_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
