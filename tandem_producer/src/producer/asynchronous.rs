use crate::lifecycle::Lifecycle;
use crate::producer::OutboundMessage;
use crate::producer::shared::Shared;
use crate::{BrokerChannel, ErrorSink, LifecycleState, Producer, ProducerConfig, ProducerError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tandem_sync::{Handoff, Intake, Latch, handoff};
use tokio::runtime::Handle;
use tokio::select;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Publishes messages through a background worker, reporting failures
/// out-of-band to the [`ErrorSink`].
///
/// ## Lifecycle
///
/// A new producer is idle. [`start`](AsyncProducer::start) spawns its worker
/// onto the current Tokio runtime; [`stop`](AsyncProducer::stop) shuts the
/// worker down and closes the broker channel.
///
/// ## Publishing
///
/// [`produce`](AsyncProducer::produce) and
/// [`produce_with_routing_key`](AsyncProducer::produce_with_routing_key)
/// hand the message over to the worker and return as soon as the worker has
/// taken it, without waiting for the publish itself. There is no queue in
/// between: a caller waits until the worker is free, so callers can never
/// run ahead of the broker by more than one message. The worker publishes
/// one message at a time.
///
/// Messages handed over before [`start`](AsyncProducer::start) are not taken
/// until the producer is started: such calls do not complete in the meantime.
///
/// ## Failures
///
/// A failed publish is reported to the [`ErrorSink`] and the message is
/// dropped. No message is ever published twice. A failure never stops the
/// worker: only [`stop`](AsyncProducer::stop) does. Messages offered to a
/// stopped producer are refused and reported as
/// [`ProducerError::Stopped`].
///
/// ## Shutdown
///
/// Once the worker picks up the shutdown request, it turns away callers
/// still waiting to hand over, publishes the message that may already sit in
/// the hand-off slot, closes the channel, and exits. Dropping the producer
/// without stopping it has the same effect, except that nobody waits for it.
pub struct AsyncProducer<C: BrokerChannel> {
    shared: Arc<Shared<C>>,
    lifecycle: Lifecycle,
    handoff: Handoff<OutboundMessage>,
    shutdown: mpsc::Sender<Latch>,
    /// The worker, until it is started.
    worker: Mutex<Option<Worker<C>>>,
    /// Released when the worker exits (for any reason).
    finished: Latch,
}

/// The background half of an [`AsyncProducer`]: the only place where the
/// producer's messages are published.
struct Worker<C: BrokerChannel> {
    shared: Arc<Shared<C>>,
    intake: Intake<OutboundMessage>,
    shutdown: mpsc::Receiver<Latch>,
    finished: Latch,
}

/// What woke the worker up.
enum Signal {
    Deliver(OutboundMessage),
    Shutdown(Option<Latch>),
}

impl<C: BrokerChannel> AsyncProducer<C> {
    /// Creates a new, idle [`AsyncProducer`] that publishes through the given
    /// channel according to the given configuration.
    pub fn new(
        channel: C,
        errors: ErrorSink<C::Error>,
        config: ProducerConfig<C::Options>,
    ) -> Self {
        let shared = Arc::new(Shared::new("async", channel, errors, config));
        let (handoff, intake) = handoff();
        let (shutdown, shutdown_listener) = mpsc::channel(1);
        let finished = Latch::new();

        let worker = Worker {
            shared: Arc::clone(&shared),
            intake,
            shutdown: shutdown_listener,
            finished: finished.clone(),
        };

        Self {
            shared,
            lifecycle: Lifecycle::idle(),
            handoff,
            shutdown,
            worker: Mutex::new(Some(worker)),
            finished,
        }
    }

    /// Reports the name of this [`AsyncProducer`].
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Reports the lifecycle stage of this [`AsyncProducer`].
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Spawns the worker of this producer onto the current Tokio runtime.
    ///
    /// Only the first call on an idle producer has an effect.
    ///
    /// ## Panics
    ///
    /// Panics if called outside of a Tokio runtime. The producer then stays
    /// idle and can still be started from within a runtime.
    pub fn start(&self) {
        // Panics here leave the producer untouched
        let runtime = Handle::current();

        if !self.lifecycle.mark_running() {
            debug!(
                producer = self.name(),
                lifecycle = %self.lifecycle(),
                "Ignored a repeated start of a producer",
            );
            return;
        }

        if let Some(worker) = self.worker.lock().take() {
            runtime.spawn(worker.run());
        }
    }
}

impl<C: BrokerChannel> AsyncProducer<C> {
    /// Hands the given payload over to the worker, to be published with the
    /// configured routing key. Returns once the worker has taken it.
    pub async fn produce(&self, payload: impl Into<Vec<u8>>) {
        let message = self.shared.message(payload.into(), None);

        self.send(message).await;
    }

    /// Hands the given payload over to the worker, to be published with the
    /// given routing key. Returns once the worker has taken it.
    pub async fn produce_with_routing_key(
        &self,
        payload: impl Into<Vec<u8>>,
        routing_key: impl Into<String>,
    ) {
        let message = self.shared.message(payload.into(), Some(routing_key.into()));

        self.send(message).await;
    }

    /// Replaces the broker channel. Waits for the publish or close in progress
    /// (if any) to finish first.
    ///
    /// A stopped producer closes the given channel instead of keeping it.
    pub async fn set_channel(&self, channel: C) {
        self.shared.replace_channel(channel, &self.lifecycle).await;
    }

    /// Stops the worker and closes the broker channel, and returns once the
    /// worker has exited.
    ///
    /// Has no effect on an idle producer. On a running producer, exactly one
    /// call performs the shutdown, while any other call waits for the worker
    /// to exit and changes nothing.
    pub async fn stop(&self) {
        let finished = self.finished.gate();

        if self.lifecycle.mark_stopped() {
            let acknowledgement = Latch::new();
            let acknowledged = acknowledgement.gate();

            // The worker can only be gone here if it panicked
            if self.shutdown.send(acknowledgement).await.is_ok() {
                select! {
                    biased;
                    _ = acknowledged.opened() => {}
                    _ = finished.opened() => {}
                }
            }
        }

        if self.lifecycle.state() == LifecycleState::Stopped {
            finished.opened().await;
        }
    }

    async fn send(&self, message: OutboundMessage) {
        if self.lifecycle.state() == LifecycleState::Stopped {
            return self.refuse(message.routing_key).await;
        }

        let routing_key = message.routing_key.clone();

        if !self.handoff.hand_over(message).await {
            self.refuse(routing_key).await;
        }
    }

    /// Reports a message that the stopped worker will never take.
    async fn refuse(&self, routing_key: String) {
        warn!(
            producer = self.name(),
            routing_key = routing_key.as_str(),
            "Dropped an outgoing message: the producer is stopped",
        );

        self.shared.report(ProducerError::Stopped { routing_key }).await;
    }
}

impl<C: BrokerChannel> Worker<C> {
    /// Publishes handed over messages one by one until asked to shut down
    /// (or until the producer is dropped).
    async fn run(mut self) {
        // Whatever happens, let the waiting `stop` callers go
        let finished = self.finished.clone();
        scopeguard::defer! {
            finished.release();
        }

        info!(producer = self.shared.name(), "Started a producer worker");

        let acknowledgement = loop {
            let signal = select! {
                message = self.intake.accept() => match message {
                    Some(message) => Signal::Deliver(message),
                    None => Signal::Shutdown(None),
                },
                request = self.shutdown.recv() => Signal::Shutdown(request),
            };

            match signal {
                Signal::Deliver(message) => self.shared.deliver(message).await,
                Signal::Shutdown(acknowledgement) => break acknowledgement,
            }
        };

        self.wind_down().await;

        info!(producer = self.shared.name(), "Stopped a producer worker");

        if let Some(acknowledgement) = acknowledgement {
            acknowledgement.release();
        }
    }

    /// Turns away further hand-overs, publishes the message left in the
    /// hand-off slot (if any), and closes the channel.
    async fn wind_down(&mut self) {
        self.intake.close();

        while let Some(message) = self.intake.try_accept() {
            self.shared.deliver(message).await;
        }

        self.shared.close().await;
    }
}

#[async_trait]
impl<C: BrokerChannel> Producer for AsyncProducer<C> {
    type Channel = C;

    fn name(&self) -> &str {
        AsyncProducer::name(self)
    }

    fn lifecycle(&self) -> LifecycleState {
        AsyncProducer::lifecycle(self)
    }

    fn start(&self) {
        AsyncProducer::start(self);
    }

    async fn set_channel(&self, channel: C) {
        AsyncProducer::set_channel(self, channel).await;
    }

    async fn stop(&self) {
        AsyncProducer::stop(self).await;
    }
}
