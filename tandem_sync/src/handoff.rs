use tokio::sync::{mpsc, oneshot};

/// Creates a rendezvous pair: a clonable [`Handoff`] for any number of
/// sending tasks and a single [`Intake`] for the receiving task.
///
/// A sender [hands over](Handoff::hand_over) an item and stays suspended
/// until the receiving task actually [accepts](Intake::accept) it. At most one
/// item waits between the two sides at any moment, so a sender can never get
/// ahead of the receiver by more than that single slot.
///
/// ## Example
///
/// ```
/// use tandem_sync::handoff;
///
/// # tokio_test::block_on(async {
/// let (handoff, mut intake) = handoff::<&'static str>();
///
/// let receiver = tokio::spawn(async move { intake.accept().await });
///
/// // Resumes only once the receiver took the item
/// assert!(handoff.hand_over("hello").await);
/// assert_eq!(receiver.await.unwrap(), Some("hello"));
/// # })
/// ```
pub fn handoff<T>() -> (Handoff<T>, Intake<T>) {
    // A single slot plus per-item acceptance gives zero-capacity semantics
    let (sender, receiver) = mpsc::channel(1);

    (Handoff { sender }, Intake { receiver })
}

/// The sending side of a [`handoff`] pair.
///
/// Light-weight and cheaply clonable.
#[derive(Debug)]
pub struct Handoff<T> {
    sender: mpsc::Sender<Parcel<T>>,
}

/// The receiving side of a [`handoff`] pair. Only one task at a time may own
/// it.
#[derive(Debug)]
pub struct Intake<T> {
    receiver: mpsc::Receiver<Parcel<T>>,
}

/// An item in transit, together with the signal that tells the sender its item
/// was taken.
#[derive(Debug)]
struct Parcel<T> {
    item: T,
    accepted: oneshot::Sender<()>,
}

impl<T> Handoff<T> {
    /// Hands the given item over to the linked [`Intake`] and waits until it
    /// is accepted.
    ///
    /// Returns `true` once the item has been accepted. Returns `false` if the
    /// intake was closed or dropped before accepting the item, in which case
    /// the item is dropped.
    ///
    /// While the intake exists but does not accept anything, this method does
    /// not return. Dropping the returned future before acceptance withdraws
    /// the item: the intake will skip it.
    pub async fn hand_over(&self, item: T) -> bool {
        let (accepted, acceptance) = oneshot::channel();

        // Occupy the slot (waits for the previous item to be taken)
        if self.sender.send(Parcel { item, accepted }).await.is_err() {
            return false;
        }

        // Wait for the receiving side to take our item
        acceptance.await.is_ok()
    }
}

impl<T> Clone for Handoff<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> Intake<T> {
    /// Waits for the next handed over item, accepts it (resuming its sender)
    /// and returns it.
    ///
    /// Returns [`None`] once every [`Handoff`] is dropped, or once this intake
    /// is [closed](Intake::close) and drained.
    ///
    /// This method is cancellation-safe: if the returned future is dropped
    /// before completion, no item is lost.
    pub async fn accept(&mut self) -> Option<T> {
        loop {
            let parcel = self.receiver.recv().await?;

            if let Some(item) = parcel.open() {
                return Some(item);
            }
        }
    }

    /// Accepts an item that is already waiting, without suspending. Returns
    /// [`None`] if nothing is waiting.
    pub fn try_accept(&mut self) -> Option<T> {
        loop {
            let parcel = self.receiver.try_recv().ok()?;

            if let Some(item) = parcel.open() {
                return Some(item);
            }
        }
    }

    /// Closes this intake: senders that have not yet occupied the slot are
    /// turned away, while an item already in the slot can still be
    /// [taken](Intake::try_accept).
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl<T> Parcel<T> {
    /// Signals acceptance and yields the item, unless the sender withdrew in
    /// the meantime.
    fn open(self) -> Option<T> {
        match self.accepted.send(()) {
            Ok(()) => Some(self.item),
            Err(()) => None,
        }
    }
}
