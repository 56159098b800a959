use tokio_util::sync::CancellationToken;

/// A one-shot barrier: once [released](Latch::release), every associated
/// [`Gate`] opens and stays open.
///
/// The producers use latches to acknowledge a shutdown request: whoever asks
/// for a shutdown keeps a [`Gate`] and waits on it, while the worker that
/// performs the shutdown releases the latch as its very last step.
///
/// ```
/// use tandem_sync::Latch;
///
/// # tokio_test::block_on(async {
/// let acknowledgement = Latch::new();
/// let gate = acknowledgement.gate();
///
/// tokio::spawn(async move {
///     // Wind down, then acknowledge
///     acknowledgement.release();
/// });
///
/// gate.opened().await;
/// assert!(gate.is_open());
/// # })
/// ```
///
/// Releasing is idempotent, and any clone of a latch may release it.
#[derive(Debug, Default, Clone)]
pub struct Latch {
    token: CancellationToken,
}

/// The waiting side of a [`Latch`].
///
/// Gates are cheap to clone, and any number of tasks may await the same gate.
#[derive(Debug, Clone)]
pub struct Gate {
    token: CancellationToken,
}

impl Latch {
    /// Returns a new, unreleased [`Latch`].
    pub fn new() -> Self {
        let token = CancellationToken::new();

        Self { token }
    }

    /// Returns a new [`Gate`] that opens when this [`Latch`] is released.
    pub fn gate(&self) -> Gate {
        Gate {
            token: self.token.clone(),
        }
    }

    /// Releases this [`Latch`], opening all associated [`Gate`]s. Subsequent
    /// calls have no additional effect.
    pub fn release(&self) {
        self.token.cancel();
    }

    /// Reports whether this [`Latch`] has already been released.
    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Gate {
    /// Waits until the associated [`Latch`] is released. Resolves immediately
    /// if it already was.
    pub async fn opened(&self) {
        self.token.cancelled().await;
    }

    /// Reports whether the associated [`Latch`] has been released.
    pub fn is_open(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn gate_stays_closed_until_release() {
        // Given
        let latch = Latch::new();
        let gate = latch.gate();

        // When
        let outcome = timeout(Duration::from_millis(10), gate.opened()).await;

        // Then
        assert!(outcome.is_err());
        assert!(!gate.is_open());
        assert!(!latch.is_released());
    }

    #[tokio::test]
    async fn release_opens_every_gate() {
        // Given
        let latch = Latch::new();
        let opened = Arc::new(AtomicUsize::new(0));
        let mut waiters = Vec::new();
        for _ in 0..3 {
            let gate = latch.gate();
            let opened = opened.clone();
            waiters.push(tokio::spawn(async move {
                gate.opened().await;
                opened.fetch_add(1, Ordering::Relaxed);
            }));
        }

        // When
        tokio::task::yield_now().await;
        latch.release();
        for waiter in waiters {
            waiter.await.unwrap();
        }

        // Then
        assert_eq!(opened.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn gate_of_released_latch_opens_immediately() {
        // Given
        let latch = Latch::new();
        latch.release();

        // When
        let outcome = timeout(Duration::from_millis(10), latch.gate().opened()).await;

        // Then
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn release_by_clone_is_idempotent() {
        // Given
        let latch = Latch::new();
        let gate = latch.gate();

        // When
        latch.clone().release();
        latch.release();

        // Then
        assert!(gate.is_open());
        assert!(latch.is_released());
    }
}
