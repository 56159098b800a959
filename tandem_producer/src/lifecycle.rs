use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

/// The lifecycle stage of a producer.
///
/// A producer moves strictly forward: `Idle` → `Running` → `Stopped`. Each
/// transition happens at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed, but not yet started.
    Idle,
    /// Accepting and publishing messages.
    Running,
    /// Stopped for good; the channel handle is (being) closed.
    Stopped,
}

impl LifecycleState {
    const fn encode(self) -> u8 {
        match self {
            LifecycleState::Idle => 0,
            LifecycleState::Running => 1,
            LifecycleState::Stopped => 2,
        }
    }

    const fn decode(value: u8) -> Self {
        match value {
            0 => LifecycleState::Idle,
            1 => LifecycleState::Running,
            _ => LifecycleState::Stopped,
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Idle => f.write_str("idle"),
            LifecycleState::Running => f.write_str("running"),
            LifecycleState::Stopped => f.write_str("stopped"),
        }
    }
}

/// Atomic holder of a [`LifecycleState`] with exactly-once transitions.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    /// A lifecycle that still has to be started.
    pub(crate) fn idle() -> Self {
        Self::at(LifecycleState::Idle)
    }

    /// A lifecycle that is ready from the start.
    pub(crate) fn running() -> Self {
        Self::at(LifecycleState::Running)
    }

    fn at(state: LifecycleState) -> Self {
        Self {
            state: AtomicU8::new(state.encode()),
        }
    }

    /// Reports the current state.
    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::decode(self.state.load(Ordering::Acquire))
    }

    /// Moves from `Idle` to `Running`. Returns `true` only for the one caller
    /// that performed the transition.
    pub(crate) fn mark_running(&self) -> bool {
        self.transition(LifecycleState::Idle, LifecycleState::Running)
    }

    /// Moves from `Running` to `Stopped`. Returns `true` only for the one
    /// caller that performed the transition.
    pub(crate) fn mark_stopped(&self) -> bool {
        self.transition(LifecycleState::Running, LifecycleState::Stopped)
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(
                from.encode(),
                to.encode(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}
