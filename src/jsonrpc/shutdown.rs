//! Cross-task exit signal
//!
//! The dispatch loop arms the signal when the peer sends `exit`; an
//! independent task waits on it and terminates the process. Arming is
//! idempotent and every waiter observes the same single transition.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One-shot shutdown signal shared between the dispatch loop and the terminator
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    /// Fires once, wakes every waiter
    token: CancellationToken,

    /// Set by the first `trigger` call
    armed: Arc<AtomicBool>,

    /// Whether `shutdown` preceded `exit`
    clean: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the signal
    ///
    /// Returns `true` only for the call that actually fired it. Later calls
    /// are no-ops and keep the exit status recorded by the first one.
    pub fn trigger(&self, clean: bool) -> bool {
        if self.armed.swap(true, Ordering::SeqCst) {
            debug!("Shutdown signal already armed, ignoring");
            return false;
        }

        self.clean.store(clean, Ordering::SeqCst);
        self.token.cancel();
        true
    }

    /// Check if the signal has fired
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the signal fires
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// Process exit status: 0 if a `shutdown` request preceded `exit`, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.clean.load(Ordering::SeqCst) {
            0
        } else {
            1
        }
    }
}
