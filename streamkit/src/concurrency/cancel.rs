//! Level-triggered cancellation signal.
//!
//! A cancellation signal is a watch channel over a `bool`. Once [`CancelTx::cancel`] flips it to
//! `true` it never goes back, so every receiver observes the cancellation regardless of when it
//! subscribed or started waiting. This differs from a plain change notification, where a
//! receiver created after the change would miss it.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Transmitter side of a cancellation signal.
///
/// Cloning the transmitter gives another handle able to fire the same signal.
#[derive(Debug, Clone)]
pub struct CancelTx(watch::Sender<bool>);

impl CancelTx {
    /// Fires the signal. Calling it again has no further effect.
    pub fn cancel(&self) {
        // `send_replace` succeeds even when no receiver is alive.
        let was_cancelled = self.0.send_replace(true);
        if !was_cancelled {
            debug!("cancellation signal fired");
        }
    }

    /// Fires the signal once `duration` has elapsed.
    ///
    /// Aborting the returned handle disarms the timer.
    pub fn cancel_after(&self, duration: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            this.cancel();
        })
    }

    /// Returns whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Creates a new receiver for this signal.
    pub fn subscribe(&self) -> CancelRx {
        CancelRx(self.0.subscribe())
    }
}

/// Receiver side of a cancellation signal.
///
/// Combinators take a [`CancelRx`] by value and clone it into every task they spawn.
#[derive(Debug, Clone)]
pub struct CancelRx(watch::Receiver<bool>);

impl CancelRx {
    /// Returns a receiver that never fires.
    pub fn never() -> Self {
        // The sender is dropped right away, so the value stays `false` forever.
        let (_, rx) = watch::channel(false);
        Self(rx)
    }

    /// Returns whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Completes once the signal has fired.
    ///
    /// Resolves immediately if it already fired. If every [`CancelTx`] is dropped without firing,
    /// the signal can no longer fire and this future stays pending forever.
    ///
    /// This future is cancel safe and meant to be used as a `tokio::select!` branch.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Creates a new, not yet fired, cancellation signal.
pub fn create_cancel_channel() -> (CancelTx, CancelRx) {
    let (tx, rx) = watch::channel(false);
    (CancelTx(tx), CancelRx(rx))
}
