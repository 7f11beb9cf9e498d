use std::future::Future;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Runs `f` once per input concurrently and returns the first output produced.
///
/// Every invocation runs in its own task and is left to complete, its output is dropped if it
/// did not win.
///
/// Callers must supply at least one input: with none there is nothing to wait for, so the call
/// returns [`None`] right away instead of blocking. [`None`] is also returned when every
/// invocation panicked.
pub async fn moving_later<I, O, F, Fut>(inputs: impl IntoIterator<Item = I>, f: F) -> Option<O>
where
    O: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = O> + Send + 'static,
{
    // A single slot: the first output takes it, later ones fail `try_send` and are dropped.
    let (winner_tx, mut winner_rx) = mpsc::channel(1);

    let mut launched = 0usize;
    for input in inputs {
        let winner_tx = winner_tx.clone();
        let invocation = f(input);
        tokio::spawn(async move {
            let output = invocation.await;
            if winner_tx.try_send(output).is_err() {
                trace!("late output dropped");
            }
        });
        launched += 1;
    }
    drop(winner_tx);

    if launched == 0 {
        warn!("no inputs to race, returning without a winner");
        return None;
    }

    debug!(launched, "racing invocations");
    winner_rx.recv().await
}
