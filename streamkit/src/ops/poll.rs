use std::fmt::Display;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, trace, warn};

use crate::concurrency::cancel::CancelRx;
use crate::concurrency::future::InFlight;
use crate::concurrency::stream::{StreamRx, StreamTx, create_stream};
use crate::workers::group::WorkerGroup;

/// Calls `probe` every `period` and streams its successful results.
///
/// The first call happens one `period` after this function returns. At most one probe runs at a
/// time: a tick arriving while a probe runs, or while its result waits for the consumer, is
/// skipped. Failed and panicking probes are logged and emit nothing.
///
/// When `cancel` fires the poller waits for the running probe, if any, discards its result and
/// closes the output.
pub fn poll<T, E, F, Fut>(cancel: CancelRx, period: Duration, probe: F) -> StreamRx<T>
where
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let (output_tx, output_rx) = create_stream();

    let mut group = WorkerGroup::new("poll");
    group.spawn(0, run_poller(cancel, period, probe, output_tx.clone()));
    group.close_when_finished(output_tx);

    output_rx
}

async fn run_poller<T, E, F, Fut>(cancel: CancelRx, period: Duration, probe: F, output: StreamTx<T>)
where
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight = pin!(InFlight::<JoinHandle<Result<T, E>>>::idle());
    // Result of the last probe, waiting for room in the output.
    let mut pending: Option<T> = None;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            permit = output.reserve(), if pending.is_some() => {
                let Ok(permit) = permit else {
                    debug!("poll consumer gone, poller stopping");
                    break;
                };
                if let Some(value) = pending.take() {
                    permit.send(value);
                }
            }

            result = in_flight.as_mut() => match result {
                Ok(Ok(value)) => pending = Some(value),
                Ok(Err(err)) => warn!(error = %err, "probe failed, no value emitted"),
                Err(join_err) => error!(error = %join_err, "probe task failed"),
            },

            _ = ticker.tick() => {
                if in_flight.is_busy() || pending.is_some() {
                    trace!("previous probe still in progress, tick skipped");
                    continue;
                }

                trace!("starting probe");
                in_flight.as_mut().start(tokio::spawn(probe()));
            }
        }
    }

    if in_flight.is_busy() {
        debug!("waiting for the running probe before closing");
        // The result is discarded, the output is about to close.
        let _ = in_flight.as_mut().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::cancel::create_cancel_channel;
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_probe(
        counter: Arc<AtomicUsize>,
        duration: Duration,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<usize, Infallible>> + Send>>
    + Send
    + Sync
    + 'static {
        move || {
            let counter = counter.clone();
            Box::pin(async move {
                tokio::time::sleep(duration).await;
                Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emits_probe_results_until_cancelled() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        let counter = Arc::new(AtomicUsize::new(0));

        let output = poll(
            cancel_rx,
            Duration::from_millis(50),
            counting_probe(counter, Duration::from_millis(10)),
        );
        cancel_tx.cancel_after(Duration::from_millis(250));

        assert_eq!(output.collect().await, vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_probe_runs_after_one_period() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        let counter = Arc::new(AtomicUsize::new(0));

        let output = poll(
            cancel_rx,
            Duration::from_millis(100),
            counting_probe(counter.clone(), Duration::ZERO),
        );

        tokio::time::sleep(Duration::from_millis(90)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert_eq!(output.recv().await, Some(1));
        cancel_tx.cancel();
        assert_eq!(output.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_first_tick_yields_nothing() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        cancel_tx.cancel();
        let counter = Arc::new(AtomicUsize::new(0));

        let output = poll(
            cancel_rx,
            Duration::from_millis(10),
            counting_probe(counter.clone(), Duration::ZERO),
        );

        assert!(output.collect().await.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probes_emit_nothing() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        let calls = Arc::new(AtomicUsize::new(0));

        let output = poll(cancel_rx, Duration::from_millis(50), move || {
            let calls = calls.clone();
            async move {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call % 2 == 1 {
                    Err(format!("call {call} failed"))
                } else {
                    Ok(call)
                }
            }
        });
        cancel_tx.cancel_after(Duration::from_millis(225));

        assert_eq!(output.collect().await, vec![2, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_probe_does_not_stop_polling() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        let calls = Arc::new(AtomicUsize::new(0));

        let output = poll(cancel_rx, Duration::from_millis(50), move || {
            let calls = calls.clone();
            async move {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call == 1 {
                    panic!("probe exploded");
                }
                Ok::<_, Infallible>(call)
            }
        });
        cancel_tx.cancel_after(Duration::from_millis(125));

        assert_eq!(output.collect().await, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn probes_never_overlap() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let output = {
            let running = running.clone();
            let peak = peak.clone();
            poll(cancel_rx, Duration::from_millis(50), move || {
                let running = running.clone();
                let peak = peak.clone();
                let calls = calls.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(120)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(calls.fetch_add(1, Ordering::SeqCst) + 1)
                }
            })
        };
        cancel_tx.cancel_after(Duration::from_millis(400));

        // Probes start at 50ms and 200ms, the one started at 350ms is discarded on cancellation.
        assert_eq!(output.collect().await, vec![1, 2]);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }
}
