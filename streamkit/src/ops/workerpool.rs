use std::future::Future;

use crate::concurrency::cancel::CancelRx;
use crate::concurrency::stream::StreamRx;
use crate::workers::base::Job;
use crate::workers::stage::spawn_stage;

/// Runs the asynchronous `job` over every value of `input` on a pool of `workers` tasks.
///
/// This is [`crate::ops::transform`] for jobs that await: a worker is busy until its job
/// completes, so at most `workers` jobs run at the same time. Output order is unspecified.
pub fn workerpool<In, Out, F, Fut>(
    cancel: CancelRx,
    workers: usize,
    input: StreamRx<In>,
    job: F,
) -> StreamRx<Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: Fn(In) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
{
    spawn_stage("workerpool", cancel, input, workers, Job(job))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::cancel::create_cancel_channel;
    use crate::concurrency::stream::create_stream;
    use crate::test_utils::{sorted, stream_from_iter};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn doubles_every_value() {
        let output = workerpool(CancelRx::never(), 5, stream_from_iter(0..5u32), |v| async move {
            v * 2
        });

        assert_eq!(sorted(output.collect().await), vec![0, 2, 4, 6, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn never_runs_more_jobs_than_workers() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let output = {
            let running = running.clone();
            let peak = peak.clone();
            workerpool(CancelRx::never(), 3, stream_from_iter(0..30u32), move |v| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    v
                }
            })
        };

        assert_eq!(output.collect().await.len(), 30);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn cancellation_before_any_value_runs_no_job() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        cancel_tx.cancel();
        let jobs = Arc::new(AtomicUsize::new(0));

        let output = {
            let jobs = jobs.clone();
            workerpool(cancel_rx, 4, stream_from_iter(0..100u32), move |v| {
                jobs.fetch_add(1, Ordering::SeqCst);
                async move { v }
            })
        };

        assert!(output.collect().await.is_empty());
        assert_eq!(jobs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_pending_deliveries() {
        let (cancel_tx, cancel_rx) = create_cancel_channel();
        let (input_tx, input_rx) = create_stream::<u32>();
        let output = workerpool(cancel_rx, 2, input_rx, |v| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            v
        });

        input_tx.send(1).await.unwrap();
        input_tx.send(2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Both jobs are done and waiting on the output, nobody reads it.
        cancel_tx.cancel();
        let remaining = output.collect().await;
        assert!(remaining.len() <= 1);
    }
}
