use std::sync::Arc;

use tracing::{debug, warn};

use crate::concurrency::cancel::CancelRx;
use crate::concurrency::stream::{StreamRx, StreamTx, create_stream};
use crate::workers::base::StageHandler;
use crate::workers::group::WorkerGroup;

/// Spawns `workers` workers running `handler` between `input` and a new output stream.
///
/// Every worker pulls from the shared `input`, hands the value to `handler` and pushes the result,
/// if any, to the shared output. Workers exit when the input is closed and drained, when
/// cancellation fires, or when every consumer of the output is gone. The output is closed once
/// the last worker has exited. Output order is not related to input order.
///
/// With zero workers nothing consumes the input and the output closes right away.
pub fn spawn_stage<In, Out, H>(
    name: &'static str,
    cancel: CancelRx,
    input: StreamRx<In>,
    workers: usize,
    handler: H,
) -> StreamRx<Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    H: StageHandler<In, Out>,
{
    if workers == 0 {
        warn!(combinator = name, "no workers requested, output will close immediately");
    }

    let (output_tx, output_rx) = create_stream();
    let handler = Arc::new(handler);

    let mut group = WorkerGroup::new(name);
    for worker_id in 0..workers {
        group.spawn(
            worker_id,
            run_stage_worker(
                worker_id,
                cancel.clone(),
                input.clone(),
                output_tx.clone(),
                handler.clone(),
            ),
        );
    }

    debug!(combinator = name, workers, "stage started");
    group.close_when_finished(output_tx);

    output_rx
}

/// Main loop of a single stage worker.
pub(crate) async fn run_stage_worker<In, Out, H>(
    worker_id: usize,
    cancel: CancelRx,
    input: StreamRx<In>,
    output: StreamTx<Out>,
    handler: Arc<H>,
) where
    H: StageHandler<In, Out>,
{
    loop {
        let value = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(worker_id, "worker stopped by cancellation while receiving");
                return;
            }

            value = input.recv() => match value {
                Some(value) => value,
                None => return,
            },
        };

        let Some(value) = handler.handle(value).await else {
            continue;
        };

        // A value still being delivered when cancellation fires is dropped.
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(worker_id, "worker stopped by cancellation while sending");
                return;
            }

            sent = output.send(value) => {
                if sent.is_err() {
                    debug!(worker_id, "output consumer gone, worker stopping");
                    return;
                }
            }
        }
    }
}
