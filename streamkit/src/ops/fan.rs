use std::sync::Arc;

use tracing::debug;

use crate::concurrency::cancel::CancelRx;
use crate::concurrency::stream::{StreamRx, StreamTx, create_stream};
use crate::workers::base::Identity;
use crate::workers::group::WorkerGroup;
use crate::workers::stage::run_stage_worker;

/// Merges every stream of `inputs` into a single output stream.
///
/// One forwarding task runs per input. Values of a given input keep their relative order, values
/// of different inputs interleave arbitrarily. The output closes once every input is closed and
/// drained, or once `cancel` fires.
pub fn fan_in<T>(cancel: CancelRx, inputs: Vec<StreamRx<T>>) -> StreamRx<T>
where
    T: Send + 'static,
{
    let (output_tx, output_rx) = create_stream();
    let handler = Arc::new(Identity);

    let mut group = WorkerGroup::new("fan_in");
    for (worker_id, input) in inputs.into_iter().enumerate() {
        group.spawn(
            worker_id,
            run_stage_worker(
                worker_id,
                cancel.clone(),
                input,
                output_tx.clone(),
                handler.clone(),
            ),
        );
    }

    debug!(inputs = group.len(), "fan-in started");
    group.close_when_finished(output_tx);

    output_rx
}

/// Splits `input` into `outputs` streams, round robin.
///
/// The k-th delivered value goes to output `k % outputs`. A single router task does the
/// delivery, so a slow consumer on one output holds back every other output. If the consumer of
/// the output due next is gone the router stops and every output closes. `outputs == 0` is treated
/// as one.
pub fn fan_out<T>(cancel: CancelRx, input: StreamRx<T>, outputs: usize) -> Vec<StreamRx<T>>
where
    T: Send + 'static,
{
    let outputs = outputs.max(1);
    let (output_txs, output_rxs): (Vec<_>, Vec<_>) = (0..outputs).map(|_| create_stream()).unzip();

    let mut group = WorkerGroup::new("fan_out");
    group.spawn(0, route_round_robin(cancel, input, output_txs.clone()));

    debug!(outputs, "fan-out started");
    group.close_when_finished(output_txs);

    output_rxs
}

async fn route_round_robin<T>(cancel: CancelRx, input: StreamRx<T>, outputs: Vec<StreamTx<T>>) {
    let mut next = 0;

    loop {
        let value = tokio::select! {
            biased;

            _ = cancel.cancelled() => return,

            value = input.recv() => match value {
                Some(value) => value,
                None => return,
            },
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => return,

            sent = outputs[next].send(value) => {
                if sent.is_err() {
                    debug!(output = next, "fan-out consumer gone, routing stopped");
                    return;
                }
                next = (next + 1) % outputs.len();
            }
        }
    }
}
