use tracing::debug;

use crate::concurrency::cancel::CancelRx;
use crate::concurrency::stream::{StreamRx, StreamTx, create_buffered_stream};
use crate::workers::group::WorkerGroup;

/// Collects the first `count` values of `input`.
///
/// The returned vector always holds `count` elements. If `input` closes or `cancel` fires
/// before `count` values were received, the missing positions hold `T::default()`.
pub async fn take_first_to_list<T>(cancel: CancelRx, count: usize, input: StreamRx<T>) -> Vec<T>
where
    T: Default,
{
    let mut values = Vec::with_capacity(count);

    while values.len() < count {
        let value = tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            value = input.recv() => match value {
                Some(value) => value,
                None => break,
            },
        };
        values.push(value);
    }

    if values.len() < count {
        debug!(received = values.len(), count, "input ended early, padding with defaults");
        values.resize_with(count, T::default);
    }

    values
}

/// Forwards the first `count` values of `input` to a new stream.
///
/// The output buffers up to `count` values, so taking never waits for the consumer. It closes once
/// `count` values were forwarded, `input` closes, or `cancel` fires. `usize::MAX` takes everything
/// until `input` closes.
pub fn take_first_to_stream<T>(cancel: CancelRx, count: usize, input: StreamRx<T>) -> StreamRx<T>
where
    T: Send + 'static,
{
    let (output_tx, output_rx) = create_buffered_stream(count);

    let mut group = WorkerGroup::new("take_first");
    if count > 0 {
        group.spawn(0, forward_first(cancel, count, input, output_tx.clone()));
    }
    group.close_when_finished(output_tx);

    output_rx
}

async fn forward_first<T>(cancel: CancelRx, count: usize, input: StreamRx<T>, output: StreamTx<T>) {
    for taken in 0..count {
        let value = tokio::select! {
            biased;

            _ = cancel.cancelled() => return,

            value = input.recv() => match value {
                Some(value) => value,
                None => {
                    debug!(taken, count, "input closed before enough values were taken");
                    return;
                }
            },
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => return,

            sent = output.send(value) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}
