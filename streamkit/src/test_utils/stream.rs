use std::time::Duration;

use tokio::time::timeout;

use crate::concurrency::stream::{StreamRx, create_stream};

/// Default time a test waits for a stream to close.
///
/// Combinators under test close their outputs within milliseconds, this only exists to turn a
/// hang into a failure.
pub const DEFAULT_COLLECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates a stream yielding every value of `values`, then closing.
///
/// A producer task sends the values one by one and stops early if every consumer is gone, so
/// infinite iterators are fine.
pub fn stream_from_iter<I>(values: I) -> StreamRx<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let (tx, rx) = create_stream();
    let values = values.into_iter();

    tokio::spawn(async move {
        for value in values {
            if tx.send(value).await.is_err() {
                return;
            }
        }
    });

    rx
}

/// Drains `stream` until it closes.
///
/// # Panics
///
/// Panics if the stream is still open after [`DEFAULT_COLLECT_TIMEOUT`].
pub async fn collect<T>(stream: StreamRx<T>) -> Vec<T> {
    match timeout(DEFAULT_COLLECT_TIMEOUT, stream.collect()).await {
        Ok(values) => values,
        Err(_) => panic!(
            "Stream still open after {DEFAULT_COLLECT_TIMEOUT:?}. \
             A producer or a combinator task never exited."
        ),
    }
}
