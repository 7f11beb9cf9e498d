//! Typed, closable conduits connecting combinators.
//!
//! A stream is a tokio `mpsc` channel with a minimal buffer. The sending side is a plain
//! [`StreamTx`]; the stream closes once the last clone of it is dropped, which is how producers
//! signal end of data. The receiving side, [`StreamRx`], can be cloned so that several workers
//! pull from the same input: each receive holds the shared receiver only until it yields a value
//! or observes the closure.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::{Mutex, Semaphore, mpsc};

/// Buffer size of streams created with [`create_stream`].
///
/// tokio channels cannot be unbuffered, a single slot is the closest equivalent.
pub const DEFAULT_STREAM_CAPACITY: usize = 1;

/// Sending side of a stream.
pub type StreamTx<T> = mpsc::Sender<T>;

/// Receiving side of a stream, shareable between consumers.
#[derive(Debug)]
pub struct StreamRx<T> {
    inner: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> StreamRx<T> {
    /// Wraps an existing tokio receiver.
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rx)),
        }
    }

    /// Receives the next value.
    ///
    /// Returns [`None`] once the stream is closed and drained. Consumers sharing this stream are
    /// served one at a time. Cancel safe: dropping the future never loses a value.
    pub async fn recv(&self) -> Option<T> {
        let mut rx = self.inner.lock().await;
        rx.recv().await
    }

    /// Drains the stream into a vector, waiting for it to close.
    pub async fn collect(self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.recv().await {
            values.push(value);
        }
        values
    }

    /// Turns this handle into a [`futures::Stream`], to use with `StreamExt` adapters.
    pub fn into_stream(self) -> impl Stream<Item = T>
    where
        T: Send + 'static,
    {
        futures::stream::unfold(self, |rx| async move {
            let value = rx.recv().await?;
            Some((value, rx))
        })
    }
}

impl<T> Clone for StreamRx<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> From<mpsc::Receiver<T>> for StreamRx<T> {
    fn from(rx: mpsc::Receiver<T>) -> Self {
        Self::new(rx)
    }
}

/// Creates a stream with [`DEFAULT_STREAM_CAPACITY`].
pub fn create_stream<T>() -> (StreamTx<T>, StreamRx<T>) {
    create_buffered_stream(DEFAULT_STREAM_CAPACITY)
}

/// Creates a stream buffering up to `capacity` values.
///
/// A zero capacity is raised to one and capacities above [`Semaphore::MAX_PERMITS`], the largest
/// bound a tokio channel accepts, are lowered to it. The buffer is allocated lazily, so a huge
/// capacity costs nothing until values are actually queued.
pub fn create_buffered_stream<T>(capacity: usize) -> (StreamTx<T>, StreamRx<T>) {
    let (tx, rx) = mpsc::channel(capacity.clamp(1, Semaphore::MAX_PERMITS));
    (tx, StreamRx::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::collections::HashSet;

    #[tokio::test]
    async fn closed_and_drained_stream_yields_none() {
        let (tx, rx) = create_buffered_stream(2);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn sender_observes_dropped_consumers() {
        let (tx, rx) = create_stream::<u8>();
        assert!(!tx.is_closed());

        drop(rx);
        assert!(tx.is_closed());
        assert!(tx.send(1).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shared_consumers_split_values_without_duplicates() {
        let (tx, rx) = create_stream::<u32>();

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let rx = rx.clone();
            consumers.push(tokio::spawn(async move { rx.collect().await }));
        }
        drop(rx);

        for i in 0..1_000 {
            tx.send(i).await.unwrap();
        }
        drop(tx);

        let mut seen = HashSet::new();
        for consumer in consumers {
            for value in consumer.await.unwrap() {
                assert!(seen.insert(value), "value {value} received twice");
            }
        }
        assert_eq!(seen.len(), 1_000);
    }

    #[tokio::test]
    async fn oversized_capacity_is_clamped() {
        let (tx, rx) = create_buffered_stream(usize::MAX);
        assert_eq!(tx.max_capacity(), Semaphore::MAX_PERMITS);

        tx.send(5u8).await.unwrap();
        drop(tx);
        assert_eq!(rx.collect().await, vec![5]);
    }

    #[tokio::test]
    async fn into_stream_supports_stream_adapters() {
        let (tx, rx) = create_buffered_stream(8);
        for i in 0..5 {
            tx.send(i).await.unwrap();
        }
        drop(tx);

        let doubled: Vec<i32> = rx.into_stream().map(|v| v * 2).collect().await;
        assert_eq!(doubled, vec![0, 2, 4, 6, 8]);
    }
}
