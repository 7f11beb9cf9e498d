use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, error, trace};

use crate::bail;
use crate::concurrency::cancel::CancelRx;
use crate::error::{ErrorKind, StreamResult};
use crate::stream_error;

/// Receiver of the result published by one execution. `None` until the execution completes.
type ResultRx<V> = watch::Receiver<Option<StreamResult<V>>>;

/// Deduplicates concurrent calls of an asynchronous function.
///
/// Calls made with a key that is already executing wait for that execution instead of starting a
/// new one, and all of them receive the same result. Once an execution completes its key is
/// forgotten, so the next call with that key runs the function again.
///
/// Executions run in their own task. A caller giving up (its cancellation fires) does not affect
/// the execution nor the other callers waiting on it.
#[derive(Debug)]
pub struct SingleFlight<K, V, F> {
    inner: Arc<Inner<K, V, F>>,
}

#[derive(Debug)]
struct Inner<K, V, F> {
    function: F,
    calls: Mutex<HashMap<K, ResultRx<V>>>,
}

impl<K, V, F, Fut> SingleFlight<K, V, F>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StreamResult<V>> + Send + 'static,
{
    /// Creates a deduplicating wrapper around `function`.
    pub fn new(function: F) -> Self {
        Self {
            inner: Arc::new(Inner {
                function,
                calls: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Calls the function with `key`, or joins the execution already running for it.
    ///
    /// Returns [`ErrorKind::Cancelled`] if `cancel` fires before the result is available, and
    /// [`ErrorKind::WorkerPanic`] if the execution panicked.
    pub async fn call(&self, cancel: &CancelRx, key: K) -> StreamResult<V> {
        let mut result_rx = {
            let mut calls = self.inner.calls.lock().await;
            match calls.get(&key) {
                Some(result_rx) => {
                    trace!(?key, "joining in-flight execution");
                    result_rx.clone()
                }
                None => {
                    let (result_tx, result_rx) = watch::channel(None);
                    calls.insert(key.clone(), result_rx.clone());
                    self.spawn_execution(key, result_tx);
                    result_rx
                }
            }
        };

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                bail!(ErrorKind::Cancelled, "Call cancelled while waiting for the result");
            }

            published = result_rx.wait_for(Option::is_some) => {
                let result = published.ok().and_then(|published| (*published).clone());
                result.unwrap_or_else(|| {
                    Err(stream_error!(
                        ErrorKind::WorkerPanic,
                        "Execution ended without publishing a result"
                    ))
                })
            }
        }
    }

    /// Returns the number of keys currently executing.
    pub async fn in_flight(&self) -> usize {
        self.inner.calls.lock().await.len()
    }

    fn spawn_execution(&self, key: K, result_tx: watch::Sender<Option<StreamResult<V>>>) {
        let inner = self.inner.clone();

        tokio::spawn(async move {
            debug!(?key, "starting execution");

            // A nested task turns a panic of the function into a join error.
            let execution = tokio::spawn((inner.function)(key.clone()));
            let result = match execution.await {
                Ok(result) => result,
                Err(join_err) => {
                    error!(?key, error = %join_err, "execution failed");
                    Err(join_err.into())
                }
            };

            // Eviction and publication happen under the same lock, so a caller either joins
            // this execution and gets its result or starts a new one.
            let mut calls = inner.calls.lock().await;
            calls.remove(&key);
            result_tx.send_replace(Some(result));

            debug!(?key, "execution completed");
        });
    }
}

impl<K, V, F> Clone for SingleFlight<K, V, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
