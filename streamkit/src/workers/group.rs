use std::future::Future;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{StreamError, StreamResult};

/// Set of tasks belonging to one combinator invocation.
///
/// [`WorkerGroup`] owns every task spawned for a single call (the workers of a filter, the
/// forwarders of a fan-in...). All of them share one lifetime contract: the group is done once
/// each task has exited, and only then may the output stream be closed.
#[derive(Debug)]
pub struct WorkerGroup {
    /// Name of the combinator, used in logs.
    name: &'static str,
    join_set: JoinSet<()>,
}

impl WorkerGroup {
    /// Creates an empty group for the combinator called `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            join_set: JoinSet::new(),
        }
    }

    /// Spawns `future` as worker `worker_id` of this group.
    pub fn spawn<F>(&mut self, worker_id: usize, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = self.name;
        self.join_set.spawn(async move {
            future.await;
            debug!(combinator = name, worker_id, "worker exited");
        });
    }

    /// Returns the number of tasks that have not been joined yet.
    pub fn len(&self) -> usize {
        self.join_set.len()
    }

    /// Returns `true` if the group has no task left to join.
    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Waits for every task of the group to exit.
    ///
    /// A panicking task does not stop the others. Panics are logged as they are joined and
    /// returned together once the whole group has exited.
    pub async fn wait_all(mut self) -> StreamResult<()> {
        let mut errors: Vec<StreamError> = Vec::new();

        while let Some(result) = self.join_set.join_next().await {
            if let Err(join_err) = result {
                error!(combinator = self.name, error = %join_err, "worker task failed");
                errors.push(join_err.into());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    /// Closes `outputs` once every task of the group has exited.
    ///
    /// `outputs` is the last sender, or collection of senders, of the streams the workers write
    /// to. Workers hold their own clones, so dropping this one after [`WorkerGroup::wait_all`]
    /// returns is what closes the streams.
    pub fn close_when_finished<O>(self, outputs: O)
    where
        O: Send + 'static,
    {
        let name = self.name;
        let workers = self.len();

        tokio::spawn(async move {
            // Failures were already logged while joining.
            let _ = self.wait_all().await;
            drop(outputs);

            debug!(combinator = name, workers, "all workers exited, output closed");
        });
    }
}
