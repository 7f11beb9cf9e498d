use std::future::{self, Future};

/// Per-value work performed by the workers of a stage.
///
/// A stage is a set of workers pulling from one shared input and pushing into one shared output.
/// For each value received, a worker calls [`StageHandler::handle`] and forwards the returned
/// value, if any. Returning [`None`] drops the value, which is how filtering is expressed.
pub trait StageHandler<In, Out>: Send + Sync + 'static {
    /// Processes one input value.
    fn handle(&self, value: In) -> impl Future<Output = Option<Out>> + Send;
}

/// Keeps the values matching a predicate.
#[derive(Debug, Clone)]
pub struct Predicate<P>(pub P);

impl<T, P> StageHandler<T, T> for Predicate<P>
where
    T: Send,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn handle(&self, value: T) -> impl Future<Output = Option<T>> + Send {
        let keep = (self.0)(&value);
        future::ready(keep.then_some(value))
    }
}

/// Maps every value with a synchronous function.
#[derive(Debug, Clone)]
pub struct Map<F>(pub F);

impl<In, Out, F> StageHandler<In, Out> for Map<F>
where
    Out: Send,
    F: Fn(In) -> Out + Send + Sync + 'static,
{
    fn handle(&self, value: In) -> impl Future<Output = Option<Out>> + Send {
        future::ready(Some((self.0)(value)))
    }
}

/// Maps every value with an asynchronous job.
#[derive(Debug, Clone)]
pub struct Job<F>(pub F);

impl<In, Out, F, Fut> StageHandler<In, Out> for Job<F>
where
    F: Fn(In) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
{
    fn handle(&self, value: In) -> impl Future<Output = Option<Out>> + Send {
        let job = (self.0)(value);
        async move { Some(job.await) }
    }
}

/// Forwards values unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> StageHandler<T, T> for Identity
where
    T: Send,
{
    fn handle(&self, value: T) -> impl Future<Output = Option<T>> + Send {
        future::ready(Some(value))
    }
}
