use crate::concurrency::cancel::CancelRx;
use crate::concurrency::stream::StreamRx;
use crate::workers::base::Predicate;
use crate::workers::stage::spawn_stage;

/// Forwards the values of `input` for which `predicate` returns `true`, using `workers`
/// concurrent workers.
///
/// Output order is unspecified. The output closes once every worker has exited.
pub fn filter<T, P>(cancel: CancelRx, input: StreamRx<T>, workers: usize, predicate: P) -> StreamRx<T>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    spawn_stage("filter", cancel, input, workers, Predicate(predicate))
}
