use crate::concurrency::cancel::CancelRx;
use crate::concurrency::stream::StreamRx;
use crate::workers::base::Map;
use crate::workers::stage::spawn_stage;

/// Applies `f` to every value of `input` using `workers` concurrent workers.
///
/// Each input value yields exactly one output value unless cancellation interrupts it. Output
/// order is unspecified.
pub fn transform<In, Out, F>(
    cancel: CancelRx,
    input: StreamRx<In>,
    workers: usize,
    f: F,
) -> StreamRx<Out>
where
    In: Send + 'static,
    Out: Send + 'static,
    F: Fn(In) -> Out + Send + Sync + 'static,
{
    spawn_stage("transform", cancel, input, workers, Map(f))
}
