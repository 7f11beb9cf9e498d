use std::time::Duration;

use streamkit::concurrency::cancel::create_cancel_channel;
use streamkit::concurrency::stream::create_stream;
use streamkit::ops::{fan_in, fan_out, filter, take_first_to_list, transform, workerpool};
use streamkit::test_utils::collect;
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_closes_a_whole_pipeline() {
    init_test_tracing();

    let (cancel_tx, cancel) = create_cancel_channel();
    // The source never closes, only cancellation can stop the pipeline.
    let (source_tx, source) = create_stream::<u64>();
    let producer = tokio::spawn(async move {
        let mut next = 0;
        while source_tx.send(next).await.is_ok() {
            next += 1;
        }
    });

    let branches = fan_out(cancel.clone(), source, 3)
        .into_iter()
        .map(|branch| transform(cancel.clone(), branch, 2, |v| v * 2))
        .collect();
    let merged = fan_in(cancel.clone(), branches);
    let filtered = filter(cancel.clone(), merged, 3, |v| v % 4 == 0);
    let processed = workerpool(cancel, 3, filtered, |v| async move { v + 1 });

    assert!(processed.recv().await.is_some());
    cancel_tx.cancel();

    // Whatever was already buffered may still come out, then the output closes.
    let remaining = collect(processed).await;
    assert!(remaining.len() <= 16);

    producer.await.unwrap();
}

#[tokio::test]
async fn take_first_stops_on_timeout_with_padding() {
    init_test_tracing();

    let (cancel_tx, cancel) = create_cancel_channel();
    let (source_tx, source) = create_stream::<u8>();
    source_tx.send(9).await.unwrap();

    let _timer = cancel_tx.cancel_after(Duration::from_millis(20));
    let first = take_first_to_list(cancel, 3, source).await;

    assert_eq!(first, vec![9, 0, 0]);
    drop(source_tx);
}
