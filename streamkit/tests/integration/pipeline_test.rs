use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use streamkit::concurrency::cancel::{CancelRx, create_cancel_channel};
use streamkit::error::StreamError;
use streamkit::ops::{
    SingleFlight, fan_in, fan_out, filter, moving_later, poll, take_first_to_list,
    take_first_to_stream, transform, workerpool,
};
use streamkit::test_utils::{collect, sorted, stream_from_iter};
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_out_transform_fan_in_keeps_every_value() {
    init_test_tracing();

    let mut rng = rand::thread_rng();
    let values: Vec<u32> = (0..5_000).map(|_| rng.gen_range(0..1_000_000)).collect();
    let cancel = CancelRx::never();

    let branches = fan_out(cancel.clone(), stream_from_iter(values.clone()), 4)
        .into_iter()
        .map(|branch| transform(cancel.clone(), branch, 2, |v: u32| u64::from(v) + 1))
        .collect();
    let merged = fan_in(cancel, branches);

    let expected: Vec<u64> = values.into_iter().map(|v| u64::from(v) + 1).collect();
    assert_eq!(sorted(collect(merged).await), sorted(expected));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn filter_then_workerpool_then_take_first() {
    init_test_tracing();

    let cancel = CancelRx::never();
    let multiples_of_three = filter(cancel.clone(), stream_from_iter(0..u64::MAX), 4, |v| {
        v % 3 == 0
    });
    let squared = workerpool(cancel.clone(), 4, multiples_of_three, |v| async move {
        tokio::task::yield_now().await;
        v * v
    });

    let first = take_first_to_list(cancel, 20, squared).await;
    assert_eq!(first.len(), 20);
    assert!(first.iter().all(|v| v % 9 == 0));
}

#[tokio::test(start_paused = true)]
async fn polled_values_feed_a_worker_pool() {
    init_test_tracing();

    let (cancel_tx, cancel_rx) = create_cancel_channel();
    let ticks = Arc::new(AtomicU64::new(0));

    let polled = {
        let ticks = ticks.clone();
        poll(cancel_rx.clone(), Duration::from_millis(20), move || {
            let ticks = ticks.clone();
            async move { Ok::<_, Infallible>(ticks.fetch_add(1, Ordering::SeqCst) + 1) }
        })
    };
    let labelled = workerpool(cancel_rx.clone(), 2, polled, |tick| async move {
        format!("tick-{tick}")
    });
    let first = take_first_to_stream(cancel_rx, 3, labelled);

    assert_eq!(
        sorted(collect(first).await),
        vec!["tick-1", "tick-2", "tick-3"]
    );
    cancel_tx.cancel();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_flight_behind_a_worker_pool() {
    init_test_tracing();

    let executions = Arc::new(AtomicU64::new(0));
    let lookups = {
        let executions = executions.clone();
        SingleFlight::new(move |key: u64| {
            let executions = executions.clone();
            async move {
                executions.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, StreamError>(key * 100)
            }
        })
    };

    // Eight workers look up the same handful of keys concurrently.
    let cancel = CancelRx::never();
    let keys = stream_from_iter((0..64u64).map(|i| i % 4));
    let results = workerpool(cancel.clone(), 8, keys, move |key| {
        let lookups = lookups.clone();
        let cancel = cancel.clone();
        async move { lookups.call(&cancel, key).await }
    });

    let results = collect(results).await;
    assert_eq!(results.len(), 64);
    for result in results {
        let value = result.unwrap();
        assert!([0, 100, 200, 300].contains(&value));
    }
    assert!(executions.load(Ordering::SeqCst) < 64);
}

#[tokio::test(start_paused = true)]
async fn moving_later_picks_the_fastest_replica() {
    init_test_tracing();

    let replicas = [("slow", 300u64), ("fast", 20), ("medium", 120)];
    let winner = moving_later(replicas, |(name, latency)| async move {
        tokio::time::sleep(Duration::from_millis(latency)).await;
        name
    })
    .await;

    assert_eq!(winner, Some("fast"));
}
