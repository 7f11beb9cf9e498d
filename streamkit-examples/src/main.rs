//! Demo pipeline built from the streamkit combinators.
//!
//! A simulated sensor is polled periodically. Its readings are fanned out to several branches,
//! tagged per branch, merged back, filtered, enriched through a deduplicated lookup and the
//! first few results are printed. The run stops once enough results were taken, after the
//! configured timeout, or on Ctrl+C.

use clap::Parser;
use config::shared::DemoConfig;
use config::{Config, LoadConfigError, load_config};
use rand::Rng;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use streamkit::concurrency::cancel::{CancelRx, CancelTx, create_cancel_channel};
use streamkit::error::{ErrorKind, StreamError, StreamResult};
use streamkit::ops::{
    SingleFlight, fan_in, fan_out, filter, moving_later, poll, take_first_to_list, transform,
    workerpool,
};
use streamkit::stream_error;
use telemetry::tracing::init_tracing;
use tracing::{info, warn};

/// Every n-th sensor read fails, to show that failed probes are skipped.
const FAILING_READ_EVERY: u64 = 7;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Workers per filter, transform and workerpool stage.
    #[arg(long)]
    workers: Option<usize>,

    /// Number of branches the readings are fanned out to.
    #[arg(long)]
    fan_out: Option<usize>,

    /// Sensor polling period, in milliseconds.
    #[arg(long)]
    poll_period_ms: Option<u64>,

    /// Number of results to take before stopping.
    #[arg(long)]
    take: Option<usize>,

    /// Maximum duration of the run, in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

/// A sensor reading, tagged with the branch that handled it.
#[derive(Debug, Clone, Default)]
struct Reading {
    sequence: u64,
    branch: usize,
}

/// A reading enriched with the label of its bucket.
#[derive(Debug, Clone, Default)]
struct Labelled {
    reading: Reading,
    label: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    let args = Args::parse();
    let config = load_demo_config(&args)?;

    info!(
        workers = config.workers.count,
        fan_out = config.workers.fan_out,
        poll_period_ms = config.poll.period_ms,
        take = config.take.count,
        timeout_ms = config.take.timeout_ms,
        "starting demo pipeline"
    );

    let (cancel_tx, cancel) = create_cancel_channel();
    let timer = cancel_tx.cancel_after(Duration::from_millis(config.take.timeout_ms));
    spawn_ctrl_c_handler(cancel_tx.clone());

    race_mirrors().await;
    run_pipeline(&config, cancel).await;

    // Stops the poller and whatever is still running upstream of the taker.
    cancel_tx.cancel();
    timer.abort();

    info!("demo pipeline finished");
    Ok(())
}

/// Loads the configuration, falling back to defaults without a configuration directory, and
/// applies the command line overrides.
fn load_demo_config(args: &Args) -> Result<DemoConfig, Box<dyn Error>> {
    let mut config = match load_config::<DemoConfig>() {
        Ok(config) => config,
        Err(LoadConfigError::MissingConfigurationDirectory(directory)) => {
            info!(
                directory = %directory.display(),
                "no configuration directory, using defaults"
            );
            DemoConfig::default()
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(workers) = args.workers {
        config.workers.count = workers;
    }
    if let Some(fan_out) = args.fan_out {
        config.workers.fan_out = fan_out;
    }
    if let Some(period_ms) = args.poll_period_ms {
        config.poll.period_ms = period_ms;
    }
    if let Some(take) = args.take {
        config.take.count = take;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.take.timeout_ms = timeout_ms;
    }

    config.validate()?;

    Ok(config)
}

fn spawn_ctrl_c_handler(cancel_tx: CancelTx) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl+c received, cancelling");
            cancel_tx.cancel();
        }
    });
}

/// Queries three simulated mirrors and keeps the first answer.
async fn race_mirrors() {
    let mirrors = ["mirror-eu", "mirror-us", "mirror-ap"];
    let latencies: Vec<u64> = {
        let mut rng = rand::thread_rng();
        mirrors.iter().map(|_| rng.gen_range(5..100)).collect()
    };

    let winner = moving_later(mirrors.into_iter().zip(latencies), |(mirror, latency)| async move {
        tokio::time::sleep(Duration::from_millis(latency)).await;
        (mirror, latency)
    })
    .await;

    match winner {
        Some((mirror, latency)) => info!(mirror, latency_ms = latency, "fastest mirror answered"),
        None => warn!("no mirror answered"),
    }
}

async fn run_pipeline(config: &DemoConfig, cancel: CancelRx) {
    let workers = config.workers.count;

    let reads = Arc::new(AtomicU64::new(0));
    let readings = poll(cancel.clone(), config.poll.period(), move || {
        let reads = reads.clone();
        async move { read_sensor(&reads).await }
    });

    let branches = fan_out(cancel.clone(), readings, config.workers.fan_out)
        .into_iter()
        .enumerate()
        .map(|(branch, readings)| {
            transform(cancel.clone(), readings, workers, move |sequence| Reading {
                sequence,
                branch,
            })
        })
        .collect();
    let merged = fan_in(cancel.clone(), branches);

    let accepted = filter(cancel.clone(), merged, workers, |reading: &Reading| {
        reading.sequence % 3 != 0
    });

    let labels = SingleFlight::new(lookup_label);
    let labelled = {
        let cancel = cancel.clone();
        workerpool(cancel.clone(), workers, accepted, move |reading: Reading| {
            let labels = labels.clone();
            let cancel = cancel.clone();
            async move {
                match labels.call(&cancel, reading.sequence % 4).await {
                    Ok(label) => Some(Labelled { reading, label }),
                    Err(err) => {
                        warn!(sequence = reading.sequence, error = %err, "label lookup failed");
                        None
                    }
                }
            }
        })
    };

    let results = take_first_to_list(cancel, config.take.count, labelled).await;
    for (position, result) in results.into_iter().enumerate() {
        match result {
            Some(Labelled { reading, label }) => info!(
                position,
                sequence = reading.sequence,
                branch = reading.branch,
                label = %label,
                "result"
            ),
            None => info!(position, "no result"),
        }
    }
}

/// Simulated sensor read.
async fn read_sensor(reads: &AtomicU64) -> Result<u64, StreamError> {
    let sequence = reads.fetch_add(1, Ordering::SeqCst) + 1;
    tokio::time::sleep(Duration::from_millis(5)).await;

    if sequence % FAILING_READ_EVERY == 0 {
        return Err(stream_error!(
            ErrorKind::CallFailed,
            "Sensor read failed",
            detail = format!("read {sequence} timed out")
        ));
    }

    Ok(sequence)
}

/// Simulated slow lookup, deduplicated per bucket by [`SingleFlight`].
async fn lookup_label(bucket: u64) -> StreamResult<String> {
    info!(bucket, "looking up label");
    tokio::time::sleep(Duration::from_millis(20)).await;

    Ok(format!("bucket-{bucket}"))
}
