use std::io;
use std::sync::Once;

use config::Environment;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_log::log::SetLoggerError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Environment variable that turns on log output in tests.
const ENABLE_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to install the log bridge: {0}")]
    LogTracer(#[from] SetLoggerError),

    #[error("failed to install the global subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Flushes buffered log lines when dropped.
///
/// Keep it alive for the whole lifetime of the program, dropping it early loses logs.
#[must_use = "dropping the flusher stops log output"]
#[derive(Debug)]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global tracing subscriber for a binary named `app_name`.
///
/// Log lines are written to stdout through a non-blocking writer. The filter comes from
/// `RUST_LOG` and defaults to `info` for the application and the streamkit crate. The
/// `dev` environment gets human-readable output, `prod` gets one JSON object per line.
/// Records emitted through the `log` crate are forwarded to tracing.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load()?;

    LogTracer::init()?;

    let (writer, guard) = tracing_appender::non_blocking(io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,streamkit=info",
            app_name.replace('-', "_")
        ))
    });

    match environment {
        Environment::Dev => {
            let subscriber = Registry::default()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(writer));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        Environment::Prod => {
            let subscriber = Registry::default().with(filter).with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(LogFlusher { _guard: guard })
}

/// Installs a subscriber that writes through the test harness, once per process.
///
/// Nothing is installed unless `ENABLE_TRACING` is set, so test output stays quiet by default.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var(ENABLE_TRACING_ENV_NAME).is_err() {
            return;
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("streamkit=debug"));
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_test_writer());

        // Another test binary component may already own the global default.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
