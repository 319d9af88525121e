//! Structured logging for the pyrostex pipeline.
//!
//! Console output with uptime timestamps and module paths, plus a JSON log
//! file in debug builds. The filter comes from `RUST_LOG` when set, else from
//! the config's `log.level`.

use std::fs::File;
use std::path::Path;

use pyrostex_config::Config;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the JSON log file written into the log directory.
pub const LOG_FILE_NAME: &str = "pyrostex.log";

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "info";

/// The filter directive the config asks for, or [`DEFAULT_FILTER`].
#[must_use]
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.log.level.trim().is_empty() => config.log.level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// JSON lines with uptime timestamps, written to `log_file`.
fn json_file_layer<S>(log_file: File) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .json()
}

/// Install the global tracing subscriber.
///
/// * `log_dir` - directory for [`LOG_FILE_NAME`]; only used in debug builds
/// * `debug_build` - enables the JSON file layer
/// * `config` - source of the default filter directive
///
/// Fails if a global subscriber is already installed. A log directory that
/// cannot be created only disables the file layer.
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Result<(), TryInitError> {
    let directive = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = File::create(log_dir.join(LOG_FILE_NAME))
    {
        return subscriber.with(json_file_layer(log_file)).try_init();
    }

    subscriber.try_init()
}
