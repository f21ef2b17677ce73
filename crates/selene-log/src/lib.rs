//! Structured logging for the Selene viewer.
//!
//! Library crates log through the `log` facade; the subscriber installed here
//! bridges those records into `tracing` so everything lands in the same
//! console output. Debug builds additionally write JSON lines to a log file.

use std::path::Path;

use selene_config::Config;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use tracing_subscriber::util::TryInitError;

/// Filter used when neither `RUST_LOG` nor the config sets a level.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// File name of the JSON log written in debug builds.
pub const LOG_FILE_NAME: &str = "selene.log";

/// Directive string for a configured log level.
///
/// A bare level such as `"debug"` keeps the GPU crates at `warn`; anything
/// containing a target directive is used verbatim.
pub fn filter_directives(config: Option<&Config>) -> String {
    let level = config.map(|c| c.debug.log_level.trim()).unwrap_or_default();
    if level.is_empty() {
        DEFAULT_FILTER.to_string()
    } else if level.contains('=') {
        level.to_string()
    } else {
        format!("{level},wgpu=warn,naga=warn")
    }
}

/// Create an `EnvFilter` with [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// JSON-lines layer writing to `file`.
pub fn json_file_layer<S>(file: std::fs::File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime())
        .json()
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the config's `debug.log_level`. When
/// `debug_build` is set and `log_dir` is writable, a JSON file layer is added.
/// Fails if a global subscriber is already installed.
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Result<(), TryInitError> {
    let filter_str = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // Thread names matter: the render thread is named.
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        return subscriber.with(json_file_layer(log_file)).try_init();
    }

    subscriber.try_init()
}
