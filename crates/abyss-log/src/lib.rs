//! Structured logging for the world generation tools.
//!
//! Console output with uptime timestamps and module paths, plus a JSON log file
//! in debug builds. `RUST_LOG` takes precedence over the configured level.

use std::path::Path;
use std::sync::Mutex;

use abyss_config::Config;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the JSON log written in debug builds.
pub const LOG_FILE_NAME: &str = "worldgen.log";

const DEFAULT_DIRECTIVES: &str = "info,abyss_terrain=info";

/// Filter directives from `config`, or the defaults when unset.
pub fn filter_directives(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.clone()
        }
        _ => DEFAULT_DIRECTIVES.to_string(),
    }
}

/// Install the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - source of the `debug.log_level` filter
///
/// Fails if a global subscriber is already installed.
///
/// ```no_run
/// use abyss_config::Config;
/// use abyss_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config)).ok();
/// ```
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Result<(), TryInitError> {
    let directives = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let file_layer = if debug_build {
        log_dir.and_then(|dir| json_file_layer(dir))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
}

/// JSON layer writing to [`LOG_FILE_NAME`] in `log_dir`, or `None` if the file
/// cannot be created.
fn json_file_layer<S>(log_dir: &Path) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(log_dir).ok()?;
    let log_file = std::fs::File::create(log_dir.join(LOG_FILE_NAME)).ok()?;
    Some(
        fmt::layer()
            .with_writer(Mutex::new(log_file))
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json(),
    )
}

/// `EnvFilter` built from the default directives.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_DIRECTIVES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = format!("{}", default_env_filter());
        assert!(filter.contains("abyss_terrain=info"), "got {filter}");
        assert!(filter.contains("info"));
    }

    #[test]
    fn test_config_level_overrides_default() {
        let mut config = Config::default();
        assert_eq!(filter_directives(Some(&config)), "info");

        config.debug.log_level = "debug,abyss_terrain=trace".into();
        assert_eq!(filter_directives(Some(&config)), "debug,abyss_terrain=trace");

        config.debug.log_level = "  ".into();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_DIRECTIVES);
        assert_eq!(filter_directives(None), DEFAULT_DIRECTIVES);
    }

    #[test]
    fn test_env_filter_parsing() {
        for directives in ["info", "debug,abyss_terrain=trace", "warn,abyss_config=debug", "error"] {
            assert!(
                EnvFilter::try_new(directives).is_ok(),
                "failed to parse filter: {directives}"
            );
        }
    }

    #[test]
    fn test_json_file_layer_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let layer = json_file_layer(&log_dir).expect("log file should be created");
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(cells_opened = 42, "world generated");
        });

        let text = std::fs::read_to_string(log_dir.join(LOG_FILE_NAME)).unwrap();
        let line = text.lines().next().expect("one event should be logged");
        let event: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["fields"]["message"], "world generated");
        assert_eq!(event["fields"]["cells_opened"], 42);
    }

    #[test]
    fn test_json_file_layer_unwritable_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        assert!(json_file_layer::<tracing_subscriber::Registry>(&blocker.join("logs")).is_none());
    }
}
