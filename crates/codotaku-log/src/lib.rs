//! Structured logging for the Codotaku shell.
//!
//! Console output goes through a `tracing` subscriber with uptime timestamps
//! and module targets. Debug builds also write a JSON log file for post-mortem
//! analysis. `log` records emitted by the GPU layer and wgpu itself are
//! captured by the same subscriber.

use codotaku_config::Config;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "codotaku.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging should be enabled
/// * `config` - optional configuration whose `debug.log_level` sets the filter
///
/// `RUST_LOG` always wins over the configured level.
///
/// # Examples
///
/// ```no_run
/// use codotaku_config::Config;
/// use codotaku_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_path) = log_dir.and_then(prepare_log_file)
        && let Ok(log_file) = std::fs::File::create(&log_path)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::debug!("Writing JSON log to {}", log_path.display());
        return;
    }

    subscriber.init();
}

/// Build the filter directive string for the given config.
///
/// A configured level is combined with the wgpu noise suppression unless it
/// already mentions those targets.
pub fn filter_directives(config: Option<&Config>) -> String {
    let level = config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty());

    match level {
        None => DEFAULT_FILTER.to_string(),
        Some(level) if level.contains("wgpu") || level.contains("naga") => level.to_string(),
        Some(level) => format!("{level},wgpu_core=warn,wgpu_hal=warn,naga=warn"),
    }
}

/// Create `log_dir` and return the log file path inside it.
fn prepare_log_file(log_dir: &Path) -> Option<PathBuf> {
    std::fs::create_dir_all(log_dir).ok()?;
    Some(log_dir.join(LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter_str = format!("{}", EnvFilter::new(DEFAULT_FILTER));
        assert!(filter_str.contains("wgpu_core=warn"));
        assert!(filter_str.contains("naga=warn"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_filter_without_config_is_default() {
        assert_eq!(filter_directives(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_filter_uses_configured_level() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        let directives = filter_directives(Some(&config));
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("wgpu_hal=warn"));
    }

    #[test]
    fn test_filter_keeps_explicit_wgpu_directive() {
        let mut config = Config::default();
        config.debug.log_level = "info,wgpu_core=trace".to_string();
        assert_eq!(filter_directives(Some(&config)), "info,wgpu_core=trace");
    }

    #[test]
    fn test_blank_level_falls_back_to_default() {
        let mut config = Config::default();
        config.debug.log_level = "   ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,codotaku_gpu=trace",
            "warn,codotaku_app=debug,wgpu_core=error",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_prepare_log_file_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("nested").join("logs");

        let path = prepare_log_file(&log_dir).unwrap();
        assert!(log_dir.is_dir());
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
    }
}
