//! Unified logging module for the data service
//!
//! Console output uses the bracketed-level format; an optional daily-rolling
//! file layer writes through a non-blocking appender. The filter is wrapped in
//! a reload layer so the level can be changed at runtime.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{
        self,
        format::Writer,
        FmtContext, FormatEvent, FormatFields,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Environment variable overriding the log directory
pub const LOG_DIR_ENV: &str = "DATASRV_LOG_DIR";

/// Logging configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of the bracketed console format
    #[serde(default)]
    pub json: bool,
    /// Also write to a daily-rolling file
    #[serde(default)]
    pub file: bool,
    /// Directory for log files (falls back to `DATASRV_LOG_DIR`, then `logs`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            file: false,
            dir: None,
        }
    }
}

impl LoggingConfig {
    /// Resolve the log directory
    ///
    /// Priority: `DATASRV_LOG_DIR` env > config `dir` > `logs`
    pub fn log_dir(&self) -> PathBuf {
        std::env::var(LOG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                self.dir
                    .as_deref()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("logs"))
            })
    }
}

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Custom event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809Z [INFO] Service started`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Reload handle for runtime level changes
static LOG_FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();
static CURRENT_LOG_LEVEL: OnceLock<Mutex<String>> = OnceLock::new();

/// Initialize logging for a service
///
/// `RUST_LOG` takes priority over `config.level`. Returns the file appender
/// guard when file output is enabled; the caller must keep it alive for the
/// lifetime of the process. Calling this twice is harmless: the second call
/// leaves the installed subscriber in place.
pub fn init_logging(
    service_name: &str,
    config: &LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let filter_str = std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());
    let env_filter = EnvFilter::try_new(&filter_str)?;

    let (reload_filter, reload_handle) = reload::Layer::new(env_filter);

    let console_layer = if config.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_ansi(true)
            .event_format(BracketedLevelFormat)
            .boxed()
    };

    let (file_layer, guard) = if config.file {
        let log_dir = config.log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let appender = tracing_appender::rolling::daily(&log_dir, format!("{}.log", service_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking)
            .event_format(BracketedLevelFormat)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let installed = tracing_subscriber::registry()
        .with(reload_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        let _ = LOG_FILTER_HANDLE.set(reload_handle);
        let _ = CURRENT_LOG_LEVEL.set(Mutex::new(filter_str));
    }

    Ok(guard)
}

/// Change the active filter directive at runtime
pub fn set_log_level(level: &str) -> Result<(), String> {
    let handle = LOG_FILTER_HANDLE
        .get()
        .ok_or_else(|| "Logging not initialized".to_string())?;
    let filter = EnvFilter::try_new(level).map_err(|e| format!("Invalid filter: {}", e))?;
    handle
        .reload(filter)
        .map_err(|e| format!("Failed to reload filter: {}", e))?;

    if let Some(current) = CURRENT_LOG_LEVEL.get() {
        match current.lock() {
            Ok(mut guard) => *guard = level.to_string(),
            Err(poisoned) => *poisoned.into_inner() = level.to_string(),
        }
    }
    tracing::info!("Log level changed to {}", level);
    Ok(())
}

/// Currently active filter directive
pub fn get_log_level() -> String {
    CURRENT_LOG_LEVEL
        .get()
        .and_then(|m| m.lock().ok().map(|g| g.clone()))
        .unwrap_or_else(|| "unknown".to_string())
}
