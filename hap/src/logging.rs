//! Console and rolling file logging.
//!
//! Without a log directory everything goes to stdout. With one, logs are
//! written through a non-blocking rolling appender and the oldest files
//! beyond `max_log_files` are pruned at start-up.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_SUFFIX: &str = "log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationPeriod {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl std::str::FromStr for RotationPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hourly" | "hour" => Ok(RotationPeriod::Hourly),
            "daily" | "day" => Ok(RotationPeriod::Daily),
            "never" | "none" => Ok(RotationPeriod::Never),
            other => Err(format!(
                "unknown rotation period '{other}' (expected hourly, daily or never)"
            )),
        }
    }
}

impl From<RotationPeriod> for Rotation {
    fn from(period: RotationPeriod) -> Self {
        match period {
            RotationPeriod::Hourly => Rotation::HOURLY,
            RotationPeriod::Daily => Rotation::DAILY,
            RotationPeriod::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub log_prefix: String,
    pub rotation: RotationPeriod,
    /// 0 keeps every file.
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("."),
            log_prefix: "neviweb-bridge".to_string(),
            rotation: RotationPeriod::Daily,
            max_log_files: 7,
        }
    }
}

/// Keeps the background log writer alive. Dropping it flushes pending lines.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Installs the global subscriber. Filtering follows `RUST_LOG`.
pub fn setup_logging(config: Option<LogConfig>) -> std::io::Result<LogGuard> {
    let Some(config) = config else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
        return Ok(LogGuard { _guard: None });
    };

    if config.max_log_files > 0 {
        prune_old_logs(&config.log_dir, &config.log_prefix, config.max_log_files)?;
    }

    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(&config.log_prefix)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(config.max_log_files)
        .build(&config.log_dir)
        .map_err(std::io::Error::other)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            Layer::default()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    Ok(LogGuard {
        _guard: Some(guard),
    })
}

fn is_log_file(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix) && name.ends_with(LOG_SUFFIX)
}

/// Deletes all but the `keep` most recently modified log files.
fn prune_old_logs(log_dir: &Path, prefix: &str, keep: usize) -> std::io::Result<()> {
    if !log_dir.exists() {
        return Ok(());
    }

    let mut files: Vec<_> = std::fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| is_log_file(name, prefix))
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((entry.path(), modified))
        })
        .collect();
    files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in files.into_iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(&path) {
            eprintln!("failed to remove old log file {}: {e}", path.display());
        }
    }
    Ok(())
}
