//! Tracing bootstrap.
//!
//! Logs go to stderr so stdout stays clean for results and exports. An
//! optional file sink rotates daily; keep the returned guard alive until
//! exit or buffered lines are lost.

use anyhow::{Context, Result};
use core_types::config::{LogFormat, LoggingSection};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber with default settings.
pub fn init_tracing() -> Result<Option<WorkerGuard>> {
    init_tracing_with_config(&LoggingSection::default())
}

/// Install the global subscriber from the `[logging]` section. `RUST_LOG`
/// wins over the configured level when set.
pub fn init_tracing_with_config(cfg: &LoggingSection) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .with_context(|| format!("invalid log level {:?}", cfg.level))?;

    let stderr = match cfg.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let (file, guard) = match cfg.file.as_deref() {
        Some(path) => {
            let (dir, name) = split_log_path(Path::new(path));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(guard)
}

/// Split a log path into the rotation directory and file prefix.
fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let name = path
        .file_name()
        .map_or_else(|| "vectorvista.log".to_string(), |n| n.to_string_lossy().into_owned());
    (dir, name)
}
