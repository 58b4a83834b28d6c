//! Tracing setup for hosts embedding the engine.
//!
//! The engine only emits events; nothing is printed unless the host installs
//! a subscriber, either through [`init_tracing`] or [`try_init`].

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Env var naming the base path of the log file.
pub const LOG_ENV: &str = "CONTRODUCER_LOG";

/// Where the subscriber writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Captured by the test harness per test.
    TestWriter,
    /// A fresh file next to this base path, see [`unique_log_path`].
    File(PathBuf),
}

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("Failed to create log file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Initialize file logging when `CONTRODUCER_LOG` is set; no-op otherwise.
///
/// Failures are reported on stderr and never abort the host.
pub fn init_tracing() {
    let Some(base) = std::env::var_os(LOG_ENV) else {
        return;
    };
    if let Err(err) = try_init(LogTarget::File(PathBuf::from(base))) {
        eprintln!("Warning: {}", err);
    }
}

/// Install a global subscriber writing to `target`, filtered by `RUST_LOG`
/// (default `info`).
///
/// Returns the created log file for [`LogTarget::File`].
pub fn try_init(target: LogTarget) -> Result<Option<PathBuf>, LogInitError> {
    let mut created = None;
    let layer = match target {
        LogTarget::Stderr => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogTarget::TestWriter => fmt::layer().with_test_writer().boxed(),
        LogTarget::File(base) => {
            let path = unique_log_path(&base);
            let file = std::fs::File::create(&path).map_err(|source| LogInitError::CreateFile {
                path: path.clone(),
                source,
            })?;
            created = Some(path);
            fmt::layer().with_writer(file).with_ansi(false).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(default_filter()))
        .try_init()
        .map_err(|_| LogInitError::AlreadyInstalled)?;
    Ok(created)
}

/// `{base}.{unix seconds}.{pid}`, so concurrent processes never share a file.
pub fn unique_log_path(base: &Path) -> PathBuf {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{}.{}", timestamp, std::process::id()));
    PathBuf::from(name)
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
