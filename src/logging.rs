//! Console + file logging via `tracing`.
//!
//! One plain-text file per day under the configured directory, opened in
//! append mode, alongside the usual console output. `RUST_LOG` overrides the
//! configured filter.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{MnemoError, Result};

/// Initialize the global subscriber. Returns the log file path for the banner.
pub fn init(cfg: &LoggingConfig) -> Result<PathBuf> {
    let path = log_file_path(&cfg.directory);
    fs::create_dir_all(&cfg.directory)?;
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.filter.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .try_init()
        .map_err(|err| MnemoError::Config(format!("failed to initialize logging: {err}")))?;

    Ok(path)
}

fn log_file_path(directory: &str) -> PathBuf {
    Path::new(directory).join(format!("mnemo-{}.log", Local::now().format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_date_stamped() {
        let path = log_file_path("logs");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("mnemo-"));
        assert!(name.ends_with(".log"));
    }
}
