//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.
//! `RUST_LOG` wins over the configured level when set.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional JSON formatting and daily-rolling file output
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&Path>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    // try_init: a second initialization (tests, embedded use) is not an error
    match log_dir {
        Some(dir) if dir.exists() => {
            let file_appender = tracing_appender::rolling::daily(dir, "regalia-server");
            let builder = builder.with_ansi(false).with_writer(file_appender);
            if json {
                let _ = builder.json().try_init();
            } else {
                let _ = builder.try_init();
            }
        }
        _ => {
            if json {
                let _ = builder.json().try_init();
            } else {
                let _ = builder.try_init();
            }
        }
    }
}

/// Remove rolled log files older than `days`
pub fn cleanup_old_logs(log_dir: &Path, days: u64) -> std::io::Result<usize> {
    let max_age = std::time::Duration::from_secs(days * 24 * 60 * 60);
    let now = std::time::SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("regalia-server"));
        if !is_log || !path.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::info!(removed, dir = %log_dir.display(), "Removed old log files");
    }
    Ok(removed)
}
