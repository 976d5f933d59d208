use crate::config::LoggingConfig;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "dashboard-core.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
  /// The terminal belongs to the caller (watch mode).
  FileOnly,
  FileAndStderr,
}

pub fn init(log_dir: &Path, cfg: &LoggingConfig, sink: LogSink) -> anyhow::Result<()> {
  fs::create_dir_all(log_dir)?;
  prune_expired_logs(log_dir, cfg.retention_days);

  let (file_writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME));
  let _ = FILE_GUARD.set(guard);

  let file_layer = tracing_subscriber::fmt::layer()
    .with_ansi(false)
    .with_writer(file_writer)
    .with_target(true);

  // Console output goes to stdout, so diagnostics stay on stderr.
  let stderr_layer = (sink == LogSink::FileAndStderr).then(|| {
    tracing_subscriber::fmt::layer()
      .with_ansi(false)
      .with_writer(std::io::stderr)
      .with_target(false)
  });

  tracing_subscriber::registry()
    .with(env_filter(&cfg.level))
    .with(file_layer)
    .with(stderr_layer)
    .try_init()?;

  Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
  EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Best effort; a log directory we cannot read is not a startup failure.
fn prune_expired_logs(log_dir: &Path, retention_days: u64) {
  if retention_days == 0 {
    return;
  }
  let Some(cutoff) =
    SystemTime::now().checked_sub(Duration::from_secs(retention_days.saturating_mul(86_400)))
  else {
    return;
  };
  let Ok(entries) = fs::read_dir(log_dir) else {
    return;
  };

  for entry in entries.flatten() {
    let path = entry.path();
    if !is_dashboard_log_file(&path) {
      continue;
    }
    let expired = entry
      .metadata()
      .and_then(|m| m.modified())
      .is_ok_and(|modified| modified < cutoff);
    if expired {
      let _ = fs::remove_file(&path);
    }
  }
}

fn is_dashboard_log_file(path: &Path) -> bool {
  path
    .file_name()
    .and_then(|n| n.to_str())
    .is_some_and(|name| {
      name == LOG_FILE_NAME
        || name
          .strip_prefix(LOG_FILE_NAME)
          .is_some_and(|suffix| suffix.starts_with('.'))
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_rolled_dashboard_logs_are_cleanup_candidates() {
    assert!(is_dashboard_log_file(Path::new("/tmp/logs/dashboard-core.log")));
    assert!(is_dashboard_log_file(Path::new(
      "/tmp/logs/dashboard-core.log.2026-10-01"
    )));
    assert!(!is_dashboard_log_file(Path::new("/tmp/logs/dashboard-core.logx")));
    assert!(!is_dashboard_log_file(Path::new("/tmp/logs/other.log")));
    assert!(!is_dashboard_log_file(Path::new("/")));
  }

  #[test]
  fn pruning_keeps_fresh_and_foreign_files() {
    let dir = std::env::temp_dir().join(format!("linkwatch-logs-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("dashboard-core.log.2026-10-18"), "x").unwrap();
    fs::write(dir.join("notes.txt"), "x").unwrap();

    prune_expired_logs(&dir, 14);

    assert!(dir.join("dashboard-core.log.2026-10-18").exists());
    assert!(dir.join("notes.txt").exists());
    let _ = fs::remove_dir_all(&dir);
  }
}
