use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Backend caps `/history` at this many entries.
pub const MAX_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub backend: BackendConfig,
  pub dashboard: DashboardConfig,
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,

  #[serde(default = "default_history_limit")]
  pub history_limit: usize,

  #[serde(default)]
  pub request_timeout_seconds: Option<u64>,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      history_limit: default_history_limit(),
      request_timeout_seconds: None,
    }
  }
}

impl BackendConfig {
  pub fn request_timeout(&self) -> Option<Duration> {
    self
      .request_timeout_seconds
      .filter(|s| *s > 0)
      .map(Duration::from_secs)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
  #[serde(default = "default_poll_interval_ms")]
  pub poll_interval_ms: u64,

  #[serde(default = "default_toast_duration_ms")]
  pub toast_duration_ms: u64,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms: default_poll_interval_ms(),
      toast_duration_ms: default_toast_duration_ms(),
    }
  }
}

impl DashboardConfig {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn toast_duration(&self) -> Duration {
    Duration::from_millis(self.toast_duration_ms)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
  #[serde(default = "default_log_level")]
  pub level: String,

  #[serde(default = "default_retention_days")]
  pub retention_days: u64,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      retention_days: default_retention_days(),
    }
  }
}

fn default_base_url() -> String {
  "http://localhost:8000".to_string()
}

fn default_history_limit() -> usize {
  MAX_HISTORY_LIMIT
}

fn default_poll_interval_ms() -> u64 {
  5_000
}

fn default_toast_duration_ms() -> u64 {
  4_000
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_retention_days() -> u64 {
  14
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  pub backend: Option<BackendConfig>,

  #[serde(default)]
  pub dashboard: Option<DashboardConfig>,

  #[serde(default)]
  pub logging: Option<LoggingConfig>,
}

impl ConfigFile {
  fn normalize(self) -> Config {
    let mut cfg = Config::default();
    if let Some(b) = self.backend {
      cfg.backend = b;
    }
    if let Some(d) = self.dashboard {
      cfg.dashboard = d;
    }
    if let Some(l) = self.logging {
      cfg.logging = l;
    }
    sanitize(&mut cfg);
    cfg
  }

  fn needs_upgrade(&self) -> bool {
    self.backend.is_none() || self.dashboard.is_none() || self.logging.is_none()
  }
}

/// Resets invalid values to their defaults instead of refusing to start.
pub fn sanitize(cfg: &mut Config) {
  if let Some(reason) = validate_base_url(&cfg.backend.base_url) {
    tracing::warn!(reason = %reason, "backend.base_url invalid; using default");
    cfg.backend.base_url = default_base_url();
  }
  if cfg.backend.history_limit == 0 || cfg.backend.history_limit > MAX_HISTORY_LIMIT {
    tracing::warn!(
      history_limit = cfg.backend.history_limit,
      "backend.history_limit out of range; using default"
    );
    cfg.backend.history_limit = default_history_limit();
  }
  if cfg.dashboard.poll_interval_ms == 0 {
    tracing::warn!("dashboard.poll_interval_ms must be > 0; using default");
    cfg.dashboard.poll_interval_ms = default_poll_interval_ms();
  }
  if cfg.dashboard.toast_duration_ms == 0 {
    tracing::warn!("dashboard.toast_duration_ms must be > 0; using default");
    cfg.dashboard.toast_duration_ms = default_toast_duration_ms();
  }
}

pub fn validate_base_url(raw: &str) -> Option<String> {
  let Ok(url) = reqwest::Url::parse(raw) else {
    return Some(format!("invalid URL: {raw}"));
  };
  if url.scheme() != "http" && url.scheme() != "https" {
    return Some(format!("base_url must use http or https: {raw}"));
  }
  if url.host_str().is_none() {
    return Some(format!("base_url has no host: {raw}"));
  }
  None
}

pub fn load_or_create_default(path: &Path) -> anyhow::Result<Config> {
  load_impl(path, true)
}

pub fn load_or_default_readonly(path: &Path) -> anyhow::Result<Config> {
  load_impl(path, false)
}

fn load_impl(path: &Path, allow_writes: bool) -> anyhow::Result<Config> {
  let parent = path
    .parent()
    .ok_or_else(|| anyhow::anyhow!("config path has no parent: {}", path.display()))?;
  if allow_writes {
    fs::create_dir_all(parent)?;
  }

  if !path.exists() {
    let cfg = Config::default();
    if allow_writes {
      write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?)?;
    }
    return Ok(cfg);
  }

  let raw = fs::read_to_string(path)?;
  match toml::from_str::<ConfigFile>(&raw) {
    Ok(file) => {
      let needs_upgrade = file.needs_upgrade();
      let cfg = file.normalize();
      if allow_writes && needs_upgrade {
        let backup = parent.join(format!("config.toml.bak-{}", now_unix_s()));
        let _ = fs::copy(path, &backup);
        let _ = write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?);
        eprintln!(
          "linkwatch: upgraded config defaults written to {} (backup: {})",
          path.display(),
          backup.display()
        );
      }
      Ok(cfg)
    }
    Err(e) => {
      let cfg = Config::default();
      if allow_writes {
        let backup = parent.join(format!("config.toml.bad-{}", now_unix_s()));
        let _ = fs::rename(path, &backup);
        write_atomic(path, &toml::to_string_pretty(&to_config_file(&cfg))?)?;
        eprintln!(
          "linkwatch: invalid config at {} (backed up to {}): {e}",
          path.display(),
          backup.display()
        );
      } else {
        eprintln!(
          "linkwatch: invalid config at {}; using defaults: {e}",
          path.display()
        );
      }
      Ok(cfg)
    }
  }
}

fn to_config_file(cfg: &Config) -> ConfigFile {
  ConfigFile {
    backend: Some(cfg.backend.clone()),
    dashboard: Some(cfg.dashboard.clone()),
    logging: Some(cfg.logging.clone()),
  }
}

fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
  let parent = path
    .parent()
    .ok_or_else(|| anyhow::anyhow!("file path has no parent: {}", path.display()))?;
  let tmp = parent.join(format!(
    ".{}.tmp",
    path.file_name().unwrap_or_default().to_string_lossy()
  ));

  fs::write(&tmp, contents)?;
  fs::rename(&tmp, path)?;
  Ok(())
}

fn now_unix_s() -> u64 {
  crate::types::now_unix_ms() / 1000
}
