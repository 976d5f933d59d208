use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Success,
  Danger,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geo {
  #[serde(default)]
  pub ip: Option<String>,
  #[serde(default)]
  pub country: Option<String>,
  #[serde(default)]
  pub city: Option<String>,
  #[serde(default)]
  pub isp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ssl {
  #[serde(default)]
  pub has_https: bool,
  #[serde(default)]
  pub issuer: Option<String>,
}

/// Risk assessment for one submitted URL, as produced by the backend.
///
/// Never mutated after it is received: a rescan yields a new value. Fields the
/// dashboard does not know about are kept in `extra` so a replayed report is
/// structurally identical to the stored one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
  pub url: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub domain: String,
  #[serde(default)]
  pub final_url: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub is_malicious: bool,
  #[serde(default, deserialize_with = "null_as_default")]
  pub reasons: Vec<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub geo: Geo,
  #[serde(default, deserialize_with = "null_as_default")]
  pub ssl: Ssl,
  #[serde(default, deserialize_with = "null_as_default")]
  pub entropy: f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub redirect_chain: Vec<String>,
  #[serde(default)]
  pub screenshot_path: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hash: Option<String>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub url: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub timestamp: String,
  pub report: Report,
  #[serde(default)]
  pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSlice {
  pub name: String,
  pub value: u64,
}

/// Point-in-time telemetry snapshot. Replaced wholesale on every refresh.
///
/// Aggregates over an empty scan table come back as `null`; they read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
  #[serde(default, deserialize_with = "null_as_default")]
  pub total_scans: u64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub malicious_scans: u64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub risk_ratio: f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub avg_entropy: f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub geo_distribution: Vec<GeoSlice>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
  pub total: u64,
  pub threats: u64,
}

impl Summary {
  pub fn from_stats(stats: &Stats) -> Self {
    Self {
      total: stats.total_scans,
      threats: stats.malicious_scans,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
  pub message: String,
  pub severity: Severity,
  pub generation: u64,
  pub created_at_unix_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingKey {
  MinDomainAgeDays,
  MaxEntropyThreshold,
  JurisdictionJumpLimit,
  EnableVisionAi,
}

impl SettingKey {
  pub const ALL: [SettingKey; 4] = [
    SettingKey::MinDomainAgeDays,
    SettingKey::MaxEntropyThreshold,
    SettingKey::JurisdictionJumpLimit,
    SettingKey::EnableVisionAi,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      SettingKey::MinDomainAgeDays => "min_domain_age_days",
      SettingKey::MaxEntropyThreshold => "max_entropy_threshold",
      SettingKey::JurisdictionJumpLimit => "jurisdiction_jump_limit",
      SettingKey::EnableVisionAi => "enable_vision_ai",
    }
  }

  pub fn parse(raw: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.as_str() == raw)
  }
}

pub const VISION_ON: &str = "1";
pub const VISION_OFF: &str = "0";

/// Backend configuration as a flat key/value object.
///
/// Values are carried exactly as the backend sent them so that committing an
/// unedited copy reproduces the remote object. Edits always store text; the
/// backend is responsible for interpreting numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
  values: BTreeMap<String, serde_json::Value>,
}

impl Settings {
  pub fn text(&self, key: SettingKey) -> String {
    match self.values.get(key.as_str()) {
      None | Some(serde_json::Value::Null) => String::new(),
      Some(serde_json::Value::String(s)) => s.clone(),
      Some(other) => other.to_string(),
    }
  }

  pub fn set_text(&mut self, key: SettingKey, value: impl Into<String>) {
    self
      .values
      .insert(key.as_str().to_string(), serde_json::Value::String(value.into()));
  }

  pub fn vision_enabled(&self) -> bool {
    self.text(SettingKey::EnableVisionAi) == VISION_ON
  }

  pub fn toggle_vision(&mut self) {
    let next = if self.vision_enabled() { VISION_OFF } else { VISION_ON };
    self.set_text(SettingKey::EnableVisionAi, next);
  }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: serde::Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub fn now_unix_ms() -> u64 {
  use std::time::{SystemTime, UNIX_EPOCH};
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as u64
}
