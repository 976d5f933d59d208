use crate::types::{HistoryEntry, Report, Settings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest<'a> {
  pub url: &'a str,
  pub check_visual: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchScanRequest<'a> {
  pub urls: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanResponse {
  pub report: Report,
  #[serde(default)]
  pub hash: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
  #[serde(default)]
  pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsCommitRequest<'a> {
  pub settings: &'a Settings,
}

/// The slice of a scan report the quick-verdict consumers read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuickVerdict {
  pub is_malicious: bool,
  #[serde(default)]
  pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickScanResponse {
  pub report: QuickVerdict,
}
