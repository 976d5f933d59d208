//! Scriptable in-memory backend for exercising the orchestration flows.

use crate::api::schema::{QuickVerdict, ScanResponse};
use crate::api::ScanBackend;
use crate::types::{Geo, HistoryEntry, Report, SettingKey, Settings, Ssl, Stats};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Default)]
struct StubInner {
  history: Vec<HistoryEntry>,
  stats: Stats,
  settings: Settings,
  scan_responses: HashMap<String, ScanResponse>,
  failing: HashSet<&'static str>,
  gates: HashMap<&'static str, Arc<Semaphore>>,
  calls: HashMap<&'static str, usize>,
  history_limits: Vec<usize>,
  scanned: Vec<String>,
  batches: Vec<Vec<String>>,
  commits: Vec<Settings>,
}

#[derive(Default)]
pub struct StubBackend {
  inner: Mutex<StubInner>,
}

/// Holds every call of one operation in flight until released.
pub struct Gate(Arc<Semaphore>);

impl Gate {
  pub fn release(&self) {
    self.0.close();
  }
}

impl StubBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_history(&self, history: Vec<HistoryEntry>) {
    self.inner.lock().unwrap().history = history;
  }

  pub fn set_stats(&self, stats: Stats) {
    self.inner.lock().unwrap().stats = stats;
  }

  pub fn set_settings(&self, settings: Settings) {
    self.inner.lock().unwrap().settings = settings;
  }

  pub fn remote_settings(&self) -> Settings {
    self.inner.lock().unwrap().settings.clone()
  }

  pub fn set_scan_response(&self, url: &str, response: ScanResponse) {
    self
      .inner
      .lock()
      .unwrap()
      .scan_responses
      .insert(url.to_string(), response);
  }

  pub fn fail(&self, op: &'static str) {
    self.inner.lock().unwrap().failing.insert(op);
  }

  pub fn recover(&self, op: &'static str) {
    self.inner.lock().unwrap().failing.remove(op);
  }

  pub fn hold(&self, op: &'static str) -> Gate {
    let sem = Arc::new(Semaphore::new(0));
    self.inner.lock().unwrap().gates.insert(op, sem.clone());
    Gate(sem)
  }

  pub fn calls(&self, op: &'static str) -> usize {
    self.inner.lock().unwrap().calls.get(op).copied().unwrap_or(0)
  }

  pub fn history_limits(&self) -> Vec<usize> {
    self.inner.lock().unwrap().history_limits.clone()
  }

  pub fn scanned(&self) -> Vec<String> {
    self.inner.lock().unwrap().scanned.clone()
  }

  pub fn batches(&self) -> Vec<Vec<String>> {
    self.inner.lock().unwrap().batches.clone()
  }

  pub fn commits(&self) -> Vec<Settings> {
    self.inner.lock().unwrap().commits.clone()
  }

  async fn enter(&self, op: &'static str) -> anyhow::Result<()> {
    let gate = {
      let mut inner = self.inner.lock().unwrap();
      *inner.calls.entry(op).or_default() += 1;
      inner.gates.get(op).cloned()
    };
    if let Some(gate) = gate {
      let _ = gate.acquire().await;
    }
    if self.inner.lock().unwrap().failing.contains(op) {
      anyhow::bail!("stub {op} failure");
    }
    Ok(())
  }
}

#[async_trait]
impl ScanBackend for StubBackend {
  async fn scan(&self, url: &str) -> anyhow::Result<ScanResponse> {
    self.inner.lock().unwrap().scanned.push(url.to_string());
    self.enter("scan").await?;
    let scripted = self.inner.lock().unwrap().scan_responses.get(url).cloned();
    Ok(scripted.unwrap_or_else(|| ScanResponse {
      report: sample_report(url, false),
      hash: Some(format!("hash-{}", url.len())),
    }))
  }

  async fn scan_batch(&self, urls: &[String]) -> anyhow::Result<()> {
    self.inner.lock().unwrap().batches.push(urls.to_vec());
    self.enter("scan_batch").await
  }

  async fn history(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
    self.inner.lock().unwrap().history_limits.push(limit);
    self.enter("history").await?;
    let inner = self.inner.lock().unwrap();
    Ok(inner.history.iter().take(limit).cloned().collect())
  }

  async fn stats(&self) -> anyhow::Result<Stats> {
    self.enter("stats").await?;
    Ok(self.inner.lock().unwrap().stats.clone())
  }

  async fn settings(&self) -> anyhow::Result<Settings> {
    self.enter("settings").await?;
    Ok(self.inner.lock().unwrap().settings.clone())
  }

  async fn commit_settings(&self, settings: &Settings) -> anyhow::Result<()> {
    self.enter("commit_settings").await?;
    let mut inner = self.inner.lock().unwrap();
    inner.commits.push(settings.clone());
    inner.settings = settings.clone();
    Ok(())
  }

  async fn quick_scan(&self, url: &str) -> anyhow::Result<QuickVerdict> {
    let resp = self.scan(url).await?;
    Ok(QuickVerdict {
      is_malicious: resp.report.is_malicious,
      reasons: resp.report.reasons,
    })
  }
}

pub fn sample_report(url: &str, malicious: bool) -> Report {
  let domain = url
    .split("://")
    .nth(1)
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or_default()
    .to_string();
  Report {
    url: url.to_string(),
    domain,
    final_url: Some(url.to_string()),
    is_malicious: malicious,
    reasons: if malicious {
      vec!["High domain entropy (4.21)".to_string()]
    } else {
      Vec::new()
    },
    geo: Geo {
      ip: Some("198.51.100.7".to_string()),
      country: Some("US".to_string()),
      city: Some("Ashburn".to_string()),
      isp: Some("Example Cloud".to_string()),
    },
    ssl: Ssl {
      has_https: url.starts_with("https://"),
      issuer: None,
    },
    entropy: if malicious { 4.21 } else { 2.75 },
    redirect_chain: vec![url.to_string()],
    screenshot_path: None,
    hash: None,
    extra: Default::default(),
  }
}

pub fn sample_history(urls: &[&str]) -> Vec<HistoryEntry> {
  urls
    .iter()
    .enumerate()
    .map(|(i, url)| HistoryEntry {
      url: url.to_string(),
      timestamp: format!("2026-10-19T10:{:02}:00", 59 - i),
      report: sample_report(url, i % 2 == 1),
      hash: Some(format!("h{i}")),
    })
    .collect()
}

pub fn sample_stats(total: u64, threats: u64) -> Stats {
  Stats {
    total_scans: total,
    malicious_scans: threats,
    risk_ratio: if total == 0 {
      0.0
    } else {
      threats as f64 * 100.0 / total as f64
    },
    avg_entropy: 3.2,
    geo_distribution: Vec::new(),
  }
}

pub fn sample_settings() -> Settings {
  let mut settings = Settings::default();
  settings.set_text(SettingKey::MinDomainAgeDays, "30");
  settings.set_text(SettingKey::MaxEntropyThreshold, "4.0");
  settings.set_text(SettingKey::JurisdictionJumpLimit, "2");
  settings.set_text(SettingKey::EnableVisionAi, "1");
  settings
}
