use crate::types::{HistoryEntry, Settings, Stats};
use async_trait::async_trait;

pub mod http;
pub mod routes;
pub mod schema;

pub use http::HttpBackend;
use schema::{QuickVerdict, ScanResponse};

/// Everything the dashboard asks of the scanning backend.
///
/// Implementations report any failure as an error without classifying it;
/// callers only distinguish success from "communication failure".
#[async_trait]
pub trait ScanBackend: Send + Sync {
  async fn scan(&self, url: &str) -> anyhow::Result<ScanResponse>;

  /// Response body is an acknowledgement only and is not parsed.
  async fn scan_batch(&self, urls: &[String]) -> anyhow::Result<()>;

  async fn history(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>>;

  async fn stats(&self) -> anyhow::Result<Stats>;

  async fn settings(&self) -> anyhow::Result<Settings>;

  async fn commit_settings(&self, settings: &Settings) -> anyhow::Result<()>;

  /// Lightweight `/scan` without visual capture, for verdict-only callers.
  async fn quick_scan(&self, url: &str) -> anyhow::Result<QuickVerdict>;
}
