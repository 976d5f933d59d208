use super::routes::{safe_url_label, Routes};
use super::schema::{
  BatchScanRequest, HistoryResponse, QuickScanResponse, QuickVerdict, ScanRequest, ScanResponse,
  SettingsCommitRequest,
};
use super::ScanBackend;
use crate::config::BackendConfig;
use crate::types::{HistoryEntry, Settings, Stats};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

pub struct HttpBackend {
  client: Client,
  routes: Routes,
}

impl HttpBackend {
  pub fn new(cfg: &BackendConfig) -> anyhow::Result<Self> {
    let routes = Routes::new(&cfg.base_url)?;

    let mut builder = Client::builder().redirect(Policy::none());
    if let Some(timeout) = cfg.request_timeout() {
      builder = builder.timeout(timeout);
    }
    let client = builder.build().context("build HTTP client")?;

    Ok(Self { client, routes })
  }

  pub fn routes(&self) -> &Routes {
    &self.routes
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> anyhow::Result<T> {
    let label = safe_url_label(&url);
    let response = self.send(self.client.get(url), &label).await?;
    response
      .json::<T>()
      .await
      .with_context(|| format!("decode response from {label}"))
  }

  async fn post<B: serde::Serialize + ?Sized>(&self, url: Url, body: &B) -> anyhow::Result<Response> {
    let label = safe_url_label(&url);
    self.send(self.client.post(url).json(body), &label).await
  }

  async fn send(&self, request: RequestBuilder, label: &str) -> anyhow::Result<Response> {
    let response = request
      .header(USER_AGENT, format!("linkwatch/{}", env!("CARGO_PKG_VERSION")))
      .send()
      .await
      .with_context(|| format!("request {label}"))?;

    if !response.status().is_success() {
      anyhow::bail!(
        "unexpected HTTP status {} for {}",
        response.status().as_u16(),
        label
      );
    }

    Ok(response)
  }
}

#[async_trait]
impl ScanBackend for HttpBackend {
  async fn scan(&self, url: &str) -> anyhow::Result<ScanResponse> {
    let endpoint = self.routes.scan()?;
    let label = safe_url_label(&endpoint);
    let body = ScanRequest {
      url,
      check_visual: true,
    };
    self
      .post(endpoint, &body)
      .await?
      .json::<ScanResponse>()
      .await
      .with_context(|| format!("decode response from {label}"))
  }

  async fn scan_batch(&self, urls: &[String]) -> anyhow::Result<()> {
    let endpoint = self.routes.scan_batch()?;
    self.post(endpoint, &BatchScanRequest { urls }).await?;
    Ok(())
  }

  async fn history(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
    let resp: HistoryResponse = self.get_json(self.routes.history(limit)?).await?;
    Ok(resp.history)
  }

  async fn stats(&self) -> anyhow::Result<Stats> {
    self.get_json(self.routes.stats()?).await
  }

  async fn settings(&self) -> anyhow::Result<Settings> {
    self.get_json(self.routes.settings()?).await
  }

  async fn commit_settings(&self, settings: &Settings) -> anyhow::Result<()> {
    let endpoint = self.routes.settings()?;
    self
      .post(endpoint, &SettingsCommitRequest { settings })
      .await?;
    Ok(())
  }

  async fn quick_scan(&self, url: &str) -> anyhow::Result<QuickVerdict> {
    let endpoint = self.routes.scan()?;
    let label = safe_url_label(&endpoint);
    let body = ScanRequest {
      url,
      check_visual: false,
    };
    let resp: QuickScanResponse = self
      .post(endpoint, &body)
      .await?
      .json()
      .await
      .with_context(|| format!("decode response from {label}"))?;
    Ok(resp.report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_against_configured_origin() {
    let cfg = BackendConfig {
      base_url: "http://scanner.local:8000".to_string(),
      request_timeout_seconds: Some(15),
      ..BackendConfig::default()
    };
    let backend = HttpBackend::new(&cfg).unwrap();
    assert_eq!(backend.routes().base().as_str(), "http://scanner.local:8000/");
  }

  #[test]
  fn rejects_unparsable_origin() {
    let cfg = BackendConfig {
      base_url: "::not-a-url".to_string(),
      ..BackendConfig::default()
    };
    assert!(HttpBackend::new(&cfg).is_err());
  }

  #[tokio::test]
  async fn unreachable_backend_is_an_error() {
    let port = {
      let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
      listener.local_addr().unwrap().port()
    };
    let cfg = BackendConfig {
      base_url: format!("http://127.0.0.1:{port}"),
      request_timeout_seconds: Some(2),
      ..BackendConfig::default()
    };
    let backend = HttpBackend::new(&cfg).unwrap();
    assert!(backend.stats().await.is_err());
  }
}
