use anyhow::Context;
use reqwest::Url;

/// Fixed backend origin plus the resource paths the dashboard links to.
#[derive(Debug, Clone)]
pub struct Routes {
  base: Url,
}

impl Routes {
  pub fn new(base_url: &str) -> anyhow::Result<Self> {
    let mut base = Url::parse(base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    Ok(Self { base })
  }

  pub fn base(&self) -> &Url {
    &self.base
  }

  pub fn scan(&self) -> anyhow::Result<Url> {
    self.join("scan")
  }

  pub fn scan_batch(&self) -> anyhow::Result<Url> {
    self.join("scan/batch")
  }

  pub fn history(&self, limit: usize) -> anyhow::Result<Url> {
    let mut url = self.join("history")?;
    url.query_pairs_mut().append_pair("limit", &limit.to_string());
    Ok(url)
  }

  pub fn stats(&self) -> anyhow::Result<Url> {
    self.join("stats")
  }

  pub fn settings(&self) -> anyhow::Result<Url> {
    self.join("settings")
  }

  /// Full report artifact; opened by the operator, never parsed here.
  pub fn report(&self, hash: &str) -> anyhow::Result<Url> {
    let mut url = self.join("report/")?;
    url
      .path_segments_mut()
      .map_err(|_| anyhow::anyhow!("base URL cannot carry a path"))?
      .pop_if_empty()
      .push(hash);
    Ok(url)
  }

  pub fn screenshot(&self, screenshot_path: &str) -> anyhow::Result<Url> {
    let file_name = screenshot_file_name(screenshot_path)
      .ok_or_else(|| anyhow::anyhow!("screenshot path has no file name"))?;
    let mut url = self.join("screenshot/")?;
    url
      .path_segments_mut()
      .map_err(|_| anyhow::anyhow!("base URL cannot carry a path"))?
      .pop_if_empty()
      .push(file_name);
    Ok(url)
  }

  fn join(&self, path: &str) -> anyhow::Result<Url> {
    self
      .base
      .join(path)
      .with_context(|| format!("build URL {path} from {}", self.base))
  }
}

/// Backend stores capture paths as written on its own host, so either
/// separator may appear.
pub fn screenshot_file_name(screenshot_path: &str) -> Option<&str> {
  screenshot_path
    .rsplit(['\\', '/'])
    .next()
    .filter(|name| !name.is_empty())
}

pub fn safe_url_label(url: &Url) -> String {
  let host = url.host_str().unwrap_or("<no-host>");
  let mut path = url.path().to_string();
  if path.is_empty() {
    path = "/".to_string();
  }
  format!("{host}{path}")
}
