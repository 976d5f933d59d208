use anyhow::Context;
use dashboard_core::api::schema::QuickVerdict;
use dashboard_core::api::{HttpBackend, ScanBackend};
use dashboard_core::{config, console, paths, scan};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  Url(String),
  File(PathBuf),
}

impl Target {
  pub fn from_args(args: &[String]) -> anyhow::Result<Self> {
    if let Some(i) = args.iter().position(|a| a == "--url") {
      let url = args
        .get(i + 1)
        .ok_or_else(|| anyhow::anyhow!("expected: --url <url>"))?;
      return Ok(Self::Url(url.clone()));
    }
    if let Some(i) = args.iter().position(|a| a == "--file") {
      let path = args
        .get(i + 1)
        .ok_or_else(|| anyhow::anyhow!("expected: --file <path-to-url-list>"))?;
      return Ok(Self::File(PathBuf::from(path)));
    }
    Err(anyhow::anyhow!("expected `--url <url>` or `--file <path>`"))
  }

  fn urls(&self) -> anyhow::Result<Vec<String>> {
    match self {
      Self::Url(url) => Ok(scan::parse_batch_input(url)),
      Self::File(path) => {
        let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Ok(scan::parse_batch_input(&raw))
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkVerdict {
  Safe,
  Suspicious(Vec<String>),
  Unreachable,
}

impl From<QuickVerdict> for LinkVerdict {
  fn from(v: QuickVerdict) -> Self {
    if v.is_malicious {
      Self::Suspicious(v.reasons)
    } else {
      Self::Safe
    }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckTotals {
  pub checked: usize,
  pub suspicious: usize,
  pub unreachable: usize,
}

/// Checks each URL in order, one request at a time.
pub async fn check_urls(
  api: &dyn ScanBackend,
  urls: &[String],
  mut report: impl FnMut(&str, &LinkVerdict),
) -> CheckTotals {
  let mut totals = CheckTotals::default();
  for url in urls {
    let verdict = match api.quick_scan(url).await {
      Ok(v) => LinkVerdict::from(v),
      Err(e) => {
        tracing::warn!(url = %url, error = ?e, "quick scan failed");
        LinkVerdict::Unreachable
      }
    };
    totals.checked += 1;
    match verdict {
      LinkVerdict::Suspicious(_) => totals.suspicious += 1,
      LinkVerdict::Unreachable => totals.unreachable += 1,
      LinkVerdict::Safe => {}
    }
    report(url, &verdict);
  }
  totals
}

pub fn format_verdict(url: &str, verdict: &LinkVerdict) -> String {
  match verdict {
    LinkVerdict::Safe => format!("SAFE        {url}"),
    LinkVerdict::Unreachable => format!("ERROR       {url} (backend unreachable)"),
    LinkVerdict::Suspicious(reasons) => {
      let mut out = format!("SUSPICIOUS  {url}");
      for reason in reasons {
        out.push_str("\n  - ");
        out.push_str(reason);
      }
      out
    }
  }
}

pub fn run(target: Target, args: &[String]) -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_ansi(false)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();

  let base = paths::base_dir()?;
  let mut cfg = config::load_or_default_readonly(&paths::config_path(&base))?;
  if let Some(base_url) = console::base_url_override(args) {
    cfg.backend.base_url = base_url;
    config::sanitize(&mut cfg);
  }

  let urls = target.urls()?;
  if urls.is_empty() {
    println!("No URLs to check.");
    return Ok(());
  }

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("build async runtime")?;

  let totals = runtime.block_on(async {
    let backend = HttpBackend::new(&cfg.backend)?;
    anyhow::Ok(
      check_urls(&backend, &urls, |url, verdict| {
        println!("{}", format_verdict(url, verdict))
      })
      .await,
    )
  })?;

  println!(
    "Checked {} URL(s): {} suspicious, {} unreachable.",
    totals.checked, totals.suspicious, totals.unreachable
  );
  Ok(())
}
