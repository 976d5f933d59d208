use crate::api::routes::Routes;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::polling::RefreshResult;
use crate::scan::SubmitOutcome;
use crate::settings_sync::CommitOutcome;
use crate::state::{DashboardState, ScanMode};
use crate::types::{HistoryEntry, Report, SettingKey, Stats, Toast};
use anyhow::Context;
use tokio::sync::watch;

pub enum ConsoleAction {
  Help,
  Scan(String),
  Batch(String),
  History { limit: Option<usize> },
  Show(usize),
  Stats,
  SettingsShow,
  SettingsSet { key: SettingKey, value: String },
  SettingsToggleVision,
  Watch,
}

pub fn parse_console_command(args: &[String]) -> anyhow::Result<ConsoleAction> {
  let args = strip_global_flags(args);

  if args.iter().any(|a| a == "--help" || a == "-h") {
    return Ok(ConsoleAction::Help);
  }

  if let Some(i) = args.iter().position(|a| a == "--scan") {
    let url = args
      .get(i + 1)
      .ok_or_else(|| anyhow::anyhow!("expected: --scan <url>"))?;
    return Ok(ConsoleAction::Scan(url.clone()));
  }

  if let Some(i) = args.iter().position(|a| a == "--batch") {
    let path = args
      .get(i + 1)
      .ok_or_else(|| anyhow::anyhow!("expected: --batch <path-to-url-list>"))?;
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    return Ok(ConsoleAction::Batch(raw));
  }

  if let Some(i) = args.iter().position(|a| a == "--history") {
    return Ok(ConsoleAction::History {
      limit: parse_limit(&args[i + 1..]),
    });
  }

  if let Some(i) = args.iter().position(|a| a == "--show") {
    let index = args
      .get(i + 1)
      .and_then(|s| s.parse::<usize>().ok())
      .ok_or_else(|| anyhow::anyhow!("expected: --show <history-index>"))?;
    return Ok(ConsoleAction::Show(index));
  }

  if args.iter().any(|a| a == "--stats") {
    return Ok(ConsoleAction::Stats);
  }

  if let Some(i) = args.iter().position(|a| a == "--settings") {
    return parse_settings(&args[i + 1..]);
  }

  Ok(ConsoleAction::Watch)
}

fn parse_settings(tail: &[String]) -> anyhow::Result<ConsoleAction> {
  let sub = tail.first().map(|s| s.as_str()).unwrap_or("show");
  match sub {
    "show" => Ok(ConsoleAction::SettingsShow),
    "toggle-vision" => Ok(ConsoleAction::SettingsToggleVision),
    "set" => {
      let raw_key = tail.get(1).map(|s| s.as_str()).unwrap_or("");
      let value = tail
        .get(2)
        .ok_or_else(|| anyhow::anyhow!("expected: --settings set <key> <value>"))?;
      let key = SettingKey::parse(raw_key).ok_or_else(|| {
        anyhow::anyhow!(
          "unknown setting `{raw_key}`. Expected one of: {}",
          SettingKey::ALL.map(|k| k.as_str()).join(", ")
        )
      })?;
      Ok(ConsoleAction::SettingsSet {
        key,
        value: value.clone(),
      })
    }
    other => anyhow::bail!(
      "unknown `--settings` subcommand `{other}`. Expected: show|set <key> <value>|toggle-vision"
    ),
  }
}

pub async fn run_console_command(
  cfg: &Config,
  dash: &mut Dashboard,
  routes: &Routes,
  action: ConsoleAction,
) -> anyhow::Result<()> {
  match action {
    ConsoleAction::Help => print_help(),
    ConsoleAction::Scan(url) => {
      dash.state().update(|s| {
        s.set_mode(ScanMode::Single);
        s.input = url;
      });
      let outcome = dash.scans().submit_current().await;
      let snap = dash.snapshot();
      print_toast(snap.toast.as_ref());
      if outcome == SubmitOutcome::Completed {
        if let Some(report) = snap.report.as_ref() {
          print_report(report, routes);
        }
      }
    }
    ConsoleAction::Batch(raw) => {
      dash.state().update(|s| {
        s.set_mode(ScanMode::Batch);
        s.input = raw;
      });
      match dash.scans().submit_current().await {
        SubmitOutcome::EmptyInput => println!("No URLs found in the batch file."),
        _ => print_toast(dash.snapshot().toast.as_ref()),
      }
    }
    ConsoleAction::History { limit } => {
      require_refresh(dash).await?;
      let snap = dash.snapshot();
      let limit = limit.unwrap_or(cfg.backend.history_limit);
      print_history(&snap.history, limit);
    }
    ConsoleAction::Show(index) => {
      require_refresh(dash).await?;
      let Some(report) = dash.select_history(index) else {
        anyhow::bail!("no history entry at index {index}");
      };
      print_report(&report, routes);
    }
    ConsoleAction::Stats => {
      require_refresh(dash).await?;
      print_stats(&dash.snapshot().stats);
    }
    ConsoleAction::SettingsShow => {
      load_settings(dash).await?;
      print_settings(&dash.snapshot());
      dash.settings().close_editor();
    }
    ConsoleAction::SettingsSet { key, value } => {
      load_settings(dash).await?;
      dash.settings().edit(key, value);
      commit_and_report(dash).await?;
    }
    ConsoleAction::SettingsToggleVision => {
      load_settings(dash).await?;
      let enabled = dash.settings().toggle_vision();
      println!(
        "Vision analysis will be {} on commit.",
        if enabled { "enabled" } else { "disabled" }
      );
      commit_and_report(dash).await?;
    }
    ConsoleAction::Watch => run_watch(dash).await?,
  }
  Ok(())
}

async fn require_refresh(dash: &Dashboard) -> anyhow::Result<()> {
  match dash.refresh_now().await {
    RefreshResult::Applied => Ok(()),
    _ => anyhow::bail!("could not load history/stats from the backend"),
  }
}

async fn load_settings(dash: &Dashboard) -> anyhow::Result<()> {
  if !dash.settings().open_editor().await {
    dash.settings().close_editor();
    anyhow::bail!("could not load settings from the backend");
  }
  Ok(())
}

async fn commit_and_report(dash: &Dashboard) -> anyhow::Result<()> {
  let outcome = dash.settings().commit_settings().await;
  print_toast(dash.snapshot().toast.as_ref());
  if outcome == CommitOutcome::Failed {
    anyhow::bail!("settings were not saved");
  }
  Ok(())
}

async fn run_watch(dash: &mut Dashboard) -> anyhow::Result<()> {
  let (stop_tx, stop_rx) = watch::channel(false);
  ctrlc::set_handler(move || {
    let _ = stop_tx.send(true);
  })?;

  println!("Watching scan telemetry (Ctrl+C to exit)...");
  dash
    .watch(stop_rx, |snap| {
      println!("{}", format_summary_line(snap));
      print_toast(snap.toast.as_ref());
    })
    .await;
  println!("Stopped.");
  Ok(())
}

pub fn format_summary_line(snap: &DashboardState) -> String {
  let latest = snap
    .history
    .first()
    .map(|e| {
      format!(
        " latest={} ({})",
        e.url,
        if e.report.is_malicious { "SUSPICIOUS" } else { "SAFE" }
      )
    })
    .unwrap_or_default();
  format!(
    "scans={} threats={} risk={:.1}% entropy={:.2}{latest}",
    snap.summary.total, snap.summary.threats, snap.stats.risk_ratio, snap.stats.avg_entropy
  )
}

fn print_toast(toast: Option<&Toast>) {
  if let Some(t) = toast {
    println!("[{:?}] {}", t.severity, t.message);
  }
}

fn print_history(history: &[HistoryEntry], limit: usize) {
  if history.is_empty() {
    println!("No scans recorded yet.");
    return;
  }
  println!("Last {} scan(s):", history.len().min(limit));
  for (i, entry) in history.iter().take(limit).enumerate() {
    let verdict = if entry.report.is_malicious {
      "SUSPICIOUS"
    } else {
      "SAFE"
    };
    let place = entry
      .report
      .geo
      .country
      .as_deref()
      .unwrap_or("unknown origin");
    println!("{i:>3}. {verdict:<10} {} [{place}] {}", entry.url, entry.timestamp);
  }
}

fn print_report(report: &Report, routes: &Routes) {
  println!("URL: {}", report.url);
  println!("Domain: {}", report.domain);
  if let Some(final_url) = report.final_url.as_deref() {
    println!("Final URL: {final_url}");
  }
  if report.is_malicious {
    println!("Status: SUSPICIOUS");
    for reason in &report.reasons {
      println!("  - {reason}");
    }
  } else {
    println!("Status: SAFE");
  }
  println!("Entropy: {:.2}", report.entropy);
  println!(
    "HTTPS: {}{}",
    if report.ssl.has_https { "yes" } else { "no" },
    report
      .ssl
      .issuer
      .as_deref()
      .map(|i| format!(" (issuer: {i})"))
      .unwrap_or_default()
  );
  let geo = &report.geo;
  println!(
    "Hosting: {} / {} / {} / {}",
    geo.ip.as_deref().unwrap_or("-"),
    geo.country.as_deref().unwrap_or("-"),
    geo.city.as_deref().unwrap_or("-"),
    geo.isp.as_deref().unwrap_or("-")
  );
  if report.redirect_chain.len() > 1 {
    println!("Redirects: {}", report.redirect_chain.join(" -> "));
  }
  if let Some(hash) = report.hash.as_deref() {
    match routes.report(hash) {
      Ok(url) => println!("Full report: {url}"),
      Err(e) => tracing::debug!(error = ?e, "could not build report link"),
    }
  }
  if let Some(path) = report.screenshot_path.as_deref() {
    match routes.screenshot(path) {
      Ok(url) => println!("Screenshot: {url}"),
      Err(e) => tracing::debug!(error = ?e, "could not build screenshot link"),
    }
  }
}

fn print_stats(stats: &Stats) {
  println!("Total scans: {}", stats.total_scans);
  println!("Malicious: {}", stats.malicious_scans);
  println!("Risk ratio: {:.1}%", stats.risk_ratio);
  println!("Average entropy: {:.2}", stats.avg_entropy);
  if stats.geo_distribution.is_empty() {
    return;
  }
  println!("Geo distribution:");
  for slice in &stats.geo_distribution {
    println!("  {:<20} {}", slice.name, slice.value);
  }
}

fn print_settings(snap: &DashboardState) {
  for key in SettingKey::ALL {
    let value = snap.settings.text(key);
    let value = if value.is_empty() { "<unset>" } else { value.as_str() };
    println!("{:<26} {value}", key.as_str());
  }
}

fn parse_limit(args: &[String]) -> Option<usize> {
  let mut i = 0;
  while i < args.len() {
    if args[i] == "--limit" {
      return args.get(i + 1).and_then(|s| s.parse::<usize>().ok());
    }
    i += 1;
  }
  None
}

/// Value following `--base-url`, if any.
pub fn base_url_override(args: &[String]) -> Option<String> {
  let i = args.iter().position(|a| a == "--base-url")?;
  args.get(i + 1).cloned()
}

fn strip_global_flags(args: &[String]) -> Vec<String> {
  let mut out = Vec::new();
  let mut skip_next = false;
  for (i, a) in args.iter().enumerate() {
    if i == 0 || skip_next {
      skip_next = false;
      continue;
    }
    if a == "--base-url" {
      skip_next = true;
      continue;
    }
    out.push(a.clone());
  }
  out
}

fn print_help() {
  println!("linkwatch dashboard v{}", env!("CARGO_PKG_VERSION"));
  println!("Commands:");
  println!("  --base-url <url> (global; overrides backend.base_url)");
  println!("  --scan <url>");
  println!("  --batch <path-to-url-list>");
  println!("  --history [--limit N]");
  println!("  --show <history-index>");
  println!("  --stats");
  println!("  --settings show");
  println!("  --settings set <key> <value>");
  println!("  --settings toggle-vision");
  println!("  --watch (default)");
}
