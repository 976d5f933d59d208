pub mod api;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod history;
pub mod logging;
pub mod notifications;
pub mod paths;
pub mod polling;
pub mod scan;
pub mod settings_sync;
pub mod state;
pub mod types;

#[cfg(test)]
mod testing;

use anyhow::Context;
use std::sync::Arc;

pub fn run_console(args: &[String]) -> anyhow::Result<()> {
  let base = paths::base_dir()?;
  let config_path = paths::config_path(&base);
  let mut cfg = config::load_or_create_default(&config_path)?;

  let action = console::parse_console_command(args)?;

  let sink = match action {
    console::ConsoleAction::Watch => logging::LogSink::FileOnly,
    _ => logging::LogSink::FileAndStderr,
  };
  logging::init(&paths::logs_dir(&base), &cfg.logging, sink)?;

  if let Some(base_url) = console::base_url_override(args) {
    cfg.backend.base_url = base_url;
    config::sanitize(&mut cfg);
  }

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("build async runtime")?;

  runtime.block_on(async {
    let backend = api::HttpBackend::new(&cfg.backend)?;
    let routes = backend.routes().clone();
    tracing::info!(backend = %api::routes::safe_url_label(routes.base()), "dashboard starting");

    let mut dash = dashboard::Dashboard::new(&cfg, Arc::new(backend));
    let result = console::run_console_command(&cfg, &mut dash, &routes, action).await;
    dash.deactivate();
    result
  })
}
