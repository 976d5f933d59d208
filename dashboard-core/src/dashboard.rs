use crate::api::ScanBackend;
use crate::config::Config;
use crate::history;
use crate::notifications::NotificationQueue;
use crate::polling::{refresh_snapshot, PollingScheduler, RefreshResult};
use crate::scan::ScanCoordinator;
use crate::settings_sync::SettingsSync;
use crate::state::{DashboardState, StateHandle};
use crate::types::Report;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Owns the view state and wires the four flows onto it.
pub struct Dashboard {
  api: Arc<dyn ScanBackend>,
  state: StateHandle,
  view: CancellationToken,
  history_limit: usize,
  toasts: NotificationQueue,
  poller: PollingScheduler,
  scans: ScanCoordinator,
  settings: SettingsSync,
}

impl Dashboard {
  pub fn new(cfg: &Config, api: Arc<dyn ScanBackend>) -> Self {
    let state = StateHandle::new();
    let view = CancellationToken::new();
    let history_limit = cfg.backend.history_limit;
    let toasts = NotificationQueue::new(state.clone(), cfg.dashboard.toast_duration());

    let poller = PollingScheduler::new(
      api.clone(),
      state.clone(),
      cfg.dashboard.poll_interval(),
      history_limit,
    );
    let scans = ScanCoordinator::new(
      api.clone(),
      state.clone(),
      toasts.clone(),
      view.clone(),
      history_limit,
    );
    let settings = SettingsSync::new(api.clone(), state.clone(), toasts.clone(), view.clone());

    Self {
      api,
      state,
      view,
      history_limit,
      toasts,
      poller,
      scans,
      settings,
    }
  }

  pub fn state(&self) -> &StateHandle {
    &self.state
  }

  pub fn snapshot(&self) -> DashboardState {
    self.state.snapshot()
  }

  pub fn toasts(&self) -> &NotificationQueue {
    &self.toasts
  }

  pub fn scans(&self) -> &ScanCoordinator {
    &self.scans
  }

  pub fn settings(&self) -> &SettingsSync {
    &self.settings
  }

  pub fn is_active(&self) -> bool {
    !self.view.is_cancelled()
  }

  pub fn start_polling(&mut self) {
    if self.is_active() {
      self.poller.activate(&self.view);
    }
  }

  pub fn stop_polling(&mut self) {
    self.poller.deactivate();
  }

  /// One History/Stats refresh outside the polling cadence.
  pub async fn refresh_now(&self) -> RefreshResult {
    refresh_snapshot(self.api.as_ref(), &self.state, &self.view, self.history_limit).await
  }

  pub fn select_history(&self, index: usize) -> Option<Report> {
    history::select_history_index(&self.state, index)
  }

  /// Tears the view down: polling stops and no in-flight completion may
  /// write to the state afterwards.
  pub fn deactivate(&mut self) {
    self.poller.deactivate();
    self.state.cancel(&self.view);
    tracing::info!("dashboard deactivated");
  }

  /// Polls until `stop` flips to true, calling `on_change` whenever a new
  /// snapshot or toast lands.
  pub async fn watch(
    &mut self,
    mut stop: watch::Receiver<bool>,
    mut on_change: impl FnMut(&DashboardState),
  ) {
    let mut revisions = self.state.subscribe();
    self.start_polling();
    tracing::info!("dashboard watch started");

    let mut last_seen = None;
    loop {
      let fingerprint = self.state.read(|s| {
        (
          s.history.first().map(|e| (e.url.clone(), e.timestamp.clone())),
          s.summary,
          s.toast.as_ref().map(|t| t.generation),
        )
      });
      if last_seen.as_ref() != Some(&fingerprint) {
        on_change(&self.state.snapshot());
        last_seen = Some(fingerprint);
      }

      tokio::select! {
        changed = stop.changed() => {
          if changed.is_err() || *stop.borrow() {
            break;
          }
        }
        changed = revisions.changed() => {
          if changed.is_err() {
            break;
          }
        }
      }
    }

    self.deactivate();
  }
}

impl Drop for Dashboard {
  fn drop(&mut self) {
    self.state.cancel(&self.view);
  }
}
