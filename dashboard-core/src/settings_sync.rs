use crate::api::ScanBackend;
use crate::notifications::NotificationQueue;
use crate::state::StateHandle;
use crate::types::{SettingKey, Severity};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const COMMIT_OK_MESSAGE: &str = "Backend configuration saved.";
pub const COMMIT_FAILED_MESSAGE: &str = "Could not save backend configuration.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
  Committed,
  Busy,
  Failed,
}

/// Buffered editor for backend settings. Reads are free; edits stay local
/// until `commit_settings`.
#[derive(Clone)]
pub struct SettingsSync {
  api: Arc<dyn ScanBackend>,
  state: StateHandle,
  toasts: NotificationQueue,
  view: CancellationToken,
}

impl SettingsSync {
  pub fn new(
    api: Arc<dyn ScanBackend>,
    state: StateHandle,
    toasts: NotificationQueue,
    view: CancellationToken,
  ) -> Self {
    Self {
      api,
      state,
      toasts,
      view,
    }
  }

  /// Opens the editor and loads the remote snapshot into it.
  pub async fn open_editor(&self) -> bool {
    self.state.update(|s| s.settings_open = true);
    self.fetch_settings().await
  }

  pub fn close_editor(&self) {
    self.state.update(|s| s.settings_open = false);
  }

  /// Replaces the local editable copy wholesale. Failures are silent and
  /// leave the current copy untouched.
  pub async fn fetch_settings(&self) -> bool {
    match self.api.settings().await {
      Ok(remote) => self
        .state
        .apply_if_active(&self.view, |s| s.settings = remote),
      Err(e) => {
        tracing::debug!(error = ?e, "settings fetch failed; keeping local copy");
        false
      }
    }
  }

  pub fn edit(&self, key: SettingKey, value: impl Into<String>) {
    let value = value.into();
    self.state.update(|s| s.settings.set_text(key, value));
  }

  pub fn toggle_vision(&self) -> bool {
    self.state.update(|s| {
      s.settings.toggle_vision();
      s.settings.vision_enabled()
    })
  }

  pub async fn commit_settings(&self) -> CommitOutcome {
    let staged = self.state.update(|s| {
      if s.saving_settings {
        return None;
      }
      s.saving_settings = true;
      Some(s.settings.clone())
    });
    let Some(staged) = staged else {
      tracing::debug!("settings commit already in flight; ignoring");
      return CommitOutcome::Busy;
    };

    let result = self.api.commit_settings(&staged).await;
    self.state.update(|s| s.saving_settings = false);

    match result {
      Ok(()) => {
        tracing::info!("backend settings committed");
        self
          .state
          .apply_if_active(&self.view, |s| s.settings_open = false);
        self.toasts.show(COMMIT_OK_MESSAGE, Severity::Success);
        CommitOutcome::Committed
      }
      Err(e) => {
        tracing::warn!(error = ?e, "backend settings commit failed");
        self.toasts.show(COMMIT_FAILED_MESSAGE, Severity::Danger);
        CommitOutcome::Failed
      }
    }
  }
}
