use crate::api::ScanBackend;
use crate::state::StateHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshResult {
  Applied,
  Discarded,
  Failed,
}

/// Fetches history and stats concurrently and, if both succeed and `token` is
/// still live, replaces them in one step. Failures are swallowed.
pub async fn refresh_snapshot(
  api: &dyn ScanBackend,
  state: &StateHandle,
  token: &CancellationToken,
  history_limit: usize,
) -> RefreshResult {
  let (history, stats) = tokio::join!(api.history(history_limit), api.stats());

  let (history, stats) = match (history, stats) {
    (Ok(h), Ok(s)) => (h, s),
    (Err(e), _) | (_, Err(e)) => {
      tracing::debug!(error = ?e, "history/stats refresh failed; keeping last snapshot");
      return RefreshResult::Failed;
    }
  };

  let entries = history.len();
  let applied = state.apply_if_active(token, |s| s.replace_snapshot(history, stats));
  if !applied {
    tracing::debug!("dashboard inactive; refresh result discarded");
    return RefreshResult::Discarded;
  }

  tracing::trace!(entries, "history/stats snapshot applied");
  RefreshResult::Applied
}

pub struct PollingScheduler {
  api: Arc<dyn ScanBackend>,
  state: StateHandle,
  interval: Duration,
  history_limit: usize,
  running: Option<(CancellationToken, JoinHandle<()>)>,
}

impl PollingScheduler {
  pub fn new(
    api: Arc<dyn ScanBackend>,
    state: StateHandle,
    interval: Duration,
    history_limit: usize,
  ) -> Self {
    Self {
      api,
      state,
      interval,
      history_limit,
      running: None,
    }
  }

  pub fn is_active(&self) -> bool {
    self.running.is_some()
  }

  /// Refreshes immediately, then every `interval` until deactivated or until
  /// `view` (the owning dashboard's liveness token) is cancelled.
  pub fn activate(&mut self, view: &CancellationToken) {
    if self.running.is_some() {
      return;
    }

    let token = view.child_token();

    let api = self.api.clone();
    let state = self.state.clone();
    let interval = self.interval;
    let history_limit = self.history_limit;
    let loop_token = token.clone();

    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

      loop {
        tokio::select! {
          _ = loop_token.cancelled() => break,
          _ = ticker.tick() => {}
        }
        // An in-flight tick runs to completion; `apply_if_active` drops its
        // result if the dashboard went away meanwhile.
        refresh_snapshot(api.as_ref(), &state, &loop_token, history_limit).await;
      }

      tracing::debug!("polling loop exited");
    });

    tracing::debug!(interval = ?interval, "polling activated");
    self.running = Some((token, handle));
  }

  /// Stops the timer. Any fetch already in flight completes but cannot write.
  pub fn deactivate(&mut self) -> Option<JoinHandle<()>> {
    let (token, handle) = self.running.take()?;
    self.state.cancel(&token);
    tracing::debug!("polling deactivated");
    Some(handle)
  }
}

impl Drop for PollingScheduler {
  fn drop(&mut self) {
    if let Some((token, _)) = self.running.take() {
      self.state.cancel(&token);
    }
  }
}
