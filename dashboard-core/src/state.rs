use crate::types::{HistoryEntry, Report, Settings, Stats, Summary, Toast};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanMode {
  #[default]
  Single,
  Batch,
}

/// Everything the dashboard view renders. Owned by the orchestration layer;
/// nothing outside it writes here.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
  pub input: String,
  pub mode: ScanMode,
  pub report: Option<Report>,
  pub history: Vec<HistoryEntry>,
  pub stats: Stats,
  pub summary: Summary,
  pub settings: Settings,
  pub settings_open: bool,
  pub toast: Option<Toast>,
  pub toast_generation: u64,
  pub scanning: bool,
  pub saving_settings: bool,
}

impl DashboardState {
  /// History and stats always land together as one authoritative snapshot.
  pub fn replace_snapshot(&mut self, history: Vec<HistoryEntry>, stats: Stats) {
    self.history = history;
    self.summary = Summary::from_stats(&stats);
    self.stats = stats;
  }

  /// Switching between single and batch input discards the draft.
  pub fn set_mode(&mut self, mode: ScanMode) {
    if self.mode != mode {
      self.mode = mode;
      self.input.clear();
    }
  }
}

/// Shared view state. Every write bumps a revision that watchers can await.
#[derive(Debug, Clone)]
pub struct StateHandle {
  inner: Arc<Mutex<DashboardState>>,
  revision: Arc<watch::Sender<u64>>,
}

impl Default for StateHandle {
  fn default() -> Self {
    Self {
      inner: Arc::default(),
      revision: Arc::new(watch::channel(0).0),
    }
  }
}

impl StateHandle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(&self) -> watch::Receiver<u64> {
    self.revision.subscribe()
  }

  pub fn snapshot(&self) -> DashboardState {
    self.lock().clone()
  }

  pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
    f(&self.lock())
  }

  pub fn update<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
    let out = f(&mut self.lock());
    self.bump();
    out
  }

  /// Applies `f` only while `token` is live. The check and the write share one
  /// critical section, so a cancellation taken under the same lock is never
  /// followed by a write.
  pub fn apply_if_active(
    &self,
    token: &CancellationToken,
    f: impl FnOnce(&mut DashboardState),
  ) -> bool {
    let mut guard = self.lock();
    if token.is_cancelled() {
      return false;
    }
    f(&mut guard);
    drop(guard);
    self.bump();
    true
  }

  pub fn cancel(&self, token: &CancellationToken) {
    let _guard = self.lock();
    token.cancel();
  }

  fn bump(&self) {
    self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
  }

  fn lock(&self) -> MutexGuard<'_, DashboardState> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
