use crate::state::StateHandle;
use crate::types::{now_unix_ms, Severity, Toast};
use std::time::Duration;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(4_000);

/// Single-slot toast. Every `show` supersedes the current toast; the dismiss
/// timer it schedules only clears the toast it was scheduled for.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
  state: StateHandle,
  display_for: Duration,
}

impl NotificationQueue {
  pub fn new(state: StateHandle, display_for: Duration) -> Self {
    Self { state, display_for }
  }

  /// Must be called from within a tokio runtime.
  pub fn show(&self, message: impl Into<String>, severity: Severity) -> u64 {
    let message = message.into();
    let generation = self.state.update(|s| {
      s.toast_generation += 1;
      s.toast = Some(Toast {
        message: message.clone(),
        severity,
        generation: s.toast_generation,
        created_at_unix_ms: now_unix_ms(),
      });
      s.toast_generation
    });

    tracing::debug!(generation, severity = ?severity, "toast shown: {message}");

    let state = self.state.clone();
    let display_for = self.display_for;
    tokio::spawn(async move {
      tokio::time::sleep(display_for).await;
      dismiss_if_current(&state, generation);
    });

    generation
  }
}

fn dismiss_if_current(state: &StateHandle, generation: u64) -> bool {
  state.update(|s| {
    let current = s.toast.as_ref().map(|t| t.generation);
    if current == Some(generation) {
      s.toast = None;
      true
    } else {
      false
    }
  })
}
