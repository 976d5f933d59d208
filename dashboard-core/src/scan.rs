use crate::api::ScanBackend;
use crate::history::displayed_report;
use crate::notifications::NotificationQueue;
use crate::polling::refresh_snapshot;
use crate::state::{ScanMode, StateHandle};
use crate::types::Severity;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const COMMUNICATION_ERROR_MESSAGE: &str = "Could not reach the scanning backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
  /// Blank input; nothing was sent.
  EmptyInput,
  /// Another submission is still in flight.
  Busy,
  Completed,
  Failed,
}

/// Splits batch input into URLs: one per line, trimmed, blanks dropped,
/// order kept.
pub fn parse_batch_input(input: &str) -> Vec<String> {
  input
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect()
}

#[derive(Clone)]
pub struct ScanCoordinator {
  api: Arc<dyn ScanBackend>,
  state: StateHandle,
  toasts: NotificationQueue,
  view: CancellationToken,
  history_limit: usize,
}

struct ScanningGuard<'a>(&'a StateHandle);

impl Drop for ScanningGuard<'_> {
  fn drop(&mut self) {
    self.0.update(|s| s.scanning = false);
  }
}

impl ScanCoordinator {
  pub fn new(
    api: Arc<dyn ScanBackend>,
    state: StateHandle,
    toasts: NotificationQueue,
    view: CancellationToken,
    history_limit: usize,
  ) -> Self {
    Self {
      api,
      state,
      toasts,
      view,
      history_limit,
    }
  }

  /// Submits whatever is in the input field using the selected mode.
  pub async fn submit_current(&self) -> SubmitOutcome {
    let (input, mode) = self.state.read(|s| (s.input.clone(), s.mode));
    self.submit_scan(&input, mode).await
  }

  pub async fn submit_scan(&self, input: &str, mode: ScanMode) -> SubmitOutcome {
    let input = input.trim();
    if input.is_empty() {
      return SubmitOutcome::EmptyInput;
    }

    let acquired = self.state.update(|s| {
      if s.scanning {
        return false;
      }
      s.scanning = true;
      true
    });
    if !acquired {
      tracing::debug!("scan already in flight; submission ignored");
      return SubmitOutcome::Busy;
    }
    let _scanning = ScanningGuard(&self.state);

    let submission_id = uuid::Uuid::new_v4().to_string();
    let result = match mode {
      ScanMode::Single => self.scan_single(&submission_id, input).await,
      ScanMode::Batch => self.scan_batch(&submission_id, input).await,
    };

    match result {
      Ok(()) => {
        self.state.update(|s| s.input.clear());
        self.spawn_refresh();
        SubmitOutcome::Completed
      }
      Err(e) => {
        tracing::warn!(
          submission_id = %submission_id,
          mode = ?mode,
          error = ?e,
          "scan submission failed"
        );
        self
          .toasts
          .show(COMMUNICATION_ERROR_MESSAGE, Severity::Danger);
        SubmitOutcome::Failed
      }
    }
  }

  async fn scan_single(&self, submission_id: &str, url: &str) -> anyhow::Result<()> {
    tracing::info!(submission_id = %submission_id, url = %url, "submitting scan");
    let resp = self.api.scan(url).await?;

    let report = displayed_report(&resp.report, resp.hash.as_deref());
    let malicious = report.is_malicious;
    tracing::info!(
      submission_id = %submission_id,
      url = %url,
      malicious,
      reasons = report.reasons.len(),
      "scan completed"
    );

    self.state.update(|s| s.report = Some(report));
    if malicious {
      self
        .toasts
        .show(format!("Threat flagged for {url}."), Severity::Danger);
    } else {
      self
        .toasts
        .show(format!("No threats found for {url}."), Severity::Success);
    }
    Ok(())
  }

  async fn scan_batch(&self, submission_id: &str, input: &str) -> anyhow::Result<()> {
    let urls = parse_batch_input(input);
    tracing::info!(
      submission_id = %submission_id,
      count = urls.len(),
      "submitting batch scan"
    );
    self.api.scan_batch(&urls).await?;

    tracing::info!(submission_id = %submission_id, count = urls.len(), "batch scan accepted");
    self.toasts.show(
      format!("Batch of {} URL(s) analysed.", urls.len()),
      Severity::Success,
    );
    Ok(())
  }

  fn spawn_refresh(&self) {
    let api = self.api.clone();
    let state = self.state.clone();
    let view = self.view.clone();
    let history_limit = self.history_limit;
    tokio::spawn(async move {
      refresh_snapshot(api.as_ref(), &state, &view, history_limit).await;
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::schema::ScanResponse;
  use crate::notifications::DEFAULT_TOAST_DURATION;
  use crate::testing::{sample_history, sample_report, sample_stats, StubBackend};
  use std::time::Duration;

  fn coordinator(stub: &Arc<StubBackend>, state: &StateHandle) -> ScanCoordinator {
    ScanCoordinator::new(
      stub.clone(),
      state.clone(),
      NotificationQueue::new(state.clone(), DEFAULT_TOAST_DURATION),
      CancellationToken::new(),
      50,
    )
  }

  async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
  }

  #[test]
  fn batch_input_drops_blanks_and_keeps_order() {
    assert_eq!(
      parse_batch_input("http://a.com\nhttp://b.com\n\n"),
      vec!["http://a.com".to_string(), "http://b.com".to_string()]
    );
    assert_eq!(
      parse_batch_input("  http://c.com  \r\n\t\nhttp://a.com"),
      vec!["http://c.com".to_string(), "http://a.com".to_string()]
    );
  }

  #[tokio::test(start_paused = true)]
  async fn blank_input_is_a_no_op() {
    let stub = Arc::new(StubBackend::new());
    let state = StateHandle::new();
    let scans = coordinator(&stub, &state);

    for input in ["", "   ", "\n\t\n"] {
      for mode in [ScanMode::Single, ScanMode::Batch] {
        assert_eq!(scans.submit_scan(input, mode).await, SubmitOutcome::EmptyInput);
      }
    }
    settle().await;

    assert_eq!(stub.scanned().len(), 0);
    assert!(stub.batches().is_empty());
    assert_eq!(stub.calls("history"), 0);
    let snap = state.snapshot();
    assert!(snap.report.is_none());
    assert!(snap.toast.is_none());
    assert_eq!(snap.toast_generation, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn single_scan_updates_report_once_with_matching_toast() {
    for malicious in [false, true] {
      let stub = Arc::new(StubBackend::new());
      stub.set_scan_response(
        "http://a.com",
        ScanResponse {
          report: sample_report("http://a.com", malicious),
          hash: Some("deadbeef".to_string()),
        },
      );
      stub.set_stats(sample_stats(1, u64::from(malicious)));
      let state = StateHandle::new();
      state.update(|s| s.input = "http://a.com".to_string());
      let scans = coordinator(&stub, &state);

      assert_eq!(scans.submit_current().await, SubmitOutcome::Completed);
      settle().await;

      let snap = state.snapshot();
      let report = snap.report.unwrap();
      assert_eq!(report.hash.as_deref(), Some("deadbeef"));
      assert_eq!(report.is_malicious, malicious);
      assert_eq!(snap.toast_generation, 1);
      let expected = if malicious {
        Severity::Danger
      } else {
        Severity::Success
      };
      assert_eq!(snap.toast.unwrap().severity, expected);
      assert!(snap.input.is_empty());
      assert!(!snap.scanning);
      assert_eq!(stub.calls("history"), 1);
      assert_eq!(snap.summary.total, 1);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn batch_scan_dispatches_cleaned_list() {
    let stub = Arc::new(StubBackend::new());
    let state = StateHandle::new();
    let scans = coordinator(&stub, &state);

    let outcome = scans
      .submit_scan("http://a.com\nhttp://b.com\n\n", ScanMode::Batch)
      .await;
    assert_eq!(outcome, SubmitOutcome::Completed);
    settle().await;

    assert_eq!(
      stub.batches(),
      vec![vec!["http://a.com".to_string(), "http://b.com".to_string()]]
    );
    let snap = state.snapshot();
    assert!(snap.report.is_none());
    assert_eq!(snap.toast.unwrap().severity, Severity::Success);
    assert_eq!(stub.calls("stats"), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn failed_scan_leaves_view_state_untouched() {
    let stub = Arc::new(StubBackend::new());
    stub.set_history(sample_history(&["http://old.com"]));
    stub.set_stats(sample_stats(4, 1));
    let state = StateHandle::new();
    let scans = coordinator(&stub, &state);

    scans.submit_scan("http://old.com", ScanMode::Single).await;
    settle().await;
    state.update(|s| s.input = "http://new.com".to_string());
    let before = state.snapshot();

    stub.fail("scan");
    assert_eq!(scans.submit_current().await, SubmitOutcome::Failed);
    settle().await;

    let after = state.snapshot();
    assert_eq!(after.report, before.report);
    assert_eq!(after.history, before.history);
    assert_eq!(after.stats, before.stats);
    assert_eq!(after.input, "http://new.com");
    assert!(!after.scanning);
    let toast = after.toast.unwrap();
    assert_eq!(toast.severity, Severity::Danger);
    assert_eq!(toast.message, COMMUNICATION_ERROR_MESSAGE);
    assert_eq!(stub.calls("history"), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn second_submission_is_rejected_while_busy() {
    let stub = Arc::new(StubBackend::new());
    let gate = stub.hold("scan");
    let state = StateHandle::new();
    let scans = coordinator(&stub, &state);

    let first = tokio::spawn({
      let scans = scans.clone();
      async move { scans.submit_scan("http://a.com", ScanMode::Single).await }
    });
    settle().await;
    assert!(state.read(|s| s.scanning));

    assert_eq!(
      scans.submit_scan("http://a.com", ScanMode::Single).await,
      SubmitOutcome::Busy
    );

    gate.release();
    assert_eq!(first.await.unwrap(), SubmitOutcome::Completed);
    assert_eq!(stub.calls("scan"), 1);
    assert!(!state.read(|s| s.scanning));
  }

  #[tokio::test(start_paused = true)]
  async fn refresh_after_scan_respects_teardown() {
    let stub = Arc::new(StubBackend::new());
    stub.set_stats(sample_stats(5, 5));
    let gate = stub.hold("history");
    let state = StateHandle::new();
    let view = CancellationToken::new();
    let scans = ScanCoordinator::new(
      stub.clone(),
      state.clone(),
      NotificationQueue::new(state.clone(), DEFAULT_TOAST_DURATION),
      view.clone(),
      50,
    );

    assert_eq!(
      scans.submit_scan("http://a.com", ScanMode::Single).await,
      SubmitOutcome::Completed
    );
    settle().await;
    state.cancel(&view);
    gate.release();
    settle().await;

    assert_eq!(state.read(|s| s.summary.total), 0);
  }
}
