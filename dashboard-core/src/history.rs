use crate::state::StateHandle;
use crate::types::{HistoryEntry, Report};

/// The one shape the detail view renders: the stored report with its hash.
/// Live scans and history replays both go through here.
pub fn displayed_report(report: &Report, hash: Option<&str>) -> Report {
  Report {
    hash: hash.map(str::to_string),
    ..report.clone()
  }
}

pub fn select_history_entry(state: &StateHandle, entry: &HistoryEntry) -> Report {
  let shown = displayed_report(&entry.report, entry.hash.as_deref());
  state.update(|s| s.report = Some(shown.clone()));
  shown
}

/// Looks up the `index`-th entry (most recent first) of the current history.
pub fn select_history_index(state: &StateHandle, index: usize) -> Option<Report> {
  let entry = state.read(|s| s.history.get(index).cloned())?;
  Some(select_history_entry(state, &entry))
}

pub fn clear_selection(state: &StateHandle) {
  state.update(|s| s.report = None);
}
