use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use serde::Serialize;

use crate::proxy_service::ProxyResult;

#[derive(Serialize, Debug, Clone)]
pub struct HistoryEntry {
  pub timestamp: String,
  pub method: String,
  pub path: String,
  pub elapsed_ms: u128,
  pub result: Option<ProxyResult>,
  pub error: Option<String>,
}

impl HistoryEntry {
  pub fn new(method: &str, path: &str, elapsed_ms: u128, outcome: Result<ProxyResult, String>) -> HistoryEntry {
    let (result, error) = match outcome {
      Ok(result) => (Some(result), None),
      Err(error) => (None, Some(error)),
    };

    HistoryEntry {
      timestamp: Local::now().to_rfc3339(),
      method: method.to_string(),
      path: path.to_string(),
      elapsed_ms,
      result,
      error,
    }
  }
}

/// Most recent relays, oldest dropped first.
pub struct ProxyHistory {
  capacity: usize,
  entries: Mutex<VecDeque<HistoryEntry>>,
}

impl ProxyHistory {
  pub fn new(capacity: usize) -> ProxyHistory {
    ProxyHistory {
      capacity,
      entries: Mutex::new(VecDeque::with_capacity(capacity)),
    }
  }

  pub fn record(&self, entry: HistoryEntry) {
    if self.capacity == 0 {
      return;
    }

    let mut entries = self.lock();
    while entries.len() >= self.capacity {
      entries.pop_front();
    }
    entries.push_back(entry);
  }

  /// Newest first.
  pub fn recent(&self) -> Vec<HistoryEntry> {
    self.lock().iter().rev().cloned().collect()
  }

  fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryEntry>> {
    match self.entries.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}
