//! DTOs for a run transcript: the observable pauses of one run, for replay and debugging.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{Node, NodeId, Value, VariableStore};

/// One observable pause recorded in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
  /// 1-based step index.
  pub step: usize,
  pub node_id: NodeId,
  pub title: String,
  pub text: String,
  /// Variable values at the moment the run paused, keyed by variable name.
  pub variables: BTreeMap<String, Value>,
  /// RFC 3339 timestamp of the pause.
  pub at: String,
}

/// Root structure of a transcript file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTranscript {
  /// Format version.
  pub version: u32,
  pub started_at: String,
  /// `None` while the run is still in progress.
  pub finished_at: Option<String>,
  /// Why the run ended (`"completed"`, `"stopped"`, or an error message).
  pub final_status: Option<String>,
  pub steps: Vec<TranscriptEntry>,
}

fn now_rfc3339() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl RunTranscript {
  pub fn begin() -> Self {
    Self {
      version: 1,
      started_at: now_rfc3339(),
      finished_at: None,
      final_status: None,
      steps: vec![],
    }
  }

  /// Records a pause at `node`. `names` maps variable ids to their display names.
  pub fn record(
    &mut self,
    node: &Node,
    store: Option<&VariableStore>,
    names: impl Fn(u64) -> Option<String>,
  ) {
    let variables = store
      .map(|s| {
        s.iter()
          .filter_map(|(id, v)| names(*id).map(|n| (n, v.clone())))
          .collect()
      })
      .unwrap_or_default();
    self.steps.push(TranscriptEntry {
      step: self.steps.len() + 1,
      node_id: node.id,
      title: node.title.clone(),
      text: node.text.clone(),
      variables,
      at: now_rfc3339(),
    });
  }

  pub fn finish(&mut self, status: impl Into<String>) {
    self.finished_at = Some(now_rfc3339());
    self.final_status = Some(status.into());
  }
}
