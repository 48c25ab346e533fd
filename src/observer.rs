//! Notifications the core sends to whoever presents a run.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::NodeId;

/// Receives the engine's outward calls. Implementations decide how to present
/// them; the engine never inspects what they do.
pub trait ExecutionObserver {
  /// The current position moved to `node`, or was cleared.
  fn on_position_changed(&mut self, node: Option<NodeId>);
  /// The run reached a node with no way forward, or was halted by an error.
  fn on_run_ended(&mut self);
  /// The variable store was rebuilt from defaults.
  fn on_variables_reset(&mut self);
}

/// A recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ExecutionEvent {
  PositionChanged { node: Option<NodeId> },
  RunEnded,
  VariablesReset,
}

/// Records every notification in order.
impl ExecutionObserver for Vec<ExecutionEvent> {
  fn on_position_changed(&mut self, node: Option<NodeId>) {
    self.push(ExecutionEvent::PositionChanged { node });
  }

  fn on_run_ended(&mut self) {
    self.push(ExecutionEvent::RunEnded);
  }

  fn on_variables_reset(&mut self) {
    self.push(ExecutionEvent::VariablesReset);
  }
}

/// Forwards notifications to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
  fn on_position_changed(&mut self, node: Option<NodeId>) {
    info!(node_id = ?node, "position changed");
  }

  fn on_run_ended(&mut self) {
    info!("run ended");
  }

  fn on_variables_reset(&mut self) {
    info!("variables reset");
  }
}
