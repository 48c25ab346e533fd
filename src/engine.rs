//! The stepper: walks exec edges from the root `Start` node, one observable
//! node per [`Engine::advance`] call.
//!
//! Silent nodes (everything except `Regular`) are passed through inside the
//! same call. Side effects run when the engine departs a node, so a
//! `VariableSet` writes its value before the step that leaves it completes.

use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::document::Document;
use crate::error::{GraphError, Result};
use crate::evaluator::DataEvaluator;
use crate::observer::ExecutionObserver;
use crate::types::{Node, NodeId, NodeKind, VariableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
  #[default]
  Idle,
  Running,
  Halted,
}

/// Outcome of one [`Engine::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  /// The engine was not running; nothing happened.
  NotRunning,
  /// Paused at an observable node.
  Paused(NodeId),
  /// No way forward; the run is over.
  Ended,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
  state: ExecutionState,
  current: Option<NodeId>,
  store: Option<VariableStore>,
  config: EngineConfig,
}

impl Engine {
  pub fn new(config: EngineConfig) -> Self {
    Self {
      config,
      ..Self::default()
    }
  }

  pub fn state(&self) -> ExecutionState {
    self.state
  }

  pub fn is_running(&self) -> bool {
    self.state == ExecutionState::Running
  }

  pub fn current_node(&self) -> Option<NodeId> {
    self.current
  }

  /// Runtime values of the current or most recent run.
  pub fn variables(&self) -> Option<&VariableStore> {
    self.store.as_ref()
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Begins a run at the root `Start` node. A live run is stopped first.
  /// Without a root `Start` node nothing else changes and `NoRootNode` is
  /// returned.
  #[instrument(level = "trace", skip(self, doc, observer))]
  pub fn start(&mut self, doc: &Document, observer: &mut dyn ExecutionObserver) -> Result<NodeId> {
    if self.is_running() {
      self.stop(observer);
    }
    let start = doc.find_root_start().ok_or(GraphError::NoRootNode)?.id;

    self.store = Some(VariableStore::from_defaults(doc.variables()));
    observer.on_variables_reset();
    self.state = ExecutionState::Running;
    self.current = Some(start);
    info!(start_id = start, "run started");
    observer.on_position_changed(Some(start));
    Ok(start)
  }

  /// Moves to the next observable node, passing through silent ones.
  /// Errors from data evaluation or the silent-step guard halt the run.
  #[instrument(level = "trace", skip(self, doc, observer))]
  pub fn advance(&mut self, doc: &Document, observer: &mut dyn ExecutionObserver) -> Result<Step> {
    if !self.is_running() {
      return Ok(Step::NotRunning);
    }
    let mut silent_steps = 0usize;

    loop {
      let next = match self.depart(doc) {
        Ok(next) => next,
        Err(e) => {
          warn!(error = %e, "run halted");
          self.end_run(observer);
          return Err(e);
        }
      };
      let Some(node) = next.and_then(|id| {
        let node = doc.node(id);
        if node.is_none() {
          warn!(target_id = id, "exec edge points at a missing node");
        }
        node
      }) else {
        info!(last_node = ?self.current, "run completed");
        self.end_run(observer);
        return Ok(Step::Ended);
      };

      self.current = Some(node.id);
      observer.on_position_changed(Some(node.id));
      if !node.is_silent() {
        info!(node_id = node.id, title = %node.title, "paused");
        return Ok(Step::Paused(node.id));
      }

      silent_steps += 1;
      if silent_steps > self.config.max_silent_steps {
        let limit = self.config.max_silent_steps;
        warn!(limit, "silent step limit exceeded");
        self.end_run(observer);
        return Err(GraphError::SilentLoop(limit));
      }
      debug!(node_id = node.id, "passing through silent node");
    }
  }

  /// Forces the engine to `Halted` and clears the position. Safe to call in
  /// any state.
  #[instrument(level = "trace", skip(self, observer))]
  pub fn stop(&mut self, observer: &mut dyn ExecutionObserver) {
    self.state = ExecutionState::Halted;
    self.store = None;
    if self.current.take().is_some() {
      info!("run stopped");
      observer.on_position_changed(None);
    }
  }

  fn end_run(&mut self, observer: &mut dyn ExecutionObserver) {
    self.state = ExecutionState::Halted;
    observer.on_run_ended();
  }

  /// Runs the current node's side effect and picks the node after it.
  fn depart(&mut self, doc: &Document) -> Result<Option<NodeId>> {
    let Some(current) = self.current else {
      return Ok(None);
    };
    let Some(node) = doc.node(current) else {
      warn!(node_id = current, "current node no longer exists");
      return Ok(None);
    };
    let store = self.store.get_or_insert_with(VariableStore::default);

    if let NodeKind::VariableSet { variable_id } = node.kind {
      if let Some(port) = node.data_inputs().next() {
        let value = DataEvaluator::new(doc, store).evaluate(node.id, port.id)?;
        if let Some(value) = value {
          debug!(variable_id, %value, "variable set");
          store.set(variable_id, value);
        }
      }
    }

    let output_index = match node.kind {
      NodeKind::Branch => Some(branch_output(doc, node, store)?),
      _ => None,
    };
    Ok(next_node(doc, node, output_index))
  }
}

/// Compares the branch's first two data inputs; `0` selects "True", `1` "False".
fn branch_output(doc: &Document, node: &Node, store: &VariableStore) -> Result<usize> {
  let mut evaluator = DataEvaluator::new(doc, store);
  let mut ports = node.data_inputs().map(|p| p.id);
  let a = match ports.next() {
    Some(p) => evaluator.evaluate(node.id, p)?,
    None => None,
  };
  let b = match ports.next() {
    Some(p) => evaluator.evaluate(node.id, p)?,
    None => None,
  };
  let taken = a == b;
  debug!(node_id = node.id, ?a, ?b, taken, "branch");
  Ok(if taken { 0 } else { 1 })
}

/// Target of the exec edge leaving `node`: from exec output `index` when
/// given, otherwise from the first exec output that has an edge.
fn next_node(doc: &Document, node: &Node, index: Option<usize>) -> Option<NodeId> {
  let edge = match index {
    Some(i) => node
      .exec_outputs()
      .nth(i)
      .and_then(|p| doc.outgoing(node.id, p.id)),
    None => node
      .exec_outputs()
      .find_map(|p| doc.outgoing(node.id, p.id)),
  };
  edge.filter(|c| c.is_exec()).map(|c| c.to_node)
}
