//! One editor session: a document, the engine that runs it, and the scope the
//! user is looking at.
//!
//! Edits go through the session so that changes which would corrupt a live
//! run are rejected while the engine is `Running`:
//! - deleting the current node (or a group containing it);
//! - deleting an edge, or a node whose deletion would take edges with it;
//! - connecting over an edge that would be replaced;
//! - removing a port that has an edge on it;
//! - renaming, retyping or deleting a variable a node refers to.

use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::document::{Document, NavigationEntry};
use crate::document_io;
use crate::engine::{Engine, ExecutionState, Step};
use crate::error::{GraphError, ReferenceKind, Result};
use crate::groups;
use crate::observer::ExecutionObserver;
use crate::types::{
  CommentId, Connection, ConnectionId, MathOp, Node, NodeId, PortId, Variable, VariableId,
  VariableType, VariableUpdate,
};

#[derive(Debug, Clone, Default)]
pub struct Session {
  document: Document,
  engine: Engine,
}

impl Session {
  pub fn new(document: Document) -> Self {
    Self::with_config(document, EngineConfig::default())
  }

  pub fn with_config(document: Document, config: EngineConfig) -> Self {
    Self {
      document,
      engine: Engine::new(config),
    }
  }

  /// Loads a saved document into a fresh session.
  pub fn open(path: &Path, config: EngineConfig) -> std::io::Result<Self> {
    Ok(Self::with_config(document_io::load_document(path)?, config))
  }

  pub fn save(&self, path: &Path) -> std::io::Result<()> {
    document_io::save_document(path, &self.document)
  }

  pub fn document(&self) -> &Document {
    &self.document
  }

  pub fn engine(&self) -> &Engine {
    &self.engine
  }

  pub fn into_document(self) -> Document {
    self.document
  }

  // ---- execution ----

  pub fn start(&mut self, observer: &mut dyn ExecutionObserver) -> Result<NodeId> {
    self.engine.start(&self.document, observer)
  }

  pub fn advance(&mut self, observer: &mut dyn ExecutionObserver) -> Result<Step> {
    self.engine.advance(&self.document, observer)
  }

  pub fn stop(&mut self, observer: &mut dyn ExecutionObserver) {
    self.engine.stop(observer);
  }

  pub fn state(&self) -> ExecutionState {
    self.engine.state()
  }

  fn ensure_idle(&self, what: &'static str) -> Result<()> {
    if self.engine.is_running() {
      return Err(GraphError::EditWhileRunning(what));
    }
    Ok(())
  }

  // ---- nodes ----

  pub fn add_regular_node(&mut self, title: impl Into<String>, text: impl Into<String>) -> NodeId {
    self.document.add_regular_node(title, text)
  }

  pub fn add_variable_get_node(&mut self, variable: VariableId) -> Result<NodeId> {
    self.document.add_variable_get_node(variable)
  }

  pub fn add_variable_set_node(&mut self, variable: VariableId) -> Result<NodeId> {
    self.document.add_variable_set_node(variable)
  }

  pub fn add_branch_node(&mut self) -> NodeId {
    self.document.add_branch_node()
  }

  pub fn add_math_node(&mut self, operation: MathOp) -> NodeId {
    self.document.add_math_node(operation)
  }

  pub fn add_group(&mut self) -> NodeId {
    self.document.add_group()
  }

  pub fn add_group_output(&mut self, group: NodeId) -> Result<NodeId> {
    self.document.add_group_output(group)
  }

  pub fn update_node_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<()> {
    self.document.update_node_title(id, title)
  }

  pub fn update_node_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
    self.document.update_node_text(id, text)
  }

  /// Deletes a node (a group with its whole subtree). While running, only
  /// nodes without edges can go. If the open scope was inside what got
  /// deleted, the view returns to root.
  #[instrument(level = "trace", skip(self))]
  pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<Node>> {
    let node = self.document.require_node(id)?;
    let doomed = if node.is_group() {
      self.document.subtree(id)
    } else {
      [id].into()
    };
    if self.engine.current_node().is_some_and(|c| doomed.contains(&c)) {
      self.ensure_idle("deleting the current node")?;
    }
    if self
      .document
      .connections()
      .iter()
      .any(|c| doomed.contains(&c.from_node) || doomed.contains(&c.to_node))
    {
      self.ensure_idle("deleting a connected node")?;
    }

    let removed = self.document.remove_node(id)?;
    if self
      .document
      .current_group_id
      .is_some_and(|g| doomed.contains(&g))
    {
      debug!(group_id = id, "open scope deleted; returning to root");
      self.document.current_group_id = None;
      self.document.navigation_stack.clear();
    }
    Ok(removed)
  }

  pub fn move_to_group(
    &mut self,
    nodes: &[NodeId],
    comments: &[CommentId],
    target: Option<NodeId>,
  ) -> Result<()> {
    self.document.move_to_group(nodes, comments, target)
  }

  // ---- ports ----

  pub fn add_input_port(&mut self, node: NodeId) -> Result<PortId> {
    self.document.add_input_port(node)
  }

  pub fn add_output_port(&mut self, node: NodeId) -> Result<PortId> {
    self.document.add_output_port(node)
  }

  pub fn remove_input_port(&mut self, node: NodeId, port: PortId) -> Result<()> {
    if self.document.incoming(node, port).is_some() {
      self.ensure_idle("removing a connected port")?;
    }
    self.document.remove_input_port(node, port)
  }

  pub fn remove_output_port(&mut self, node: NodeId, port: PortId) -> Result<()> {
    if self.document.outgoing(node, port).is_some() {
      self.ensure_idle("removing a connected port")?;
    }
    self.document.remove_output_port(node, port)
  }

  // ---- connections ----

  /// Connects two ports, resolving group boundaries first. While running,
  /// only connections that replace nothing are accepted.
  pub fn connect(
    &mut self,
    from: NodeId,
    from_port: PortId,
    to: NodeId,
    to_port: PortId,
  ) -> Result<ConnectionId> {
    let (from, from_port) = groups::resolve_outgoing(&self.document, from, from_port)?;
    let (to, to_port) = groups::resolve_incoming(&self.document, to, to_port)?;
    self
      .document
      .check_connection(from, from_port, to, to_port)?;
    if !self
      .document
      .conflicting_connections(from, from_port, to, to_port)
      .is_empty()
    {
      self.ensure_idle("replacing a connection")?;
    }
    self.document.insert_connection(from, from_port, to, to_port)
  }

  pub fn remove_connection(&mut self, id: ConnectionId) -> Result<Connection> {
    self.ensure_idle("deleting a connection")?;
    self.document.remove_connection(id)
  }

  // ---- variables ----

  pub fn add_variable(&mut self, name: &str, var_type: VariableType) -> Result<VariableId> {
    self.document.add_variable(name, var_type)
  }

  /// Changing only the default is always allowed; renaming or retyping a
  /// referenced variable is not while running.
  pub fn update_variable(&mut self, id: VariableId, update: VariableUpdate) -> Result<()> {
    let var = self.document.require_variable(id)?;
    let renames = update.name.as_deref().is_some_and(|n| n.trim() != var.name);
    let retypes = update.var_type.is_some_and(|t| t != var.var_type);
    if (renames || retypes) && self.document.is_variable_referenced(id) {
      self.ensure_idle("changing a variable in use")?;
    }
    self.document.update_variable(id, update)
  }

  pub fn remove_variable(&mut self, id: VariableId) -> Result<Variable> {
    if self.document.is_variable_referenced(id) {
      self.ensure_idle("deleting a variable in use")?;
    }
    self.document.remove_variable(id)
  }

  // ---- comments ----

  pub fn add_comment(&mut self) -> CommentId {
    self.document.add_comment()
  }

  pub fn remove_comment(&mut self, id: CommentId) -> Result<()> {
    self.document.remove_comment(id).map(|_| ())
  }

  // ---- scope navigation ----

  pub fn current_group_id(&self) -> Option<NodeId> {
    self.document.current_group_id
  }

  pub fn set_view(&mut self, view: JsonValue) {
    self.document.set_view(view);
  }

  /// Enters `group`, remembering the current scope and its `view`.
  #[instrument(level = "trace", skip(self, view))]
  pub fn open_group(&mut self, group: NodeId, view: JsonValue) -> Result<()> {
    if !self.document.node(group).is_some_and(Node::is_group) {
      return Err(GraphError::reference(ReferenceKind::Group, group));
    }
    self.document.navigation_stack.push(NavigationEntry {
      group_id: self.document.current_group_id,
      view,
    });
    self.document.current_group_id = Some(group);
    Ok(())
  }

  /// Leaves the open group, returning the view saved when it was entered.
  /// `None` at root.
  pub fn close_group(&mut self) -> Option<JsonValue> {
    let entry = self.document.navigation_stack.pop()?;
    self.document.current_group_id = entry.group_id;
    self.document.view = entry.view.clone();
    Some(entry.view)
  }

  /// Jumps back to root (`None`) or to a group on the navigation path,
  /// returning its saved view. Staying put returns `Ok(None)`.
  pub fn navigate_to_group(&mut self, target: Option<NodeId>) -> Result<Option<JsonValue>> {
    if target == self.document.current_group_id {
      return Ok(None);
    }
    let Some(pos) = self
      .document
      .navigation_stack
      .iter()
      .position(|e| e.group_id == target)
    else {
      return Err(GraphError::reference(
        ReferenceKind::Group,
        target.unwrap_or_default(),
      ));
    };
    let entry = self.document.navigation_stack.remove(pos);
    self.document.navigation_stack.truncate(pos);
    self.document.current_group_id = entry.group_id;
    self.document.view = entry.view.clone();
    Ok(Some(entry.view))
  }
}

impl From<Document> for Session {
  fn from(document: Document) -> Self {
    Self::new(document)
  }
}
