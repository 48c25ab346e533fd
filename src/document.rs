//! The graph model: one owned aggregate holding every node, connection,
//! variable and comment of an editor session, plus the id counters.
//!
//! Structural invariants kept here:
//! - an edge joins an output port to an input port of the same [`PortKind`];
//! - an input port has at most one incoming edge and an output port at most
//!   one outgoing edge (a new edge silently replaces the old one);
//! - deleting a node deletes every edge touching it in the same call.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument, warn};

use crate::error::{GraphError, ReferenceKind, Result};
use crate::groups;
use crate::types::{
  Comment, CommentId, Connection, ConnectionId, MathOp, Node, NodeId, NodeKind, Port, PortId,
  PortKind, Variable, VariableId, VariableType, VariableUpdate,
};

/// One breadcrumb: the scope that was open before entering a group, and its saved view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
  pub group_id: Option<NodeId>,
  #[serde(default)]
  pub view: JsonValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  pub(crate) nodes: BTreeMap<NodeId, Node>,
  pub(crate) comments: Vec<Comment>,
  pub(crate) connections: Vec<Connection>,
  pub(crate) variables: Vec<Variable>,
  pub(crate) node_id_counter: NodeId,
  pub(crate) comment_id_counter: CommentId,
  pub(crate) connection_id_counter: ConnectionId,
  pub(crate) variable_id_counter: VariableId,
  pub(crate) view: JsonValue,
  pub(crate) current_group_id: Option<NodeId>,
  pub(crate) navigation_stack: Vec<NavigationEntry>,
}

impl Default for Document {
  fn default() -> Self {
    Self::new()
  }
}

impl Document {
  /// A document with a single `Start` node at root scope.
  pub fn new() -> Self {
    let mut doc = Self::empty();
    let id = doc.allocate_node_id();
    doc.nodes.insert(id, Node::start(id));
    doc
  }

  /// A document with no nodes at all.
  pub fn empty() -> Self {
    Self {
      nodes: BTreeMap::new(),
      comments: Vec::new(),
      connections: Vec::new(),
      variables: Vec::new(),
      node_id_counter: 1,
      comment_id_counter: 1,
      connection_id_counter: 1,
      variable_id_counter: 1,
      view: JsonValue::Null,
      current_group_id: None,
      navigation_stack: Vec::new(),
    }
  }

  // ---- nodes ----

  pub(crate) fn allocate_node_id(&mut self) -> NodeId {
    let id = self.node_id_counter;
    self.node_id_counter += 1;
    id
  }

  /// Inserts a node built by the caller into the current scope.
  pub(crate) fn insert_in_scope(&mut self, mut node: Node) -> NodeId {
    let id = node.id;
    node.parent_group = self.current_group_id;
    self.nodes.insert(id, node);
    id
  }

  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(&id)
  }

  pub fn require_node(&self, id: NodeId) -> Result<&Node> {
    self.nodes.get(&id).ok_or(GraphError::node(id))
  }

  pub(crate) fn require_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
    self.nodes.get_mut(&id).ok_or(GraphError::node(id))
  }

  /// All nodes in id order.
  pub fn nodes(&self) -> impl Iterator<Item = &Node> {
    self.nodes.values()
  }

  pub fn nodes_in_scope(&self, scope: Option<NodeId>) -> impl Iterator<Item = &Node> {
    self.nodes.values().filter(move |n| n.parent_group == scope)
  }

  pub fn add_regular_node(&mut self, title: impl Into<String>, text: impl Into<String>) -> NodeId {
    let id = self.allocate_node_id();
    self.insert_in_scope(Node::regular(id, title, text))
  }

  pub fn add_variable_get_node(&mut self, variable: VariableId) -> Result<NodeId> {
    let var = self.require_variable(variable)?.clone();
    let id = self.allocate_node_id();
    Ok(self.insert_in_scope(Node::variable_get(id, &var)))
  }

  pub fn add_variable_set_node(&mut self, variable: VariableId) -> Result<NodeId> {
    let var = self.require_variable(variable)?.clone();
    let id = self.allocate_node_id();
    Ok(self.insert_in_scope(Node::variable_set(id, &var)))
  }

  pub fn add_branch_node(&mut self) -> NodeId {
    let id = self.allocate_node_id();
    self.insert_in_scope(Node::branch(id))
  }

  pub fn add_math_node(&mut self, operation: MathOp) -> NodeId {
    let id = self.allocate_node_id();
    self.insert_in_scope(Node::math(id, operation))
  }

  /// Creates a group in the current scope with its `InProxy` and one `OutProxy`.
  pub fn add_group(&mut self) -> NodeId {
    groups::create_group(self)
  }

  /// Appends an output to `group`, returning the new `OutProxy`.
  pub fn add_group_output(&mut self, group: NodeId) -> Result<NodeId> {
    groups::add_group_output(self, group)
  }

  pub fn update_node_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<()> {
    self.require_node_mut(id)?.title = title.into();
    Ok(())
  }

  pub fn update_node_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
    self.require_node_mut(id)?.text = text.into();
    Ok(())
  }

  /// `group` plus every node nested in it at any depth.
  pub(crate) fn subtree(&self, group: NodeId) -> BTreeSet<NodeId> {
    let mut set = BTreeSet::from([group]);
    loop {
      let before = set.len();
      for node in self.nodes.values() {
        if node.parent_group.is_some_and(|p| set.contains(&p)) {
          set.insert(node.id);
        }
      }
      if set.len() == before {
        return set;
      }
    }
  }

  /// Deletes a node and every edge touching it. Deleting a group deletes its
  /// whole subtree and the comments inside it. Returns the removed nodes.
  #[instrument(level = "trace", skip(self))]
  pub fn remove_node(&mut self, id: NodeId) -> Result<Vec<Node>> {
    let node = self.require_node(id)?;
    if node.is_system() {
      return Err(GraphError::SystemNode(id));
    }
    let doomed = if node.is_group() {
      self.subtree(id)
    } else {
      BTreeSet::from([id])
    };

    let before = self.connections.len();
    self
      .connections
      .retain(|c| !doomed.contains(&c.from_node) && !doomed.contains(&c.to_node));
    self
      .comments
      .retain(|c| !c.parent_group.is_some_and(|p| doomed.contains(&p)));
    let removed: Vec<Node> = doomed.iter().filter_map(|n| self.nodes.remove(n)).collect();
    debug!(
      node_id = id,
      nodes = removed.len(),
      connections = before - self.connections.len(),
      "removed node"
    );
    Ok(removed)
  }

  // ---- ports ----

  fn require_editable(&mut self, id: NodeId) -> Result<&mut Node> {
    let node = self.require_node_mut(id)?;
    if node.kind != NodeKind::Regular {
      return Err(GraphError::NotEditable(id));
    }
    Ok(node)
  }

  pub fn add_input_port(&mut self, node: NodeId) -> Result<PortId> {
    let node = self.require_editable(node)?;
    let id = node.inputs.iter().map(|p| p.id).max().unwrap_or(0) + 1;
    node.inputs.push(Port::exec(id));
    Ok(id)
  }

  pub fn add_output_port(&mut self, node: NodeId) -> Result<PortId> {
    let node = self.require_editable(node)?;
    let id = node.outputs.iter().map(|p| p.id).max().unwrap_or(0) + 1;
    node.outputs.push(Port::exec(id));
    Ok(id)
  }

  /// Removes an input port and any edge ending at it.
  pub fn remove_input_port(&mut self, node_id: NodeId, port: PortId) -> Result<()> {
    let node = self.require_editable(node_id)?;
    if node.input(port).is_none() {
      return Err(GraphError::port(port));
    }
    if node.inputs.len() <= 1 {
      return Err(GraphError::LastPort(node_id));
    }
    node.inputs.retain(|p| p.id != port);
    self
      .connections
      .retain(|c| !(c.to_node == node_id && c.to_port == port));
    Ok(())
  }

  /// Removes an output port and any edge leaving it.
  pub fn remove_output_port(&mut self, node_id: NodeId, port: PortId) -> Result<()> {
    let node = self.require_editable(node_id)?;
    if node.output(port).is_none() {
      return Err(GraphError::port(port));
    }
    if node.outputs.len() <= 1 {
      return Err(GraphError::LastPort(node_id));
    }
    node.outputs.retain(|p| p.id != port);
    self
      .connections
      .retain(|c| !(c.from_node == node_id && c.from_port == port));
    Ok(())
  }

  // ---- connections ----

  pub fn connections(&self) -> &[Connection] {
    &self.connections
  }

  pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
    self.connections.iter().find(|c| c.id == id)
  }

  /// The edge ending at `(node, port)`, if any.
  pub fn incoming(&self, node: NodeId, port: PortId) -> Option<&Connection> {
    self
      .connections
      .iter()
      .find(|c| c.to_node == node && c.to_port == port)
  }

  /// The edge leaving `(node, port)`, if any.
  pub fn outgoing(&self, node: NodeId, port: PortId) -> Option<&Connection> {
    self
      .connections
      .iter()
      .find(|c| c.from_node == node && c.from_port == port)
  }

  /// Connects an output port to an input port. Group endpoints are first
  /// resolved to their proxies, so stored edges only reference leaf nodes.
  /// Any edge already on either resolved port is replaced.
  #[instrument(level = "trace", skip(self))]
  pub fn connect(
    &mut self,
    from: NodeId,
    from_port: PortId,
    to: NodeId,
    to_port: PortId,
  ) -> Result<ConnectionId> {
    let (from, from_port) = groups::resolve_outgoing(self, from, from_port)?;
    let (to, to_port) = groups::resolve_incoming(self, to, to_port)?;
    self.insert_connection(from, from_port, to, to_port)
  }

  /// Resolved endpoints plus the kind an edge between them would carry.
  pub(crate) fn check_connection(
    &self,
    from: NodeId,
    from_port: PortId,
    to: NodeId,
    to_port: PortId,
  ) -> Result<PortKind> {
    let from_node = self.require_node(from)?;
    let to_node = self.require_node(to)?;
    if from == to {
      return Err(GraphError::SelfConnection(from));
    }
    let out = match from_node.output(from_port) {
      Some(p) => p,
      None if from_node.input(from_port).is_some() => {
        return Err(GraphError::PortDirection {
          node: from,
          port: from_port,
          expected: "an output",
        });
      }
      None => return Err(GraphError::port(from_port)),
    };
    let inp = match to_node.input(to_port) {
      Some(p) => p,
      None if to_node.output(to_port).is_some() => {
        return Err(GraphError::PortDirection {
          node: to,
          port: to_port,
          expected: "an input",
        });
      }
      None => return Err(GraphError::port(to_port)),
    };
    if out.kind != inp.kind {
      return Err(GraphError::TypeMismatch {
        from: out.kind,
        to: inp.kind,
      });
    }
    Ok(out.kind)
  }

  /// Ids of the edges a connection between these leaf endpoints would replace.
  pub(crate) fn conflicting_connections(
    &self,
    from: NodeId,
    from_port: PortId,
    to: NodeId,
    to_port: PortId,
  ) -> Vec<ConnectionId> {
    self
      .connections
      .iter()
      .filter(|c| {
        (c.to_node == to && c.to_port == to_port) || (c.from_node == from && c.from_port == from_port)
      })
      .map(|c| c.id)
      .collect()
  }

  /// Stores an edge between two leaf endpoints without group resolution.
  pub(crate) fn insert_connection(
    &mut self,
    from: NodeId,
    from_port: PortId,
    to: NodeId,
    to_port: PortId,
  ) -> Result<ConnectionId> {
    let kind = self.check_connection(from, from_port, to, to_port)?;
    let replaced = self.conflicting_connections(from, from_port, to, to_port);
    if !replaced.is_empty() {
      debug!(?replaced, "replacing connections on reused ports");
      self.connections.retain(|c| !replaced.contains(&c.id));
    }
    let id = self.connection_id_counter;
    self.connection_id_counter += 1;
    self.connections.push(Connection {
      id,
      from_node: from,
      from_port,
      to_node: to,
      to_port,
      connection_type: kind,
    });
    Ok(id)
  }

  pub fn remove_connection(&mut self, id: ConnectionId) -> Result<Connection> {
    let idx = self
      .connections
      .iter()
      .position(|c| c.id == id)
      .ok_or(GraphError::reference(ReferenceKind::Connection, id))?;
    Ok(self.connections.remove(idx))
  }

  // ---- variables ----

  pub fn variables(&self) -> &[Variable] {
    &self.variables
  }

  pub fn variable(&self, id: VariableId) -> Option<&Variable> {
    self.variables.iter().find(|v| v.id == id)
  }

  pub fn variable_by_name(&self, name: &str) -> Option<&Variable> {
    self.variables.iter().find(|v| v.name == name)
  }

  pub fn require_variable(&self, id: VariableId) -> Result<&Variable> {
    self
      .variable(id)
      .ok_or(GraphError::reference(ReferenceKind::Variable, id))
  }

  fn validate_variable_name(&self, name: &str, except: Option<VariableId>) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
      return Err(GraphError::EmptyVariableName);
    }
    if self
      .variables
      .iter()
      .any(|v| v.name == name && Some(v.id) != except)
    {
      return Err(GraphError::DuplicateVariableName(name.to_string()));
    }
    Ok(name.to_string())
  }

  /// Declares a variable whose default is the zero value of `var_type`.
  pub fn add_variable(&mut self, name: &str, var_type: VariableType) -> Result<VariableId> {
    let name = self.validate_variable_name(name, None)?;
    let id = self.variable_id_counter;
    self.variable_id_counter += 1;
    self.variables.push(Variable::new(id, name, var_type));
    Ok(id)
  }

  /// True if any get or set node reads or writes the variable.
  pub fn is_variable_referenced(&self, id: VariableId) -> bool {
    self.nodes.values().any(|n| n.variable_id() == Some(id))
  }

  /// Renames, retypes or changes the default of a variable. Retyping resets
  /// the default and retypes the data ports of the variable's nodes.
  pub fn update_variable(&mut self, id: VariableId, update: VariableUpdate) -> Result<()> {
    self.require_variable(id)?;
    let name = match update.name {
      Some(ref n) => Some(self.validate_variable_name(n, Some(id))?),
      None => None,
    };
    let Some(var) = self.variables.iter_mut().find(|v| v.id == id) else {
      return Err(GraphError::reference(ReferenceKind::Variable, id));
    };
    if let Some(name) = name {
      var.name = name;
    }
    if let Some(ty) = update.var_type.filter(|t| *t != var.var_type) {
      var.var_type = ty;
      var.value = ty.default_value();
    }
    if let Some(value) = update.value {
      var.value = value;
    }
    let var = var.clone();

    for node in self.nodes.values_mut() {
      match node.kind {
        NodeKind::VariableGet { variable_id } if variable_id == id => {
          node.title = format!("Get {}", var.name);
          for p in node.outputs.iter_mut().filter(|p| p.is_data()) {
            p.data_type = Some(var.var_type.data_type());
          }
        }
        NodeKind::VariableSet { variable_id } if variable_id == id => {
          node.title = format!("Set {}", var.name);
          for p in node.inputs.iter_mut().filter(|p| p.is_data()) {
            p.data_type = Some(var.var_type.data_type());
          }
        }
        _ => {}
      }
    }
    Ok(())
  }

  /// Deletes a variable. Nodes referring to it stay and read nothing.
  pub fn remove_variable(&mut self, id: VariableId) -> Result<Variable> {
    let idx = self
      .variables
      .iter()
      .position(|v| v.id == id)
      .ok_or(GraphError::reference(ReferenceKind::Variable, id))?;
    Ok(self.variables.remove(idx))
  }

  // ---- comments ----

  pub fn comments(&self) -> &[Comment] {
    &self.comments
  }

  pub fn comment(&self, id: CommentId) -> Option<&Comment> {
    self.comments.iter().find(|c| c.id == id)
  }

  pub fn comments_in_scope(&self, scope: Option<NodeId>) -> impl Iterator<Item = &Comment> {
    self.comments.iter().filter(move |c| c.parent_group == scope)
  }

  /// Adds an empty comment area to the current scope.
  pub fn add_comment(&mut self) -> CommentId {
    let id = self.comment_id_counter;
    self.comment_id_counter += 1;
    self.comments.push(Comment::new(id, self.current_group_id));
    id
  }

  pub fn remove_comment(&mut self, id: CommentId) -> Result<Comment> {
    let idx = self
      .comments
      .iter()
      .position(|c| c.id == id)
      .ok_or(GraphError::reference(ReferenceKind::Comment, id))?;
    Ok(self.comments.remove(idx))
  }

  // ---- scope ----

  pub fn current_group_id(&self) -> Option<NodeId> {
    self.current_group_id
  }

  pub fn navigation_stack(&self) -> &[NavigationEntry] {
    &self.navigation_stack
  }

  pub fn view(&self) -> &JsonValue {
    &self.view
  }

  pub fn set_view(&mut self, view: JsonValue) {
    self.view = view;
  }

  /// Re-parents nodes and comments into `target` (a group, or root when `None`).
  /// Group nodes in `nodes` are skipped; system nodes are rejected. Nothing
  /// moves unless every id is valid.
  pub fn move_to_group(
    &mut self,
    nodes: &[NodeId],
    comments: &[CommentId],
    target: Option<NodeId>,
  ) -> Result<()> {
    if let Some(g) = target {
      if !self.node(g).is_some_and(Node::is_group) {
        return Err(GraphError::reference(ReferenceKind::Group, g));
      }
    }
    for id in nodes {
      if self.require_node(*id)?.is_system() {
        return Err(GraphError::SystemNode(*id));
      }
    }
    for id in comments {
      if self.comment(*id).is_none() {
        return Err(GraphError::reference(ReferenceKind::Comment, *id));
      }
    }
    for id in nodes {
      if let Some(node) = self.nodes.get_mut(id).filter(|n| !n.is_group()) {
        node.parent_group = target;
      }
    }
    for c in self.comments.iter_mut().filter(|c| comments.contains(&c.id)) {
      c.parent_group = target;
    }
    Ok(())
  }

  /// The `Start` node at root scope. With several, the lowest id wins.
  pub fn find_root_start(&self) -> Option<&Node> {
    let mut starts = self
      .nodes
      .values()
      .filter(|n| n.kind == NodeKind::Start && n.parent_group.is_none());
    let first = starts.next()?;
    if starts.next().is_some() {
      warn!(start_id = first.id, "several root start nodes; using the lowest id");
    }
    Some(first)
  }
}
