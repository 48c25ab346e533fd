//! Group boundary resolution.
//!
//! From the outside a group is one node with one exec input and N exec
//! outputs. Inside, the input is an `InProxy` node and each output an
//! `OutProxy`. Edges are always stored between leaf nodes: connecting to a
//! group port goes through [`resolve_incoming`] / [`resolve_outgoing`] first,
//! and [`visual_endpoint`] maps a stored edge back onto the group for display.

use tracing::instrument;

use crate::document::Document;
use crate::error::{GraphError, ReferenceKind, Result};
use crate::types::{Connection, Node, NodeId, NodeKind, Port, PortId, PortSide};

/// Creates a group in the current scope with its `InProxy` and first `OutProxy`.
#[instrument(level = "trace", skip(doc))]
pub(crate) fn create_group(doc: &mut Document) -> NodeId {
  let group = doc.allocate_node_id();
  doc.insert_in_scope(Node::group(group));

  let in_id = doc.allocate_node_id();
  let mut in_proxy = Node::in_proxy(in_id, group);
  in_proxy.parent_group = Some(group);
  doc.nodes.insert(in_id, in_proxy);

  attach_out_proxy(doc, group);
  group
}

/// Appends an output to an existing group.
#[instrument(level = "trace", skip(doc))]
pub(crate) fn add_group_output(doc: &mut Document, group: NodeId) -> Result<NodeId> {
  if !doc.node(group).is_some_and(Node::is_group) {
    return Err(GraphError::reference(ReferenceKind::Group, group));
  }
  Ok(attach_out_proxy(doc, group))
}

fn attach_out_proxy(doc: &mut Document, group: NodeId) -> NodeId {
  let proxy_id = doc.allocate_node_id();
  let Some(group_node) = doc.nodes.get_mut(&group) else {
    return proxy_id;
  };
  let NodeKind::Group { out_node_ids } = &mut group_node.kind else {
    return proxy_id;
  };
  let out_index = out_node_ids.len();
  out_node_ids.push(proxy_id);
  let port_id = group_node.outputs.iter().map(|p| p.id).max().unwrap_or(0) + 1;
  group_node.outputs.push(Port::exec(port_id));

  let mut proxy = Node::out_proxy(proxy_id, group, out_index);
  proxy.parent_group = Some(group);
  doc.nodes.insert(proxy_id, proxy);
  proxy_id
}

/// The `InProxy` standing in for `group`'s input.
pub fn in_proxy_of(doc: &Document, group: NodeId) -> Option<&Node> {
  doc.nodes().find(|n| {
    matches!(n.kind, NodeKind::InProxy { linked_group_node } if linked_group_node == group)
  })
}

/// Maps a group output port to the matching `OutProxy`'s output port.
/// Ports on any other node map to themselves.
pub fn resolve_outgoing(doc: &Document, node: NodeId, port: PortId) -> Result<(NodeId, PortId)> {
  let n = doc.require_node(node)?;
  let NodeKind::Group { out_node_ids } = &n.kind else {
    return Ok((node, port));
  };
  let index = n.output_index(port).ok_or(GraphError::port(port))?;
  let proxy_id = *out_node_ids
    .get(index)
    .ok_or(GraphError::reference(ReferenceKind::Node, node))?;
  let proxy = doc.require_node(proxy_id)?;
  let out = proxy.outputs.first().ok_or(GraphError::port(port))?;
  Ok((proxy_id, out.id))
}

/// Maps a group input port to its `InProxy`'s input port.
/// Ports on any other node map to themselves.
pub fn resolve_incoming(doc: &Document, node: NodeId, port: PortId) -> Result<(NodeId, PortId)> {
  let n = doc.require_node(node)?;
  if !n.is_group() {
    return Ok((node, port));
  }
  if n.input(port).is_none() {
    return Err(GraphError::port(port));
  }
  let proxy = in_proxy_of(doc, node).ok_or(GraphError::reference(ReferenceKind::Node, node))?;
  let inp = proxy.inputs.first().ok_or(GraphError::port(port))?;
  Ok((proxy.id, inp.id))
}

/// Where one end of an edge is drawn: a node and a slot on one of its sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualEndpoint {
  pub node: NodeId,
  pub index: usize,
  /// Number of slots on that side, for spacing.
  pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualEdge {
  pub from: VisualEndpoint,
  pub to: VisualEndpoint,
}

impl VisualEdge {
  /// World positions of both ends, from the display nodes' geometry.
  pub fn anchors(&self, doc: &Document) -> Result<((f64, f64), (f64, f64))> {
    let from = doc.require_node(self.from.node)?;
    let to = doc.require_node(self.to.node)?;
    Ok((
      from
        .geometry
        .port_anchor(PortSide::Output, self.from.index, self.from.count),
      to.geometry
        .port_anchor(PortSide::Input, self.to.index, self.to.count),
    ))
  }
}

/// Display endpoints of a stored edge. An edge leaving an `OutProxy` is drawn
/// from its group's output `outIndex`; an edge entering an `InProxy` is drawn
/// into its group's input 0.
pub fn visual_endpoint(doc: &Document, conn: &Connection) -> Result<VisualEdge> {
  let from_node = doc.require_node(conn.from_node)?;
  let from = match from_node.kind {
    NodeKind::OutProxy {
      linked_group_node,
      out_index,
    } => {
      let group = doc.require_node(linked_group_node)?;
      VisualEndpoint {
        node: group.id,
        index: out_index,
        count: group.outputs.len(),
      }
    }
    _ => VisualEndpoint {
      node: from_node.id,
      index: from_node
        .output_index(conn.from_port)
        .ok_or(GraphError::port(conn.from_port))?,
      count: from_node.outputs.len(),
    },
  };

  let to_node = doc.require_node(conn.to_node)?;
  let to = match to_node.kind {
    NodeKind::InProxy { linked_group_node } => {
      let group = doc.require_node(linked_group_node)?;
      VisualEndpoint {
        node: group.id,
        index: 0,
        count: group.inputs.len(),
      }
    }
    _ => VisualEndpoint {
      node: to_node.id,
      index: to_node
        .input_index(conn.to_port)
        .ok_or(GraphError::port(conn.to_port))?,
      count: to_node.inputs.len(),
    },
  };

  Ok(VisualEdge { from, to })
}

/// Scope an edge end is drawn in. The outward side of a proxy belongs to the
/// scope containing its group.
fn display_scope(doc: &Document, node: &Node, side: PortSide) -> Option<Option<NodeId>> {
  match (&node.kind, side) {
    (NodeKind::OutProxy { linked_group_node, .. }, PortSide::Output)
    | (NodeKind::InProxy { linked_group_node }, PortSide::Input) => {
      doc.node(*linked_group_node).map(|g| g.parent_group)
    }
    _ => Some(node.parent_group),
  }
}

/// Edges drawn when viewing `scope`.
pub fn visible_connections(doc: &Document, scope: Option<NodeId>) -> Vec<&Connection> {
  doc
    .connections()
    .iter()
    .filter(|c| {
      let (Some(from), Some(to)) = (doc.node(c.from_node), doc.node(c.to_node)) else {
        return false;
      };
      display_scope(doc, from, PortSide::Output) == Some(scope)
        && display_scope(doc, to, PortSide::Input) == Some(scope)
    })
    .collect()
}
