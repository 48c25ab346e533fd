//! Document save/load (JSON).
//!
//! The saved record mirrors the editor's own file: camelCase fields, node
//! kind tagged by `nodeType`. Files written by older editors may lack
//! `connectionType` on connections or `type` on ports; both are inferred.
//! Those editors also wrote plain text nodes without `nodeType` and marked
//! system nodes with `isRoot`/`isGroup`/`isInNode`/`isOutNode`
//! flags; the kind is inferred from those. Loading always lands at root scope
//! with an empty navigation stack, and id counters never trail the ids
//! already in the file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, instrument, warn};

use crate::document::{Document, NavigationEntry};
use crate::types::{
  Comment, CommentId, Connection, ConnectionId, Node, NodeId, PortId, PortKind, Variable,
  VariableId,
};

fn first_id() -> u64 {
  1
}

/// `saved`, raised past the largest id in use.
fn next_free_id(saved: u64, ids: impl Iterator<Item = u64>) -> u64 {
  ids.map(|id| id + 1).fold(saved.max(1), u64::max)
}

/// A node as found on disk. The kind tag may be missing; `rest` is handed to
/// [`Node`]'s own deserializer once the tag is settled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedNode {
  #[serde(default)]
  node_type: Option<String>,
  #[serde(default)]
  is_root: bool,
  #[serde(default)]
  is_group: bool,
  #[serde(default)]
  is_in_node: bool,
  #[serde(default)]
  is_out_node: bool,
  #[serde(default)]
  out_index: Option<usize>,
  #[serde(flatten)]
  rest: Map<String, JsonValue>,
}

impl SavedNode {
  fn kind_tag(&self) -> &str {
    match self.node_type.as_deref() {
      Some(tag) => tag,
      None if self.is_root => "start",
      None if self.is_group => "group",
      None if self.is_in_node => "inProxy",
      None if self.is_out_node => "outProxy",
      None => "regular",
    }
  }

  fn id(&self) -> Option<NodeId> {
    self.rest.get("id").and_then(JsonValue::as_u64)
  }

  fn linked_group(&self) -> Option<NodeId> {
    self.rest.get("linkedGroupNode").and_then(JsonValue::as_u64)
  }

  fn out_node_ids(&self) -> Vec<NodeId> {
    self
      .rest
      .get("outNodeIds")
      .and_then(JsonValue::as_array)
      .map(|ids| ids.iter().filter_map(JsonValue::as_u64).collect())
      .unwrap_or_default()
  }

  /// Builds the node. `groups` maps each group id to its `outNodeIds`, used to
  /// place an `OUT` proxy saved without `outIndex`.
  fn into_node(self, groups: &BTreeMap<NodeId, Vec<NodeId>>) -> Result<Node, serde_json::Error> {
    let tag = self.kind_tag().to_string();
    let out_index = self.out_index.or_else(|| {
      let id = self.id()?;
      let outs = groups.get(&self.linked_group()?)?;
      outs.iter().position(|o| *o == id)
    });
    let mut fields = self.rest;
    fields.insert("nodeType".into(), JsonValue::String(tag));
    if let Some(i) = out_index {
      fields.insert("outIndex".into(), i.into());
    }
    serde_json::from_value(JsonValue::Object(fields))
  }
}

/// A connection as found on disk; `connectionType` may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedConnection {
  id: ConnectionId,
  from_node: NodeId,
  #[serde(alias = "fromPoint")]
  from_port: PortId,
  to_node: NodeId,
  #[serde(alias = "toPoint")]
  to_port: PortId,
  #[serde(default)]
  connection_type: Option<PortKind>,
}

/// The persisted record. `N` is [`Node`] when saving and [`SavedNode`] when
/// loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "N: Deserialize<'de>"))]
struct SavedDocument<N> {
  #[serde(default)]
  nodes: Vec<N>,
  #[serde(default)]
  comments: Vec<Comment>,
  #[serde(default)]
  connections: Vec<SavedConnection>,
  #[serde(default)]
  variables: Vec<Variable>,
  #[serde(default = "first_id")]
  node_id_counter: NodeId,
  #[serde(default = "first_id")]
  comment_id_counter: CommentId,
  #[serde(default = "first_id")]
  connection_id_counter: ConnectionId,
  #[serde(default = "first_id")]
  variable_id_counter: VariableId,
  #[serde(default)]
  view: JsonValue,
  #[serde(default)]
  current_group_id: Option<NodeId>,
  #[serde(default)]
  navigation_stack: Vec<NavigationEntry>,
}

impl From<&Document> for SavedDocument<Node> {
  fn from(doc: &Document) -> Self {
    Self {
      nodes: doc.nodes.values().cloned().collect(),
      comments: doc.comments.clone(),
      connections: doc
        .connections
        .iter()
        .map(|c| SavedConnection {
          id: c.id,
          from_node: c.from_node,
          from_port: c.from_port,
          to_node: c.to_node,
          to_port: c.to_port,
          connection_type: Some(c.connection_type),
        })
        .collect(),
      variables: doc.variables.clone(),
      node_id_counter: doc.node_id_counter,
      comment_id_counter: doc.comment_id_counter,
      connection_id_counter: doc.connection_id_counter,
      variable_id_counter: doc.variable_id_counter,
      view: doc.view.clone(),
      current_group_id: doc.current_group_id,
      navigation_stack: doc.navigation_stack.clone(),
    }
  }
}

impl SavedDocument<SavedNode> {
  fn into_document(self) -> Result<Document, serde_json::Error> {
    let groups: BTreeMap<NodeId, Vec<NodeId>> = self
      .nodes
      .iter()
      .filter(|n| n.kind_tag() == "group")
      .filter_map(|n| Some((n.id()?, n.out_node_ids())))
      .collect();
    let mut nodes = BTreeMap::new();
    for saved in self.nodes {
      let node = saved.into_node(&groups)?;
      if nodes.contains_key(&node.id) {
        warn!(node_id = node.id, "duplicate node id in file; keeping the first");
        continue;
      }
      nodes.insert(node.id, node);
    }
    let connections: Vec<Connection> = self
      .connections
      .into_iter()
      .map(|c| {
        let connection_type = c.connection_type.unwrap_or_else(|| {
          nodes
            .get(&c.from_node)
            .and_then(|n| n.output(c.from_port))
            .map(|p| p.kind)
            .unwrap_or_default()
        });
        Connection {
          id: c.id,
          from_node: c.from_node,
          from_port: c.from_port,
          to_node: c.to_node,
          to_port: c.to_port,
          connection_type,
        }
      })
      .collect();

    if self.current_group_id.is_some() || !self.navigation_stack.is_empty() {
      debug!("resetting saved scope to root");
    }
    let node_id_counter = next_free_id(self.node_id_counter, nodes.keys().copied());
    let comment_id_counter =
      next_free_id(self.comment_id_counter, self.comments.iter().map(|c| c.id));
    let connection_id_counter =
      next_free_id(self.connection_id_counter, connections.iter().map(|c| c.id));
    let variable_id_counter =
      next_free_id(self.variable_id_counter, self.variables.iter().map(|v| v.id));
    if node_id_counter != self.node_id_counter {
      debug!(
        saved = self.node_id_counter,
        node_id_counter, "node id counter raised past ids in use"
      );
    }
    Ok(Document {
      nodes,
      comments: self.comments,
      connections,
      variables: self.variables,
      node_id_counter,
      comment_id_counter,
      connection_id_counter,
      variable_id_counter,
      view: self.view,
      current_group_id: None,
      navigation_stack: Vec::new(),
    })
  }
}

/// Serializes `doc` as pretty-printed JSON.
pub fn document_to_json(doc: &Document) -> Result<String, serde_json::Error> {
  serde_json::to_string_pretty(&SavedDocument::<Node>::from(doc))
}

/// Parses a saved document. Scope and navigation are reset to root.
pub fn document_from_json(json: &str) -> Result<Document, serde_json::Error> {
  let saved: SavedDocument<SavedNode> = serde_json::from_str(json)?;
  saved.into_document()
}

/// Saves a document to `path` as JSON, creating parent directories.
#[instrument(level = "trace", skip(path, doc))]
pub fn save_document(path: &Path, doc: &Document) -> Result<(), std::io::Error> {
  let json =
    document_to_json(doc).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

/// Loads a document from `path`. Returns error if the file is missing or invalid JSON.
#[instrument(level = "trace", skip(path))]
pub fn load_document(path: &Path) -> Result<Document, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice::<SavedDocument<SavedNode>>(&bytes)
    .and_then(SavedDocument::<SavedNode>::into_document)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
