//! Error taxonomy for graph editing and execution.
//!
//! Every variant is a synchronous rejection: the document and engine stay
//! usable after any of them is returned.

use thiserror::Error;

use crate::types::{NodeId, PortId};

/// What kind of id an [`GraphError::InvalidReference`] failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
  Node,
  Port,
  Connection,
  Variable,
  Comment,
  Group,
}

impl std::fmt::Display for ReferenceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      ReferenceKind::Node => "node",
      ReferenceKind::Port => "port",
      ReferenceKind::Connection => "connection",
      ReferenceKind::Variable => "variable",
      ReferenceKind::Comment => "comment",
      ReferenceKind::Group => "group",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
  #[error("cannot connect a {from} port to a {to} port")]
  TypeMismatch {
    from: crate::types::PortKind,
    to: crate::types::PortKind,
  },

  #[error("no start node found at root scope")]
  NoRootNode,

  #[error("unknown {kind} {id}")]
  InvalidReference { kind: ReferenceKind, id: u64 },

  #[error("node {0} is a system node and cannot be removed or moved")]
  SystemNode(NodeId),

  #[error("cannot connect node {0} to itself")]
  SelfConnection(NodeId),

  #[error("port {port} on node {node} cannot be used as {expected}")]
  PortDirection {
    node: NodeId,
    port: PortId,
    expected: &'static str,
  },

  #[error("a variable named {0:?} already exists")]
  DuplicateVariableName(String),

  #[error("variable name must not be empty")]
  EmptyVariableName,

  #[error("node {0} must keep at least one port on that side")]
  LastPort(NodeId),

  #[error("node {0} has a fixed port layout")]
  NotEditable(NodeId),

  #[error("{0} is not allowed while a run is in progress")]
  EditWhileRunning(&'static str),

  #[error("data flow cycle detected at node {0}")]
  CyclicDataFlow(NodeId),

  #[error("auto-advance passed {0} silent nodes without reaching an observable node")]
  SilentLoop(usize),
}

impl GraphError {
  pub(crate) fn node(id: NodeId) -> Self {
    GraphError::InvalidReference {
      kind: ReferenceKind::Node,
      id,
    }
  }

  pub(crate) fn port(id: PortId) -> Self {
    GraphError::InvalidReference {
      kind: ReferenceKind::Port,
      id: u64::from(id),
    }
  }

  pub(crate) fn reference(kind: ReferenceKind, id: u64) -> Self {
    GraphError::InvalidReference { kind, id }
  }
}

pub type Result<T> = std::result::Result<T, GraphError>;
