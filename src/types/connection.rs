//! An edge between an output port and an input port.

use serde::{Deserialize, Serialize};

use super::{ConnectionId, NodeId, PortId, PortKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
  pub id: ConnectionId,
  pub from_node: NodeId,
  #[serde(alias = "fromPoint")]
  pub from_port: PortId,
  pub to_node: NodeId,
  #[serde(alias = "toPoint")]
  pub to_port: PortId,
  /// Kind shared by both endpoint ports.
  pub connection_type: PortKind,
}

impl Connection {
  pub fn touches(&self, node: NodeId) -> bool {
    self.from_node == node || self.to_node == node
  }

  pub fn is_exec(&self) -> bool {
    self.connection_type == PortKind::Exec
  }

  pub fn is_data(&self) -> bool {
    self.connection_type == PortKind::Data
  }
}
