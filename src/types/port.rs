//! Connection points on a node.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PortId;

/// Whether a port carries control flow or a value.
///
/// Ports saved without a `type` are exec ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
  #[default]
  Exec,
  Data,
}

impl fmt::Display for PortKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PortKind::Exec => write!(f, "exec"),
      PortKind::Data => write!(f, "data"),
    }
  }
}

/// Declared value type of a data port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
  Number,
  String,
  Boolean,
  Any,
}

/// A port. Ids are unique within the owning node's input list or output list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
  pub id: PortId,
  #[serde(rename = "type", default)]
  pub kind: PortKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data_type: Option<DataType>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
}

impl Port {
  pub fn exec(id: PortId) -> Self {
    Self {
      id,
      kind: PortKind::Exec,
      data_type: None,
      label: None,
    }
  }

  pub fn data(id: PortId, data_type: DataType) -> Self {
    Self {
      id,
      kind: PortKind::Data,
      data_type: Some(data_type),
      label: None,
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }

  pub fn is_exec(&self) -> bool {
    self.kind == PortKind::Exec
  }

  pub fn is_data(&self) -> bool {
    self.kind == PortKind::Data
  }
}
