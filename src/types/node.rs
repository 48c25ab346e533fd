//! A node in the editor graph.

use serde::{Deserialize, Serialize};

use super::{DataType, NodeId, Port, PortId, PortKind, Variable, VariableId};

/// Height of the node header; connection slots are laid out below it.
pub const HEADER_HEIGHT: f64 = 40.0;

/// Which side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSide {
  Input,
  Output,
}

/// Renderer-owned placement of a node. The core only reads it to place
/// connection anchors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
  #[serde(default)]
  pub x: f64,
  #[serde(default)]
  pub y: f64,
  #[serde(default)]
  pub width: f64,
  #[serde(default)]
  pub height: f64,
}

impl Geometry {
  pub fn sized(width: f64, height: f64) -> Self {
    Self {
      x: 0.0,
      y: 0.0,
      width,
      height,
    }
  }

  /// World position of slot `index` out of `count` on the given side.
  pub fn port_anchor(&self, side: PortSide, index: usize, count: usize) -> (f64, f64) {
    let x = match side {
      PortSide::Input => self.x,
      PortSide::Output => self.x + self.width,
    };
    let fraction = (index as f64 + 1.0) / (count as f64 + 1.0);
    let y = self.y + HEADER_HEIGHT + (self.height - HEADER_HEIGHT) * fraction;
    (x, y)
  }
}

/// Arithmetic performed by a math node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathOp {
  Add,
  Subtract,
  Multiply,
  Divide,
}

impl MathOp {
  /// Applies the operation. Division by zero yields `0`.
  pub fn apply(self, a: f64, b: f64) -> f64 {
    match self {
      MathOp::Add => a + b,
      MathOp::Subtract => a - b,
      MathOp::Multiply => a * b,
      MathOp::Divide => {
        if b == 0.0 {
          0.0
        } else {
          a / b
        }
      }
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      MathOp::Add => "Add",
      MathOp::Subtract => "Subtract",
      MathOp::Multiply => "Multiply",
      MathOp::Divide => "Divide",
    }
  }
}

/// Kind tag plus kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
  tag = "nodeType",
  rename_all = "camelCase",
  rename_all_fields = "camelCase"
)]
pub enum NodeKind {
  Start,
  Regular,
  Group {
    /// One `OutProxy` per group output, in output order.
    out_node_ids: Vec<NodeId>,
  },
  InProxy {
    linked_group_node: NodeId,
  },
  OutProxy {
    linked_group_node: NodeId,
    out_index: usize,
  },
  VariableGet {
    variable_id: VariableId,
  },
  VariableSet {
    variable_id: VariableId,
  },
  Branch,
  Math {
    operation: MathOp,
  },
}

fn default_color() -> String {
  "#007acc".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
  pub id: NodeId,
  #[serde(flatten)]
  pub kind: NodeKind,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub text: String,
  #[serde(default = "default_color")]
  pub color: String,
  #[serde(flatten)]
  pub geometry: Geometry,
  #[serde(default)]
  pub inputs: Vec<Port>,
  #[serde(default)]
  pub outputs: Vec<Port>,
  /// Enclosing group, `None` at root scope.
  #[serde(default)]
  pub parent_group: Option<NodeId>,
}

impl Node {
  fn with_layout(
    id: NodeId,
    kind: NodeKind,
    title: impl Into<String>,
    color: &str,
    geometry: Geometry,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
  ) -> Self {
    Self {
      id,
      kind,
      title: title.into(),
      text: String::new(),
      color: color.to_string(),
      geometry,
      inputs,
      outputs,
      parent_group: None,
    }
  }

  pub fn start(id: NodeId) -> Self {
    Self::with_layout(
      id,
      NodeKind::Start,
      "START",
      "#28a745",
      Geometry::sized(160.0, 80.0),
      vec![],
      vec![Port::exec(1)],
    )
  }

  pub fn regular(id: NodeId, title: impl Into<String>, text: impl Into<String>) -> Self {
    let mut node = Self::with_layout(
      id,
      NodeKind::Regular,
      title,
      "#007acc",
      Geometry::sized(220.0, 150.0),
      vec![Port::exec(1)],
      vec![Port::exec(1)],
    );
    node.text = text.into();
    node
  }

  /// A group with no outputs yet; the resolver adds proxies and ports.
  pub fn group(id: NodeId) -> Self {
    Self::with_layout(
      id,
      NodeKind::Group {
        out_node_ids: vec![],
      },
      format!("Group {id}"),
      "#9c27b0",
      Geometry::sized(220.0, 150.0),
      vec![Port::exec(1)],
      vec![],
    )
  }

  pub fn in_proxy(id: NodeId, group: NodeId) -> Self {
    Self::with_layout(
      id,
      NodeKind::InProxy {
        linked_group_node: group,
      },
      "IN",
      "#6c757d",
      Geometry::sized(160.0, 80.0),
      vec![Port::exec(1)],
      vec![Port::exec(1)],
    )
  }

  pub fn out_proxy(id: NodeId, group: NodeId, out_index: usize) -> Self {
    Self::with_layout(
      id,
      NodeKind::OutProxy {
        linked_group_node: group,
        out_index,
      },
      format!("OUT {}", out_index + 1),
      "#6c757d",
      Geometry::sized(160.0, 80.0),
      vec![Port::exec(1)],
      vec![Port::exec(1)],
    )
  }

  pub fn variable_get(id: NodeId, variable: &Variable) -> Self {
    Self::with_layout(
      id,
      NodeKind::VariableGet {
        variable_id: variable.id,
      },
      format!("Get {}", variable.name),
      "#28a745",
      Geometry::sized(200.0, 80.0),
      vec![],
      vec![Port::data(1, variable.var_type.data_type())],
    )
  }

  pub fn variable_set(id: NodeId, variable: &Variable) -> Self {
    Self::with_layout(
      id,
      NodeKind::VariableSet {
        variable_id: variable.id,
      },
      format!("Set {}", variable.name),
      "#ffc107",
      Geometry::sized(200.0, 100.0),
      vec![
        Port::exec(1),
        Port::data(2, variable.var_type.data_type()),
      ],
      vec![Port::exec(1)],
    )
  }

  pub fn branch(id: NodeId) -> Self {
    Self::with_layout(
      id,
      NodeKind::Branch,
      "Branch",
      "#17a2b8",
      Geometry::sized(200.0, 120.0),
      vec![
        Port::exec(1),
        Port::data(2, DataType::Any).with_label("A"),
        Port::data(3, DataType::Any).with_label("B"),
      ],
      vec![
        Port::exec(1).with_label("True"),
        Port::exec(2).with_label("False"),
      ],
    )
  }

  pub fn math(id: NodeId, operation: MathOp) -> Self {
    Self::with_layout(
      id,
      NodeKind::Math { operation },
      operation.title(),
      "#6f42c1",
      Geometry::sized(180.0, 100.0),
      vec![
        Port::data(1, DataType::Number).with_label("A"),
        Port::data(2, DataType::Number).with_label("B"),
      ],
      vec![Port::data(1, DataType::Number)],
    )
  }

  /// Start and proxy nodes are owned by the system and cannot be deleted by the user.
  pub fn is_system(&self) -> bool {
    matches!(
      self.kind,
      NodeKind::Start | NodeKind::InProxy { .. } | NodeKind::OutProxy { .. }
    )
  }

  /// Silent nodes are passed through by the engine without pausing.
  pub fn is_silent(&self) -> bool {
    match self.kind {
      NodeKind::Regular => false,
      NodeKind::Start
      | NodeKind::Group { .. }
      | NodeKind::InProxy { .. }
      | NodeKind::OutProxy { .. }
      | NodeKind::VariableGet { .. }
      | NodeKind::VariableSet { .. }
      | NodeKind::Branch
      | NodeKind::Math { .. } => true,
    }
  }

  pub fn is_group(&self) -> bool {
    matches!(self.kind, NodeKind::Group { .. })
  }

  /// Group a proxy node stands in for.
  pub fn linked_group(&self) -> Option<NodeId> {
    match self.kind {
      NodeKind::InProxy { linked_group_node } | NodeKind::OutProxy { linked_group_node, .. } => {
        Some(linked_group_node)
      }
      _ => None,
    }
  }

  /// Variable read or written by this node.
  pub fn variable_id(&self) -> Option<VariableId> {
    match self.kind {
      NodeKind::VariableGet { variable_id } | NodeKind::VariableSet { variable_id } => {
        Some(variable_id)
      }
      _ => None,
    }
  }

  pub fn input(&self, port: PortId) -> Option<&Port> {
    self.inputs.iter().find(|p| p.id == port)
  }

  pub fn output(&self, port: PortId) -> Option<&Port> {
    self.outputs.iter().find(|p| p.id == port)
  }

  pub fn input_index(&self, port: PortId) -> Option<usize> {
    self.inputs.iter().position(|p| p.id == port)
  }

  pub fn output_index(&self, port: PortId) -> Option<usize> {
    self.outputs.iter().position(|p| p.id == port)
  }

  /// Data inputs in declaration order.
  pub fn data_inputs(&self) -> impl Iterator<Item = &Port> {
    self.inputs.iter().filter(|p| p.kind == PortKind::Data)
  }

  /// Exec outputs in declaration order.
  pub fn exec_outputs(&self) -> impl Iterator<Item = &Port> {
    self.outputs.iter().filter(|p| p.kind == PortKind::Exec)
  }
}
