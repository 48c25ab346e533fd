//! Comment areas. Opaque to the core apart from identity and scope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{CommentId, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id: CommentId,
  #[serde(default)]
  pub parent_group: Option<NodeId>,
  /// Renderer-owned fields (title, color, geometry), kept as-is.
  #[serde(flatten)]
  pub extra: Map<String, JsonValue>,
}

impl Comment {
  pub fn new(id: CommentId, parent_group: Option<NodeId>) -> Self {
    Self {
      id,
      parent_group,
      extra: Map::new(),
    }
  }
}
