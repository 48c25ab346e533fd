//! Pull-based evaluation of data inputs.
//!
//! A data input's value comes from the node feeding it: a variable read, or a
//! math node whose own inputs are evaluated recursively. Any other source
//! yields `None`. Control flow is never executed here.

use tracing::{instrument, trace};

use crate::document::Document;
use crate::error::{GraphError, Result};
use crate::types::{NodeId, NodeKind, PortId, Value, VariableStore};

pub struct DataEvaluator<'a> {
  document: &'a Document,
  store: &'a VariableStore,
  /// Nodes whose inputs are currently being evaluated.
  stack: Vec<NodeId>,
}

impl<'a> DataEvaluator<'a> {
  pub fn new(document: &'a Document, store: &'a VariableStore) -> Self {
    Self {
      document,
      store,
      stack: Vec::new(),
    }
  }

  /// Value flowing into `(node, port)`, or `None` if the input is unconnected
  /// or its source produces nothing. Fails only on a data-flow cycle.
  #[instrument(level = "trace", skip(self))]
  pub fn evaluate(&mut self, node: NodeId, port: PortId) -> Result<Option<Value>> {
    let Some(edge) = self
      .document
      .connections()
      .iter()
      .find(|c| c.to_node == node && c.to_port == port && c.is_data())
    else {
      return Ok(None);
    };
    let Some(source) = self.document.node(edge.from_node) else {
      return Ok(None);
    };

    match source.kind {
      NodeKind::VariableGet { variable_id } => Ok(self.store.get(variable_id).cloned()),
      NodeKind::Math { operation } => {
        if self.stack.contains(&source.id) {
          return Err(GraphError::CyclicDataFlow(source.id));
        }
        let inputs: Vec<PortId> = source.data_inputs().take(2).map(|p| p.id).collect();
        let &[a_port, b_port] = inputs.as_slice() else {
          return Ok(None);
        };
        self.stack.push(source.id);
        let operands = self.evaluate_pair(source.id, a_port, b_port);
        self.stack.pop();

        let (Some(a), Some(b)) = operands? else {
          return Ok(None);
        };
        let (Some(a), Some(b)) = (a.as_number(), b.as_number()) else {
          trace!(node_id = source.id, "math on non-numeric input");
          return Ok(None);
        };
        Ok(Some(Value::Number(operation.apply(a, b))))
      }
      _ => Ok(None),
    }
  }

  fn evaluate_pair(
    &mut self,
    node: NodeId,
    a: PortId,
    b: PortId,
  ) -> Result<(Option<Value>, Option<Value>)> {
    Ok((self.evaluate(node, a)?, self.evaluate(node, b)?))
  }
}
