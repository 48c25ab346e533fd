//! Runtime variable values for one run.

use std::collections::HashMap;

use tracing::instrument;

use super::{Value, Variable, VariableId};

/// Current value of every variable during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
  values: HashMap<VariableId, Value>,
}

impl VariableStore {
  /// Builds a store seeded with each variable's default.
  #[instrument(level = "trace", skip(variables))]
  pub fn from_defaults<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> Self {
    Self {
      values: variables
        .into_iter()
        .map(|v| (v.id, v.value.clone()))
        .collect(),
    }
  }

  pub fn get(&self, id: VariableId) -> Option<&Value> {
    self.values.get(&id)
  }

  pub fn set(&mut self, id: VariableId, value: Value) {
    self.values.insert(id, value);
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&VariableId, &Value)> {
    self.values.iter()
  }
}
