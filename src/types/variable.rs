//! Design-time variable declarations.

use serde::{Deserialize, Serialize};

use super::{DataType, Value, VariableId};

/// Declared type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
  Number,
  String,
  Boolean,
}

impl VariableType {
  /// Zero value a freshly declared (or retyped) variable starts with.
  pub fn default_value(self) -> Value {
    match self {
      VariableType::Number => Value::Number(0.0),
      VariableType::String => Value::String(String::new()),
      VariableType::Boolean => Value::Boolean(false),
    }
  }

  pub fn data_type(self) -> DataType {
    match self {
      VariableType::Number => DataType::Number,
      VariableType::String => DataType::String,
      VariableType::Boolean => DataType::Boolean,
    }
  }
}

/// A named, typed variable with its design-time default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
  pub id: VariableId,
  pub name: String,
  #[serde(rename = "type")]
  pub var_type: VariableType,
  /// Default copied into the variable store when a run starts.
  pub value: Value,
}

impl Variable {
  pub fn new(id: VariableId, name: impl Into<String>, var_type: VariableType) -> Self {
    Self {
      id,
      name: name.into(),
      var_type,
      value: var_type.default_value(),
    }
  }
}

/// Partial update applied by [`crate::Document::update_variable`].
#[derive(Debug, Clone, Default)]
pub struct VariableUpdate {
  pub name: Option<String>,
  pub var_type: Option<VariableType>,
  pub value: Option<Value>,
}
