//! Tests for `DataEvaluator`.

use proptest::prelude::*;

use crate::document::Document;
use crate::error::GraphError;
use crate::evaluator::DataEvaluator;
use crate::types::{MathOp, NodeId, Value, VariableStore, VariableType, VariableUpdate};

fn number_var(doc: &mut Document, name: &str, value: f64) -> u64 {
  let id = doc.add_variable(name, VariableType::Number).unwrap();
  doc
    .update_variable(
      id,
      VariableUpdate {
        value: Some(Value::Number(value)),
        ..Default::default()
      },
    )
    .unwrap();
  id
}

/// `Set result <- op(Get a, Get b)`. Returns the document and the set node.
fn binary(a: f64, b: f64, op: MathOp) -> (Document, NodeId) {
  let mut doc = Document::new();
  let va = number_var(&mut doc, "a", a);
  let vb = number_var(&mut doc, "b", b);
  let result = doc.add_variable("result", VariableType::Number).unwrap();
  let ga = doc.add_variable_get_node(va).unwrap();
  let gb = doc.add_variable_get_node(vb).unwrap();
  let math = doc.add_math_node(op);
  let set = doc.add_variable_set_node(result).unwrap();
  doc.connect(ga, 1, math, 1).unwrap();
  doc.connect(gb, 1, math, 2).unwrap();
  doc.connect(math, 1, set, 2).unwrap();
  (doc, set)
}

fn eval(doc: &Document, node: NodeId, port: u32) -> crate::error::Result<Option<Value>> {
  let store = VariableStore::from_defaults(doc.variables());
  DataEvaluator::new(doc, &store).evaluate(node, port)
}

#[test]
fn unconnected_input_is_none() {
  let mut doc = Document::new();
  let var = doc.add_variable("x", VariableType::Number).unwrap();
  let set = doc.add_variable_set_node(var).unwrap();
  assert_eq!(eval(&doc, set, 2).unwrap(), None);
}

#[test]
fn variable_get_reads_the_store_not_the_default() {
  let mut doc = Document::new();
  let var = doc.add_variable("name", VariableType::String).unwrap();
  let get = doc.add_variable_get_node(var).unwrap();
  let branch = doc.add_branch_node();
  doc.connect(get, 1, branch, 2).unwrap();

  let mut store = VariableStore::from_defaults(doc.variables());
  store.set(var, Value::from("Ada"));
  let value = DataEvaluator::new(&doc, &store).evaluate(branch, 2).unwrap();
  assert_eq!(value, Some(Value::from("Ada")));
}

#[test]
fn math_applies_operation() {
  let (doc, set) = binary(6.0, 4.0, MathOp::Subtract);
  assert_eq!(eval(&doc, set, 2).unwrap(), Some(Value::Number(2.0)));
  let (doc, set) = binary(6.0, 4.0, MathOp::Multiply);
  assert_eq!(eval(&doc, set, 2).unwrap(), Some(Value::Number(24.0)));
}

#[test]
fn divide_by_zero_is_zero() {
  let (doc, set) = binary(10.0, 0.0, MathOp::Divide);
  assert_eq!(eval(&doc, set, 2).unwrap(), Some(Value::Number(0.0)));
}

#[test]
fn math_with_missing_input_is_none() {
  let (mut doc, set) = binary(1.0, 2.0, MathOp::Add);
  let edge = doc
    .connections()
    .iter()
    .find(|c| c.to_port == 2 && c.to_node != set)
    .map(|c| c.id)
    .unwrap();
  doc.remove_connection(edge).unwrap();
  assert_eq!(eval(&doc, set, 2).unwrap(), None);
}

#[test]
fn math_on_string_is_none() {
  let mut doc = Document::new();
  let s = doc.add_variable("s", VariableType::String).unwrap();
  let n = number_var(&mut doc, "n", 1.0);
  let gs = doc.add_variable_get_node(s).unwrap();
  let gn = doc.add_variable_get_node(n).unwrap();
  let math = doc.add_math_node(MathOp::Add);
  let set = doc.add_variable_set_node(n).unwrap();
  doc.connect(gs, 1, math, 1).unwrap();
  doc.connect(gn, 1, math, 2).unwrap();
  doc.connect(math, 1, set, 2).unwrap();
  assert_eq!(eval(&doc, set, 2).unwrap(), None);
}

#[test]
fn nested_math_evaluates_recursively() {
  // (a + b) * c
  let mut doc = Document::new();
  let a = number_var(&mut doc, "a", 2.0);
  let b = number_var(&mut doc, "b", 3.0);
  let c = number_var(&mut doc, "c", 4.0);
  let ga = doc.add_variable_get_node(a).unwrap();
  let gb = doc.add_variable_get_node(b).unwrap();
  let gc = doc.add_variable_get_node(c).unwrap();
  let add = doc.add_math_node(MathOp::Add);
  let mul = doc.add_math_node(MathOp::Multiply);
  let set = doc.add_variable_set_node(a).unwrap();
  doc.connect(ga, 1, add, 1).unwrap();
  doc.connect(gb, 1, add, 2).unwrap();
  doc.connect(add, 1, mul, 1).unwrap();
  doc.connect(gc, 1, mul, 2).unwrap();
  doc.connect(mul, 1, set, 2).unwrap();
  assert_eq!(eval(&doc, set, 2).unwrap(), Some(Value::Number(20.0)));
}

#[test]
fn data_cycle_is_reported() {
  let mut doc = Document::new();
  let m1 = doc.add_math_node(MathOp::Add);
  let m2 = doc.add_math_node(MathOp::Add);
  doc.connect(m1, 1, m2, 1).unwrap();
  doc.connect(m2, 1, m1, 1).unwrap();
  assert_eq!(
    eval(&doc, m1, 1).unwrap_err(),
    GraphError::CyclicDataFlow(m2)
  );
}

proptest! {
  #[test]
  fn add_matches_host_arithmetic(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
    let (doc, set) = binary(a, b, MathOp::Add);
    prop_assert_eq!(eval(&doc, set, 2).unwrap(), Some(Value::Number(a + b)));
  }

  #[test]
  fn divide_by_zero_is_always_zero(a in -1.0e6f64..1.0e6) {
    let (doc, set) = binary(a, 0.0, MathOp::Divide);
    prop_assert_eq!(eval(&doc, set, 2).unwrap(), Some(Value::Number(0.0)));
  }
}
