//! Tests for `RunTranscript`.

use super::{Node, RunTranscript, Value, Variable, VariableStore, VariableType};

#[test]
fn begin_is_open() {
  let t = RunTranscript::begin();
  assert_eq!(t.version, 1);
  assert!(t.finished_at.is_none());
  assert!(t.final_status.is_none());
  assert!(t.steps.is_empty());
  assert!(chrono::DateTime::parse_from_rfc3339(&t.started_at).is_ok());
}

#[test]
fn record_numbers_steps_and_names_variables() {
  let var = Variable::new(1, "score", VariableType::Number);
  let mut store = VariableStore::from_defaults([&var]);
  store.set(1, Value::Number(3.0));

  let mut t = RunTranscript::begin();
  t.record(&Node::regular(4, "Intro", "Hi"), Some(&store), |id| {
    (id == 1).then(|| "score".to_string())
  });
  t.record(&Node::regular(5, "Outro", "Bye"), None, |_| None);

  assert_eq!(t.steps.len(), 2);
  assert_eq!(t.steps[0].step, 1);
  assert_eq!(t.steps[0].node_id, 4);
  assert_eq!(t.steps[0].text, "Hi");
  assert_eq!(t.steps[0].variables.get("score"), Some(&Value::Number(3.0)));
  assert_eq!(t.steps[1].step, 2);
  assert!(t.steps[1].variables.is_empty());
}

#[test]
fn finish_sets_status() {
  let mut t = RunTranscript::begin();
  t.finish("completed");
  assert_eq!(t.final_status.as_deref(), Some("completed"));
  assert!(t.finished_at.is_some());
}
