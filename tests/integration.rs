//! Integration tests over the JSON fixtures in tests/fixtures/: library runs
//! through `Session`, and the `run_graph` CLI end to end.

use std::path::{Path, PathBuf};
use std::process::Command;

use nodeweave::transcript_io::load_transcript;
use nodeweave::{
  EngineConfig, ExecutionEvent, ExecutionState, GraphError, NodeId, Session, Step, Value,
};

fn fixture(name: &str) -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

fn open(name: &str) -> Session {
  Session::open(&fixture(name), EngineConfig::default()).expect("fixture loads")
}

/// Starts the session and advances until the run ends, returning every pause.
fn play(session: &mut Session, events: &mut Vec<ExecutionEvent>) -> Vec<NodeId> {
  session.start(events).expect("start");
  let mut pauses = Vec::new();
  loop {
    match session.advance(events).expect("advance") {
      Step::Paused(id) => pauses.push(id),
      Step::Ended | Step::NotRunning => return pauses,
    }
  }
}

/// Runs the run_graph binary with `args`. Returns (stdout, stderr, success).
fn run_graph(args: &[&str], env: &[(&str, &str)]) -> (String, String, bool) {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_run_graph"));
  cmd
    .args(args)
    .env_remove("NODEWEAVE_MAX_SILENT_STEPS")
    .env_remove("NODEWEAVE_TRANSCRIPT");
  for (k, v) in env {
    cmd.env(k, v);
  }
  let out = cmd.output().expect("run_graph runs");
  (
    String::from_utf8_lossy(&out.stdout).into_owned(),
    String::from_utf8_lossy(&out.stderr).into_owned(),
    out.status.success(),
  )
}

// ---- library runs ----

#[test]
fn hello_pauses_at_each_regular_node() {
  let mut session = open("hello.json");
  let mut events: Vec<ExecutionEvent> = Vec::new();
  assert_eq!(play(&mut session, &mut events), vec![2, 3]);
  assert_eq!(events.last(), Some(&ExecutionEvent::RunEnded));
  assert_eq!(session.state(), ExecutionState::Halted);
}

#[test]
fn shop_branches_and_sets_total() {
  let mut session = open("shop.json");
  let mut events: Vec<ExecutionEvent> = Vec::new();
  assert_eq!(play(&mut session, &mut events), vec![5, 8]);
  let total = session.document().variable_by_name("total").unwrap().id;
  assert_eq!(
    session.engine().variables().and_then(|s| s.get(total)),
    Some(&Value::Number(100.0))
  );
  assert_eq!(session.document().comments().len(), 1);
}

#[test]
fn grouped_document_loads_at_root_and_runs_through_group() {
  let mut session = open("grouped.json");
  assert_eq!(session.current_group_id(), None);
  assert!(session.document().navigation_stack().is_empty());
  let mut events: Vec<ExecutionEvent> = Vec::new();
  assert_eq!(play(&mut session, &mut events), vec![6, 5]);
}

#[test]
fn missing_start_is_reported() {
  let mut session = open("no_start.json");
  let mut events: Vec<ExecutionEvent> = Vec::new();
  assert_eq!(session.start(&mut events).unwrap_err(), GraphError::NoRootNode);
  assert_eq!(session.state(), ExecutionState::Idle);
}

#[test]
fn silent_loop_is_halted() {
  let mut session = Session::open(
    &fixture("silent_loop.json"),
    EngineConfig::default().with_max_silent_steps(25),
  )
  .unwrap();
  let mut events: Vec<ExecutionEvent> = Vec::new();
  session.start(&mut events).unwrap();
  assert_eq!(
    session.advance(&mut events).unwrap_err(),
    GraphError::SilentLoop(25)
  );
  assert_eq!(session.state(), ExecutionState::Halted);
}

#[test]
fn edited_document_survives_save_and_reload() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("edited.json");

  let mut session = open("hello.json");
  let extra = session.add_regular_node("Epilogue", "The end.");
  session.connect(3, 1, extra, 1).unwrap();
  session.save(&path).unwrap();

  let mut reloaded = Session::open(&path, EngineConfig::default()).unwrap();
  let mut events: Vec<ExecutionEvent> = Vec::new();
  assert_eq!(play(&mut reloaded, &mut events), vec![2, 3, extra]);
}

// ---- CLI ----

#[test]
fn cli_auto_prints_nodes_and_completes() {
  let path = fixture("hello.json");
  let (stdout, stderr, success) = run_graph(&["--auto", path.to_str().unwrap()], &[]);
  assert!(success, "run_graph failed: stderr={stderr}");
  assert!(stdout.contains("== Greeting =="));
  assert!(stdout.contains("Hi"));
  assert!(stdout.contains("== Farewell =="));
  assert!(stdout.contains("Run completed."));
}

#[test]
fn cli_writes_transcript() {
  let dir = tempfile::tempdir().unwrap();
  let transcript = dir.path().join("out").join("transcript.json");
  let path = fixture("shop.json");
  let (_, stderr, success) = run_graph(
    &[
      "--auto",
      "--transcript",
      transcript.to_str().unwrap(),
      path.to_str().unwrap(),
    ],
    &[],
  );
  assert!(success, "run_graph failed: stderr={stderr}");

  let t = load_transcript(&transcript).unwrap();
  assert_eq!(t.final_status.as_deref(), Some("completed"));
  assert_eq!(t.steps.len(), 2);
  assert_eq!(t.steps[0].title, "Rich");
  assert_eq!(t.steps[1].node_id, 8);
  assert_eq!(t.steps[1].variables.get("total"), Some(&Value::Number(100.0)));
}

#[test]
fn cli_interactive_quits_on_q() {
  use std::io::Write;
  use std::process::Stdio;

  let path = fixture("hello.json");
  let mut child = Command::new(env!("CARGO_BIN_EXE_run_graph"))
    .arg(path.to_str().unwrap())
    .env_remove("NODEWEAVE_TRANSCRIPT")
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .unwrap();
  child.stdin.take().unwrap().write_all(b"q\n").unwrap();
  let out = child.wait_with_output().unwrap();
  let stdout = String::from_utf8_lossy(&out.stdout);
  assert!(out.status.success());
  assert!(stdout.contains("== Greeting =="));
  assert!(!stdout.contains("== Farewell =="));
  assert!(stdout.contains("Run stopped."));
}

#[test]
fn cli_fails_without_start_node() {
  let path = fixture("no_start.json");
  let (_, stderr, success) = run_graph(&["--auto", path.to_str().unwrap()], &[]);
  assert!(!success);
  assert!(stderr.contains("no start node"));
}

#[test]
fn cli_fails_on_missing_file() {
  let (_, stderr, success) = run_graph(&["--auto", "does/not/exist.json"], &[]);
  assert!(!success);
  assert!(stderr.contains("Error reading"));
}

#[test]
fn cli_env_limit_overrides_flag() {
  let path = fixture("silent_loop.json");
  let (_, stderr, success) = run_graph(
    &["--auto", "--max-silent-steps", "100000", path.to_str().unwrap()],
    &[("NODEWEAVE_MAX_SILENT_STEPS", "7")],
  );
  assert!(!success);
  assert!(stderr.contains("passed 7 silent nodes"), "stderr={stderr}");
}

#[test]
fn cli_invalid_env_limit_keeps_flag() {
  let path = fixture("silent_loop.json");
  let (_, stderr, success) = run_graph(
    &["--auto", "--max-silent-steps", "3", path.to_str().unwrap()],
    &[("NODEWEAVE_MAX_SILENT_STEPS", "lots")],
  );
  assert!(!success);
  assert!(stderr.contains("passed 3 silent nodes"), "stderr={stderr}");
}
