//! CLI: play a saved node graph in the terminal.
//!
//! Loads the document, starts at its root `Start` node and prints every
//! observable node. Interactive by default: Enter advances, `q` stops.
//!
//! Usage: `run_graph [OPTIONS] <document.json>`
//! Example: run_graph --auto --transcript run.json story.json
//!
//! Set RUST_LOG=nodeweave=trace for TRACE-level span enter/exit and events.

use clap::Parser;
use nodeweave::transcript_io::save_transcript;
use nodeweave::{EngineConfig, Node, RunTranscript, Session, Step, TracingObserver};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Play a saved node graph.
#[derive(Parser, Debug)]
#[command(name = "run_graph")]
#[command(
  after_help = r#"Environment variables (override the matching flags when set):
  NODEWEAVE_MAX_SILENT_STEPS   Silent nodes one step may pass through before the run is halted.
  NODEWEAVE_TRANSCRIPT         Path of the JSON transcript to write.

Examples:
  run_graph story.json
  run_graph --auto --transcript run.json story.json"#
)]
struct Args {
  /// Advance without waiting for Enter.
  #[arg(long)]
  auto: bool,

  /// Write a JSON transcript of every pause to this file.
  #[arg(long, value_name = "FILE", env = "NODEWEAVE_TRANSCRIPT")]
  transcript: Option<PathBuf>,

  /// Silent-step limit per advance. Overridden by NODEWEAVE_MAX_SILENT_STEPS if set.
  #[arg(long, value_name = "N")]
  max_silent_steps: Option<usize>,

  /// Path to the saved document
  #[arg(value_name = "document.json")]
  document: PathBuf,
}

fn print_node(node: &Node) {
  println!("== {} ==", node.title);
  if !node.text.is_empty() {
    println!("{}", node.text);
  }
}

fn write_transcript(path: Option<&Path>, transcript: &RunTranscript) {
  let Some(path) = path else {
    return;
  };
  if let Err(e) = save_transcript(path, transcript) {
    warn!(path = %path.display(), error = %e, "failed to write transcript");
  }
}

/// Waits for Enter; `false` when the user typed `q` or input is closed.
fn wait_for_user(input: &mut impl BufRead) -> bool {
  print!("[Enter] continue, [q] quit > ");
  if let Err(e) = io::stdout().flush() {
    warn!(error = %e, "failed to flush prompt");
  }
  let mut line = String::new();
  match input.read_line(&mut line) {
    Ok(0) | Err(_) => false,
    Ok(_) => !line.trim().eq_ignore_ascii_case("q"),
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let args = Args::parse();

  // Env var overrides the flag.
  let config = args
    .max_silent_steps
    .map_or_else(EngineConfig::default, |n| {
      EngineConfig::default().with_max_silent_steps(n)
    })
    .with_env_overrides();
  info!(
    document = %args.document.display(),
    auto = args.auto,
    max_silent_steps = config.max_silent_steps,
    "run_graph starting"
  );

  let mut session = match Session::open(&args.document, config) {
    Ok(s) => s,
    Err(e) => {
      eprintln!("Error reading {}: {}", args.document.display(), e);
      process::exit(1);
    }
  };

  let mut observer = TracingObserver;
  let transcript_path = args.transcript.as_deref();
  let mut transcript = RunTranscript::begin();

  if let Err(e) = session.start(&mut observer) {
    eprintln!("Cannot start: {}", e);
    process::exit(1);
  }

  let stdin = io::stdin();
  let mut input = stdin.lock();
  let status = loop {
    match session.advance(&mut observer) {
      Ok(Step::Paused(id)) => {
        let doc = session.document();
        let Some(node) = doc.node(id) else {
          break "completed".to_string();
        };
        print_node(node);
        transcript.record(node, session.engine().variables(), |var| {
          doc.variable(var).map(|v| v.name.clone())
        });
        write_transcript(transcript_path, &transcript);
        if !args.auto && !wait_for_user(&mut input) {
          session.stop(&mut observer);
          break "stopped".to_string();
        }
      }
      Ok(Step::Ended) | Ok(Step::NotRunning) => break "completed".to_string(),
      Err(e) => {
        eprintln!("Run error: {}", e);
        transcript.finish(e.to_string());
        write_transcript(transcript_path, &transcript);
        process::exit(1);
      }
    }
  };

  transcript.finish(status.clone());
  write_transcript(transcript_path, &transcript);
  println!("Run {}.", status);
}
