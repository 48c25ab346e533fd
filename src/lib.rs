//! # nodeweave
//!
//! Execution core for branching node graphs (dialogue trees, flowcharts).
//!
//! ## Architecture
//!
//! - [`Document`] owns nodes, ports, connections, variables and comments.
//! - [`groups`] maps a group's outer ports onto its `InProxy` / `OutProxy`
//!   nodes, so stored edges only join leaf nodes.
//! - [`DataEvaluator`] pulls values into data inputs on demand.
//! - [`Engine`] steps along exec edges, pausing only at `Regular` nodes.
//! - [`Session`] ties a document to an engine and rejects edits that would
//!   break a live run.
//!
//! Presentation hooks in through [`ExecutionObserver`].
//!
//! Set `RUST_LOG=nodeweave=trace` for span enter/exit and per-node events.

pub mod config;
#[cfg(test)]
mod config_test;
pub mod document;
pub mod document_io;
pub mod engine;
pub mod error;
pub mod evaluator;
#[cfg(test)]
mod evaluator_test;
pub mod groups;
pub mod observer;
pub mod session;
pub mod transcript_io;
pub mod types;

pub use config::EngineConfig;
pub use document::{Document, NavigationEntry};
pub use engine::{Engine, ExecutionState, Step};
pub use error::{GraphError, ReferenceKind, Result};
pub use evaluator::DataEvaluator;
pub use observer::{ExecutionEvent, ExecutionObserver, TracingObserver};
pub use session::Session;
pub use types::{
  Connection, MathOp, Node, NodeId, NodeKind, Port, PortId, PortKind, RunTranscript, Value,
  Variable, VariableType, VariableUpdate,
};
