//! Graph model types: nodes, ports, connections, variables and runtime values.
//!
//! These are plain data; the invariants tying them together are enforced by
//! [`crate::Document`].

mod comment;
mod connection;
mod node;
mod port;
mod run_transcript;
#[cfg(test)]
mod run_transcript_test;
mod value;
#[cfg(test)]
mod value_test;
mod variable;
mod variable_store;

pub use comment::Comment;
pub use connection::Connection;
pub use node::{Geometry, HEADER_HEIGHT, MathOp, Node, NodeKind, PortSide};
pub use port::{DataType, Port, PortKind};
pub use run_transcript::{RunTranscript, TranscriptEntry};
pub use value::Value;
pub use variable::{Variable, VariableType, VariableUpdate};
pub use variable_store::VariableStore;

pub type NodeId = u64;
/// Unique within one node's input list or output list.
pub type PortId = u32;
pub type ConnectionId = u64;
pub type VariableId = u64;
pub type CommentId = u64;
