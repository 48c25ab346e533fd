//! Run transcript save/load (JSON).

use std::path::Path;

use tracing::instrument;

use crate::types::RunTranscript;

/// Writes `transcript` to `path`, creating parent directories. Called after
/// every pause, so the file always reflects the run so far.
#[instrument(level = "trace", skip(path, transcript))]
pub fn save_transcript(path: &Path, transcript: &RunTranscript) -> Result<(), std::io::Error> {
  let json = serde_json::to_string_pretty(transcript)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

/// Loads a transcript from `path`. Returns error if the file is missing or invalid JSON.
pub fn load_transcript(path: &Path) -> Result<RunTranscript, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
