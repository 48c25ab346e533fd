//! Engine settings.

use std::env;

use tracing::warn;

/// Environment variable overriding [`EngineConfig::max_silent_steps`].
pub const MAX_SILENT_STEPS_ENV: &str = "NODEWEAVE_MAX_SILENT_STEPS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
  /// Most silent nodes one `advance()` may pass through before the run is
  /// halted as a silent loop.
  pub max_silent_steps: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_silent_steps: 10_000,
    }
  }
}

impl EngineConfig {
  /// Defaults, overridden by `NODEWEAVE_MAX_SILENT_STEPS` when it parses.
  pub fn from_env() -> Self {
    Self::default().with_env_overrides()
  }

  /// Applies `NODEWEAVE_MAX_SILENT_STEPS` on top of `self`. An unset or
  /// invalid value leaves the current limit alone.
  pub fn with_env_overrides(self) -> Self {
    match env::var(MAX_SILENT_STEPS_ENV) {
      Ok(raw) => self.with_override(&raw),
      Err(_) => self,
    }
  }

  pub(crate) fn with_override(mut self, raw: &str) -> Self {
    match raw.trim().parse::<usize>() {
      Ok(n) if n > 0 => self.max_silent_steps = n,
      _ => warn!(
        value = %raw,
        kept = self.max_silent_steps,
        "ignoring invalid {MAX_SILENT_STEPS_ENV}"
      ),
    }
    self
  }

  pub fn with_max_silent_steps(mut self, n: usize) -> Self {
    self.max_silent_steps = n;
    self
  }
}
