//! Tests for `EngineConfig` overrides.

use crate::config::EngineConfig;

#[test]
fn override_replaces_limit() {
  let config = EngineConfig::default().with_max_silent_steps(50);
  assert_eq!(config.with_override(" 7 ").max_silent_steps, 7);
}

#[test]
fn invalid_override_keeps_current_limit() {
  let config = EngineConfig::default().with_max_silent_steps(50);
  assert_eq!(config.with_override("lots").max_silent_steps, 50);
  assert_eq!(config.with_override("0").max_silent_steps, 50);
  assert_eq!(config.with_override("").max_silent_steps, 50);
}
