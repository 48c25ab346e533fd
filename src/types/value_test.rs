//! Tests for `Value`.

use super::Value;

#[test]
fn equality_is_strict_across_variants() {
  assert_eq!(Value::Number(5.0), Value::from(5.0));
  assert_ne!(Value::Number(5.0), Value::from("5"));
  assert_ne!(Value::Boolean(false), Value::Number(0.0));
}

#[test]
fn accessors_match_variant_only() {
  assert_eq!(Value::from(2.5).as_number(), Some(2.5));
  assert_eq!(Value::from("x").as_number(), None);
  assert_eq!(Value::from("x").as_str(), Some("x"));
  assert_eq!(Value::from(true).as_bool(), Some(true));
  assert_eq!(Value::from(1.0).as_bool(), None);
}

#[test]
fn display_drops_trailing_zero() {
  assert_eq!(Value::Number(10.0).to_string(), "10");
  assert_eq!(Value::Number(2.5).to_string(), "2.5");
  assert_eq!(Value::from("hi").to_string(), "hi");
  assert_eq!(Value::from(false).to_string(), "false");
}

#[test]
fn serde_is_untagged() {
  assert_eq!(serde_json::to_string(&Value::Number(3.0)).unwrap(), "3.0");
  assert_eq!(serde_json::to_string(&Value::from("a")).unwrap(), "\"a\"");
  let v: Value = serde_json::from_str("true").unwrap();
  assert_eq!(v, Value::Boolean(true));
  let v: Value = serde_json::from_str("7").unwrap();
  assert_eq!(v, Value::Number(7.0));
}
