//! Assertion library
//!
//! Every assertion returns [`CheckResult`]: `Ok(())` when it holds, otherwise
//! a [`CheckError`] that the check body propagates with `?`. The runner
//! matches on the variant, so a skip can never be mistaken for a failure and
//! neither can be mistaken for a fault coming from a collaborator.
//!
//! Expected and actual values are kept as JSON values rather than strings so
//! the reporter can render them verbatim.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

/// Result type returned by check bodies and assertions
pub type CheckResult = std::result::Result<(), CheckError>;

/// An assertion that did not hold
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub message: String,
    pub expected: Option<Value>,
    pub got: Option<Value>,
}

/// Signal that ends a check body early
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    /// An assertion failed
    #[error("{}", .0.message)]
    Failed(Failure),

    /// The check asked to be skipped
    #[error("skipped: {0}")]
    Skipped(String),

    /// Something other than an assertion went wrong (network, decoding, ...)
    #[error("{kind}: {message}")]
    Fault { kind: String, message: String },
}

impl CheckError {
    /// Create a failure carrying only a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(Failure {
            message: message.into(),
            expected: None,
            got: None,
        })
    }

    /// Create a failure with expected and actual values
    pub fn mismatch(message: impl Into<String>, expected: Value, got: Value) -> Self {
        Self::Failed(Failure {
            message: message.into(),
            expected: Some(expected),
            got: Some(got),
        })
    }

    /// Create an unexpected fault of the given kind
    pub fn fault(kind: impl Into<String>, message: impl ToString) -> Self {
        Self::Fault {
            kind: kind.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for CheckError {
    fn from(e: serde_json::Error) -> Self {
        Self::fault("json", e)
    }
}

impl From<std::io::Error> for CheckError {
    fn from(e: std::io::Error) -> Self {
        Self::fault("io", e)
    }
}

impl From<reqwest::Error> for CheckError {
    fn from(e: reqwest::Error) -> Self {
        Self::fault("http", e)
    }
}

/// Convert a value for display in a report, falling back to its Debug form
fn to_value<T: Serialize + Debug + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(format!("{:?}", value)))
}

/// Render a value inline inside an expectation string
fn inline<T: Serialize + Debug + ?Sized>(value: &T) -> String {
    match to_value(value) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Assert two values are equal
pub fn equal<T>(actual: &T, expected: &T, msg: &str) -> CheckResult
where
    T: PartialEq + Serialize + Debug + ?Sized,
{
    if actual != expected {
        return Err(CheckError::mismatch(msg, to_value(expected), to_value(actual)));
    }
    Ok(())
}

/// Assert condition is true
pub fn is_true(condition: bool, msg: &str) -> CheckResult {
    if !condition {
        return Err(CheckError::failed(msg));
    }
    Ok(())
}

/// Assert condition is false
pub fn is_false(condition: bool, msg: &str) -> CheckResult {
    if condition {
        return Err(CheckError::failed(msg));
    }
    Ok(())
}

/// Fail unconditionally
pub fn fail(msg: &str) -> CheckResult {
    Err(CheckError::failed(msg))
}

/// Assert string contains substring
pub fn contains(haystack: &str, needle: &str, msg: &str) -> CheckResult {
    if !haystack.contains(needle) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!("contains '{}'", needle)),
            Value::String(haystack.to_string()),
        ));
    }
    Ok(())
}

/// Assert string does not contain substring
pub fn not_contains(haystack: &str, needle: &str, msg: &str) -> CheckResult {
    if haystack.contains(needle) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!("does not contain '{}'", needle)),
            Value::String(haystack.to_string()),
        ));
    }
    Ok(())
}

/// Assert item is in collection
pub fn member_of<T>(item: &T, collection: &[T], msg: &str) -> CheckResult
where
    T: PartialEq + Serialize + Debug,
{
    if !collection.contains(item) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!("'{}' in collection", inline(item))),
            to_value(collection),
        ));
    }
    Ok(())
}

/// Assert item is not in collection
pub fn not_member_of<T>(item: &T, collection: &[T], msg: &str) -> CheckResult
where
    T: PartialEq + Serialize + Debug,
{
    if collection.contains(item) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!("'{}' not in collection", inline(item))),
            to_value(collection),
        ));
    }
    Ok(())
}

/// Values that may or may not carry something
///
/// JSON `null` counts as absent, like a missing `Option`.
pub trait Presence {
    fn is_present(&self) -> bool;
    fn describe(&self) -> Value;
}

impl<T: Serialize + Debug> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.is_some()
    }

    fn describe(&self) -> Value {
        match self {
            Some(v) => to_value(v),
            None => Value::Null,
        }
    }
}

impl Presence for Value {
    fn is_present(&self) -> bool {
        !self.is_null()
    }

    fn describe(&self) -> Value {
        self.clone()
    }
}

/// Assert a value is present (not `None`, not JSON null)
pub fn is_present<P: Presence + ?Sized>(value: &P, msg: &str) -> CheckResult {
    if !value.is_present() {
        return Err(CheckError::mismatch(
            msg,
            Value::String("present".to_string()),
            Value::Null,
        ));
    }
    Ok(())
}

/// Assert a value is absent (`None` or JSON null)
pub fn is_absent<P: Presence + ?Sized>(value: &P, msg: &str) -> CheckResult {
    if value.is_present() {
        return Err(CheckError::mismatch(msg, Value::Null, value.describe()));
    }
    Ok(())
}

/// Assert a > b
pub fn greater<T>(a: &T, b: &T, msg: &str) -> CheckResult
where
    T: PartialOrd + Serialize + Debug + ?Sized,
{
    if !(a > b) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!("> {}", inline(b))),
            to_value(a),
        ));
    }
    Ok(())
}

/// Assert a >= b
pub fn greater_or_equal<T>(a: &T, b: &T, msg: &str) -> CheckResult
where
    T: PartialOrd + Serialize + Debug + ?Sized,
{
    if !(a >= b) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!(">= {}", inline(b))),
            to_value(a),
        ));
    }
    Ok(())
}

/// Assert a < b
pub fn less<T>(a: &T, b: &T, msg: &str) -> CheckResult
where
    T: PartialOrd + Serialize + Debug + ?Sized,
{
    if !(a < b) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!("< {}", inline(b))),
            to_value(a),
        ));
    }
    Ok(())
}

/// JSON value kinds for [`of_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Null,
    Bool,
    /// Any number
    Number,
    /// A number without a fractional part
    Integer,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn name(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Bool => "bool",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    /// The most specific kind of a value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonType::Integer,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Number => value.is_number(),
            other => JsonType::of(value) == other,
        }
    }
}

/// Assert a JSON value has the expected kind
pub fn of_type(value: &Value, expected: JsonType, msg: &str) -> CheckResult {
    if !expected.matches(value) {
        return Err(CheckError::mismatch(
            msg,
            Value::String(expected.name().to_string()),
            Value::String(JsonType::of(value).name().to_string()),
        ));
    }
    Ok(())
}

/// Assert a JSON object has a key
///
/// The key may map to `null`; only its presence is checked.
pub fn has_field(obj: &Value, key: &str, msg: &str) -> CheckResult {
    let Some(map) = obj.as_object() else {
        return Err(CheckError::mismatch(
            msg,
            Value::String("object".to_string()),
            Value::String(JsonType::of(obj).name().to_string()),
        ));
    };
    if !map.contains_key(key) {
        let keys: Vec<Value> = map.keys().map(|k| Value::String(k.clone())).collect();
        return Err(CheckError::mismatch(
            msg,
            Value::String(format!("key '{}'", key)),
            Value::Array(keys),
        ));
    }
    Ok(())
}

/// Anything that carries an HTTP status code
pub trait HasStatus {
    fn status_code(&self) -> u16;
}

impl HasStatus for u16 {
    fn status_code(&self) -> u16 {
        *self
    }
}

/// Assert an HTTP response status code
pub fn status_code_equals<R: HasStatus + ?Sized>(response: &R, expected: u16, msg: &str) -> CheckResult {
    let actual = response.status_code();
    if actual != expected {
        return Err(CheckError::mismatch(msg, Value::from(expected), Value::from(actual)));
    }
    Ok(())
}

/// Skip the current check
pub fn skip(reason: &str) -> CheckResult {
    Err(CheckError::Skipped(reason.to_string()))
}

/// Skip the current check if condition is true
pub fn skip_if(condition: bool, reason: &str) -> CheckResult {
    if condition {
        return skip(reason);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure(r: CheckResult) -> Failure {
        match r {
            Err(CheckError::Failed(f)) => f,
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_keeps_values_verbatim() {
        assert!(equal(&1, &1, "same").is_ok());

        let f = failure(equal(&2, &1, "x==y"));
        assert_eq!(f.message, "x==y");
        assert_eq!(f.expected, Some(json!(1)));
        assert_eq!(f.got, Some(json!(2)));
    }

    #[test]
    fn test_equal_structured_values() {
        let f = failure(equal(&json!({"a": [1, 2]}), &json!({"a": [1]}), "shape"));
        assert_eq!(f.got, Some(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_contains_and_not_contains() {
        assert!(contains("hello world", "world", "m").is_ok());
        let f = failure(contains("hello", "bye", "m"));
        assert_eq!(f.expected, Some(json!("contains 'bye'")));
        assert_eq!(f.got, Some(json!("hello")));

        assert!(not_contains("hello", "bye", "m").is_ok());
        assert!(not_contains("hello", "ell", "m").is_err());
    }

    #[test]
    fn test_membership() {
        let models = vec!["a".to_string(), "b".to_string()];
        assert!(member_of(&"a".to_string(), &models, "m").is_ok());

        let f = failure(member_of(&"c".to_string(), &models, "m"));
        assert_eq!(f.expected, Some(json!("'c' in collection")));
        assert_eq!(f.got, Some(json!(["a", "b"])));

        assert!(not_member_of(&"c".to_string(), &models, "m").is_ok());
        assert!(not_member_of(&"a".to_string(), &models, "m").is_err());
    }

    #[test]
    fn test_presence() {
        assert!(is_present(&Some(1), "m").is_ok());
        assert!(is_present(&None::<i32>, "m").is_err());
        assert!(is_present(&json!("x"), "m").is_ok());
        assert!(is_present(&Value::Null, "m").is_err());

        assert!(is_absent(&None::<i32>, "m").is_ok());
        let f = failure(is_absent(&json!([1]), "m"));
        assert_eq!(f.expected, Some(Value::Null));
        assert_eq!(f.got, Some(json!([1])));
    }

    #[test]
    fn test_ordering() {
        assert!(greater(&2, &1, "m").is_ok());
        let f = failure(greater(&1, &1, "m"));
        assert_eq!(f.expected, Some(json!("> 1")));
        assert_eq!(f.got, Some(json!(1)));

        assert!(greater_or_equal(&1, &1, "m").is_ok());
        assert!(greater_or_equal(&0, &1, "m").is_err());
        assert!(less(&1, &2, "m").is_ok());
        assert!(less(&2, &2, "m").is_err());
    }

    #[test]
    fn test_of_type() {
        assert!(of_type(&json!(3), JsonType::Integer, "m").is_ok());
        assert!(of_type(&json!(3.5), JsonType::Number, "m").is_ok());
        assert!(of_type(&json!(3), JsonType::Number, "m").is_ok());

        let f = failure(of_type(&json!("3"), JsonType::Integer, "m"));
        assert_eq!(f.expected, Some(json!("integer")));
        assert_eq!(f.got, Some(json!("string")));
    }

    #[test]
    fn test_has_field() {
        let obj = json!({"id": "x", "fingerprint": null});
        assert!(has_field(&obj, "id", "m").is_ok());
        assert!(has_field(&obj, "fingerprint", "m").is_ok());

        let f = failure(has_field(&obj, "model", "m"));
        assert_eq!(f.expected, Some(json!("key 'model'")));

        let f = failure(has_field(&json!([1]), "id", "m"));
        assert_eq!(f.expected, Some(json!("object")));
        assert_eq!(f.got, Some(json!("array")));
    }

    #[test]
    fn test_status_code() {
        assert!(status_code_equals(&200u16, 200, "m").is_ok());
        let f = failure(status_code_equals(&404u16, 200, "m"));
        assert_eq!(f.expected, Some(json!(200)));
        assert_eq!(f.got, Some(json!(404)));
    }

    #[test]
    fn test_skip_is_not_failure() {
        assert_eq!(skip("n/a"), Err(CheckError::Skipped("n/a".to_string())));
        assert!(skip_if(false, "n/a").is_ok());
        assert!(matches!(skip_if(true, "n/a"), Err(CheckError::Skipped(_))));
    }

    #[test]
    fn test_collaborator_errors_become_faults() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let e: CheckError = err.into();
        assert!(matches!(e, CheckError::Fault { ref kind, .. } if kind == "json"));
    }
}
