//! Work request types: the loose inbound request and the validated input.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Upper bound accepted for `age`.
pub const MAX_AGE: i64 = 150;

/// Validated work input, as published on the `inputs` queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingInput {
    /// Caller-supplied identifier, used for correlation.
    pub id: String,
    pub name: String,
    pub surname: String,
    pub age: i64,
}

impl ProcessingInput {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        surname: impl Into<String>,
        age: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            surname: surname.into(),
            age,
        }
    }
}

/// Validation failure for an inbound request. Only the first failing field is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} should not be empty")]
    Missing(&'static str),

    #[error("{0} must be a string")]
    NotAString(&'static str),

    #[error("{0} must be an integer number")]
    NotAnInteger(&'static str),

    #[error("{field} must not be greater than {max}")]
    TooLarge { field: &'static str, max: i64 },
}

/// Untyped request body as received from a client.
///
/// Every field is kept as raw JSON so that type mismatches surface as
/// validation errors instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingRequest {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub surname: Option<Value>,
    pub age: Option<Value>,
}

impl ProcessingRequest {
    /// Validate the request, producing the input that may be put on the queue.
    pub fn validate(&self) -> Result<ProcessingInput, ValidationError> {
        let id = required_string("id", self.id.as_ref())?;
        let name = required_string("name", self.name.as_ref())?;
        let surname = required_string("surname", self.surname.as_ref())?;
        let age = required_age(self.age.as_ref())?;

        Ok(ProcessingInput {
            id,
            name,
            surname,
            age,
        })
    }
}

fn required_string(field: &'static str, value: Option<&Value>) -> Result<String, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::Missing(field)),
        Some(Value::String(s)) if s.is_empty() => Err(ValidationError::Missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::NotAString(field)),
    }
}

fn required_age(value: Option<&Value>) -> Result<i64, ValidationError> {
    let age = match value {
        None | Some(Value::Null) => return Err(ValidationError::Missing("age")),
        Some(Value::String(s)) if s.is_empty() => return Err(ValidationError::Missing("age")),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i),
            (None, Some(f)) if f.is_finite() && f.abs() < i64::MAX as f64 => Some(f.trunc() as i64),
            _ => None,
        },
        Some(Value::String(s)) => leading_integer(s),
        Some(_) => None,
    };

    let age = age.ok_or(ValidationError::NotAnInteger("age"))?;
    if age > MAX_AGE {
        return Err(ValidationError::TooLarge {
            field: "age",
            max: MAX_AGE,
        });
    }
    Ok(age)
}

/// Parse the leading integer of a string, ignoring trailing garbage ("42abc" -> 42).
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
