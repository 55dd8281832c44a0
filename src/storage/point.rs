//! Time-series records and their line protocol rendering.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Reasons a point cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    #[error("missing measurement")]
    MissingMeasurement,

    #[error("point without fields is unsupported")]
    NoFields,

    #[error("empty key in {0}")]
    EmptyKey(&'static str),

    #[error("field {0} is not a finite number")]
    NonFinite(String),

    #[error("{part} {name:?} contains a control character or a trailing backslash")]
    UnrepresentableName { part: &'static str, name: String },
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

/// Timestamp precision used when rendering a point for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Nanoseconds,
    Seconds,
}

impl Precision {
    /// Value of the `precision` write parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            Precision::Nanoseconds => "ns",
            Precision::Seconds => "s",
        }
    }

    fn scale(self, timestamp_ns: i64) -> i64 {
        match self {
            Precision::Nanoseconds => timestamp_ns,
            Precision::Seconds => timestamp_ns.div_euclid(1_000_000_000),
        }
    }
}

/// A tagged, timestamped record.
///
/// Tags and fields are kept sorted by key so rendering is deterministic.
/// `Display` renders line protocol with a nanosecond timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp_ns: i64,
}

impl Point {
    /// Create a validated point.
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        timestamp_ns: i64,
    ) -> Result<Self, PointError> {
        let measurement = measurement.into();
        if measurement.is_empty() {
            return Err(PointError::MissingMeasurement);
        }
        if fields.is_empty() {
            return Err(PointError::NoFields);
        }
        check_name("measurement", &measurement)?;
        for (key, value) in &tags {
            if key.is_empty() {
                return Err(PointError::EmptyKey("tags"));
            }
            check_name("tag key", key)?;
            check_name("tag value", value)?;
        }
        for (key, value) in &fields {
            if key.is_empty() {
                return Err(PointError::EmptyKey("fields"));
            }
            check_name("field key", key)?;
            if let FieldValue::Float(v) = value {
                if !v.is_finite() {
                    return Err(PointError::NonFinite(key.clone()));
                }
            }
        }

        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp_ns,
        })
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    /// Render as one line of line protocol.
    pub fn line(&self, precision: Precision) -> String {
        let mut out = String::new();
        escape_into(&mut out, &self.measurement, &[',', ' ']);

        // Tags with empty values are not representable and are skipped.
        for (key, value) in self.tags.iter().filter(|(_, v)| !v.is_empty()) {
            out.push(',');
            escape_into(&mut out, key, &[',', '=', ' ']);
            out.push('=');
            escape_into(&mut out, value, &[',', '=', ' ']);
        }

        for (i, (key, value)) in self.fields.iter().enumerate() {
            out.push(if i == 0 { ' ' } else { ',' });
            escape_into(&mut out, key, &[',', '=', ' ']);
            out.push('=');
            match value {
                FieldValue::Float(v) => out.push_str(&v.to_string()),
                FieldValue::Integer(v) => {
                    out.push_str(&v.to_string());
                    out.push('i');
                }
                FieldValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
                FieldValue::String(v) => {
                    out.push('"');
                    escape_into(&mut out, v, &['"', '\\']);
                    out.push('"');
                }
            }
        }

        out.push(' ');
        out.push_str(&precision.scale(self.timestamp_ns).to_string());
        out
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line(Precision::Nanoseconds))
    }
}

/// Reject names that line protocol cannot carry unquoted.
///
/// A newline ends the line, and a trailing backslash escapes the separator
/// that follows the name.
fn check_name(part: &'static str, name: &str) -> Result<(), PointError> {
    if name.chars().any(char::is_control) || name.ends_with('\\') {
        return Err(PointError::UnrepresentableName {
            part,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
