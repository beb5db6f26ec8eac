//! Tolerant field access for loosely-typed JSON report bodies.
//!
//! Browsers are not required to send complete reports, and different browser
//! versions disagree on field types. Every optional leaf is therefore read
//! through [`FieldExtractor`], which returns the type's zero value when the
//! field is absent or has the wrong type and records a [`FieldWarning`] in the
//! caller-supplied [`WarningSink`] instead of failing the decode.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;

/// JSON runtime type of a value, as observed in a report body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Missing,
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => JsonKind::Missing,
            Some(Value::Null) => JsonKind::Null,
            Some(Value::Bool(_)) => JsonKind::Bool,
            Some(Value::Number(_)) => JsonKind::Number,
            Some(Value::String(_)) => JsonKind::String,
            Some(Value::Array(_)) => JsonKind::Array,
            Some(Value::Object(_)) => JsonKind::Object,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            JsonKind::Missing => "missing",
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field that could not be read as the expected type and was defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWarning {
    /// Dotted path of the field, e.g. `body.lineNumber`
    pub path: String,
    /// What the decoder wanted, e.g. `string`, `integer`, `timestamp`
    pub expected: &'static str,
    pub observed: JsonKind,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected {}: wanted {}, got {}",
            self.path, self.expected, self.observed
        )
    }
}

/// Receiver for non-fatal decode warnings.
pub trait WarningSink {
    fn warn(&mut self, warning: FieldWarning);
}

impl WarningSink for Vec<FieldWarning> {
    fn warn(&mut self, warning: FieldWarning) {
        self.push(warning);
    }
}

/// Emits every warning as a `tracing` event and keeps a count.
#[derive(Debug, Default)]
pub struct LogWarnings {
    pub count: usize,
}

impl WarningSink for LogWarnings {
    fn warn(&mut self, warning: FieldWarning) {
        self.count += 1;
        tracing::warn!(
            field = %warning.path,
            expected = warning.expected,
            observed = %warning.observed,
            "unexpected report field"
        );
    }
}

/// Reads typed values out of one JSON object.
///
/// Paths in warnings are prefixed with the extractor's own path so that nested
/// extractors (see [`FieldExtractor::nested`]) report `body.sourceFile` rather
/// than `sourceFile`.
pub struct FieldExtractor<'o, 'w, W: WarningSink + ?Sized> {
    object: &'o Map<String, Value>,
    path: String,
    warnings: &'w mut W,
}

impl<'o, 'w, W: WarningSink + ?Sized> FieldExtractor<'o, 'w, W> {
    pub fn new(object: &'o Map<String, Value>, warnings: &'w mut W) -> Self {
        Self {
            object,
            path: String::new(),
            warnings,
        }
    }

    /// Creates a root extractor whose warning paths start with `path`.
    pub fn with_path(object: &'o Map<String, Value>, path: &str, warnings: &'w mut W) -> Self {
        Self {
            object,
            path: path.to_string(),
            warnings,
        }
    }

    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    pub(crate) fn warn(&mut self, key: &str, expected: &'static str, observed: Option<&Value>) {
        let warning = FieldWarning {
            path: self.field_path(key),
            expected,
            observed: JsonKind::of(observed),
        };
        self.warnings.warn(warning);
    }

    /// The object this extractor reads from.
    pub fn as_map(&self) -> &'o Map<String, Value> {
        self.object
    }

    pub fn get(&self, key: &str) -> Option<&'o Value> {
        let object: &'o Map<String, Value> = self.object;
        object.get(key)
    }

    /// String field; absent or non-string values default to `""`.
    pub fn string(&mut self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            other => {
                self.warn(key, "string", other);
                String::new()
            }
        }
    }

    /// String field that is legitimately optional: absence and `null` are
    /// silent, a value of another type is warned about.
    pub fn optional_string(&mut self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            None | Some(Value::Null) => None,
            other => {
                self.warn(key, "string", other);
                None
            }
        }
    }

    /// Floating point field; absent or non-numeric values default to `0.0`.
    pub fn number(&mut self, key: &str) -> f64 {
        let value = self.get(key);
        match value.and_then(Value::as_f64) {
            Some(n) => n,
            None => {
                self.warn(key, "number", value);
                0.0
            }
        }
    }

    /// Numeric field that is legitimately optional, see [`Self::optional_string`].
    pub fn optional_number(&mut self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            None | Some(Value::Null) => None,
            other => {
                self.warn(key, "number", other);
                None
            }
        }
    }

    /// Integer field. Fractional numbers are truncated toward zero; values that
    /// do not fit `T` are treated like a type mismatch.
    pub fn integer<T>(&mut self, key: &str) -> T
    where
        T: TryFrom<i64> + Default,
    {
        let value = self.get(key);
        let parsed = match value {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .and_then(|i| T::try_from(i).ok()),
            _ => None,
        };

        match parsed {
            Some(i) => i,
            None => {
                self.warn(key, "integer", value);
                T::default()
            }
        }
    }

    /// Array-of-strings field. Non-string elements are skipped with a warning
    /// naming their index.
    pub fn string_list(&mut self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        other => self.warn(&format!("{key}[{i}]"), "string", Some(other)),
                    }
                }
                out
            }
            other => {
                self.warn(key, "array", other);
                Vec::new()
            }
        }
    }

    /// RFC 3339 timestamp field; unparsable strings are treated like a type mismatch.
    pub fn timestamp(&mut self, key: &str) -> Option<DateTime<Utc>> {
        let value = self.get(key);
        let parsed = value
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        if parsed.is_none() {
            self.warn(key, "timestamp", value);
        }
        parsed
    }

    /// Object field, borrowed as-is. Absent or non-object values yield `None`
    /// with a warning.
    pub fn object(&mut self, key: &str) -> Option<&'o Map<String, Value>> {
        match self.get(key) {
            Some(Value::Object(map)) => Some(map),
            other => {
                self.warn(key, "object", other);
                None
            }
        }
    }

    /// Array field kept as opaque JSON; absence is silent.
    pub fn opaque_list(&mut self, key: &str) -> Vec<Value> {
        match self.get(key) {
            Some(Value::Array(items)) => items.clone(),
            None | Some(Value::Null) => Vec::new(),
            other => {
                self.warn(key, "array", other);
                Vec::new()
            }
        }
    }

    /// Extractor for a nested object that shares this extractor's warning sink.
    ///
    /// A missing or mistyped nested object is warned about once, and the
    /// returned extractor reads from an empty object so every leaf defaults.
    pub fn nested(&mut self, key: &str) -> FieldExtractor<'o, '_, W> {
        static EMPTY: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);

        let object = match self.object(key) {
            Some(map) => map,
            None => &*EMPTY,
        };
        let path = self.field_path(key);

        FieldExtractor {
            object,
            path,
            warnings: &mut *self.warnings,
        }
    }
}
