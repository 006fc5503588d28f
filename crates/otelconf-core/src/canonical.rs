//! # Canonical Documents — YAML Normalization
//!
//! This module defines `CanonicalDocument`, the sole representation of an
//! input configuration that schema validation and decoding accept.
//!
//! ## Invariant
//!
//! The inner value and text are private. The only way to construct a
//! `CanonicalDocument` is through the `from_yaml_*` constructors (or
//! [`CanonicalDocument::from_json_value`]), which run the full pipeline:
//!
//! 1. **Parse into a value graph** with `serde_yaml`. Aliases are expanded
//!    by the parser, so an anchor defined at the top of a file and
//!    referenced at the bottom is already a plain copy.
//! 2. **Apply merge keys.** `<<: *defaults` entries are folded into their
//!    mapping. Explicit keys win over merged ones.
//! 3. **Convert to JSON.** Scalar keys are stringified, tags are dropped,
//!    `.nan`/`.inf` and non-scalar keys are rejected.
//! 4. **Serialize with JCS** (RFC 8785) via `serde_jcs`: sorted keys,
//!    compact separators.
//!
//! Two YAML files that denote the same tree produce byte-identical
//! canonical text, and re-normalizing canonical text (JSON is YAML) is the
//! identity.
//!
//! A document whose root is null (an empty file, a file holding only
//! comments, or a bare `~`) normalizes to the empty mapping `{}`.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::error::ParseError;
use crate::path::DocumentPath;

/// A YAML configuration document after alias expansion, in canonical JSON form.
///
/// # Invariants
///
/// - No YAML aliases, anchors or merge keys remain.
/// - All object keys are strings.
/// - All numbers are finite.
/// - `canonical_text()` is the JCS serialization of `value()`.
#[derive(Debug, Clone)]
pub struct CanonicalDocument {
    value: Value,
    text: String,
}

impl CanonicalDocument {
    /// Normalize a YAML document held in a string.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Yaml`] for malformed YAML or multi-document
    /// streams, [`ParseError::UnsupportedKey`] for non-scalar mapping keys
    /// and [`ParseError::NonFiniteNumber`] for `.nan`/`.inf` scalars.
    pub fn from_yaml_str(input: &str) -> Result<Self, ParseError> {
        if is_blank(input) {
            return Self::from_json_value(Value::Null);
        }
        let mut yaml: serde_yaml::Value = serde_yaml::from_str(input)?;
        yaml.apply_merge()?;
        let value = yaml_to_json_value(&yaml, &DocumentPath::root())?;
        Self::from_json_value(value)
    }

    /// Normalize a YAML document held in a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Utf8`] if the bytes are not UTF-8, otherwise
    /// the same errors as [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_yaml_slice(input: &[u8]) -> Result<Self, ParseError> {
        Self::from_yaml_str(std::str::from_utf8(input)?)
    }

    /// Normalize a YAML document read from a stream.
    ///
    /// The stream is consumed to its end before parsing; anchors may be
    /// referenced arbitrarily far from their definition.
    pub fn from_yaml_reader(mut reader: impl Read) -> Result<Self, ParseError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::from_yaml_slice(&buf)
    }

    /// Normalize the YAML document stored at `path`.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_yaml_slice(&bytes)
    }

    /// Wrap an already-JSON value, applying the null-root rule and
    /// producing its canonical text.
    pub fn from_json_value(value: Value) -> Result<Self, ParseError> {
        let value = match value {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => coerce_integral_floats(other),
        };
        let text = serde_jcs::to_string(&value)?;
        Ok(Self { value, text })
    }

    /// The expanded JSON value tree.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The deterministic JCS serialization of [`value`](Self::value).
    pub fn canonical_text(&self) -> &str {
        &self.text
    }

    /// Human-oriented, indented JSON rendering.
    pub fn to_pretty_string(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string_pretty(&self.value)?)
    }

    /// Consumes the document and returns the value tree.
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl PartialEq for CanonicalDocument {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for CanonicalDocument {}

impl fmt::Display for CanonicalDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Normalize YAML text into a [`CanonicalDocument`].
///
/// Shorthand for [`CanonicalDocument::from_yaml_str`].
pub fn normalize(yaml: &str) -> Result<CanonicalDocument, ParseError> {
    CanonicalDocument::from_yaml_str(yaml)
}

/// True when the input holds no YAML node at all: only whitespace and comments.
fn is_blank(input: &str) -> bool {
    input.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Integral floats (`128.0`) become integers, matching their JCS text.
fn json_number_from_f64(f: f64) -> Option<serde_json::Number> {
    if f.is_finite() && f.fract() == 0.0 {
        if f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
            return Some(serde_json::Number::from(f as i64));
        }
        if f >= 0.0 && f < 18_446_744_073_709_551_616.0 {
            return Some(serde_json::Number::from(f as u64));
        }
    }
    serde_json::Number::from_f64(f)
}

fn coerce_integral_floats(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64().and_then(json_number_from_f64) {
            Some(n) => Value::Number(n),
            None => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(coerce_integral_floats).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, coerce_integral_floats(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// YAML has a richer type system than JSON (tags, non-string keys).
/// Configuration documents use only the JSON-compatible subset, so scalar
/// keys are stringified and tags are dropped in favour of the tagged value.
fn yaml_to_json_value(yaml: &serde_yaml::Value, path: &DocumentPath) -> Result<Value, ParseError> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else {
                n.as_f64()
                    .and_then(json_number_from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| ParseError::NonFiniteNumber {
                        path: path.to_string(),
                    })
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, ParseError> = seq
                .iter()
                .enumerate()
                .map(|(i, item)| yaml_to_json_value(item, &path.index(i)))
                .collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Tagged(tagged) => match &tagged.value {
                        serde_yaml::Value::String(s) => s.clone(),
                        other => {
                            return Err(ParseError::UnsupportedKey {
                                path: path.to_string(),
                                found: format!("{other:?}"),
                            })
                        }
                    },
                    other => {
                        return Err(ParseError::UnsupportedKey {
                            path: path.to_string(),
                            found: format!("{other:?}"),
                        })
                    }
                };
                let child = yaml_to_json_value(v, &path.key(key.as_str()))?;
                json_map.insert(key, child);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value, path),
    }
}
