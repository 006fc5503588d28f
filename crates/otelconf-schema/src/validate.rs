//! # Schema Validation
//!
//! Validates a [`CanonicalDocument`] against a [`CompiledSchema`] and
//! reports every failure as a [`Violation`].
//!
//! Validation never stops at the first error. The result is a
//! [`ViolationSet`], ordered and deduplicated, so the same document and
//! schema always produce the same report regardless of evaluation order.
//!
//! Violation messages follow one format:
//!
//! ```text
//! $.args.endpoint: integer found, string expected
//! $.args.protocol: is missing but it is required
//! $.args.extra: is not defined in the schema and the schema does not allow additional properties
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::Value;

use otelconf_core::{CanonicalDocument, DocumentPath, ParseError};

use crate::resolver::CompiledSchema;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Violation {
    /// `$`-rooted locator of the offending node.
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl Violation {
    fn new(path: &DocumentPath, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Ordered, deduplicated collection of violations. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationSet {
    violations: BTreeSet<Violation>,
}

impl ViolationSet {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if the document is valid.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterate violations in `(path, message)` order.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    /// Returns true if a violation renders exactly as `rendered`.
    pub fn contains(&self, rendered: &str) -> bool {
        self.violations.iter().any(|v| v.to_string() == rendered)
    }

    /// Every violation rendered as `path: message`.
    pub fn to_strings(&self) -> BTreeSet<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// Consume into the underlying set.
    pub fn into_inner(self) -> BTreeSet<Violation> {
        self.violations
    }
}

impl fmt::Display for ViolationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {v}")?;
        }
        Ok(())
    }
}

impl FromIterator<Violation> for ViolationSet {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ViolationSet {
    type Item = Violation;
    type IntoIter = std::collections::btree_set::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = std::collections::btree_set::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// A document that passed validation against a named schema.
///
/// Only [`CompiledSchema::check`] constructs one, so holding a
/// `ValidatedDocument` proves validation ran and succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDocument {
    document: CanonicalDocument,
    schema: String,
}

impl ValidatedDocument {
    /// The underlying canonical document.
    pub fn document(&self) -> &CanonicalDocument {
        &self.document
    }

    /// The canonical JSON value.
    pub fn value(&self) -> &Value {
        self.document.value()
    }

    /// Name of the schema the document was validated against.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Drop the validation proof and return the document.
    pub fn into_inner(self) -> CanonicalDocument {
        self.document
    }
}

impl Deref for ValidatedDocument {
    type Target = CanonicalDocument;

    fn deref(&self) -> &CanonicalDocument {
        &self.document
    }
}

impl CompiledSchema {
    /// Validate a canonical document, collecting every violation.
    ///
    /// Pure: the same document and schema always yield the same set.
    pub fn validate(&self, document: &CanonicalDocument) -> ViolationSet {
        self.validate_value(document.value())
    }

    /// Validate a raw JSON value, collecting every violation.
    pub fn validate_value(&self, instance: &Value) -> ViolationSet {
        let violations: ViolationSet = self
            .validator
            .iter_errors(instance)
            .flat_map(|e| violations_from_error(&e, instance))
            .collect();
        tracing::debug!(
            schema = self.name(),
            violations = violations.len(),
            "validated document"
        );
        violations
    }

    /// Normalize YAML text and validate it.
    pub fn validate_yaml_str(&self, yaml: &str) -> Result<ViolationSet, ParseError> {
        Ok(self.validate(&CanonicalDocument::from_yaml_str(yaml)?))
    }

    /// Returns true if the document has no violations.
    pub fn is_valid(&self, document: &CanonicalDocument) -> bool {
        self.validator.is_valid(document.value())
    }

    /// Validate and, on success, wrap the document as a [`ValidatedDocument`].
    ///
    /// # Errors
    ///
    /// Returns the non-empty [`ViolationSet`] if the document is invalid.
    pub fn check(&self, document: CanonicalDocument) -> Result<ValidatedDocument, ViolationSet> {
        let violations = self.validate(&document);
        if violations.is_empty() {
            Ok(ValidatedDocument {
                document,
                schema: self.name().to_string(),
            })
        } else {
            Err(violations)
        }
    }
}

/// Map one library error onto one or more violations.
fn violations_from_error(error: &ValidationError<'_>, root: &Value) -> Vec<Violation> {
    let path = locate(root, &error.instance_path.to_string());
    match &error.kind {
        ValidationErrorKind::Type { kind } => vec![Violation::new(
            &path,
            format!(
                "{} found, {} expected",
                json_type_name(&error.instance),
                expected_types(kind)
            ),
        )],
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map_or_else(|| property.to_string(), str::to_owned);
            vec![Violation::new(
                &path.key(name),
                "is missing but it is required",
            )]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|key| {
                Violation::new(
                    &path.key(key.as_str()),
                    "is not defined in the schema and the schema does not allow additional properties",
                )
            })
            .collect(),
        ValidationErrorKind::Enum { options } => vec![Violation::new(
            &path,
            format!(
                "does not have a value in the enumeration {}",
                render_options(options)
            ),
        )],
        ValidationErrorKind::Pattern { pattern } => vec![Violation::new(
            &path,
            format!("does not match the regex pattern {pattern}"),
        )],
        ValidationErrorKind::Minimum { limit } => vec![Violation::new(
            &path,
            format!("must have a minimum value of {limit}"),
        )],
        ValidationErrorKind::Maximum { limit } => vec![Violation::new(
            &path,
            format!("must have a maximum value of {limit}"),
        )],
        _ => vec![Violation::new(&path, error.to_string())],
    }
}

/// Convert a JSON pointer into a [`DocumentPath`], consulting the instance
/// so that numeric tokens become array indices only under arrays.
fn locate(root: &Value, pointer: &str) -> DocumentPath {
    let mut path = DocumentPath::root();
    let mut current = Some(root);
    for raw in pointer.split('/').skip(1) {
        let token = raw.replace("~1", "/").replace("~0", "~");
        match current {
            Some(Value::Array(items)) => match token.parse::<usize>() {
                Ok(index) => {
                    current = items.get(index);
                    path = path.index(index);
                }
                Err(_) => {
                    current = None;
                    path = path.key(token);
                }
            },
            Some(Value::Object(map)) => {
                current = map.get(token.as_str());
                path = path.key(token);
            }
            _ => {
                current = None;
                path = path.key(token);
            }
        }
    }
    path
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected_types(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(ty) => ty.to_string(),
        TypeKind::Multiple(types) => types
            .clone()
            .into_iter()
            .map(|ty| ty.to_string())
            .collect::<Vec<_>>()
            .join(" or "),
    }
}

fn render_options(options: &Value) -> String {
    match options {
        Value::Array(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            format!("[{}]", rendered.join(", "))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_violation_display_format() {
        let v = Violation::new(
            &DocumentPath::root().key("args").key("endpoint"),
            "integer found, string expected",
        );
        assert_eq!(v.to_string(), "$.args.endpoint: integer found, string expected");
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation::new(&DocumentPath::root(), "object found, array expected");
        assert_eq!(v.to_string(), "$: object found, array expected");
    }

    #[test]
    fn test_locate_distinguishes_index_from_numeric_key() {
        let doc = json!({"list": [{"a": 1}], "map": {"0": {"a": 1}}});
        assert_eq!(locate(&doc, "/list/0/a").to_string(), "$.list[0].a");
        assert_eq!(locate(&doc, "/map/0/a").to_string(), "$.map.0.a");
    }

    #[test]
    fn test_locate_unescapes_tokens() {
        let doc = json!({"a/b": {"c~d": 1}});
        assert_eq!(locate(&doc, "/a~1b/c~0d").to_string(), "$['a/b']['c~d']");
    }

    #[test]
    fn test_locate_root() {
        assert_eq!(locate(&json!({}), "").to_string(), "$");
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(1)), "integer");
        assert_eq!(json_type_name(&json!(-1)), "integer");
        assert_eq!(json_type_name(&json!(1.5)), "number");
        assert_eq!(json_type_name(&json!("x")), "string");
        assert_eq!(json_type_name(&json!(null)), "null");
    }

    #[test]
    fn test_render_options() {
        assert_eq!(
            render_options(&json!(["tracecontext", "baggage", 3])),
            "[tracecontext, baggage, 3]"
        );
    }

    #[test]
    fn test_violation_set_orders_and_dedups() {
        let a = Violation::new(&DocumentPath::root().key("b"), "second");
        let b = Violation::new(&DocumentPath::root().key("a"), "first");
        let set: ViolationSet = vec![a.clone(), b.clone(), a.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
        let ordered: Vec<_> = set.iter().cloned().collect();
        assert_eq!(ordered, vec![b, a]);
        assert!(set.contains("$.a: first"));
    }

    #[test]
    fn test_violation_set_display() {
        let set: ViolationSet = vec![
            Violation::new(&DocumentPath::root().key("a"), "first"),
            Violation::new(&DocumentPath::root().key("b"), "second"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_string(), "  - $.a: first\n  - $.b: second");
    }
}
