//! # Protobuf Bridge
//!
//! Merges a [`CanonicalDocument`] into a [`DynamicMessage`] described at
//! runtime by a [`DescriptorPool`].
//!
//! ## Merge Rules
//!
//! - Object keys match fields by proto name first, then by JSON name.
//! - Keys with no matching field are skipped (logged at `debug`). The schema
//!   set is allowed to be a superset of the message.
//! - Singular and repeated message fields are merged recursively so a
//!   failure names its dotted field path (`tracer_provider.processors[0].batch`).
//! - Scalars, enums, maps and `google.protobuf.*` types are handed to the
//!   proto3 JSON mapping.
//! - `null` on a singular message field sets an empty message; on any other
//!   field it leaves the field untouched.
//! - Repeated fields append; merging twice doubles the list.

use std::path::Path;

use prost::Message;
use prost_reflect::{
    DescriptorPool, DeserializeOptions, DynamicMessage, FieldDescriptor, Kind, MessageDescriptor,
    ReflectMessage, Value as ReflectValue,
};
use serde_json::{Map, Value};

use otelconf_core::{CanonicalDocument, DecodeError};

/// Full name of the root configuration message in the bundled protos.
pub const CONFIGURATION_MESSAGE: &str = "opentelemetry.sdk.v1.OpenTelemetryConfiguration";

/// Descriptor set compiled from `proto/` by the build script.
const BUNDLED_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/otelconf_descriptor.bin"));

/// Runtime protobuf schema plus the document → message merge.
#[derive(Debug, Clone)]
pub struct ProtoBridge {
    pool: DescriptorPool,
}

impl ProtoBridge {
    /// Bridge over the bundled `opentelemetry.sdk.v1` protos.
    pub fn bundled() -> Result<Self, DecodeError> {
        Self::from_descriptor_set(BUNDLED_DESCRIPTOR_SET)
    }

    /// Bridge over an encoded `FileDescriptorSet`.
    pub fn from_descriptor_set(bytes: &[u8]) -> Result<Self, DecodeError> {
        let pool =
            DescriptorPool::decode(bytes).map_err(|e| DecodeError::Descriptor(e.to_string()))?;
        tracing::debug!(messages = pool.all_messages().count(), "loaded descriptor pool");
        Ok(Self { pool })
    }

    /// Compile `.proto` files at runtime.
    ///
    /// Files are resolved against `includes`; well-known `google/protobuf`
    /// imports are always available.
    pub fn from_proto_files<F, I>(files: F, includes: I) -> Result<Self, DecodeError>
    where
        F: IntoIterator,
        F::Item: AsRef<Path>,
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let descriptor_error = |e: protox::Error| DecodeError::Descriptor(e.to_string());
        let mut compiler = protox::Compiler::new(includes).map_err(descriptor_error)?;
        compiler.include_imports(true);
        compiler.open_files(files).map_err(descriptor_error)?;
        Self::from_descriptor_set(&compiler.file_descriptor_set().encode_to_vec())
    }

    /// The underlying descriptor pool.
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Look up a message by full name.
    pub fn message(&self, name: &str) -> Result<MessageDescriptor, DecodeError> {
        self.pool
            .get_message_by_name(name)
            .ok_or_else(|| DecodeError::UnknownMessage(name.to_string()))
    }

    /// Build a fresh `name` message from the document.
    pub fn decode(
        &self,
        document: &CanonicalDocument,
        name: &str,
    ) -> Result<DynamicMessage, DecodeError> {
        let mut message = DynamicMessage::new(self.message(name)?);
        Self::merge(document, &mut message)?;
        Ok(message)
    }

    /// Merge the document into an existing message.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Proto`] if a known field holds a value of the
    /// wrong shape. Unknown keys never fail.
    pub fn merge(
        document: &CanonicalDocument,
        message: &mut DynamicMessage,
    ) -> Result<(), DecodeError> {
        match document.value() {
            Value::Object(map) => merge_object(map, message, ""),
            other => Err(DecodeError::Proto {
                path: message.descriptor().full_name().to_string(),
                reason: shape_mismatch(other, "message"),
            }),
        }
    }
}

fn merge_object(
    map: &Map<String, Value>,
    message: &mut DynamicMessage,
    prefix: &str,
) -> Result<(), DecodeError> {
    let descriptor = message.descriptor();
    for (key, value) in map {
        let Some(field) = descriptor
            .get_field_by_name(key)
            .or_else(|| descriptor.get_field_by_json_name(key))
        else {
            tracing::debug!(
                message = descriptor.full_name(),
                field = key.as_str(),
                "ignoring key with no matching field"
            );
            continue;
        };
        let path = if prefix.is_empty() {
            field.name().to_string()
        } else {
            format!("{prefix}.{}", field.name())
        };
        merge_field(&field, value, message, &path)?;
    }
    Ok(())
}

fn merge_field(
    field: &FieldDescriptor,
    value: &Value,
    message: &mut DynamicMessage,
    path: &str,
) -> Result<(), DecodeError> {
    let inner = match field.kind() {
        Kind::Message(inner) if !field.is_map() && !is_well_known(&inner) => inner,
        _ => return delegate(field, value, message, path),
    };

    if field.is_list() {
        let items = match value {
            Value::Null => return Ok(()),
            Value::Array(items) => items,
            other => return Err(proto_error(path, shape_mismatch(other, "list"))),
        };
        let mut elements = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let element_path = format!("{path}[{i}]");
            let mut element = DynamicMessage::new(inner.clone());
            match item {
                Value::Object(map) => merge_object(map, &mut element, &element_path)?,
                Value::Null => {}
                other => return Err(proto_error(&element_path, shape_mismatch(other, "message"))),
            }
            elements.push(ReflectValue::Message(element));
        }
        return append_list(field, elements, message, path);
    }

    match value {
        Value::Null => {
            if !message.has_field(field) {
                message.set_field(field, ReflectValue::Message(DynamicMessage::new(inner)));
            }
            Ok(())
        }
        Value::Object(map) => {
            let nested = message
                .get_field_mut(field)
                .as_message_mut()
                .ok_or_else(|| proto_error(path, "field does not hold a message".to_string()))?;
            merge_object(map, nested, path)
        }
        other => Err(proto_error(path, shape_mismatch(other, "message"))),
    }
}

/// Parse one field through the proto3 JSON mapping and copy it across.
fn delegate(
    field: &FieldDescriptor,
    value: &Value,
    message: &mut DynamicMessage,
    path: &str,
) -> Result<(), DecodeError> {
    if value.is_null() {
        return Ok(());
    }
    let mut single = Map::new();
    single.insert(field.name().to_string(), value.clone());
    let options = DeserializeOptions::new().deny_unknown_fields(false);
    let parsed =
        DynamicMessage::deserialize_with_options(message.descriptor(), Value::Object(single), &options)
            .map_err(|e| proto_error(path, e.to_string()))?;
    let parsed_value = parsed.get_field(field).into_owned();

    if field.is_list() {
        let elements = match parsed_value {
            ReflectValue::List(elements) => elements,
            _ => return Err(proto_error(path, "expected a list".to_string())),
        };
        return append_list(field, elements, message, path);
    }
    if field.is_map() {
        let entries = match parsed_value {
            ReflectValue::Map(entries) => entries,
            _ => return Err(proto_error(path, "expected a map".to_string())),
        };
        let existing = message
            .get_field_mut(field)
            .as_map_mut()
            .ok_or_else(|| proto_error(path, "field does not hold a map".to_string()))?;
        existing.extend(entries);
        return Ok(());
    }
    message.set_field(field, parsed_value);
    Ok(())
}

fn append_list(
    field: &FieldDescriptor,
    elements: Vec<ReflectValue>,
    message: &mut DynamicMessage,
    path: &str,
) -> Result<(), DecodeError> {
    let existing = message
        .get_field_mut(field)
        .as_list_mut()
        .ok_or_else(|| proto_error(path, "field does not hold a list".to_string()))?;
    existing.extend(elements);
    Ok(())
}

fn is_well_known(descriptor: &MessageDescriptor) -> bool {
    descriptor.full_name().starts_with("google.protobuf.")
}

fn proto_error(path: &str, reason: String) -> DecodeError {
    DecodeError::Proto {
        path: path.to_string(),
        reason,
    }
}

fn shape_mismatch(value: &Value, expected: &str) -> String {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("{found} found, {expected} expected")
}
