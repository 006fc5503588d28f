//! # Typed Decoding
//!
//! Maps a [`ValidatedDocument`] onto a serde shape. Only validated
//! documents are accepted, so a failure here means the Rust shape and the
//! schema disagree; it surfaces as [`DecodeError::Typed`] rather than a
//! partially populated value.

use serde::de::DeserializeOwned;

use otelconf_core::DecodeError;
use otelconf_schema::ValidatedDocument;

use crate::config::OpenTelemetryConfiguration;

/// Decode a validated document into `T`.
///
/// # Errors
///
/// Returns [`DecodeError::Typed`] naming `T` if the document does not fit.
pub fn decode<T: DeserializeOwned>(document: &ValidatedDocument) -> Result<T, DecodeError> {
    let target = std::any::type_name::<T>();
    T::deserialize(document.value()).map_err(|e| {
        tracing::debug!(target_type = target, error = %e, "typed decode failed");
        DecodeError::Typed {
            target,
            reason: e.to_string(),
        }
    })
}

/// Decode a document validated against `opentelemetry_configuration.json`.
pub fn decode_configuration(
    document: &ValidatedDocument,
) -> Result<OpenTelemetryConfiguration, DecodeError> {
    decode(document)
}
