//! # Typed Configuration Tree
//!
//! Rust shapes for the OpenTelemetry SDK file configuration, one struct per
//! schema object. Field names match the YAML keys.
//!
//! ## Conventions
//!
//! - Closed schema objects deny unknown fields.
//! - Open objects (`Headers`, resource attributes, aggregation `args`)
//!   keep unrecognized keys in a `BTreeMap<String, Value>` bag.
//! - One-of objects (exporters, processors, samplers) are structs of
//!   optional members; the schema guarantees exactly one is set.
//! - Presence-only nodes written as a bare key (`console:`, `always_on:`)
//!   decode to `Some` even though their YAML value is `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserialize a key whose presence matters more than its value: a `null`
/// becomes `Some(T::default())`. Pair with `#[serde(default)]` so an absent
/// key stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(|value| Some(value.unwrap_or_default()))
}

/// Root of a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenTelemetryConfiguration {
    /// Configuration file format version, e.g. `"0.1"`.
    pub file_format: String,

    /// Disable the SDK entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    /// Global attribute limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_limits: Option<AttributeLimits>,

    /// Resource shared by all providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,

    /// Context propagators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagator: Option<Propagator>,

    /// Tracing pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracer_provider: Option<TracerProvider>,

    /// Metrics pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_provider: Option<MeterProvider>,

    /// Logs pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger_provider: Option<LoggerProvider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_value_length_limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_count_limit: Option<u64>,
}

/// Resource attributes and schema URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ResourceAttributes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
}

/// Resource attributes: `service.name` plus any other semantic-convention key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    /// Logical name of the service.
    #[serde(
        rename = "service.name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_name: Option<String>,

    /// Every other attribute, keyed by attribute name.
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Propagator {
    /// Propagator names, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Tracer provider: span processors, limits and sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracerProvider {
    /// Span processors, invoked in order.
    pub processors: Vec<SpanProcessor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<SpanLimits>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler: Option<Sampler>,
}

/// Exactly one of `batch` or `simple`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpanProcessor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchSpanProcessor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<SimpleSpanProcessor>,
}

/// Batching span processor. Durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSpanProcessor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_delay: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_queue_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_export_batch_size: Option<u64>,

    pub exporter: SpanExporter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleSpanProcessor {
    pub exporter: SpanExporter,
}

/// Exactly one of `otlp`, `zipkin` or `console`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpanExporter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp: Option<Otlp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipkin: Option<Zipkin>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub console: Option<Console>,
}

/// OTLP exporter settings shared by all three signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Otlp {
    /// `grpc`, `http/protobuf` or `http/json`.
    pub protocol: String,

    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,

    /// Export timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
}

/// Free-form export headers. Values may be strings, integers or booleans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(pub BTreeMap<String, Value>);

impl Headers {
    /// Header value rendered as text, the way it goes on the wire.
    pub fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Zipkin {
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Console exporter. Carries no settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Console {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpanLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_value_length_limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_count_limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_count_limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_count_limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_attribute_count_limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_attribute_count_limit: Option<u64>,
}

/// Exactly one sampler kind. `parent_based` nests further samplers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sampler {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub always_on: Option<AlwaysOn>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub always_off: Option<AlwaysOff>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub trace_id_ratio_based: Option<TraceIdRatioBased>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_based: Option<Box<ParentBased>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlwaysOn {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlwaysOff {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceIdRatioBased {
    /// Fraction of traces sampled, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

/// Delegating sampler keyed on the parent span's sampling decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentBased {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Box<Sampler>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_parent_sampled: Option<Box<Sampler>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_parent_not_sampled: Option<Box<Sampler>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_parent_sampled: Option<Box<Sampler>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_parent_not_sampled: Option<Box<Sampler>>,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeterProvider {
    pub readers: Vec<MetricReader>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<View>,
}

/// Exactly one of `periodic` or `pull`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricReader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic: Option<PeriodicMetricReader>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull: Option<PullMetricReader>,
}

/// Push reader exporting on a fixed interval. Durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodicMetricReader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    pub exporter: MetricExporter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PullMetricReader {
    pub exporter: PullMetricExporter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PullMetricExporter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus: Option<Prometheus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Prometheus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Exactly one of `otlp` or `console`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricExporter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp: Option<Otlp>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub console: Option<Console>,
}

/// A view: which instruments to match and how to reshape their stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct View {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<ViewSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewStream>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_schema_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,

    /// Attribute keys retained on the stream; all others are dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_keys: Option<Vec<String>>,
}

/// Aggregation name plus aggregation-specific arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Aggregation {
    pub name: String,

    /// Arguments such as `boundaries` or `record_min_max`, kept as JSON.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerProvider {
    pub processors: Vec<LogRecordProcessor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<AttributeLimits>,
}

/// Exactly one of `batch` or `simple`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogRecordProcessor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchLogRecordProcessor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple: Option<SimpleLogRecordProcessor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchLogRecordProcessor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_delay: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_queue_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_export_batch_size: Option<u64>,

    pub exporter: LogRecordExporter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleLogRecordProcessor {
    pub exporter: LogRecordExporter,
}

/// Exactly one of `otlp` or `console`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogRecordExporter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp: Option<Otlp>,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub console: Option<Console>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_console_key_is_present() {
        let exporter: SpanExporter = serde_json::from_value(json!({"console": null})).unwrap();
        assert_eq!(exporter.console, Some(Console {}));
        assert!(exporter.otlp.is_none());
    }

    #[test]
    fn test_absent_console_key_is_none() {
        let exporter: SpanExporter =
            serde_json::from_value(json!({"zipkin": {"endpoint": "http://z"}})).unwrap();
        assert!(exporter.console.is_none());
        assert_eq!(exporter.zipkin.unwrap().endpoint, "http://z");
    }

    #[test]
    fn test_nested_sampler() {
        let sampler: Sampler = serde_json::from_value(json!({
            "parent_based": {
                "root": {"trace_id_ratio_based": {"ratio": 0.5}},
                "remote_parent_sampled": {"always_on": null}
            }
        }))
        .unwrap();
        let parent = sampler.parent_based.unwrap();
        let root = parent.root.unwrap();
        assert_eq!(root.trace_id_ratio_based.unwrap().ratio, Some(0.5));
        assert!(parent.remote_parent_sampled.unwrap().always_on.is_some());
        assert!(parent.local_parent_sampled.is_none());
    }

    #[test]
    fn test_closed_shape_rejects_unknown_field() {
        let err = serde_json::from_value::<Zipkin>(json!({"endpoint": "x", "retries": 3}))
            .unwrap_err();
        assert!(err.to_string().contains("retries"), "{err}");
    }

    #[test]
    fn test_resource_attributes_bag() {
        let attrs: ResourceAttributes = serde_json::from_value(json!({
            "service.name": "checkout",
            "deployment.environment": "prod",
            "host.cores": 8
        }))
        .unwrap();
        assert_eq!(attrs.service_name.as_deref(), Some("checkout"));
        assert_eq!(attrs.additional.len(), 2);
        assert_eq!(attrs.additional["host.cores"], json!(8));
    }

    #[test]
    fn test_headers_render_values() {
        let headers: Headers =
            serde_json::from_value(json!({"api-key": "1234", "retries": 3, "debug": true}))
                .unwrap();
        assert_eq!(headers.get("api-key").as_deref(), Some("1234"));
        assert_eq!(headers.get("retries").as_deref(), Some("3"));
        assert_eq!(headers.get("debug").as_deref(), Some("true"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let exporter = SpanExporter {
            console: Some(Console {}),
            ..SpanExporter::default()
        };
        assert_eq!(serde_json::to_value(&exporter).unwrap(), json!({"console": {}}));
    }
}
