//! Integration tests: validate repository fixtures, then decode them into
//! the typed configuration tree.

use std::fs;
use std::path::PathBuf;

use otelconf_core::{CanonicalDocument, DecodeError};
use otelconf_model::{
    decode, decode_configuration, OpenTelemetryConfiguration, SpanLimits, SpanProcessor,
};
use otelconf_schema::{SchemaResolver, ValidatedDocument};

fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn validated(schema: &str, fixture: &str) -> ValidatedDocument {
    let compiled = SchemaResolver::from_dir(repo_root().join("schemas"))
        .unwrap()
        .build(schema)
        .unwrap();
    let doc = CanonicalDocument::from_yaml_file(repo_root().join("fixtures").join(fixture)).unwrap();
    compiled
        .check(doc)
        .unwrap_or_else(|v| panic!("{fixture} must validate:\n{v}"))
}

fn kitchen_sink() -> OpenTelemetryConfiguration {
    decode_configuration(&validated(
        "opentelemetry_configuration.json",
        "kitchen-sink.yaml",
    ))
    .unwrap()
}

#[test]
fn test_kitchen_sink_root_fields() {
    let config = kitchen_sink();
    assert_eq!(config.file_format, "0.1");
    assert_eq!(config.disabled, Some(false));
    let limits = config.attribute_limits.unwrap();
    assert_eq!(limits.attribute_value_length_limit, Some(4096));
    assert_eq!(limits.attribute_count_limit, Some(128));

    let resource = config.resource.unwrap();
    let attributes = resource.attributes.unwrap();
    assert_eq!(attributes.service_name.as_deref(), Some("unknown_service"));
    assert_eq!(
        attributes.additional["deployment.environment"],
        serde_json::json!("staging")
    );
    assert_eq!(
        resource.schema_url.as_deref(),
        Some("https://opentelemetry.io/schemas/1.16.0")
    );
    assert_eq!(config.propagator.unwrap().composite.len(), 7);
}

#[test]
fn test_kitchen_sink_tracer_provider() {
    let tracer = kitchen_sink().tracer_provider.unwrap();
    assert_eq!(tracer.processors.len(), 3);

    let batch = tracer.processors[0].batch.as_ref().unwrap();
    assert_eq!(batch.schedule_delay, Some(5000));
    let otlp = batch.exporter.otlp.as_ref().unwrap();
    assert_eq!(otlp.protocol, "http/protobuf");
    assert_eq!(otlp.endpoint, "http://localhost:4318/v1/traces");
    assert_eq!(otlp.headers.as_ref().unwrap().get("api-key").as_deref(), Some("1234"));
    assert_eq!(otlp.timeout, Some(10000));

    let zipkin = tracer.processors[1]
        .batch
        .as_ref()
        .unwrap()
        .exporter
        .zipkin
        .as_ref()
        .unwrap();
    assert_eq!(zipkin.endpoint, "http://localhost:9411/api/v2/spans");

    let simple = tracer.processors[2].simple.as_ref().unwrap();
    assert!(simple.exporter.console.is_some(), "bare `console:` must decode as present");

    assert_eq!(tracer.limits.unwrap().link_attribute_count_limit, Some(128));

    let parent = tracer.sampler.unwrap().parent_based.unwrap();
    let ratio = parent.root.unwrap().trace_id_ratio_based.unwrap().ratio;
    assert_eq!(ratio, Some(0.0001));
    assert!(parent.remote_parent_sampled.unwrap().always_on.is_some());
    assert!(parent.local_parent_not_sampled.unwrap().always_off.is_some());
}

#[test]
fn test_kitchen_sink_merge_keys_expanded() {
    let config = kitchen_sink();
    let meter = config.meter_provider.unwrap();
    let periodic = meter.readers[0].periodic.as_ref().unwrap();
    let otlp = periodic.exporter.otlp.as_ref().unwrap();
    // Inherited from the traces exporter anchor, endpoint overridden.
    assert_eq!(otlp.protocol, "http/protobuf");
    assert_eq!(otlp.compression.as_deref(), Some("gzip"));
    assert_eq!(otlp.endpoint, "http://localhost:4318/v1/metrics");

    let logs = config.logger_provider.unwrap();
    let log_otlp = logs.processors[0]
        .batch
        .as_ref()
        .unwrap()
        .exporter
        .otlp
        .as_ref()
        .unwrap();
    assert_eq!(log_otlp.endpoint, "http://localhost:4318/v1/logs");
    assert_eq!(log_otlp.client_key.as_deref(), Some("/app/cert.pem"));
}

#[test]
fn test_kitchen_sink_metrics_views_and_pull_reader() {
    let meter = kitchen_sink().meter_provider.unwrap();
    let prometheus = meter.readers[1]
        .pull
        .as_ref()
        .unwrap()
        .exporter
        .prometheus
        .as_ref()
        .unwrap();
    assert_eq!(prometheus.host.as_deref(), Some("localhost"));
    assert_eq!(prometheus.port, Some(9464));

    let view = &meter.views[0];
    let selector = view.selector.as_ref().unwrap();
    assert_eq!(selector.meter_version.as_deref(), Some("1.0.0"));
    let stream = view.view.as_ref().unwrap();
    let aggregation = stream.aggregation.as_ref().unwrap();
    assert_eq!(aggregation.name, "explicit_bucket_histogram");
    assert_eq!(aggregation.args["record_min_max"], serde_json::json!(true));
    assert_eq!(
        stream.attribute_keys.as_deref(),
        Some(&["key1".to_string(), "key2".to_string()][..])
    );
}

#[test]
fn test_decode_fragment_schemas() {
    let limits: SpanLimits = decode(&validated("span_limits.json", "span_limits/all-fields.yaml")).unwrap();
    assert!(limits.attribute_count_limit.is_some());

    let processor: SpanProcessor =
        decode(&validated("span_processor.json", "span_processor/batch-all-fields.yaml")).unwrap();
    assert!(processor.batch.is_some());
    assert!(processor.simple.is_none());
}

#[test]
fn test_integral_float_limit_decodes_as_integer() {
    let compiled = SchemaResolver::from_dir(repo_root().join("schemas"))
        .unwrap()
        .build("span_limits.json")
        .unwrap();
    let validated = compiled
        .check(CanonicalDocument::from_yaml_str("event_count_limit: 128.0\n").unwrap())
        .unwrap();
    let limits: SpanLimits = decode(&validated).unwrap();
    assert_eq!(limits.event_count_limit, Some(128));
}

#[test]
fn test_shape_mismatch_is_decode_error() {
    // A permissive schema lets a document through that the typed tree rejects.
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("anything.json"), r#"{"type":"object"}"#).unwrap();
    let compiled = SchemaResolver::from_dir(tmp.path())
        .unwrap()
        .build("anything.json")
        .unwrap();
    let validated = compiled
        .check(CanonicalDocument::from_yaml_str("file_format: 1\n").unwrap())
        .unwrap();

    let err = decode_configuration(&validated).unwrap_err();
    match err {
        DecodeError::Typed { target, reason } => {
            assert!(target.ends_with("OpenTelemetryConfiguration"), "{target}");
            assert!(reason.contains("invalid type"), "{reason}");
        }
        other => panic!("Expected DecodeError::Typed, got: {other}"),
    }
}

#[test]
fn test_decoded_tree_round_trips_through_json() {
    let config = kitchen_sink();
    let value = serde_json::to_value(&config).unwrap();
    let back: OpenTelemetryConfiguration = serde_json::from_value(value).unwrap();
    assert_eq!(back, config);
}
